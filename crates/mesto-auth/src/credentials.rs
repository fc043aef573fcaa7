//! Credential checking for login

use async_trait::async_trait;
use mesto_db::{CredentialRecord, Database, User};
use std::sync::Arc;
use tracing::debug;

use crate::error::AuthError;
use crate::password::{hash_password, verify_password};

/// Lookup of stored credentials by email
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Find the credential record for an exact email match
    async fn find_credential_by_email(
        &self,
        email: &str,
    ) -> Result<Option<CredentialRecord>, AuthError>;
}

#[async_trait]
impl CredentialStore for Database {
    async fn find_credential_by_email(
        &self,
        email: &str,
    ) -> Result<Option<CredentialRecord>, AuthError> {
        Ok(Database::find_credential_by_email(self, email).await?)
    }
}

/// Turns an email and password into a verified user
pub struct CredentialChecker {
    store: Arc<dyn CredentialStore>,
    /// Verified against when the email is unknown, so both failure paths
    /// cost one Argon2 verification
    dummy_hash: String,
}

impl CredentialChecker {
    pub fn new(store: Arc<dyn CredentialStore>) -> Result<Self, AuthError> {
        Ok(Self {
            store,
            dummy_hash: hash_password("mesto-unknown-account")?,
        })
    }

    /// Verify a login attempt.
    ///
    /// Unknown emails and wrong passwords both yield
    /// [`AuthError::InvalidCredentials`].
    pub async fn verify_credentials(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let record = self.store.find_credential_by_email(email).await?;

        let stored_hash = record
            .as_ref()
            .map(|r| r.password_hash.as_str())
            .unwrap_or(&self.dummy_hash);
        let password_valid = verify_password(password, stored_hash)?;

        match record {
            Some(record) if password_valid => Ok(record.user),
            Some(record) => {
                debug!("Login rejected for user {}: password mismatch", record.user.id);
                Err(AuthError::InvalidCredentials)
            }
            None => {
                debug!("Login rejected: no account for the submitted email");
                Err(AuthError::InvalidCredentials)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use mesto_db::DbError;
    use std::collections::HashMap;
    use uuid::Uuid;

    struct MemoryStore {
        records: HashMap<String, CredentialRecord>,
    }

    impl MemoryStore {
        fn with_user(email: &str, password: &str) -> (Self, User) {
            let user = User {
                id: Uuid::new_v4(),
                name: "Jacques".to_string(),
                about: "Explorer".to_string(),
                avatar: "https://example.com/a.png".to_string(),
                email: email.to_string(),
                created_at: Utc::now(),
                updated_at: Utc::now(),
            };
            let record = CredentialRecord {
                user: user.clone(),
                password_hash: hash_password(password).unwrap(),
            };
            let records = HashMap::from([(email.to_string(), record)]);
            (Self { records }, user)
        }
    }

    #[async_trait]
    impl CredentialStore for MemoryStore {
        async fn find_credential_by_email(
            &self,
            email: &str,
        ) -> Result<Option<CredentialRecord>, AuthError> {
            Ok(self.records.get(email).cloned())
        }
    }

    struct FailingStore;

    #[async_trait]
    impl CredentialStore for FailingStore {
        async fn find_credential_by_email(
            &self,
            _email: &str,
        ) -> Result<Option<CredentialRecord>, AuthError> {
            Err(DbError::Migration("table missing".to_string()).into())
        }
    }

    #[tokio::test]
    async fn test_valid_credentials_return_user() {
        let (store, user) = MemoryStore::with_user("a@b.com", "correct123");
        let checker = CredentialChecker::new(Arc::new(store)).unwrap();

        let verified = checker.verify_credentials("a@b.com", "correct123").await.unwrap();
        assert_eq!(verified.id, user.id);
        assert_eq!(verified.email, "a@b.com");
    }

    #[tokio::test]
    async fn test_unknown_email_and_wrong_password_are_indistinguishable() {
        let (store, _) = MemoryStore::with_user("a@b.com", "correct123");
        let checker = CredentialChecker::new(Arc::new(store)).unwrap();

        let wrong_password = checker.verify_credentials("a@b.com", "wrong").await.unwrap_err();
        let unknown_email = checker
            .verify_credentials("nobody@b.com", "correct123")
            .await
            .unwrap_err();

        assert!(matches!(wrong_password, AuthError::InvalidCredentials));
        assert!(matches!(unknown_email, AuthError::InvalidCredentials));
        assert_eq!(wrong_password.to_string(), unknown_email.to_string());
    }

    #[tokio::test]
    async fn test_email_match_is_case_sensitive() {
        let (store, _) = MemoryStore::with_user("a@b.com", "correct123");
        let checker = CredentialChecker::new(Arc::new(store)).unwrap();

        let result = checker.verify_credentials("A@B.COM", "correct123").await;
        assert!(matches!(result, Err(AuthError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_store_failure_is_not_a_credential_failure() {
        let checker = CredentialChecker::new(Arc::new(FailingStore)).unwrap();

        let result = checker.verify_credentials("a@b.com", "correct123").await;
        assert!(matches!(result, Err(AuthError::Store(_))));
    }

    #[tokio::test]
    async fn test_database_backed_store() {
        let db = Database::in_memory().await.unwrap();
        let user = db
            .insert_user(mesto_db::NewUser {
                name: "Jacques".to_string(),
                about: "Explorer".to_string(),
                avatar: "https://example.com/a.png".to_string(),
                email: "a@b.com".to_string(),
                password_hash: hash_password("correct123").unwrap(),
            })
            .await
            .unwrap();
        let checker = CredentialChecker::new(Arc::new(db)).unwrap();

        let verified = checker.verify_credentials("a@b.com", "correct123").await.unwrap();
        assert_eq!(verified, user);
    }
}
