//! User operations

use chrono::Utc;
use uuid::Uuid;

use crate::error::DbError;
use crate::models::{CredentialRecord, NewUser, ProfileUpdate, User, UserId};
use crate::repository::Database;

impl Database {
    // ==================== User Operations ====================

    /// Insert a new user
    pub async fn insert_user(&self, user: NewUser) -> Result<User, DbError> {
        let now = Utc::now();
        let id = Uuid::new_v4();

        // Check if the email is already registered
        if self.email_exists(&user.email).await? {
            return Err(DbError::Duplicate(format!("User '{}' already exists", user.email)));
        }

        sqlx::query(
            r#"
            INSERT INTO users (id, name, about, avatar, email, password_hash, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(id.to_string())
        .bind(&user.name)
        .bind(&user.about)
        .bind(&user.avatar)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(now.to_rfc3339())
        .bind(now.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            // A concurrent signup may win the race past the check above
            if DbError::is_unique_violation(&e) {
                DbError::Duplicate(format!("User '{}' already exists", user.email))
            } else {
                DbError::from(e)
            }
        })?;

        Ok(User {
            id,
            name: user.name,
            about: user.about,
            avatar: user.avatar,
            email: user.email,
            created_at: now,
            updated_at: now,
        })
    }

    /// Look up the stored credentials for an email (exact, case-sensitive match)
    pub async fn find_credential_by_email(
        &self,
        email: &str,
    ) -> Result<Option<CredentialRecord>, DbError> {
        let result = sqlx::query(
            r#"
            SELECT id, name, about, avatar, email, password_hash, created_at, updated_at
            FROM users
            WHERE email = ?
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        result
            .map(|row| CredentialRecord::try_from(&row).map_err(DbError::from))
            .transpose()
    }

    /// Get a user by ID
    pub async fn get_user_by_id(&self, id: UserId) -> Result<Option<User>, DbError> {
        let result = sqlx::query(
            r#"
            SELECT id, name, about, avatar, email, created_at, updated_at
            FROM users
            WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        result.map(|row| User::try_from(&row).map_err(DbError::from)).transpose()
    }

    /// List all users
    pub async fn list_users(&self) -> Result<Vec<User>, DbError> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, about, avatar, email, created_at, updated_at
            FROM users
            ORDER BY created_at
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| User::try_from(row).map_err(DbError::from))
            .collect()
    }

    /// Update name and/or about, returning the updated user
    pub async fn update_user_profile(
        &self,
        id: UserId,
        update: ProfileUpdate,
    ) -> Result<User, DbError> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            UPDATE users
            SET name = COALESCE(?, name), about = COALESCE(?, about), updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(update.name)
        .bind(update.about)
        .bind(now.to_rfc3339())
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound(format!("User: {}", id)));
        }
        self.get_user_by_id(id)
            .await?
            .ok_or_else(|| DbError::NotFound(format!("User: {}", id)))
    }

    /// Update avatar, returning the updated user
    pub async fn update_user_avatar(&self, id: UserId, avatar: &str) -> Result<User, DbError> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            UPDATE users
            SET avatar = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(avatar)
        .bind(now.to_rfc3339())
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound(format!("User: {}", id)));
        }
        self.get_user_by_id(id)
            .await?
            .ok_or_else(|| DbError::NotFound(format!("User: {}", id)))
    }

    async fn email_exists(&self, email: &str) -> Result<bool, DbError> {
        let row = sqlx::query("SELECT 1 FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }
}
