//! JWT token management

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::error::AuthError;
use crate::secret::SecretProvider;

/// Token lifetime. Expiry is absolute; tokens are never renewed.
pub const TOKEN_TTL_DAYS: i64 = 7;

/// JWT claims
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    /// The user ID carried in `sub`
    pub fn user_id(&self) -> Option<Uuid> {
        Uuid::parse_str(&self.sub).ok()
    }
}

/// A freshly signed token
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Why a token was turned away. Only ever logged; callers see
/// [`AuthError::Unauthorized`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RejectReason {
    MissingToken,
    MalformedHeader,
    MalformedToken,
    BadSignature,
    Expired,
    InvalidSubject,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            RejectReason::MissingToken => "missing token",
            RejectReason::MalformedHeader => "malformed authorization header",
            RejectReason::MalformedToken => "malformed token",
            RejectReason::BadSignature => "bad signature",
            RejectReason::Expired => "expired",
            RejectReason::InvalidSubject => "invalid subject",
        };
        f.write_str(reason)
    }
}

/// Issues and verifies HS256 tokens with a secret from a [`SecretProvider`]
#[derive(Clone)]
pub struct JwtManager {
    secrets: Arc<dyn SecretProvider>,
}

impl JwtManager {
    /// Create a new JWT manager
    pub fn new(secrets: Arc<dyn SecretProvider>) -> Self {
        Self { secrets }
    }

    /// Token lifetime
    pub fn ttl(&self) -> Duration {
        Duration::days(TOKEN_TTL_DAYS)
    }

    /// Sign a token for a user, valid for seven days from `now`
    pub fn issue(&self, user_id: Uuid, now: DateTime<Utc>) -> Result<IssuedToken, AuthError> {
        let expires_at = now + self.ttl();

        let claims = Claims {
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        debug!("Issuing token for user: {}", user_id);

        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.secrets.signing_secret()),
        )
        .map_err(AuthError::TokenEncoding)?;

        Ok(IssuedToken {
            token,
            issued_at: now,
            expires_at,
        })
    }

    /// Sign a token for a user, valid for seven days from the current time
    pub fn generate_token(&self, user_id: Uuid) -> Result<IssuedToken, AuthError> {
        self.issue(user_id, Utc::now())
    }

    /// Verify a token as of `now` and return its claims.
    ///
    /// Every failure is reported as [`AuthError::Unauthorized`].
    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, AuthError> {
        self.check(token, now).map_err(|reason| {
            debug!("Token rejected: {}", reason);
            AuthError::Unauthorized
        })
    }

    /// Verify a token as of the current time
    pub fn validate_token(&self, token: &str) -> Result<Claims, AuthError> {
        self.verify(token, Utc::now())
    }

    /// A token is valid iff its signature matches and `now` is before `exp`.
    pub(crate) fn check(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, RejectReason> {
        // Expiry is checked below against the caller's clock, without leeway
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secrets.signing_secret()),
            &validation,
        )
        .map_err(|e| match e.kind() {
            ErrorKind::InvalidSignature => RejectReason::BadSignature,
            ErrorKind::ExpiredSignature => RejectReason::Expired,
            _ => RejectReason::MalformedToken,
        })?;

        if now.timestamp() >= token_data.claims.exp {
            return Err(RejectReason::Expired);
        }

        if token_data.claims.user_id().is_none() {
            return Err(RejectReason::InvalidSubject);
        }

        Ok(token_data.claims)
    }
}
