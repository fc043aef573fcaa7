//! Authentication error types

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Errors produced by the authentication core.
///
/// Credential and token failures each collapse into a single variant so that
/// callers can never tell an unknown email from a wrong password, or an
/// expired token from a forged one.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Authorization required")]
    Unauthorized,

    #[error("Invalid signing secret: {0}")]
    InvalidSecret(String),

    #[error("Password hashing error: {0}")]
    PasswordHash(String),

    #[error("Token encoding error: {0}")]
    TokenEncoding(#[source] jsonwebtoken::errors::Error),

    #[error("Credential store error: {0}")]
    Store(#[from] mesto_db::DbError),
}

impl AuthError {
    /// HTTP status for this error
    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::InvalidCredentials | AuthError::Unauthorized => StatusCode::UNAUTHORIZED,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show to the client
    pub fn public_message(&self) -> &'static str {
        match self {
            AuthError::InvalidCredentials => "Invalid email or password",
            AuthError::Unauthorized => "Authorization required",
            _ => "An error occurred on the server",
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Authentication failure: {}", self);
        }

        let body = axum::Json(json!({
            "message": self.public_message()
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_facing_mapping() {
        assert_eq!(AuthError::InvalidCredentials.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AuthError::Unauthorized.status(), StatusCode::UNAUTHORIZED);

        let internal = AuthError::PasswordHash("salt too short".to_string());
        assert_eq!(internal.status(), StatusCode::INTERNAL_SERVER_ERROR);
        // Internal details stay out of the response
        assert!(!internal.public_message().contains("salt"));
    }
}
