//! Database error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database connection error: {0}")]
    Connection(#[from] sqlx::Error),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Duplicate entry: {0}")]
    Duplicate(String),

    #[error("Migration error: {0}")]
    Migration(String),
}

impl DbError {
    /// Whether the underlying driver error is a UNIQUE constraint violation
    pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
        err.as_database_error()
            .map(|e| e.is_unique_violation())
            .unwrap_or(false)
    }

    /// Whether the underlying driver error is a FOREIGN KEY constraint violation
    pub(crate) fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
        err.as_database_error()
            .map(|e| e.is_foreign_key_violation())
            .unwrap_or(false)
    }
}
