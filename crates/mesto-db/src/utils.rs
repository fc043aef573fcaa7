//! Shared utility functions

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Parse a datetime string (RFC3339 format) or return current time
///
/// Used throughout the database layer for timestamp columns, which are
/// stored as RFC3339 text.
pub fn parse_datetime_or_now(s: &str) -> DateTime<Utc> {
    chrono::DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

/// Parse a UUID stored as text, surfacing failures as a decode error
pub fn parse_uuid(s: &str) -> Result<Uuid, sqlx::Error> {
    Uuid::parse_str(s).map_err(|e| sqlx::Error::Decode(Box::new(e)))
}
