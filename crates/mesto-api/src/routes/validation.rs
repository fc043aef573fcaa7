//! Input validation for request bodies

use url::Url;

use crate::error::ApiError;

/// Minimum length of names, "about" lines and card titles
const MIN_TEXT_LENGTH: usize = 2;
/// Maximum length of names, "about" lines and card titles
const MAX_TEXT_LENGTH: usize = 30;
/// Maximum allowed email length
const MAX_EMAIL_LENGTH: usize = 254;
/// Minimum allowed password length at signup
const MIN_PASSWORD_LENGTH: usize = 8;
/// Maximum allowed password length (prevent DoS with very large passwords)
const MAX_PASSWORD_LENGTH: usize = 256;

/// Validate a short display text (name, about, card title)
pub fn validate_text(field: &str, value: &str) -> Result<(), ApiError> {
    // Counted on the value as stored
    let length = value.chars().count();
    if !(MIN_TEXT_LENGTH..=MAX_TEXT_LENGTH).contains(&length) || value.trim().is_empty() {
        return Err(ApiError::BadRequest(format!(
            "{} must be between {} and {} characters",
            field, MIN_TEXT_LENGTH, MAX_TEXT_LENGTH
        )));
    }
    Ok(())
}

/// Validate an email address shape
pub fn validate_email(email: &str) -> Result<(), ApiError> {
    let invalid = || ApiError::BadRequest("Invalid email".to_string());

    if email.is_empty() || email.len() > MAX_EMAIL_LENGTH {
        return Err(invalid());
    }
    if email.chars().any(char::is_whitespace) {
        return Err(invalid());
    }

    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.contains('@') {
        return Err(invalid());
    }
    if !domain.contains('.') || domain.starts_with('.') || domain.ends_with('.') {
        return Err(invalid());
    }
    Ok(())
}

/// Validate a password at account creation
pub fn validate_new_password(password: &str) -> Result<(), ApiError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(ApiError::BadRequest(format!(
            "Password must be at least {} characters long",
            MIN_PASSWORD_LENGTH
        )));
    }
    validate_password_length(password)
}

/// Validate a submitted password's length only
pub fn validate_password_length(password: &str) -> Result<(), ApiError> {
    if password.is_empty() {
        return Err(ApiError::BadRequest("Password is required".to_string()));
    }
    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(ApiError::BadRequest(format!(
            "Password exceeds maximum length of {} characters",
            MAX_PASSWORD_LENGTH
        )));
    }
    Ok(())
}

/// Validate an http(s) URL (avatars, card images)
pub fn validate_url(field: &str, value: &str) -> Result<(), ApiError> {
    let invalid = || ApiError::BadRequest(format!("{} must be a valid http(s) URL", field));

    let url = Url::parse(value).map_err(|_| invalid())?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(invalid());
    }
    Ok(())
}
