use validator::ValidateEmail;

use crate::app_error::{AppError, AppResult};

/// Validates that the input looks like a valid email address
pub fn is_valid_email(email: &str) -> bool {
    let email = email.trim();
    !email.is_empty() && email.validate_email()
}

/// Canonical form of a waitlist address: trimmed and lower-cased.
pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Normalizes a submitted address and rejects empty or malformed input.
pub fn parse_waitlist_email(raw: Option<&str>) -> AppResult<String> {
    let Some(raw) = raw else {
        return Err(AppError::InvalidInput("Email is required".into()));
    };

    let email = normalize_email(raw);
    if email.is_empty() {
        return Err(AppError::InvalidInput("Email is required".into()));
    }
    if !is_valid_email(&email) {
        return Err(AppError::InvalidInput("Invalid email address".into()));
    }

    Ok(email)
}

/// Local part of an address, used as a stand-in first name in templates.
pub fn first_name_hint(email: &str) -> &str {
    email.split('@').next().unwrap_or(email)
}
