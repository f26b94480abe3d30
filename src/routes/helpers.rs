//! Shared validation helpers for route handlers.

use std::sync::OnceLock;

use regex::Regex;

use crate::error::ApiError;

/// `local@domain.tld` shape; anything stricter belongs to the mail system.
fn email_regex() -> &'static Regex {
    static EMAIL_RE: OnceLock<Regex> = OnceLock::new();
    EMAIL_RE.get_or_init(|| {
        Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email regex compiles")
    })
}

/// Normalize an email for storage and lookup: trimmed and lower-cased.
pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub(crate) fn validate_email(email: &str) -> Result<(), ApiError> {
    if email.is_empty() {
        return Err(ApiError::Validation("email is required".to_string()));
    }
    if !email_regex().is_match(email) {
        return Err(ApiError::Validation(format!("'{email}' is not a valid email address")));
    }
    Ok(())
}

pub(crate) fn validate_full_name(full_name: &str) -> Result<(), ApiError> {
    if full_name.trim().is_empty() {
        return Err(ApiError::Validation("fullName is required".to_string()));
    }
    Ok(())
}

pub(crate) fn validate_password(password: &str) -> Result<(), ApiError> {
    if password.len() < 8 {
        return Err(ApiError::Validation(
            "password must be at least 8 characters".to_string(),
        ));
    }
    Ok(())
}
