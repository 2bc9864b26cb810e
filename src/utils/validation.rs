use crate::error::{AppError, AppResult};
use regex::Regex;
use std::sync::OnceLock;

fn email_regex() -> &'static Regex {
    static EMAIL_RE: OnceLock<Regex> = OnceLock::new();
    EMAIL_RE.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)+$")
            .expect("email regex is valid")
    })
}

/// Validate an email address and return the form used as the lookup key
/// (trimmed, lower-cased).
pub fn normalize_email(email: &str) -> AppResult<String> {
    let email = email.trim().to_lowercase();
    if email.len() > 254 || !email_regex().is_match(&email) {
        return Err(AppError::ValidationError(
            "email must be a valid email address".to_string(),
        ));
    }
    Ok(email)
}

/// Trimmed, non-empty text or a validation error naming the field.
pub fn require_non_empty(field: &str, value: &str) -> AppResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::ValidationError(format!("{field} must not be empty")));
    }
    Ok(value.to_string())
}

pub fn validate_image_url(field: &str, value: &str) -> AppResult<()> {
    let value = value.trim();
    let rest = value
        .strip_prefix("https://")
        .or_else(|| value.strip_prefix("http://"));
    match rest {
        Some(host) if !host.is_empty() && !host.contains(char::is_whitespace) => Ok(()),
        _ => Err(AppError::ValidationError(format!(
            "{field} must be an http(s) URL"
        ))),
    }
}

/// Parse the path form of a user id.
pub fn parse_user_id(raw: &str) -> AppResult<String> {
    uuid::Uuid::parse_str(raw)
        .map(|id| id.to_string())
        .map_err(|_| AppError::ValidationError("Invalid UUID format".to_string()))
}
