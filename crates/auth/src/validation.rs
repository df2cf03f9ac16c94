//! Input validation for credentials.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::AuthError;

const MAX_EMAIL_LEN: usize = 255;
const MAX_PASSWORD_LEN: usize = 1024;

static EMAIL_REGEX: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").ok());

/// Canonical form used for storage and lookup.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Validate email format
pub fn validate_email(email: &str) -> Result<(), AuthError> {
    if email.is_empty() {
        return Err(AuthError::InvalidInput("email is required".to_string()));
    }

    if email.len() > MAX_EMAIL_LEN {
        return Err(AuthError::InvalidInput("email too long".to_string()));
    }

    let regex = EMAIL_REGEX
        .as_ref()
        .ok_or_else(|| AuthError::InvalidInput("invalid email regex".to_string()))?;

    if !regex.is_match(email) {
        return Err(AuthError::InvalidInput("invalid email format".to_string()));
    }

    Ok(())
}

/// Passwords only need to be present and bounded; argon2 does the rest.
pub fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.is_empty() {
        return Err(AuthError::InvalidInput("password is required".to_string()));
    }

    if password.len() > MAX_PASSWORD_LEN {
        return Err(AuthError::InvalidInput("password too long".to_string()));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_validation() {
        assert!(validate_email("test@example.com").is_ok());
        assert!(validate_email("user.name+tag@domain.co.uk").is_ok());

        assert!(validate_email("").is_err());
        assert!(validate_email("invalid-email").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("test@").is_err());
        assert!(validate_email(&format!("{}@example.com", "a".repeat(250))).is_err());
    }

    #[test]
    fn test_password_validation() {
        assert!(validate_password("x").is_ok());
        assert!(validate_password("correct horse battery staple").is_ok());

        assert!(validate_password("").is_err());
        assert!(validate_password(&"a".repeat(1025)).is_err());
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Alice@Example.COM "), "alice@example.com");
    }
}
