//! User validation utilities

use thiserror::Error;
use validator::ValidateEmail;

/// Errors that can occur during user validation
#[derive(Debug, Error, Clone, PartialEq)]
pub enum UserValidationError {
    #[error("{0} cannot be empty")]
    EmptyName(&'static str),

    #[error("{0} exceeds maximum length of {1} characters")]
    NameTooLong(&'static str, usize),

    #[error("Email cannot be empty")]
    EmptyEmail,

    #[error("Email exceeds maximum length of {0} characters")]
    EmailTooLong(usize),

    #[error("Email '{0}' is not a valid address")]
    InvalidEmail(String),

    #[error("Password is too short. Minimum length is {0} characters")]
    PasswordTooShort(usize),

    #[error("Password exceeds maximum length of {0} characters")]
    PasswordTooLong(usize),
}

const MAX_NAME_LENGTH: usize = 100;
const MAX_EMAIL_LENGTH: usize = 254;
const MIN_PASSWORD_LENGTH: usize = 8;
const MAX_PASSWORD_LENGTH: usize = 128;

/// Validate a first or last name
///
/// `field` is the human readable field name used in the error message.
pub fn validate_name(field: &'static str, value: &str) -> Result<(), UserValidationError> {
    let trimmed = value.trim();

    if trimmed.is_empty() {
        return Err(UserValidationError::EmptyName(field));
    }

    if trimmed.chars().count() > MAX_NAME_LENGTH {
        return Err(UserValidationError::NameTooLong(field, MAX_NAME_LENGTH));
    }

    Ok(())
}

/// Validate an email address (expects the normalized form)
pub fn validate_email(email: &str) -> Result<(), UserValidationError> {
    if email.is_empty() {
        return Err(UserValidationError::EmptyEmail);
    }

    if email.len() > MAX_EMAIL_LENGTH {
        return Err(UserValidationError::EmailTooLong(MAX_EMAIL_LENGTH));
    }

    if !email.validate_email() {
        return Err(UserValidationError::InvalidEmail(email.to_string()));
    }

    Ok(())
}

/// Validate a password
///
/// Rules:
/// - Minimum 8 characters
/// - Maximum 128 characters
pub fn validate_password(password: &str) -> Result<(), UserValidationError> {
    let length = password.chars().count();

    if length < MIN_PASSWORD_LENGTH {
        return Err(UserValidationError::PasswordTooShort(MIN_PASSWORD_LENGTH));
    }

    if length > MAX_PASSWORD_LENGTH {
        return Err(UserValidationError::PasswordTooLong(MAX_PASSWORD_LENGTH));
    }

    Ok(())
}

/// Canonical form used for every email lookup and write
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_names() {
        assert!(validate_name("First name", "Ada").is_ok());
        assert!(validate_name("Last name", "de la Cruz").is_ok());
    }

    #[test]
    fn test_empty_name() {
        assert_eq!(
            validate_name("First name", "   "),
            Err(UserValidationError::EmptyName("First name"))
        );
    }

    #[test]
    fn test_name_too_long() {
        let long_name = "a".repeat(101);
        assert_eq!(
            validate_name("Last name", &long_name),
            Err(UserValidationError::NameTooLong("Last name", 100))
        );
    }

    #[test]
    fn test_valid_emails() {
        assert!(validate_email("ada@example.com").is_ok());
        assert!(validate_email("first.last+tag@sub.example.org").is_ok());
    }

    #[test]
    fn test_invalid_emails() {
        assert_eq!(validate_email(""), Err(UserValidationError::EmptyEmail));
        assert!(matches!(
            validate_email("not-an-email"),
            Err(UserValidationError::InvalidEmail(_))
        ));
        assert!(matches!(
            validate_email("@example.com"),
            Err(UserValidationError::InvalidEmail(_))
        ));
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Ada@Example.COM "), "ada@example.com");
    }

    #[test]
    fn test_password_bounds() {
        assert!(validate_password("12345678").is_ok());
        assert_eq!(
            validate_password("1234567"),
            Err(UserValidationError::PasswordTooShort(8))
        );
        assert_eq!(
            validate_password(&"a".repeat(129)),
            Err(UserValidationError::PasswordTooLong(128))
        );
    }

    #[test]
    fn test_password_bounds_count_characters() {
        // 7 characters, 21 bytes
        assert_eq!(
            validate_password(&"密".repeat(7)),
            Err(UserValidationError::PasswordTooShort(8))
        );
        assert!(validate_password(&"密".repeat(8)).is_ok());
        assert!(validate_password(&"é".repeat(128)).is_ok());
        assert_eq!(
            validate_password(&"é".repeat(129)),
            Err(UserValidationError::PasswordTooLong(128))
        );
    }
}
