//! Validation of user-supplied text before it is sent to the server.
//!
//! Every check runs on the trimmed input, which is also what gets sent.

use crate::core::error::{AppError, Result};

pub struct ValidationResult {
    pub is_valid: bool,
    pub error: Option<String>,
}

impl ValidationResult {
    pub fn ok() -> Self {
        Self {
            is_valid: true,
            error: None,
        }
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            error: Some(message.into()),
        }
    }

    /// Convert into `AppError::Validation` for `?` propagation.
    pub fn into_result(self) -> Result<()> {
        match self.error {
            Some(message) if !self.is_valid => Err(AppError::Validation(message)),
            _ => Ok(()),
        }
    }
}

/// Validate email format
pub fn validate_email(email: &str) -> ValidationResult {
    let email = email.trim();
    if email.is_empty() {
        return ValidationResult::err("Email is required");
    }

    let Some((local, domain)) = email.split_once('@') else {
        return ValidationResult::err("Invalid email format");
    };

    if domain.contains('@') {
        return ValidationResult::err("Invalid email format");
    }

    if local.is_empty() {
        return ValidationResult::err("Email username cannot be empty");
    }

    if domain.is_empty() || !domain.contains('.') {
        return ValidationResult::err("Invalid email domain");
    }

    ValidationResult::ok()
}

/// Validate the emailed reset code
pub fn validate_reset_code(code: &str) -> ValidationResult {
    if code.trim().is_empty() {
        return ValidationResult::err("Reset code is required");
    }
    ValidationResult::ok()
}

/// Validate a new password
pub fn validate_new_password(password: &str) -> ValidationResult {
    if password.is_empty() {
        return ValidationResult::err("Password is required");
    }
    ValidationResult::ok()
}

/// Validate comment text
pub fn validate_comment(content: &str) -> ValidationResult {
    if content.trim().is_empty() {
        return ValidationResult::err("Comment cannot be empty");
    }
    ValidationResult::ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_validation() {
        assert!(validate_email("test@example.com").is_valid);
        assert!(validate_email("  owner@tiertreff.de ").is_valid);
        assert!(!validate_email("").is_valid);
        assert!(!validate_email("invalid").is_valid);
        assert!(!validate_email("@example.com").is_valid);
        assert!(!validate_email("test@").is_valid);
        assert!(!validate_email("a@b@c.de").is_valid);
    }

    #[test]
    fn test_reset_inputs() {
        assert!(validate_reset_code(" 123456 ").is_valid);
        assert!(!validate_reset_code("   ").is_valid);
        assert!(validate_new_password("hunter22").is_valid);
        assert!(!validate_new_password("").is_valid);
    }

    #[test]
    fn test_into_result() {
        assert!(validate_comment("nice dog").into_result().is_ok());
        assert!(matches!(
            validate_comment(" \n ").into_result(),
            Err(AppError::Validation(msg)) if msg == "Comment cannot be empty"
        ));
    }
}
