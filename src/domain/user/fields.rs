//! Submitted create/edit form fields

use std::collections::BTreeSet;

use validator::{Validate, ValidateEmail, ValidationError};

use crate::domain::ValidationFailure;

pub const NAME_MAX_LENGTH: usize = 255;
pub const EMAIL_MAX_LENGTH: usize = 255;
pub const PASSWORD_MAX_LENGTH: usize = 255;

pub const EMAIL_TAKEN_MESSAGE: &str = "The email has already been taken.";
pub const INVALID_ROLE_MESSAGE: &str = "The selected role is invalid.";

/// Shape of the create/edit form. `password: None` means "leave unchanged"
/// on edit and "no credential" on create.
#[derive(Debug, Clone, Default, Validate)]
pub struct UserFields {
    #[validate(custom(function = "validate_name"))]
    pub name: String,
    #[validate(custom(function = "validate_email_field"))]
    pub email: String,
    #[validate(length(
        max = 255,
        message = "The password field must not be greater than 255 characters."
    ))]
    pub password: Option<String>,
    pub is_active: Option<bool>,
    pub roles: BTreeSet<String>,
}

impl UserFields {
    /// Trims text input, lower-cases the email and drops a blank password.
    pub fn normalized(mut self) -> Self {
        self.name = self.name.trim().to_string();
        self.email = self.email.trim().to_lowercase();
        self.password = self.password.filter(|p| !p.trim().is_empty());
        self.roles = self
            .roles
            .into_iter()
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty())
            .collect();
        self
    }

    /// Runs the field rules, collecting every failure.
    pub fn check(&self) -> Result<(), ValidationFailure> {
        self.validate().map_err(ValidationFailure::from)
    }
}

fn error(code: &'static str, message: &'static str) -> ValidationError {
    let mut e = ValidationError::new(code);
    e.message = Some(message.into());
    e
}

fn validate_name(name: &str) -> Result<(), ValidationError> {
    if name.is_empty() {
        return Err(error("required", "The name field is required."));
    }
    if name.chars().count() > NAME_MAX_LENGTH {
        return Err(error(
            "max_length",
            "The name field must not be greater than 255 characters.",
        ));
    }
    Ok(())
}

fn validate_email_field(email: &str) -> Result<(), ValidationError> {
    if email.is_empty() {
        return Err(error("required", "The email field is required."));
    }
    if email.chars().count() > EMAIL_MAX_LENGTH {
        return Err(error(
            "max_length",
            "The email field must not be greater than 255 characters.",
        ));
    }
    if !email.validate_email() {
        return Err(error(
            "email",
            "The email field must be a valid email address.",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(name: &str, email: &str) -> UserFields {
        UserFields {
            name: name.into(),
            email: email.into(),
            ..Default::default()
        }
    }

    #[test]
    fn normalizes_before_validation() {
        let f = UserFields {
            password: Some("   ".into()),
            roles: [" editor ", ""].iter().map(|s| s.to_string()).collect(),
            ..fields("  Ann Lee ", " Ann@Example.COM ")
        }
        .normalized();

        assert_eq!(f.name, "Ann Lee");
        assert_eq!(f.email, "ann@example.com");
        assert_eq!(f.password, None);
        assert_eq!(f.roles.len(), 1);
        assert!(f.roles.contains("editor"));
        assert!(f.check().is_ok());
    }

    #[test]
    fn reports_required_fields() {
        let failure = fields("", "").check().unwrap_err();
        assert!(failure.has("name", "required"));
        assert!(failure.has("email", "required"));
        assert_eq!(failure.errors.len(), 2);
    }

    #[test]
    fn rejects_long_name_and_bad_email() {
        let failure = fields(&"x".repeat(256), "not-an-email").check().unwrap_err();
        assert!(failure.has("name", "max_length"));
        assert!(failure.has("email", "email"));

        assert!(fields(&"x".repeat(255), "a@b.io").check().is_ok());
    }

    #[test]
    fn rejects_long_password() {
        let f = UserFields {
            password: Some("p".repeat(256)),
            ..fields("Ann", "ann@example.com")
        };
        assert!(f.check().unwrap_err().has("password", "length"));
    }
}
