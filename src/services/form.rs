//! Allow-user form validation

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Message shown when the email field is left empty
pub const EMAIL_REQUIRED: &str = "Name Field Required";

/// Inline validation failure for a single field
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: &'static str,
}

/// Values of the "Allow User" dialog
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllowUserForm {
    pub email: String,
}

impl AllowUserForm {
    pub fn new(email: impl Into<String>) -> Self {
        Self { email: email.into() }
    }

    /// Check the form; only presence of the email is required
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.email.trim().is_empty() {
            return Err(ValidationError {
                field: "email",
                message: EMAIL_REQUIRED,
            });
        }
        Ok(())
    }

    /// Validated, trimmed email ready to submit
    pub fn submit_email(&self) -> Result<&str, ValidationError> {
        self.validate()?;
        Ok(self.email.trim())
    }
}
