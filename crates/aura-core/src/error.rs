use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuraError {
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Authentication failed for user '{0}'")]
    AuthenticationFailed(String),

    #[error("Permission denied: {action} requires {required}, current role is {role}")]
    PermissionDenied {
        action: String,
        required: String,
        role: String,
    },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Missing credential: {0}")]
    MissingCredential(String),

    #[error("External service failure: {0}")]
    ExternalService(String),

    #[error("Persistence failure: {0}")]
    Persistence(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for AuraError {
    fn from(e: serde_json::Error) -> Self {
        AuraError::SerializationError(e.to_string())
    }
}

impl From<ValidationErrors> for AuraError {
    fn from(e: ValidationErrors) -> Self {
        AuraError::Validation(e)
    }
}

/// A single violated input rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub field: String,
    pub message: String,
}

/// Every violation found while validating one input, in discovery order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationErrors {
    pub issues: Vec<ValidationIssue>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: &str, message: impl Into<String>) {
        self.issues.push(ValidationIssue {
            field: field.to_string(),
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn len(&self) -> usize {
        self.issues.len()
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.issues.iter().any(|i| i.field == field)
    }

    /// `Ok(())` when nothing was collected, otherwise the whole list as an error.
    pub fn into_result(self) -> Result<(), AuraError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(AuraError::Validation(self))
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<&str> = self.issues.iter().map(|i| i.message.as_str()).collect();
        write!(f, "{}", messages.join("; "))
    }
}
