//! Domain errors raised by the lifecycle rules
//!
//! These carry user-facing messages. The backend maps each variant onto an
//! HTTP status; nothing here knows about transport or storage.

use thiserror::Error;

/// A rule violation detected before anything is written
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LifecycleError {
    /// Missing or malformed input, wrong source status, missing prerequisite
    #[error("{field}: {message}")]
    Validation { field: String, message: String },

    /// The request is well-formed but collides with existing state
    #[error("{message}")]
    Conflict { resource: String, message: String },

    /// The transition table does not allow the requested status change
    #[error("Invalid status transition: {0}")]
    InvalidTransition(String),

    /// The caller's role may not perform the action
    #[error("Forbidden: {0}")]
    Forbidden(String),
}

impl LifecycleError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        LifecycleError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn conflict(resource: impl Into<String>, message: impl Into<String>) -> Self {
        LifecycleError::Conflict {
            resource: resource.into(),
            message: message.into(),
        }
    }

    /// Collapse `validator` derive output into a single error.
    ///
    /// Field names are sorted so the reported field is stable across runs.
    pub fn from_validation_errors(errors: &validator::ValidationErrors) -> Self {
        let field_errors = errors.field_errors();
        let mut fields: Vec<_> = field_errors.keys().copied().collect();
        fields.sort_unstable();

        match fields.first() {
            Some(field) => {
                let message = field_errors
                    .get(field)
                    .and_then(|errs| errs.first())
                    .map(|err| match &err.message {
                        Some(message) => message.to_string(),
                        None => format!("invalid value ({})", err.code),
                    })
                    .unwrap_or_else(|| "invalid value".to_string());
                LifecycleError::validation(*field, message)
            }
            None => LifecycleError::validation("body", "invalid input"),
        }
    }
}

pub type LifecycleResult<T> = Result<T, LifecycleError>;
