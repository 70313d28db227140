use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A human-readable message attached to one field name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// File content could not be read
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Error reading file '{name}': {reason}")]
pub struct FileReadError {
    pub name: String,
    pub reason: String,
}

impl FileReadError {
    pub fn new(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            reason: reason.into(),
        }
    }
}
