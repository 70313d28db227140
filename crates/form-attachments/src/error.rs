use form_compiler::ValidationReport;
use form_types::{FieldError, FileReadError};
use thiserror::Error;

/// A selection was refused; the field's state is unchanged
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AttachmentError {
    #[error("{message}")]
    Validation {
        field: String,
        file: String,
        message: String,
    },

    #[error("Could not create a preview for '{file}': {reason}")]
    Preview {
        field: String,
        file: String,
        reason: String,
    },

    #[error("Field '{0}' does not take attachments")]
    UnknownField(String),
}

impl AttachmentError {
    pub fn field(&self) -> &str {
        match self {
            AttachmentError::Validation { field, .. } => field,
            AttachmentError::Preview { field, .. } => field,
            AttachmentError::UnknownField(field) => field,
        }
    }

    pub fn to_field_error(&self) -> FieldError {
        FieldError::new(self.field(), self.to_string())
    }
}

/// The preview store could not hand out a reference
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct PreviewError(pub String);

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SubmissionError {
    #[error("Form has {} invalid field(s)", .0.errors.len())]
    Invalid(ValidationReport),

    #[error(transparent)]
    Read(#[from] FileReadError),

    #[error("Submission was superseded by a form reset")]
    Superseded,

    #[error("Form is disabled")]
    Disabled,
}
