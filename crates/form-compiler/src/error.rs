use form_types::FieldError;
use thiserror::Error;

/// A single field could not be compiled; the field is dropped from the form
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FieldCompileError {
    #[error("Error parsing dropdown values for '{field}': {reason}")]
    MalformedOptions { field: String, reason: String },

    #[error("Select field '{0}' has no dropdown values")]
    MissingOptions(String),
}

impl FieldCompileError {
    pub fn field(&self) -> &str {
        match self {
            FieldCompileError::MalformedOptions { field, .. } => field,
            FieldCompileError::MissingOptions(field) => field,
        }
    }

    /// Diagnostic for the field-level error channel
    pub fn to_field_error(&self) -> FieldError {
        FieldError::new(self.field(), self.to_string())
    }
}

/// A whole template is structurally unusable
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateCompilationError {
    #[error("Template '{template}': field '{field_id}' has an empty field name")]
    EmptyFieldName { template: String, field_id: String },

    #[error("Template '{template}': field name '{name}' is used more than once")]
    DuplicateFieldName { template: String, name: String },

    #[error("Template '{template}': {reason}")]
    UnbalancedFieldset { template: String, reason: String },
}
