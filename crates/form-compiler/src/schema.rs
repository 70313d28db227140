//! Structural validation schema
//!
//! One rule per compiled field. The schema only checks shape (presence,
//! type, date-time format); attachment constraints are enforced when files
//! are selected, not here.

use form_types::{CompiledForm, FieldError, FieldKind, FieldValue, FormValues};
use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

lazy_static! {
    /// `datetime-local` input format, ASCII digits only
    static ref DATETIME_LOCAL: Regex =
        Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}T[0-9]{2}:[0-9]{2}$").unwrap();
}

/// Message for a date-time value that doesn't match `YYYY-MM-DDTHH:mm`
pub const DATETIME_MESSAGE: &str = "must be a date and time (YYYY-MM-DDTHH:mm)";

/// Constraint applied to one field's value
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum FieldRule {
    /// Required: non-empty string. Optional: string or absent.
    Text { required: bool },
    /// Required: number >= 0. Optional: number or absent.
    Number { required: bool },
    /// Required: non-empty string. Optional: string or absent.
    Choice { required: bool },
    /// Non-empty strings must match `YYYY-MM-DDTHH:mm`.
    DateTime { required: bool },
    /// Not checked here
    Any,
}

impl FieldRule {
    pub fn for_field(kind: FieldKind, required: bool) -> Self {
        match kind {
            FieldKind::ShortText | FieldKind::LongText => FieldRule::Text { required },
            FieldKind::Integer => FieldRule::Number { required },
            FieldKind::SingleSelect => FieldRule::Choice { required },
            FieldKind::DateTime => FieldRule::DateTime { required },
            FieldKind::Photo | FieldKind::GenericFile | FieldKind::Boolean => FieldRule::Any,
        }
    }

    /// Check a value; `None` stands for a field missing from the values.
    ///
    /// Returns the failure message without the field label.
    pub fn check(&self, value: Option<&FieldValue>) -> Result<(), &'static str> {
        let absent = FieldValue::Null;
        let value = value.unwrap_or(&absent);
        match *self {
            FieldRule::Text { required } | FieldRule::Choice { required } => match value {
                FieldValue::Null if required => Err("is required"),
                FieldValue::Null => Ok(()),
                FieldValue::Text(s) if required && s.is_empty() => Err("is required"),
                FieldValue::Text(_) => Ok(()),
                _ => Err("must be text"),
            },
            FieldRule::Number { required } => match value {
                FieldValue::Null if required => Err("is required"),
                FieldValue::Null => Ok(()),
                FieldValue::Number(n) if n.is_nan() => Err("must be a number"),
                FieldValue::Number(n) if required && *n < 0.0 => Err("must be 0 or greater"),
                FieldValue::Number(_) => Ok(()),
                _ => Err("must be a number"),
            },
            FieldRule::DateTime { required } => match value {
                FieldValue::Null if required => Err("is required"),
                FieldValue::Null => Ok(()),
                FieldValue::Text(s) if s.is_empty() && required => Err("is required"),
                FieldValue::Text(s) if s.is_empty() => Ok(()),
                FieldValue::Text(s) if DATETIME_LOCAL.is_match(s) => Ok(()),
                _ => Err(DATETIME_MESSAGE),
            },
            FieldRule::Any => Ok(()),
        }
    }
}

/// Schema entry for one compiled field
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchemaEntry {
    pub name: String,
    pub label: String,
    #[serde(rename = "type")]
    pub kind: FieldKind,
    #[serde(flatten)]
    pub rule: FieldRule,
}

impl SchemaEntry {
    pub fn check(&self, value: Option<&FieldValue>) -> Result<(), FieldError> {
        self.rule
            .check(value)
            .map_err(|reason| FieldError::new(&self.name, format!("{} {}", self.label, reason)))
    }
}

/// Validation schema derived from one compiled form; immutable once built
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationSchema {
    form_id: String,
    entries: Vec<SchemaEntry>,
}

impl ValidationSchema {
    pub fn form_id(&self) -> &str {
        &self.form_id
    }

    pub fn entries(&self) -> &[SchemaEntry] {
        &self.entries
    }

    pub fn entry(&self, name: &str) -> Option<&SchemaEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    /// Check a single field; unknown names pass
    pub fn validate_field(&self, name: &str, value: Option<&FieldValue>) -> Result<(), FieldError> {
        match self.entry(name) {
            Some(entry) => entry.check(value),
            None => Ok(()),
        }
    }

    /// Check every field of the form against the given values
    pub fn validate(&self, values: &FormValues) -> ValidationReport {
        let errors = self
            .entries
            .iter()
            .filter_map(|entry| entry.check(values.get(&entry.name)).err())
            .collect();
        ValidationReport { errors }
    }
}

/// Outcome of validating a full set of values
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationReport {
    pub errors: Vec<FieldError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn error_for(&self, name: &str) -> Option<&FieldError> {
        self.errors.iter().find(|e| e.field == name)
    }
}

/// Derive a fresh schema from a compiled form
pub fn build_schema(form: &CompiledForm) -> ValidationSchema {
    ValidationSchema {
        form_id: form.id.clone(),
        entries: form
            .fields
            .iter()
            .map(|field| SchemaEntry {
                name: field.name.clone(),
                label: field.label.clone(),
                kind: field.kind,
                rule: FieldRule::for_field(field.kind, field.required),
            })
            .collect(),
    }
}
