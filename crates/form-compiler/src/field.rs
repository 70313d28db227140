//! Compilation of a single template row
//!
//! A row yields its main field and, depending on its flags, a comment
//! sub-field and a photo sub-field. A row that requires a photo becomes a
//! fieldset: main field opens it, the photo field closes it.

use form_types::{CompiledField, DefaultValue, FieldKind, RawField, SelectOption};
use tracing::warn;

use crate::error::FieldCompileError;
use crate::mapper::map_type;

/// Appended to the parent's name to name its photo sub-field
pub const PHOTO_SUFFIX: &str = "_photo";

const SELECT_PLACEHOLDER: &str = "Select an option...";
const COMMENT_PLACEHOLDER: &str = "Enter additional comments...";
const DATETIME_HELP: &str = "Select date and time";

/// Compile the main field of a row, dropping it if it cannot be rendered
pub fn compile_field(raw: &RawField) -> Option<CompiledField> {
    match compile_field_checked(raw) {
        Ok(field) => Some(field),
        Err(e) => {
            warn!(field = %raw.field_name, "{}", e);
            None
        }
    }
}

/// Compile the main field of a row, reporting why it was dropped
pub fn compile_field_checked(raw: &RawField) -> Result<CompiledField, FieldCompileError> {
    let kind = map_type(&raw.field_type);
    let mut field = CompiledField::new(&raw.field_name, kind, &raw.title, &raw.category);
    field.required = raw.input_req;
    field.help_text = non_empty(raw.help_text.as_deref());
    field.default_value = parse_default_value(raw.default_value.as_deref(), kind);

    if kind.takes_typed_input() {
        field.placeholder = Some(format!("Enter {}...", raw.title.to_lowercase()));
    }

    match kind {
        FieldKind::SingleSelect => {
            field.options = Some(parse_options(raw)?);
            field.placeholder = Some(SELECT_PLACEHOLDER.to_string());
        }
        FieldKind::DateTime => {
            if field.help_text.is_none() {
                field.help_text = Some(DATETIME_HELP.to_string());
            }
        }
        _ => {}
    }

    if raw.requires_photo {
        field.fieldset_start = true;
        field.fieldset_title = Some(raw.title.clone());
    }

    Ok(field)
}

/// Comment sub-field, if the row declares one with a usable name.
///
/// `in_fieldset` marks it as a member of the row's open fieldset.
pub fn comment_field(raw: &RawField, in_fieldset: bool) -> Option<CompiledField> {
    if !raw.comment_field {
        return None;
    }
    let name = non_empty(raw.comment_field_name.as_deref())?;

    let mut field = CompiledField::new(
        name,
        FieldKind::LongText,
        format!("{} - Comments", raw.title),
        &raw.category,
    );
    field.placeholder = Some(COMMENT_PLACEHOLDER.to_string());
    field.fieldset_member = in_fieldset;
    field.parent_field = Some(raw.field_name.clone());
    Some(field)
}

/// Photo sub-field closing the row's fieldset
pub fn photo_field(raw: &RawField) -> Option<CompiledField> {
    if !raw.requires_photo {
        return None;
    }

    let mut field = CompiledField::new(
        format!("{}{}", raw.field_name, PHOTO_SUFFIX),
        FieldKind::Photo,
        format!("{} - Photo", raw.title),
        &raw.category,
    );
    field.required = raw.input_req;
    field.fieldset_member = true;
    field.fieldset_end = true;
    field.parent_field = Some(raw.field_name.clone());
    Some(field)
}

/// Type-directed default parsing; never fails.
///
/// Integer defaults that do not parse to a finite number yield no default.
/// Checkbox defaults are true only for `"true"` and `"1"`.
pub fn parse_default_value(raw: Option<&str>, kind: FieldKind) -> Option<DefaultValue> {
    let raw = raw?;
    match kind {
        FieldKind::Integer => {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                return None;
            }
            trimmed
                .parse::<f64>()
                .ok()
                .filter(|n| n.is_finite())
                .map(DefaultValue::Number)
        }
        FieldKind::Boolean => Some(DefaultValue::Bool(raw == "true" || raw == "1")),
        _ => Some(DefaultValue::Text(raw.to_string())),
    }
}

/// Parse `dropVals` (`{"value": "Label", ...}`) into options, in document order
fn parse_options(raw: &RawField) -> Result<Vec<SelectOption>, FieldCompileError> {
    let payload = raw
        .drop_vals
        .as_deref()
        .filter(|p| !p.trim().is_empty())
        .ok_or_else(|| FieldCompileError::MissingOptions(raw.field_name.clone()))?;

    let parsed: serde_json::Value =
        serde_json::from_str(payload).map_err(|e| FieldCompileError::MalformedOptions {
            field: raw.field_name.clone(),
            reason: e.to_string(),
        })?;

    match parsed {
        serde_json::Value::Object(map) => Ok(map
            .into_iter()
            .map(|(value, label)| SelectOption {
                label: label_text(label),
                value,
            })
            .collect()),
        serde_json::Value::Array(items) => Ok(items
            .into_iter()
            .enumerate()
            .map(|(i, label)| SelectOption {
                label: label_text(label),
                value: i.to_string(),
            })
            .collect()),
        other => Err(FieldCompileError::MalformedOptions {
            field: raw.field_name.clone(),
            reason: format!("expected an object of value/label pairs, got {}", other),
        }),
    }
}

fn label_text(label: serde_json::Value) -> String {
    match label {
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|s| !s.is_empty()).map(str::to_string)
}
