//! Render-ready field descriptors

use serde::{Deserialize, Serialize, Serializer};

/// The closed set of renderable field kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldKind {
    #[serde(rename = "text")]
    ShortText,
    #[serde(rename = "textarea")]
    LongText,
    #[serde(rename = "number")]
    Integer,
    #[serde(rename = "select")]
    SingleSelect,
    #[serde(rename = "datetime")]
    DateTime,
    #[serde(rename = "photo")]
    Photo,
    #[serde(rename = "file")]
    GenericFile,
    #[serde(rename = "checkbox")]
    Boolean,
}

impl FieldKind {
    /// Photo and generic file fields carry attachments instead of scalars
    pub fn is_attachment(&self) -> bool {
        matches!(self, FieldKind::Photo | FieldKind::GenericFile)
    }

    /// Whether the renderer should span the full row
    pub fn is_full_width(&self) -> bool {
        matches!(
            self,
            FieldKind::LongText | FieldKind::Photo | FieldKind::GenericFile
        )
    }

    /// Kinds that get an "Enter ..." placeholder derived from the title
    pub fn takes_typed_input(&self) -> bool {
        matches!(
            self,
            FieldKind::ShortText | FieldKind::LongText | FieldKind::Integer
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::ShortText => "text",
            FieldKind::LongText => "textarea",
            FieldKind::Integer => "number",
            FieldKind::SingleSelect => "select",
            FieldKind::DateTime => "datetime",
            FieldKind::Photo => "photo",
            FieldKind::GenericFile => "file",
            FieldKind::Boolean => "checkbox",
        }
    }
}

impl std::fmt::Display for FieldKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed default, matching the field kind
///
/// Serializes untagged; whole numbers are written as JSON integers.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum DefaultValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl Serialize for DefaultValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            DefaultValue::Bool(b) => serializer.serialize_bool(*b),
            DefaultValue::Number(n) => match integral(*n) {
                Some(i) => serializer.serialize_i64(i),
                None => serializer.serialize_f64(*n),
            },
            DefaultValue::Text(s) => serializer.serialize_str(s),
        }
    }
}

/// The `i64` equal to `n`, if `n` is a whole number in range
pub fn integral(n: f64) -> Option<i64> {
    if n.fract() == 0.0 && n >= i64::MIN as f64 && n < i64::MAX as f64 {
        Some(n as i64)
    } else {
        None
    }
}

/// One entry of a select field's option list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
    pub label: String,
    pub value: String,
}

/// A normalized, render-ready field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompiledField {
    /// Form-state key
    pub name: String,
    #[serde(rename = "type")]
    pub kind: FieldKind,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help_text: Option<String>,
    pub required: bool,
    pub group: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<DefaultValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<SelectOption>>,
    #[serde(default)]
    pub full_width: bool,
    #[serde(default)]
    pub fieldset_start: bool,
    #[serde(default)]
    pub fieldset_member: bool,
    #[serde(default)]
    pub fieldset_end: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fieldset_title: Option<String>,
    /// Main field a generated comment/photo sub-field belongs to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_field: Option<String>,
}

impl CompiledField {
    /// A bare field of the given kind; layout and fieldset markers unset
    pub fn new(
        name: impl Into<String>,
        kind: FieldKind,
        label: impl Into<String>,
        group: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            label: label.into(),
            placeholder: None,
            help_text: None,
            required: false,
            group: group.into(),
            default_value: None,
            options: None,
            full_width: kind.is_full_width(),
            fieldset_start: false,
            fieldset_member: false,
            fieldset_end: false,
            fieldset_title: None,
            parent_field: None,
        }
    }

    /// Photo field that accepts several images at once (not inside a fieldset)
    pub fn accepts_multiple(&self) -> bool {
        self.kind == FieldKind::Photo && !self.fieldset_member
    }
}

/// A compiled form ready for rendering
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompiledForm {
    pub id: String,
    pub title: String,
    pub fields: Vec<CompiledField>,
}

impl CompiledForm {
    /// Placeholder shown in place of a template that failed to compile
    pub fn error_placeholder(id: impl Into<String>, form_name: &str) -> Self {
        Self {
            id: id.into(),
            title: format!("Error: {}", form_name),
            fields: Vec::new(),
        }
    }

    pub fn field(&self, name: &str) -> Option<&CompiledField> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn attachment_fields(&self) -> impl Iterator<Item = &CompiledField> {
        self.fields.iter().filter(|f| f.kind.is_attachment())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_serializes_as_render_tag() {
        let json = serde_json::to_string(&FieldKind::Integer).unwrap();
        assert_eq!(json, "\"number\"");
        let kind: FieldKind = serde_json::from_str("\"checkbox\"").unwrap();
        assert_eq!(kind, FieldKind::Boolean);
    }

    #[test]
    fn test_default_value_is_untagged() {
        let json = serde_json::to_string(&DefaultValue::Number(12.5)).unwrap();
        assert_eq!(json, "12.5");
        let json = serde_json::to_string(&DefaultValue::Bool(true)).unwrap();
        assert_eq!(json, "true");
        let json = serde_json::to_string(&DefaultValue::Text("North".into())).unwrap();
        assert_eq!(json, "\"North\"");
    }

    #[test]
    fn test_whole_number_default_written_as_integer() {
        assert_eq!(serde_json::to_string(&DefaultValue::Number(12.0)).unwrap(), "12");
        assert_eq!(serde_json::to_string(&DefaultValue::Number(-3.0)).unwrap(), "-3");

        let mut field = CompiledField::new("crew", FieldKind::Integer, "Crew", "g");
        field.default_value = Some(DefaultValue::Number(4.0));
        let json = serde_json::to_value(&field).unwrap();
        assert_eq!(json["defaultValue"], serde_json::json!(4));

        let back: CompiledField = serde_json::from_value(json).unwrap();
        assert_eq!(back.default_value, Some(DefaultValue::Number(4.0)));
    }

    #[test]
    fn test_integral_range() {
        assert_eq!(integral(4.0), Some(4));
        assert_eq!(integral(4.5), None);
        assert_eq!(integral(f64::NAN), None);
        assert_eq!(integral(f64::INFINITY), None);
        assert_eq!(integral(1e19), None);
    }

    #[test]
    fn test_new_field_width_follows_kind() {
        assert!(CompiledField::new("a", FieldKind::LongText, "A", "g").full_width);
        assert!(CompiledField::new("a", FieldKind::Photo, "A", "g").full_width);
        assert!(!CompiledField::new("a", FieldKind::Integer, "A", "g").full_width);
    }

    #[test]
    fn test_multiple_only_for_top_level_photo() {
        let mut photo = CompiledField::new("p", FieldKind::Photo, "P", "g");
        assert!(photo.accepts_multiple());
        photo.fieldset_member = true;
        assert!(!photo.accepts_multiple());
        let file = CompiledField::new("f", FieldKind::GenericFile, "F", "g");
        assert!(!file.accepts_multiple());
    }

    #[test]
    fn test_error_placeholder_title() {
        let form = CompiledForm::error_placeholder("F-1", "Site Inspection");
        assert_eq!(form.title, "Error: Site Inspection");
        assert!(form.fields.is_empty());
    }
}
