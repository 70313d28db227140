//! Raw template records
//!
//! These mirror the column layout of the field export, so the serde names
//! follow the export (camelCase, `IDX`, `fieldid`, and the historical
//! `defautVal` spelling). Flags arrive as `0`/`1` integers from most
//! exports but booleans and `"1"`/`"true"` strings are accepted too.

use serde::{Deserialize, Serialize};

/// One row of a form template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawField {
    #[serde(rename = "IDX", default, skip_serializing_if = "Option::is_none")]
    pub idx: Option<i64>,
    #[serde(rename = "formid", default, skip_serializing_if = "Option::is_none")]
    pub form_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub form_name: Option<String>,
    #[serde(rename = "fieldid", default)]
    pub field_id: String,
    #[serde(default)]
    pub category_order: i64,
    #[serde(default)]
    pub field_order: i64,
    #[serde(default)]
    pub category: String,
    pub title: String,
    pub field_name: String,
    pub field_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_type: Option<String>,
    /// JSON-encoded `{value: label}` map, select fields only
    #[serde(default)]
    pub drop_vals: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill_method: Option<String>,
    #[serde(default, with = "flag")]
    pub comment_field: bool,
    #[serde(default)]
    pub comment_field_name: Option<String>,
    #[serde(default)]
    pub help_text: Option<String>,
    #[serde(default, with = "flag")]
    pub requires_photo: bool,
    #[serde(default, with = "flag")]
    pub visible: bool,
    #[serde(default, with = "flag")]
    pub input_req: bool,
    #[serde(rename = "defautVal", alias = "defaultVal", default)]
    pub default_value: Option<String>,
}

impl RawField {
    /// Create a visible, optional field with no sub-fields
    pub fn new(
        field_name: impl Into<String>,
        title: impl Into<String>,
        field_type: impl Into<String>,
    ) -> Self {
        let field_name = field_name.into();
        Self {
            idx: None,
            form_id: None,
            form_name: None,
            field_id: field_name.clone(),
            category_order: 0,
            field_order: 0,
            category: String::new(),
            title: title.into(),
            field_name,
            field_type: field_type.into(),
            data_type: None,
            drop_vals: None,
            fill_method: None,
            comment_field: false,
            comment_field_name: None,
            help_text: None,
            requires_photo: false,
            visible: true,
            input_req: false,
            default_value: None,
        }
    }

    /// Set the category and both ordering keys
    pub fn in_category(mut self, category: impl Into<String>, category_order: i64, field_order: i64) -> Self {
        self.category = category.into();
        self.category_order = category_order;
        self.field_order = field_order;
        self
    }

    pub fn required(mut self) -> Self {
        self.input_req = true;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    pub fn with_options(mut self, drop_vals: impl Into<String>) -> Self {
        self.drop_vals = Some(drop_vals.into());
        self
    }

    pub fn with_default(mut self, value: impl Into<String>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help_text = Some(help.into());
        self
    }

    /// Attach a free-text comment sub-field
    pub fn with_comment(mut self, comment_field_name: impl Into<String>) -> Self {
        self.comment_field = true;
        self.comment_field_name = Some(comment_field_name.into());
        self
    }

    /// Attach a photo sub-field, turning the field into a fieldset
    pub fn with_photo(mut self) -> Self {
        self.requires_photo = true;
        self
    }
}

/// A complete form template: name, id and its denormalized field rows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTemplate {
    pub form_name: String,
    pub form_id: String,
    #[serde(default)]
    pub fields: Vec<RawField>,
}

impl RawTemplate {
    pub fn new(form_id: impl Into<String>, form_name: impl Into<String>, fields: Vec<RawField>) -> Self {
        Self {
            form_name: form_name.into(),
            form_id: form_id.into(),
            fields,
        }
    }
}

/// 0/1 flag columns
mod flag {
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Bool(bool),
        Int(i64),
        Float(f64),
        Text(String),
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<bool, D::Error>
    where
        D: Deserializer<'de>,
    {
        let repr = Option::<Repr>::deserialize(deserializer)?;
        Ok(match repr {
            Some(Repr::Bool(b)) => b,
            Some(Repr::Int(n)) => n == 1,
            Some(Repr::Float(f)) => f == 1.0,
            Some(Repr::Text(s)) => matches!(s.trim(), "1" | "true"),
            None => false,
        })
    }

    pub fn serialize<S>(value: &bool, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u8(u8::from(*value))
    }
}
