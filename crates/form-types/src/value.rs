//! Working form values
//!
//! Values live on a single-threaded UI loop, so file handles are `Rc` and the
//! async read is `?Send` (browser `File` objects are not `Send`).

use std::any::Any;
use std::fmt;
use std::rc::Rc;

use async_trait::async_trait;

use crate::compiled::{integral, CompiledForm, DefaultValue, FieldKind};
use crate::error::FileReadError;

/// A user-selected file: metadata is available synchronously, content is read on demand
#[async_trait(?Send)]
pub trait FileBlob: fmt::Debug {
    fn name(&self) -> String;

    /// Size in bytes
    fn size(&self) -> u64;

    /// MIME type as reported by the picker; may be empty
    fn mime_type(&self) -> String;

    /// Last modification time in milliseconds since the Unix epoch
    fn last_modified_ms(&self) -> i64;

    async fn read_bytes(&self) -> Result<Vec<u8>, FileReadError>;

    /// Concrete file type, for preview stores that need the platform object
    fn as_any(&self) -> &dyn Any;
}

pub type FileHandle = Rc<dyn FileBlob>;

/// Value of one form field
#[derive(Clone, Default)]
pub enum FieldValue {
    #[default]
    Null,
    Text(String),
    Number(f64),
    Bool(bool),
    File(FileHandle),
    Files(Vec<FileHandle>),
}

impl FieldValue {
    /// Null, the empty string and an empty file list count as "no value"
    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Null => true,
            FieldValue::Text(s) => s.is_empty(),
            FieldValue::Files(files) => files.is_empty(),
            _ => false,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Files held by this value, in selection order
    pub fn files(&self) -> Vec<FileHandle> {
        match self {
            FieldValue::File(file) => vec![file.clone()],
            FieldValue::Files(files) => files.clone(),
            _ => Vec::new(),
        }
    }

    /// JSON form of a scalar value; `None` for file values
    pub fn to_scalar_json(&self) -> Option<serde_json::Value> {
        match self {
            FieldValue::Null => Some(serde_json::Value::Null),
            FieldValue::Text(s) => Some(serde_json::Value::String(s.clone())),
            FieldValue::Number(n) => Some(match integral(*n) {
                Some(i) => serde_json::Value::from(i),
                None => serde_json::Number::from_f64(*n)
                    .map(serde_json::Value::Number)
                    .unwrap_or(serde_json::Value::Null),
            }),
            FieldValue::Bool(b) => Some(serde_json::Value::Bool(*b)),
            FieldValue::File(_) | FieldValue::Files(_) => None,
        }
    }

    /// Scalar value from JSON; arrays and objects are not scalars
    pub fn from_scalar_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Null => Some(FieldValue::Null),
            serde_json::Value::Bool(b) => Some(FieldValue::Bool(*b)),
            serde_json::Value::Number(n) => n.as_f64().map(FieldValue::Number),
            serde_json::Value::String(s) => Some(FieldValue::Text(s.clone())),
            serde_json::Value::Array(_) | serde_json::Value::Object(_) => None,
        }
    }
}

impl From<&DefaultValue> for FieldValue {
    fn from(value: &DefaultValue) -> Self {
        match value {
            DefaultValue::Bool(b) => FieldValue::Bool(*b),
            DefaultValue::Number(n) => FieldValue::Number(*n),
            DefaultValue::Text(s) => FieldValue::Text(s.clone()),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Number(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl fmt::Debug for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Null => f.write_str("Null"),
            FieldValue::Text(s) => f.debug_tuple("Text").field(s).finish(),
            FieldValue::Number(n) => f.debug_tuple("Number").field(n).finish(),
            FieldValue::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
            FieldValue::File(file) => f.debug_tuple("File").field(&file.name()).finish(),
            FieldValue::Files(files) => f
                .debug_tuple("Files")
                .field(&files.iter().map(|file| file.name()).collect::<Vec<_>>())
                .finish(),
        }
    }
}

impl PartialEq for FieldValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (FieldValue::Null, FieldValue::Null) => true,
            (FieldValue::Text(a), FieldValue::Text(b)) => a == b,
            (FieldValue::Number(a), FieldValue::Number(b)) => a == b,
            (FieldValue::Bool(a), FieldValue::Bool(b)) => a == b,
            (FieldValue::File(a), FieldValue::File(b)) => Rc::ptr_eq(a, b),
            (FieldValue::Files(a), FieldValue::Files(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| Rc::ptr_eq(x, y))
            }
            _ => false,
        }
    }
}

/// Field name -> value, kept in insertion order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormValues {
    entries: Vec<(String, FieldValue)>,
}

impl FormValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Initial values for a compiled form: typed defaults, `false` for
    /// checkboxes without a default, `Null` everywhere else
    pub fn from_defaults(form: &CompiledForm) -> Self {
        let mut values = Self::new();
        for field in &form.fields {
            let value = match (&field.default_value, field.kind) {
                (Some(default), _) => FieldValue::from(default),
                (None, FieldKind::Boolean) => FieldValue::Bool(false),
                (None, _) => FieldValue::Null,
            };
            values.insert(field.name.clone(), value);
        }
        values
    }

    /// Insert or replace; a replaced entry keeps its position
    pub fn insert(&mut self, name: impl Into<String>, value: FieldValue) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn remove(&mut self, name: &str) -> Option<FieldValue> {
        let index = self.entries.iter().position(|(n, _)| n == name)?;
        Some(self.entries.remove(index).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, FieldValue)> for FormValues {
    fn from_iter<I: IntoIterator<Item = (K, FieldValue)>>(iter: I) -> Self {
        let mut values = Self::new();
        for (name, value) in iter {
            values.insert(name, value);
        }
        values
    }
}
