//! Reading templates and value files from disk
//!
//! Values JSON is an object keyed by field name. Scalars are taken as-is;
//! file fields take `{"file": "path", "type": "mime"}` (type optional) or an
//! array of those.

use std::any::Any;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::UNIX_EPOCH;

use anyhow::Context;
use async_trait::async_trait;
use form_types::{FieldValue, FileBlob, FileHandle, FileReadError, RawTemplate};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InputError {
    #[error("Values file must be a JSON object keyed by field name")]
    NotAnObject,

    #[error("Value for '{0}' is not a scalar or a file reference")]
    UnsupportedValue(String),

    #[error("Expected exactly one template in {path}, found {count}")]
    NotSingleTemplate { path: String, count: usize },
}

/// One template or an array of them
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TemplateInput {
    One(RawTemplate),
    Many(Vec<RawTemplate>),
}

/// Load every template in a JSON file
///
/// The file holds either one template object or an array of them.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not template JSON
pub fn load_templates(path: &Path) -> anyhow::Result<Vec<RawTemplate>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read templates: {}", path.display()))?;
    let input: TemplateInput = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse templates: {}", path.display()))?;
    Ok(match input {
        TemplateInput::One(template) => vec![template],
        TemplateInput::Many(templates) => templates,
    })
}

/// Load a file that must hold exactly one template
///
/// # Errors
///
/// Same as [`load_templates`], plus [`InputError::NotSingleTemplate`] when
/// the file holds an array whose length isn't one
pub fn load_template(path: &Path) -> anyhow::Result<RawTemplate> {
    let mut templates = load_templates(path)?;
    if templates.len() != 1 {
        return Err(InputError::NotSingleTemplate {
            path: path.display().to_string(),
            count: templates.len(),
        }
        .into());
    }
    Ok(templates.remove(0))
}

/// A value read from the values file
#[derive(Debug, Clone)]
pub enum InputValue {
    Scalar(FieldValue),
    Files(Vec<FileHandle>),
}

#[derive(Debug, Deserialize)]
struct FileRef {
    file: PathBuf,
    #[serde(rename = "type")]
    mime_type: Option<String>,
}

/// Load the values file. File references are resolved relative to the
/// values file's directory and stat'ed up front; contents are read on submit.
///
/// # Errors
///
/// Returns an error if:
/// - The file cannot be read or parsed
/// - The top level is not an object ([`InputError::NotAnObject`])
/// - A value is neither a scalar nor a file reference
/// - A referenced file does not exist
pub async fn load_values(path: &Path) -> anyhow::Result<Vec<(String, InputValue)>> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read values: {}", path.display()))?;
    let json: Value = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse values: {}", path.display()))?;
    let Value::Object(map) = json else {
        return Err(InputError::NotAnObject.into());
    };

    let base = path.parent().unwrap_or_else(|| Path::new("."));
    let mut values = Vec::with_capacity(map.len());
    for (name, value) in map {
        let input = match &value {
            Value::Object(_) => InputValue::Files(vec![open_file_ref(base, &name, &value).await?]),
            Value::Array(items) => {
                let mut files = Vec::with_capacity(items.len());
                for item in items {
                    files.push(open_file_ref(base, &name, item).await?);
                }
                InputValue::Files(files)
            }
            scalar => InputValue::Scalar(
                FieldValue::from_scalar_json(scalar).ok_or_else(|| InputError::UnsupportedValue(name.clone()))?,
            ),
        };
        values.push((name, input));
    }
    Ok(values)
}

async fn open_file_ref(base: &Path, field: &str, value: &Value) -> anyhow::Result<FileHandle> {
    let file_ref = FileRef::deserialize(value).map_err(|_| InputError::UnsupportedValue(field.to_string()))?;
    let path = base.join(&file_ref.file);
    let file = DiskFile::open(&path, file_ref.mime_type).await?;
    Ok(Rc::new(file))
}

/// A file on local disk; content is read when the submission is encoded
#[derive(Debug, Clone)]
pub struct DiskFile {
    path: PathBuf,
    name: String,
    mime_type: String,
    size: u64,
    last_modified_ms: i64,
}

impl DiskFile {
    /// Stat a file; `mime_type` overrides the extension-based guess
    pub async fn open(path: &Path, mime_type: Option<String>) -> anyhow::Result<Self> {
        let metadata = tokio::fs::metadata(path)
            .await
            .with_context(|| format!("Failed to stat attachment: {}", path.display()))?;
        let last_modified_ms = metadata
            .modified()
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_millis() as i64)
            .unwrap_or(0);
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        Ok(Self {
            path: path.to_path_buf(),
            mime_type: mime_type.unwrap_or_else(|| guess_mime_type(&name).to_string()),
            name,
            size: metadata.len(),
            last_modified_ms,
        })
    }
}

#[async_trait(?Send)]
impl FileBlob for DiskFile {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn size(&self) -> u64 {
        self.size
    }

    fn mime_type(&self) -> String {
        self.mime_type.clone()
    }

    fn last_modified_ms(&self) -> i64 {
        self.last_modified_ms
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    async fn read_bytes(&self) -> Result<Vec<u8>, FileReadError> {
        tokio::fs::read(&self.path)
            .await
            .map_err(|e| FileReadError::new(&self.name, e.to_string()))
    }
}

/// MIME type from the file extension; empty when unknown
fn guess_mime_type(name: &str) -> &'static str {
    let extension = name.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase());
    match extension.as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("heic") => "image/heic",
        Some("pdf") => "application/pdf",
        Some("txt") => "text/plain",
        Some("csv") => "text/csv",
        Some("json") => "application/json",
        _ => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("form-cli-{}-{}", name, std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_guess_mime_type() {
        assert_eq!(guess_mime_type("site.PNG"), "image/png");
        assert_eq!(guess_mime_type("notes.txt"), "text/plain");
        assert_eq!(guess_mime_type("archive.xyz"), "");
        assert_eq!(guess_mime_type("README"), "");
    }

    #[test]
    fn test_single_and_many_templates() {
        let dir = scratch_dir("templates");
        let one = dir.join("one.json");
        std::fs::write(&one, r#"{"formName": "A", "formId": "1", "fields": []}"#).unwrap();
        let many = dir.join("many.json");
        std::fs::write(
            &many,
            r#"[{"formName": "A", "formId": "1"}, {"formName": "B", "formId": "2"}]"#,
        )
        .unwrap();

        assert_eq!(load_template(&one).unwrap().form_id, "1");
        assert_eq!(load_templates(&many).unwrap().len(), 2);
        assert!(load_template(&many).is_err());
    }

    #[tokio::test]
    async fn test_values_with_file_refs() {
        let dir = scratch_dir("values");
        std::fs::write(dir.join("a.txt"), "hello world\n").unwrap();
        std::fs::write(dir.join("b.png"), [0u8; 4]).unwrap();
        let values_path = dir.join("values.json");
        std::fs::write(
            &values_path,
            r#"{
                "notes": "ok",
                "count": 3,
                "permit": {"file": "a.txt"},
                "photos": [{"file": "b.png"}, {"file": "a.txt", "type": "image/png"}]
            }"#,
        )
        .unwrap();

        let values = load_values(&values_path).await.unwrap();
        let names: Vec<_> = values.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["notes", "count", "permit", "photos"]);

        match &values[2].1 {
            InputValue::Files(files) => {
                assert_eq!(files[0].name(), "a.txt");
                assert_eq!(files[0].size(), 12);
                assert_eq!(files[0].mime_type(), "text/plain");
                assert_eq!(files[0].read_bytes().await.unwrap(), b"hello world\n".to_vec());
            }
            other => panic!("expected files, got {:?}", other),
        }
        match &values[3].1 {
            InputValue::Files(files) => {
                assert_eq!(files.len(), 2);
                assert_eq!(files[1].mime_type(), "image/png");
            }
            other => panic!("expected files, got {:?}", other),
        }
    }

    #[test]
    fn test_values_must_be_object() {
        let dir = scratch_dir("bad-values");
        let path = dir.join("values.json");
        std::fs::write(&path, "[1, 2]").unwrap();
        let err = tokio_test::block_on(load_values(&path)).unwrap_err();
        assert_eq!(err.downcast_ref::<InputError>(), Some(&InputError::NotAnObject));
    }
}
