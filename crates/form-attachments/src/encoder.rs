//! Submission encoding
//!
//! File values are read and inlined as base64 data URLs so the payload is a
//! plain JSON object. Every file in the submission is read concurrently;
//! the output keeps the field order of the input values.

use base64::{engine::general_purpose::STANDARD, Engine};
use chrono::{SecondsFormat, TimeZone, Utc};
use form_types::{FieldValue, FileBlob, FileHandle, FileReadError, FormValues};
use futures::future::{try_join_all, FutureExt, LocalBoxFuture};
use serde::{Deserialize, Serialize};
use serde_json::Value;

const FALLBACK_MIME: &str = "application/octet-stream";

/// Encoded payload: field name -> JSON value, in field order
pub type EncodedValues = serde_json::Map<String, Value>;

/// One file, inlined
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncodedFile {
    pub name: String,
    pub size: u64,
    #[serde(rename = "type")]
    pub mime_type: String,
    /// ISO-8601 UTC with milliseconds
    pub last_modified: String,
    pub data_url: String,
}

pub async fn encode_file(file: &dyn FileBlob) -> Result<EncodedFile, FileReadError> {
    let bytes = file.read_bytes().await?;
    let mime_type = file.mime_type();
    let data_mime = if mime_type.is_empty() { FALLBACK_MIME } else { mime_type.as_str() };

    Ok(EncodedFile {
        name: file.name(),
        size: file.size(),
        last_modified: iso_timestamp(file.last_modified_ms()),
        data_url: format!("data:{};base64,{}", data_mime, STANDARD.encode(&bytes)),
        mime_type,
    })
}

/// Encode every value; any unreadable file fails the whole submission
pub async fn encode_submission(values: &FormValues) -> Result<EncodedValues, FileReadError> {
    let fields: Vec<LocalBoxFuture<'_, Result<(String, Value), FileReadError>>> = values
        .iter()
        .map(|(name, value)| {
            let name = name.to_string();
            async move { Ok::<_, FileReadError>((name, encode_value(value).await?)) }.boxed_local()
        })
        .collect();

    Ok(try_join_all(fields).await?.into_iter().collect())
}

async fn encode_value(value: &FieldValue) -> Result<Value, FileReadError> {
    match value {
        FieldValue::File(file) => to_json(encode_file(file.as_ref()).await?),
        FieldValue::Files(files) => {
            let encoded = try_join_all(files.iter().map(encode_handle)).await?;
            Ok(Value::Array(
                encoded.into_iter().map(to_json).collect::<Result<_, _>>()?,
            ))
        }
        scalar => Ok(scalar.to_scalar_json().unwrap_or(Value::Null)),
    }
}

async fn encode_handle(file: &FileHandle) -> Result<EncodedFile, FileReadError> {
    encode_file(file.as_ref()).await
}

fn to_json(file: EncodedFile) -> Result<Value, FileReadError> {
    let name = file.name.clone();
    serde_json::to_value(file).map_err(|e| FileReadError::new(name, e.to_string()))
}

fn iso_timestamp(ms: i64) -> String {
    Utc.timestamp_millis_opt(ms)
        .single()
        .map(|t| t.to_rfc3339_opts(SecondsFormat::Millis, true))
        .unwrap_or_else(|| "1970-01-01T00:00:00.000Z".to_string())
}
