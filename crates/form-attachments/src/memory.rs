use std::any::Any;
use std::rc::Rc;

use async_trait::async_trait;
use form_types::{FileBlob, FileHandle, FileReadError};

/// A file whose content is already in memory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryFile {
    name: String,
    mime_type: String,
    last_modified_ms: i64,
    bytes: Vec<u8>,
    fail_reads: bool,
}

impl MemoryFile {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            last_modified_ms: 0,
            bytes,
            fail_reads: false,
        }
    }

    /// Zero-filled file of the given size
    pub fn sized(name: impl Into<String>, mime_type: impl Into<String>, size: usize) -> Self {
        Self::new(name, mime_type, vec![0; size])
    }

    pub fn modified_at(mut self, last_modified_ms: i64) -> Self {
        self.last_modified_ms = last_modified_ms;
        self
    }

    /// Make every content read fail, as an unreadable or revoked file would
    pub fn failing_reads(mut self) -> Self {
        self.fail_reads = true;
        self
    }

    pub fn into_handle(self) -> FileHandle {
        Rc::new(self)
    }
}

#[async_trait(?Send)]
impl FileBlob for MemoryFile {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn size(&self) -> u64 {
        self.bytes.len() as u64
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
        if self.fail_reads {
            return Err(FileReadError::new(&self.name, "file is no longer readable"));
        }
        Ok(self.bytes.clone())
    }
}
