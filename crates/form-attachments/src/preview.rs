//! Preview references
//!
//! A preview reference is a scarce resource (a `blob:` URL in the browser):
//! every reference handed out by a store must be revoked exactly once when
//! its attachment is removed, replaced or cleared.

use std::cell::RefCell;
use std::collections::HashSet;

use form_types::FileHandle;
use serde::Serialize;
use uuid::Uuid;

use crate::error::PreviewError;

pub trait PreviewStore {
    /// Hand out a displayable reference for the file
    fn create(&self, file: &FileHandle) -> Result<String, PreviewError>;

    /// Release a reference; unknown references are ignored
    fn revoke(&self, reference: &str);
}

/// A selected file with its live preview reference
#[derive(Debug, Clone)]
pub struct AttachmentPreview {
    /// `{file name}-{uuid}`, unique for the life of the process
    pub id: String,
    pub preview_url: String,
    pub file: FileHandle,
}

impl AttachmentPreview {
    pub fn summary(&self) -> PreviewSummary {
        PreviewSummary {
            id: self.id.clone(),
            preview_url: self.preview_url.clone(),
            name: self.file.name(),
            size: self.file.size(),
            mime_type: self.file.mime_type(),
        }
    }
}

/// Serializable view of a preview, without the file handle
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewSummary {
    pub id: String,
    pub preview_url: String,
    pub name: String,
    pub size: u64,
    #[serde(rename = "type")]
    pub mime_type: String,
}

/// Preview store that tracks live references in memory
#[derive(Debug, Default)]
pub struct MemoryPreviewStore {
    live: RefCell<HashSet<String>>,
    fail_creates: bool,
}

impl MemoryPreviewStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose every `create` fails
    pub fn failing() -> Self {
        Self {
            live: RefCell::default(),
            fail_creates: true,
        }
    }

    /// Number of references created and not yet revoked
    pub fn live_count(&self) -> usize {
        self.live.borrow().len()
    }

    pub fn is_live(&self, reference: &str) -> bool {
        self.live.borrow().contains(reference)
    }
}

impl PreviewStore for MemoryPreviewStore {
    fn create(&self, file: &FileHandle) -> Result<String, PreviewError> {
        if self.fail_creates {
            return Err(PreviewError(format!("no preview available for '{}'", file.name())));
        }
        let reference = format!("blob:memory/{}", Uuid::new_v4());
        self.live.borrow_mut().insert(reference.clone());
        Ok(reference)
    }

    fn revoke(&self, reference: &str) {
        self.live.borrow_mut().remove(reference);
    }
}
