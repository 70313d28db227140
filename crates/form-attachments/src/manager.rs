//! Per-field attachment state
//!
//! One manager per photo/file field. It owns the field's previews and is the
//! only place preview references are created or revoked, so the live set of
//! references always equals the previews it currently displays.

use std::rc::Rc;

use form_types::{CompiledField, FieldError, FieldKind, FieldValue, FileHandle};
use tracing::debug;
use uuid::Uuid;

use crate::error::AttachmentError;
use crate::policy::AttachmentPolicy;
use crate::preview::{AttachmentPreview, PreviewStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionMode {
    /// A new selection replaces the current file
    Single,
    /// New selections are appended
    Multiple,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentState {
    Empty,
    /// Previews are being created for an accepted batch
    Selecting,
    Populated,
}

pub struct AttachmentManager {
    field: String,
    kind: FieldKind,
    mode: SelectionMode,
    policy: AttachmentPolicy,
    store: Rc<dyn PreviewStore>,
    previews: Vec<AttachmentPreview>,
    state: AttachmentState,
    disabled: bool,
    error: Option<FieldError>,
}

impl AttachmentManager {
    pub fn new(
        field: impl Into<String>,
        kind: FieldKind,
        mode: SelectionMode,
        policy: AttachmentPolicy,
        store: Rc<dyn PreviewStore>,
    ) -> Self {
        Self {
            field: field.into(),
            kind,
            mode,
            policy,
            store,
            previews: Vec::new(),
            state: AttachmentState::Empty,
            disabled: false,
            error: None,
        }
    }

    /// Manager for a compiled attachment field; `None` for other kinds
    pub fn for_field(
        field: &CompiledField,
        policy: AttachmentPolicy,
        store: Rc<dyn PreviewStore>,
    ) -> Option<Self> {
        if !field.kind.is_attachment() {
            return None;
        }
        let mode = if field.accepts_multiple() {
            SelectionMode::Multiple
        } else {
            SelectionMode::Single
        };
        Some(Self::new(field.name.clone(), field.kind, mode, policy, store))
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn mode(&self) -> SelectionMode {
        self.mode
    }

    pub fn state(&self) -> AttachmentState {
        self.state
    }

    pub fn previews(&self) -> &[AttachmentPreview] {
        &self.previews
    }

    pub fn error(&self) -> Option<&FieldError> {
        self.error.as_ref()
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    pub fn set_disabled(&mut self, disabled: bool) {
        self.disabled = disabled;
    }

    /// The field value implied by the current previews
    pub fn value(&self) -> FieldValue {
        match (self.mode, self.previews.as_slice()) {
            (_, []) => FieldValue::Null,
            (SelectionMode::Single, [first, ..]) => FieldValue::File(first.file.clone()),
            (SelectionMode::Multiple, previews) => {
                FieldValue::Files(previews.iter().map(|p| p.file.clone()).collect())
            }
        }
    }

    /// Accept a picker batch.
    ///
    /// The batch is checked as a whole: one bad file rejects all of them and
    /// leaves the previous previews in place. Single mode only looks at the
    /// first file. Returns the new field value, or `None` when the call was
    /// a no-op (disabled, empty batch).
    pub fn select(&mut self, files: Vec<FileHandle>) -> Result<Option<FieldValue>, AttachmentError> {
        if self.disabled || files.is_empty() {
            return Ok(None);
        }

        let batch: Vec<FileHandle> = match self.mode {
            SelectionMode::Single => files.into_iter().take(1).collect(),
            SelectionMode::Multiple => files,
        };

        for file in &batch {
            if let Err(message) = self.policy.check(self.kind, file.as_ref()) {
                let err = AttachmentError::Validation {
                    field: self.field.clone(),
                    file: file.name(),
                    message,
                };
                debug!(field = %self.field, file = %file.name(), "attachment batch rejected");
                self.error = Some(err.to_field_error());
                return Err(err);
            }
        }

        let previous = self.state;
        self.state = AttachmentState::Selecting;

        let mut created: Vec<AttachmentPreview> = Vec::with_capacity(batch.len());
        for file in batch {
            match self.store.create(&file) {
                Ok(preview_url) => created.push(AttachmentPreview {
                    id: format!("{}-{}", file.name(), Uuid::new_v4()),
                    preview_url,
                    file,
                }),
                Err(e) => {
                    for preview in &created {
                        self.store.revoke(&preview.preview_url);
                    }
                    self.state = previous;
                    let err = AttachmentError::Preview {
                        field: self.field.clone(),
                        file: file.name(),
                        reason: e.to_string(),
                    };
                    self.error = Some(err.to_field_error());
                    return Err(err);
                }
            }
        }

        if self.mode == SelectionMode::Single {
            self.release_all();
        }
        self.previews.extend(created);
        self.state = AttachmentState::Populated;
        self.error = None;

        debug!(field = %self.field, count = self.previews.len(), "attachments selected");
        Ok(Some(self.value()))
    }

    /// Drop one attachment by preview id; `None` if disabled or not found
    pub fn remove(&mut self, id: &str) -> Option<FieldValue> {
        if self.disabled {
            return None;
        }
        let index = self.previews.iter().position(|p| p.id == id)?;
        let preview = self.previews.remove(index);
        self.store.revoke(&preview.preview_url);
        if self.previews.is_empty() {
            self.state = AttachmentState::Empty;
        }
        Some(self.value())
    }

    /// Drop every attachment; `None` if disabled
    pub fn clear(&mut self) -> Option<FieldValue> {
        if self.disabled {
            return None;
        }
        self.release_all();
        self.error = None;
        Some(FieldValue::Null)
    }

    /// Return to the initial state regardless of the disabled flag
    pub fn reset(&mut self) {
        self.release_all();
        self.error = None;
    }

    /// Follow an external value change: an emptied value drops the previews.
    /// Returns whether anything was released.
    pub fn sync_value(&mut self, value: &FieldValue) -> bool {
        if value.is_empty() && !self.previews.is_empty() {
            self.release_all();
            return true;
        }
        false
    }

    fn release_all(&mut self) {
        for preview in self.previews.drain(..) {
            self.store.revoke(&preview.preview_url);
        }
        self.state = AttachmentState::Empty;
    }
}

impl Drop for AttachmentManager {
    fn drop(&mut self) {
        self.release_all();
    }
}
