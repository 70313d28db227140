use form_types::{FieldKind, FileBlob};
use serde::{Deserialize, Serialize};

const MIB: u64 = 1024 * 1024;

/// Acceptance rules for selected files
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttachmentPolicy {
    /// Largest accepted file, inclusive (default: 5 MiB)
    pub max_file_bytes: u64,
    /// MIME prefix required for photo fields (default: `image/`)
    pub image_mime_prefix: String,
}

impl Default for AttachmentPolicy {
    fn default() -> Self {
        Self {
            max_file_bytes: 5 * MIB,
            image_mime_prefix: "image/".to_string(),
        }
    }
}

impl AttachmentPolicy {
    /// Check one candidate file for a field of the given kind.
    ///
    /// Photo fields need an image MIME type; every kind has the size cap.
    pub fn check(&self, kind: FieldKind, file: &dyn FileBlob) -> Result<(), String> {
        let oversize = file.size() > self.max_file_bytes;
        match kind {
            FieldKind::Photo => {
                if oversize || !file.mime_type().starts_with(&self.image_mime_prefix) {
                    return Err(format!("Images only and each < {}", self.size_limit_label()));
                }
            }
            _ => {
                if oversize {
                    return Err(format!("Files must each be < {}", self.size_limit_label()));
                }
            }
        }
        Ok(())
    }

    fn size_limit_label(&self) -> String {
        if self.max_file_bytes % MIB == 0 {
            format!("{} MB", self.max_file_bytes / MIB)
        } else {
            format!("{} KB", self.max_file_bytes.div_ceil(1024))
        }
    }
}
