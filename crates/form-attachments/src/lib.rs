//! Attachment lifecycle and submission encoding
//!
//! - `policy`: per-file acceptance rules (size, image MIME type)
//! - `preview`: revocable preview references and the in-memory store
//! - `manager`: per-field selection state machine
//! - `encoder`: file values -> serializable records with data URLs
//! - `session`: form-state controller owning values, managers and reset
//! - `memory`: in-memory `FileBlob` implementation

pub mod encoder;
pub mod error;
pub mod manager;
pub mod memory;
pub mod policy;
pub mod preview;
pub mod session;

pub use encoder::{encode_file, encode_submission, EncodedFile, EncodedValues};
pub use error::{AttachmentError, PreviewError, SubmissionError};
pub use manager::{AttachmentManager, AttachmentState, SelectionMode};
pub use memory::MemoryFile;
pub use policy::AttachmentPolicy;
pub use preview::{AttachmentPreview, MemoryPreviewStore, PreviewStore, PreviewSummary};
pub use session::{FormSession, SubmissionTicket};
