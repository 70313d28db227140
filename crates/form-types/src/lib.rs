//! Shared data model for the dynamic form pipeline
//!
//! - `raw`: template records as they arrive from a spreadsheet/database export
//! - `compiled`: render-ready field descriptors and compiled forms
//! - `value`: working form values and the file handle abstraction
//! - `error`: the field-level error channel and file read failures

pub mod compiled;
pub mod error;
pub mod raw;
pub mod value;

pub use compiled::{CompiledField, CompiledForm, DefaultValue, FieldKind, SelectOption};
pub use error::{FieldError, FileReadError};
pub use raw::{RawField, RawTemplate};
pub use value::{FieldValue, FileBlob, FileHandle, FormValues};
