//! Template-to-form compilation
//!
//! Turns flat, denormalized field templates into render-ready forms:
//! - `mapper`: declared type tag -> `FieldKind` (fail-open)
//! - `field`: one raw row -> main field plus comment/photo sub-fields
//! - `template`: filtering, ordering and fieldset assembly for a whole template
//! - `catalog`: batch compilation with per-template failure isolation
//! - `grouping`: ordered groups and fieldset render blocks
//! - `schema`: structural validation schema derived from a compiled form

pub mod catalog;
pub mod error;
pub mod field;
pub mod fieldset;
pub mod grouping;
pub mod mapper;
pub mod schema;
pub mod template;

pub use catalog::{compile_catalog, Catalog, CatalogFailure};
pub use error::{FieldCompileError, TemplateCompilationError};
pub use field::{compile_field, compile_field_checked, parse_default_value, PHOTO_SUFFIX};
pub use fieldset::{check_fieldsets, FieldsetTracker};
pub use grouping::{group_fields, render_blocks, FieldGroup, RenderBlock};
pub use mapper::map_type;
pub use schema::{build_schema, FieldRule, SchemaEntry, ValidationReport, ValidationSchema, DATETIME_MESSAGE};
pub use template::{compile_template, compile_template_report, CompileReport};
