//! Form CLI
//!
//! Compiles form templates, prints schemas and groupings, and runs
//! validation and submission encoding against a values file.

pub mod commands;
pub mod config;
pub mod input;

pub use commands::Outcome;
pub use config::Config;
