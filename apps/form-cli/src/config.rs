//! CLI configuration
//!
//! Loaded from an optional TOML file. Every key has a default, so an empty
//! file (or no file at all) is a valid configuration.

use anyhow::Context;
use form_attachments::AttachmentPolicy;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Main configuration structure loaded from TOML files
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Attachment acceptance rules
    #[serde(default)]
    pub attachments: AttachmentPolicy,
    /// Output formatting
    #[serde(default)]
    pub output: OutputConfig,
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the TOML configuration file
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file cannot be read
    /// - The TOML is malformed
    /// - A key has the wrong type (e.g. a string for `max_file_bytes`)
    ///
    /// # Example
    ///
    /// ```no_run
    /// use form_cli::config::Config;
    ///
    /// # fn example() -> anyhow::Result<()> {
    /// let config = Config::from_file("form-cli.toml")?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string
    ///
    /// Missing tables and keys fall back to their defaults.
    ///
    /// # Arguments
    ///
    /// * `s` - TOML configuration as a string
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is malformed or a key has the wrong type
    ///
    /// # Example
    ///
    /// ```
    /// use form_cli::config::Config;
    ///
    /// # fn main() -> anyhow::Result<()> {
    /// let toml = r#"
    ///     [attachments]
    ///     max_file_bytes = 2097152
    ///
    ///     [output]
    ///     pretty = false
    /// "#;
    /// let config = Config::from_str(toml)?;
    /// assert_eq!(config.attachments.max_file_bytes, 2 * 1024 * 1024);
    /// assert_eq!(config.attachments.image_mime_prefix, "image/");
    /// assert!(!config.output.pretty);
    /// # Ok(())
    /// # }
    /// ```
    pub fn from_str(s: &str) -> anyhow::Result<Self> {
        toml::from_str(s).context("Failed to parse TOML configuration")
    }
}

/// How command output is printed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Pretty-print JSON output (default: true)
    #[serde(default = "default_pretty")]
    pub pretty: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            pretty: default_pretty(),
        }
    }
}

fn default_pretty() -> bool {
    true
}
