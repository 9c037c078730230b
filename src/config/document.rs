//! Structured document parsing (YAML or TOML by file extension).
//!
//! Both formats decode into an ordered [`serde_yaml::Value`] so that the
//! manifest and brick-set loaders see one representation and resource order
//! is preserved.
use serde_yaml::Value;
use std::path::Path;

use crate::error::{BuildError, Result};

/// Supported document formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// YAML (`.yaml`, `.yml`, and anything without a `.toml` extension).
    Yaml,
    /// TOML (`.toml`).
    Toml,
}

impl Format {
    /// Pick the format from a file's extension.
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => Self::Toml,
            _ => Self::Yaml,
        }
    }
}

/// Parse `content` as a document in `format`.
///
/// # Errors
///
/// Returns the parser's message if the content is malformed.
pub fn parse_document(content: &str, format: Format) -> std::result::Result<Value, String> {
    match format {
        Format::Yaml if content.trim().is_empty() => Ok(Value::Null),
        Format::Yaml => serde_yaml::from_str(content).map_err(|e| e.to_string()),
        Format::Toml => toml::from_str(content).map_err(|e| e.to_string()),
    }
}

/// Read and parse the document at `path`.
///
/// # Errors
///
/// Returns [`BuildError::Load`] if the file cannot be read or parsed.
pub fn load_document(path: &Path) -> Result<Value> {
    let content = std::fs::read_to_string(path).map_err(|e| BuildError::load(path, e))?;
    parse_document(&content, Format::from_path(path)).map_err(|e| BuildError::load(path, e))
}
