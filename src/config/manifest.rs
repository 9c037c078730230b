//! The top-level manifest naming which brick sets to build.
use serde::Deserialize;
use serde_yaml::Value;
use std::path::Path;

use super::document::load_document;
use crate::error::{BuildError, Result};

/// Ordered list of brick sets to process.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Manifest {
    /// Brick-set names, in build order.
    pub brick_sets: Vec<String>,
}

impl Manifest {
    /// Load the manifest at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::Load`] if the file cannot be read, is malformed,
    /// lacks a `brick_sets` list, or names an invalid brick set.
    pub fn load(path: &Path) -> Result<Self> {
        Self::from_value(path, load_document(path)?)
    }

    /// Build a manifest from an already-parsed document.
    ///
    /// # Errors
    ///
    /// See [`Manifest::load`].
    pub fn from_value(path: &Path, value: Value) -> Result<Self> {
        if value.is_null() {
            return Err(BuildError::load(
                path,
                "document is empty; expected a `brick_sets` list",
            ));
        }
        let manifest: Self = serde_yaml::from_value(value).map_err(|e| BuildError::load(path, e))?;
        for name in &manifest.brick_sets {
            validate_brick_set_name(name).map_err(|reason| BuildError::load(path, reason))?;
        }
        Ok(manifest)
    }
}

/// A brick-set name must be a single, plain path component.
///
/// # Errors
///
/// Returns a human-readable reason when `name` is empty, `.`/`..`, or
/// contains a path separator.
pub fn validate_brick_set_name(name: &str) -> std::result::Result<(), String> {
    if name.trim().is_empty() {
        return Err("brick set name must not be empty".to_string());
    }
    if name == "." || name == ".." || name.contains(['/', '\\']) {
        return Err(format!(
            "invalid brick set name '{name}': must be a plain directory name"
        ));
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::document::{Format, parse_document};

    fn manifest_from(content: &str) -> Result<Manifest> {
        let value = parse_document(content, Format::Yaml).unwrap();
        Manifest::from_value(Path::new("build.yaml"), value)
    }

    #[test]
    fn brick_sets_keep_declared_order() {
        let manifest = manifest_from("brick_sets:\n  - web\n  - base\n  - db\n").unwrap();
        assert_eq!(manifest.brick_sets, vec!["web", "base", "db"]);
    }

    #[test]
    fn extra_keys_are_ignored() {
        let manifest = manifest_from("description: demo\nbrick_sets: [web]\n").unwrap();
        assert_eq!(manifest.brick_sets, vec!["web"]);
    }

    #[test]
    fn missing_brick_sets_is_load_error() {
        let err = manifest_from("other: [web]\n").unwrap_err();
        assert!(matches!(err, BuildError::Load { .. }), "got {err:?}");
        assert!(err.to_string().contains("brick_sets"), "got: {err}");
    }

    #[test]
    fn brick_sets_not_a_list_is_load_error() {
        let err = manifest_from("brick_sets: web\n").unwrap_err();
        assert!(matches!(err, BuildError::Load { .. }), "got {err:?}");
    }

    #[test]
    fn empty_document_is_load_error() {
        let err = manifest_from("").unwrap_err();
        assert!(err.to_string().contains("document is empty"), "got: {err}");
    }

    #[test]
    fn path_like_names_are_rejected() {
        for bad in ["../etc", "a/b", "..", ""] {
            let content = format!("brick_sets: [\"{bad}\"]\n");
            assert!(manifest_from(&content).is_err(), "'{bad}' should be rejected");
        }
    }

    #[test]
    fn load_reads_toml_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("build.toml");
        std::fs::write(&path, "brick_sets = [\"web\"]\n").unwrap();
        assert_eq!(Manifest::load(&path).unwrap().brick_sets, vec!["web"]);
    }
}
