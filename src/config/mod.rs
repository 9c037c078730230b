//! On-disk configuration: the manifest, brick-set definitions, and the
//! document formats they are written in.
pub mod brick_set;
pub mod document;
pub mod manifest;

use std::path::{Path, PathBuf};

/// Environment variable overriding the root directory holding `brick_sets/`.
pub const ROOT_ENV: &str = "LEGO_ROOT";

/// Resolve the root directory brick sets are loaded from.
///
/// Precedence: the explicit `--root` value, then `env_root` (the value of
/// [`ROOT_ENV`]), then the directory containing the manifest.
#[must_use]
pub fn resolve_root(cli_root: Option<&Path>, env_root: Option<&str>, manifest: &Path) -> PathBuf {
    if let Some(root) = cli_root {
        return root.to_path_buf();
    }
    if let Some(root) = env_root.filter(|r| !r.is_empty()) {
        return PathBuf::from(root);
    }
    manifest
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
}
