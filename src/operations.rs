//! Filesystem operation abstractions for dependency injection.
//!
//! Provides the [`FileSystemOps`] trait so that file resources can be
//! unit-tested without touching the real filesystem.  Production code uses
//! [`SystemFileSystemOps`]; tests use `MockFileSystemOps`.

use anyhow::{Context as _, Result};
use std::path::Path;

/// Abstraction over the filesystem primitives used by file resources.
pub trait FileSystemOps: std::fmt::Debug {
    /// Returns `true` if something (file, directory or symlink) exists at `path`.
    fn exists(&self, path: &Path) -> bool;

    /// Lowercase hex SHA-256 digest of the file content at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if `path` cannot be read.
    fn checksum(&self, path: &Path) -> Result<String>;

    /// Overwrite `dst` with the content of `src`, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error if `src` cannot be read or `dst` cannot be written.
    fn copy(&self, src: &Path, dst: &Path) -> Result<()>;

    /// Recursively remove the file or directory at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if nothing exists at `path` or removal fails.
    fn remove(&self, path: &Path) -> Result<()>;

    /// Set the permission bits of `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the permissions cannot be changed.
    fn chmod(&self, path: &Path, mode: u32) -> Result<()>;

    /// Set the owning user and group of `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if ownership cannot be changed.
    fn chown(&self, path: &Path, uid: u32, gid: u32) -> Result<()>;
}

/// Lowercase hex SHA-256 digest of `bytes`.
#[must_use]
pub fn sha256_hex(bytes: &[u8]) -> String {
    use sha2::{Digest, Sha256};
    use std::fmt::Write as _;

    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let result = hasher.finalize();
    let mut hex = String::with_capacity(64);
    for b in &result {
        // write! to a String is infallible; unwrap_or(()) makes that explicit.
        write!(hex, "{b:02x}").unwrap_or(());
    }
    hex
}

/// Production [`FileSystemOps`] implementation that delegates to [`std::fs`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemFileSystemOps;

impl FileSystemOps for SystemFileSystemOps {
    fn exists(&self, path: &Path) -> bool {
        path.symlink_metadata().is_ok()
    }

    fn checksum(&self, path: &Path) -> Result<String> {
        let bytes = std::fs::read(path).with_context(|| format!("read {}", path.display()))?;
        Ok(sha256_hex(&bytes))
    }

    fn copy(&self, src: &Path, dst: &Path) -> Result<()> {
        if let Some(parent) = dst.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create parent: {}", parent.display()))?;
        }
        std::fs::copy(src, dst)
            .with_context(|| format!("copy {} to {}", src.display(), dst.display()))?;
        Ok(())
    }

    fn remove(&self, path: &Path) -> Result<()> {
        let meta =
            std::fs::symlink_metadata(path).with_context(|| format!("remove {}", path.display()))?;
        if meta.is_dir() {
            std::fs::remove_dir_all(path)
        } else {
            std::fs::remove_file(path)
        }
        .with_context(|| format!("remove {}", path.display()))
    }

    #[cfg(unix)]
    fn chmod(&self, path: &Path, mode: u32) -> Result<()> {
        use std::os::unix::fs::PermissionsExt;

        std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode))
            .with_context(|| format!("set mode {mode:o} on {}", path.display()))
    }

    #[cfg(not(unix))]
    fn chmod(&self, path: &Path, _mode: u32) -> Result<()> {
        anyhow::bail!("chmod not supported on this platform: {}", path.display())
    }

    #[cfg(unix)]
    fn chown(&self, path: &Path, uid: u32, gid: u32) -> Result<()> {
        std::os::unix::fs::chown(path, Some(uid), Some(gid))
            .with_context(|| format!("set owner {uid}:{gid} on {}", path.display()))
    }

    #[cfg(not(unix))]
    fn chown(&self, path: &Path, _uid: u32, _gid: u32) -> Result<()> {
        anyhow::bail!("chown not supported on this platform: {}", path.display())
    }
}

/// In-memory [`FileSystemOps`] for unit tests.
///
/// Pre-configure file contents with [`with_file`](Self::with_file), then
/// inspect the recorded copies, modes and owners after applying a resource.
///
/// # Example
///
/// ```ignore
/// let fs = MockFileSystemOps::new().with_file("/src/index.html", "<h1>hi</h1>");
/// fs.copy(Path::new("/src/index.html"), Path::new("/srv/index.html"))?;
/// assert_eq!(fs.copy_count(), 1);
/// ```
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MockFileSystemOps {
    files: std::sync::Mutex<std::collections::BTreeMap<std::path::PathBuf, Vec<u8>>>,
    modes: std::sync::Mutex<std::collections::BTreeMap<std::path::PathBuf, u32>>,
    owners: std::sync::Mutex<std::collections::BTreeMap<std::path::PathBuf, (u32, u32)>>,
    copies: std::sync::atomic::AtomicUsize,
    fail_chmod: bool,
}

#[cfg(test)]
#[allow(clippy::expect_used)]
impl MockFileSystemOps {
    /// Create an empty mock with nothing configured.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a file at `path` holding `content`.
    #[must_use]
    pub fn with_file(self, path: impl Into<std::path::PathBuf>, content: &str) -> Self {
        self.files
            .lock()
            .expect("mock files poisoned")
            .insert(path.into(), content.as_bytes().to_vec());
        self
    }

    /// Make every [`FileSystemOps::chmod`] call fail.
    #[must_use]
    pub const fn failing_chmod(mut self) -> Self {
        self.fail_chmod = true;
        self
    }

    /// Replace the content of `path`, as an external edit would.
    pub fn write(&self, path: impl Into<std::path::PathBuf>, content: &str) {
        self.files
            .lock()
            .expect("mock files poisoned")
            .insert(path.into(), content.as_bytes().to_vec());
    }

    /// Content of `path`, if present.
    #[must_use]
    pub fn content(&self, path: &Path) -> Option<String> {
        self.files
            .lock()
            .expect("mock files poisoned")
            .get(path)
            .map(|b| String::from_utf8_lossy(b).to_string())
    }

    /// Number of [`FileSystemOps::copy`] calls made so far.
    #[must_use]
    pub fn copy_count(&self) -> usize {
        self.copies.load(std::sync::atomic::Ordering::SeqCst)
    }

    /// Last mode applied to `path`.
    #[must_use]
    pub fn mode(&self, path: &Path) -> Option<u32> {
        self.modes
            .lock()
            .expect("mock modes poisoned")
            .get(path)
            .copied()
    }

    /// Last owner applied to `path`.
    #[must_use]
    pub fn owner(&self, path: &Path) -> Option<(u32, u32)> {
        self.owners
            .lock()
            .expect("mock owners poisoned")
            .get(path)
            .copied()
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
impl FileSystemOps for MockFileSystemOps {
    fn exists(&self, path: &Path) -> bool {
        let files = self.files.lock().expect("mock files poisoned");
        files.keys().any(|p| p == path || p.starts_with(path))
    }

    fn checksum(&self, path: &Path) -> Result<String> {
        self.files
            .lock()
            .expect("mock files poisoned")
            .get(path)
            .map(|b| sha256_hex(b))
            .ok_or_else(|| anyhow::anyhow!("read {}: not found", path.display()))
    }

    fn copy(&self, src: &Path, dst: &Path) -> Result<()> {
        let mut files = self.files.lock().expect("mock files poisoned");
        let content = files
            .get(src)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("copy {}: not found", src.display()))?;
        files.insert(dst.to_path_buf(), content);
        self.copies.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        Ok(())
    }

    fn remove(&self, path: &Path) -> Result<()> {
        let mut files = self.files.lock().expect("mock files poisoned");
        let before = files.len();
        files.retain(|p, _| !(p == path || p.starts_with(path)));
        if files.len() == before {
            anyhow::bail!("remove {}: not found", path.display());
        }
        Ok(())
    }

    fn chmod(&self, path: &Path, mode: u32) -> Result<()> {
        if self.fail_chmod || !self.exists(path) {
            anyhow::bail!("set mode {mode:o} on {}: failed", path.display());
        }
        self.modes
            .lock()
            .expect("mock modes poisoned")
            .insert(path.to_path_buf(), mode);
        Ok(())
    }

    fn chown(&self, path: &Path, uid: u32, gid: u32) -> Result<()> {
        if !self.exists(path) {
            anyhow::bail!("set owner {uid}:{gid} on {}: not found", path.display());
        }
        self.owners
            .lock()
            .expect("mock owners poisoned")
            .insert(path.to_path_buf(), (uid, gid));
        Ok(())
    }
}
