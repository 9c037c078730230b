// Shared helpers for integration tests.
//
// Provides a temporary-directory-backed repository builder and a set of
// collaborators that touch the real filesystem and shell but never change
// ownership or packages, so each test can run unprivileged.
//
// Used by all integration test binaries that declare `mod common;`.
#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use lego::context::Context;
use lego::exec::SystemExecutor;
use lego::identity::IdentityResolver;
use lego::logging::MemoryLog;
use lego::operations::{FileSystemOps, SystemFileSystemOps};
use lego::resources::package::PackageManager;

/// An isolated repository (manifest, brick sets, sources) in a temp dir.
///
/// The directory is deleted when the repo is dropped.
pub struct TestRepo {
    root: tempfile::TempDir,
}

impl TestRepo {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self {
            root: tempfile::tempdir().expect("create temp dir"),
        }
    }

    /// Path to the repository root.
    pub fn root_path(&self) -> &Path {
        self.root.path()
    }

    /// Absolute path of `rel` inside the repository.
    pub fn path(&self, rel: &str) -> PathBuf {
        self.root.path().join(rel)
    }

    /// Path of the manifest written by [`with_manifest`](Self::with_manifest).
    pub fn manifest_path(&self) -> PathBuf {
        self.path("build.yaml")
    }

    /// Write `build.yaml` at the root.
    pub fn with_manifest(self, content: &str) -> Self {
        self.write("build.yaml", content);
        self
    }

    /// Write `brick_sets/<name>/<file>`.
    pub fn with_brick_set_file(self, name: &str, file: &str, content: &str) -> Self {
        self.write(&format!("brick_sets/{name}/{file}"), content);
        self
    }

    /// Write `brick_sets/<name>/bricks.yaml`.
    pub fn with_brick_set(self, name: &str, content: &str) -> Self {
        self.with_brick_set_file(name, "bricks.yaml", content)
    }

    /// Write a source file under `brick_sets/<name>/files/`.
    pub fn with_source(self, name: &str, rel: &str, content: &str) -> Self {
        self.write(&format!("brick_sets/{name}/files/{rel}"), content);
        self
    }

    /// Write `content` to `rel`, creating parent directories.
    pub fn write(&self, rel: &str, content: &str) {
        let path = self.path(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create parent dir");
        }
        std::fs::write(&path, content).expect("write file");
    }
}

/// [`FileSystemOps`] over the real filesystem that counts copies and
/// records ownership changes instead of applying them.
#[derive(Debug, Default)]
pub struct CountingFs {
    copies: AtomicUsize,
    owners: Mutex<Vec<(PathBuf, u32, u32)>>,
}

impl CountingFs {
    /// Number of copies performed so far.
    pub fn copy_count(&self) -> usize {
        self.copies.load(Ordering::SeqCst)
    }

    /// Every recorded `chown` call.
    pub fn owners(&self) -> Vec<(PathBuf, u32, u32)> {
        self.owners.lock().expect("owners poisoned").clone()
    }
}

impl FileSystemOps for CountingFs {
    fn exists(&self, path: &Path) -> bool {
        SystemFileSystemOps.exists(path)
    }

    fn checksum(&self, path: &Path) -> anyhow::Result<String> {
        SystemFileSystemOps.checksum(path)
    }

    fn copy(&self, src: &Path, dst: &Path) -> anyhow::Result<()> {
        self.copies.fetch_add(1, Ordering::SeqCst);
        SystemFileSystemOps.copy(src, dst)
    }

    fn remove(&self, path: &Path) -> anyhow::Result<()> {
        SystemFileSystemOps.remove(path)
    }

    fn chmod(&self, path: &Path, mode: u32) -> anyhow::Result<()> {
        SystemFileSystemOps.chmod(path, mode)
    }

    fn chown(&self, path: &Path, uid: u32, gid: u32) -> anyhow::Result<()> {
        if !path.exists() {
            anyhow::bail!("set owner {uid}:{gid} on {}: not found", path.display());
        }
        self.owners
            .lock()
            .expect("owners poisoned")
            .push((path.to_path_buf(), uid, gid));
        Ok(())
    }
}

/// Resolves `root` to 0 and every other name to 1000; `nobody-here` is unknown.
#[derive(Debug, Default)]
pub struct FixedIdentity;

impl FixedIdentity {
    fn lookup(name: &str) -> anyhow::Result<u32> {
        match name {
            "root" => Ok(0),
            "nobody-here" => anyhow::bail!("unknown user '{name}'"),
            _ => Ok(1000),
        }
    }
}

impl IdentityResolver for FixedIdentity {
    fn uid_for_user(&self, name: &str) -> anyhow::Result<u32> {
        Self::lookup(name)
    }

    fn gid_for_group(&self, name: &str) -> anyhow::Result<u32> {
        Self::lookup(name)
    }
}

/// Package manager that reports every package installed and refuses changes.
#[derive(Debug, Default)]
pub struct InstalledPackages {
    queries: AtomicUsize,
}

impl InstalledPackages {
    /// Number of `is_installed` queries so far.
    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }
}

impl PackageManager for InstalledPackages {
    fn is_installed(&self, _name: &str) -> anyhow::Result<bool> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        Ok(true)
    }

    fn install(&self, name: &str) -> anyhow::Result<()> {
        anyhow::bail!("refusing to install {name} in tests")
    }

    fn uninstall(&self, name: &str) -> anyhow::Result<()> {
        anyhow::bail!("refusing to uninstall {name} in tests")
    }
}

/// One of each collaborator, lent out as a [`Context`].
#[derive(Debug, Default)]
pub struct Collaborators {
    pub log: MemoryLog,
    pub executor: SystemExecutor,
    pub fs: CountingFs,
    pub identity: FixedIdentity,
    pub apt: InstalledPackages,
}

impl Collaborators {
    /// Borrow every collaborator as a context.
    pub fn ctx(&self) -> Context<'_> {
        Context {
            log: &self.log,
            executor: &self.executor,
            fs: &self.fs,
            identity: &self.identity,
            apt: &self.apt,
        }
    }
}
