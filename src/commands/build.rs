use anyhow::Result;
use std::path::{Path, PathBuf};

use crate::builder::{Builder, BuildSummary};
use crate::cli::{BuildOpts, GlobalOpts};
use crate::config::{ROOT_ENV, resolve_root as resolve};
use crate::context::Context;
use crate::exec::SystemExecutor;
use crate::identity::SystemIdentityResolver;
use crate::logging::Logger;
use crate::operations::SystemFileSystemOps;
use crate::resources::package::AptPackageManager;

/// Run the build command against the live system.
///
/// # Errors
///
/// Returns the [`BuildError`](crate::error::BuildError) that aborted the
/// build, converted to [`anyhow::Error`].
pub fn run(global: &GlobalOpts, opts: &BuildOpts, log: &Logger) -> Result<()> {
    log.info(&format!("lego {}", super::version()));

    let root = resolve_root(global, &opts.manifest);
    let executor = SystemExecutor;
    let fs = SystemFileSystemOps;
    let identity = SystemIdentityResolver::new(&executor);
    let apt = AptPackageManager::new(&executor, log);
    let ctx = Context {
        log,
        executor: &executor,
        fs: &fs,
        identity: &identity,
        apt: &apt,
    };

    let summary = build(&opts.manifest, root, &ctx)?;
    log.stage("Summary");
    log.info(&summary.to_string());
    Ok(())
}

/// Load and apply `manifest` with the collaborators in `ctx`.
///
/// # Errors
///
/// Returns the first load, validation or apply error.
pub fn build(manifest: &Path, root: PathBuf, ctx: &Context<'_>) -> Result<BuildSummary> {
    let loaded = Builder::new(manifest, root).load(ctx.log)?;
    Ok(loaded.build(ctx)?)
}

/// Resolve the root directory from `--root`, `LEGO_ROOT`, or the manifest's
/// directory.
#[must_use]
pub fn resolve_root(global: &GlobalOpts, manifest: &Path) -> PathBuf {
    let env_root = std::env::var(ROOT_ENV).ok();
    resolve(global.root.as_deref(), env_root.as_deref(), manifest)
}
