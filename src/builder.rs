//! Build orchestration: load the manifest and its brick sets, then apply
//! every resource in order.
//!
//! The build is a small typestate machine:
//!
//! ```text
//! Builder ──load()──▶ LoadedBuild ──build()──▶ BuildSummary
//! ```
//!
//! Loading reads every file before anything is applied, so a missing or
//! malformed brick set aborts the run with the system untouched. Applying
//! stops at the first error; resources applied before it stay applied.
use std::path::PathBuf;

use crate::config::brick_set::BrickSet;
use crate::config::manifest::Manifest;
use crate::context::Context;
use crate::error::Result;
use crate::logging::Log;
use crate::resources::{Resource, ResourceChange};

/// A build that has not loaded anything yet.
#[derive(Debug, Clone)]
pub struct Builder {
    manifest: PathBuf,
    root: PathBuf,
}

impl Builder {
    /// Prepare a build of `manifest`, loading brick sets from
    /// `<root>/brick_sets/`.
    #[must_use]
    pub fn new(manifest: impl Into<PathBuf>, root: impl Into<PathBuf>) -> Self {
        Self {
            manifest: manifest.into(),
            root: root.into(),
        }
    }

    /// Read the manifest and every brick set it names.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::Load`](crate::error::BuildError::Load) if the
    /// manifest or any brick set is missing or malformed, and the
    /// definition errors of [`BrickSet::load`].
    pub fn load(self, log: &dyn Log) -> Result<LoadedBuild> {
        log.stage("Loading manifest");
        log.debug(&format!("manifest: {}", self.manifest.display()));
        log.debug(&format!("root: {}", self.root.display()));

        let manifest = Manifest::load(&self.manifest)?;
        let brick_sets = manifest
            .brick_sets
            .iter()
            .map(|name| {
                let set = BrickSet::load(&self.root, name)?;
                log.debug(&format!(
                    "brick set {name}: {} resource(s)",
                    set.resources().len()
                ));
                Ok(set)
            })
            .collect::<Result<Vec<_>>>()?;

        log.info(&format!("loaded {} brick set(s)", brick_sets.len()));
        Ok(LoadedBuild { brick_sets })
    }
}

/// A build whose brick sets are all loaded and ready to apply.
#[derive(Debug, Clone)]
pub struct LoadedBuild {
    brick_sets: Vec<BrickSet>,
}

impl LoadedBuild {
    /// Loaded brick sets, in manifest order.
    #[must_use]
    pub fn brick_sets(&self) -> &[BrickSet] {
        &self.brick_sets
    }

    /// Validate and apply every resource, brick sets in manifest order and
    /// resources in definition order.
    ///
    /// # Errors
    ///
    /// Returns the first validation or apply error; nothing after it runs.
    pub fn build(self, ctx: &Context<'_>) -> Result<BuildSummary> {
        let mut summary = BuildSummary::default();

        for set in &self.brick_sets {
            ctx.log.stage(&format!("Brick set {}", set.name()));
            for definition in set.resources() {
                let resource = Resource::from_definition(definition, set, ctx.log)?;
                ctx.log
                    .debug(&format!("applying {} ({})", resource.id(), resource.kind()));
                let change = resource.apply(ctx)?;

                summary.resources += 1;
                match change {
                    ResourceChange::Applied => {
                        summary.changed += 1;
                        ctx.log.info(&format!("{}: changed", resource.id()));
                    }
                    ResourceChange::AlreadyCorrect => {
                        ctx.log.info(&format!("{}: ok", resource.id()));
                    }
                }
            }
            summary.brick_sets += 1;
        }

        Ok(summary)
    }
}

/// Counts reported after a successful build.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BuildSummary {
    /// Brick sets processed.
    pub brick_sets: usize,
    /// Resources applied.
    pub resources: usize,
    /// Resources that changed the system.
    pub changed: usize,
}

impl std::fmt::Display for BuildSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} brick set(s), {} resource(s), {} changed",
            self.brick_sets, self.resources, self.changed
        )
    }
}
