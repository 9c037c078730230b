//! Package resource and the package-manager seam.
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::Context as _;
use serde::Deserialize;

use super::schema::Schema;
use super::{ResourceChange, State};
use crate::context::Context;
use crate::error::{BuildError, Result};
use crate::exec::Executor;
use crate::logging::Log;

/// Attribute schema of `type: package`.
pub const SCHEMA: Schema = Schema {
    supported: &["type", "provider", "state", "packages"],
    compulsory: &["type", "provider", "state", "packages"],
};

/// Supported package providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    /// Debian/Ubuntu packages (apt-get, dpkg-query).
    Apt,
}

impl Provider {
    /// Every supported provider.
    pub const ALL: [Self; 1] = [Self::Apt];

    /// The `provider` value selecting this provider.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Apt => "apt",
        }
    }

    /// Parse the `provider` attribute of `resource`.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::UnsupportedProvider`] listing the supported set.
    pub fn parse(resource: &str, provider: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == provider)
            .ok_or_else(|| BuildError::UnsupportedProvider {
                resource: resource.to_string(),
                provider: provider.to_string(),
                supported: Self::ALL.map(Self::as_str).join(", "),
            })
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw attributes of a package definition.
#[derive(Debug, Clone, Deserialize)]
pub struct PackageSpec {
    /// Provider name, checked by [`Provider::parse`].
    pub provider: String,
    /// Desired state, checked by [`State::parse`].
    pub state: String,
    /// Package names, in install order.
    pub packages: Vec<String>,
}

/// Client for one package provider.
#[cfg_attr(test, mockall::automock)]
pub trait PackageManager {
    /// Returns `true` if `name` is currently installed.
    ///
    /// # Errors
    ///
    /// Returns an error if the query itself cannot be run.
    fn is_installed(&self, name: &str) -> anyhow::Result<bool>;

    /// Install `name`.
    ///
    /// # Errors
    ///
    /// Returns an error if installation fails.
    fn install(&self, name: &str) -> anyhow::Result<()>;

    /// Uninstall `name`, removing its configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if removal fails.
    fn uninstall(&self, name: &str) -> anyhow::Result<()>;
}

/// Environment for every `apt-get` invocation.
const APT_ENV: &[(&str, &str)] = &[("DEBIAN_FRONTEND", "noninteractive")];

/// [`PackageManager`] for the `apt` provider.
///
/// The package index is refreshed once, before the first install of the run.
pub struct AptPackageManager<'a> {
    executor: &'a dyn Executor,
    log: &'a dyn Log,
    refreshed: AtomicBool,
}

impl<'a> AptPackageManager<'a> {
    /// Create an apt client running its tools through `executor`.
    #[must_use]
    pub const fn new(executor: &'a dyn Executor, log: &'a dyn Log) -> Self {
        Self {
            executor,
            log,
            refreshed: AtomicBool::new(false),
        }
    }

    fn apt_get(&self, args: &[&str]) -> anyhow::Result<()> {
        let result = self.executor.run_with_env("apt-get", args, APT_ENV)?;
        for line in result.stdout.lines() {
            self.log.debug(line);
        }
        Ok(())
    }

    fn refresh_index(&self) -> anyhow::Result<()> {
        if self.refreshed.load(Ordering::SeqCst) {
            return Ok(());
        }
        self.log.debug("refreshing apt package index");
        self.apt_get(&["update"]).context("apt-get update")?;
        self.refreshed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

impl std::fmt::Debug for AptPackageManager<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AptPackageManager")
            .field("executor", &self.executor)
            .field("log", &"<dyn Log>")
            .field("refreshed", &self.refreshed)
            .finish()
    }
}

impl PackageManager for AptPackageManager<'_> {
    fn is_installed(&self, name: &str) -> anyhow::Result<bool> {
        let result = self
            .executor
            .run_unchecked("dpkg-query", &["-W", "-f=${Status}", name])
            .with_context(|| format!("query package {name}"))?;
        // `${Status}` is "<want> <flag> <status>"; held packages report `hold`.
        Ok(result.success && result.stdout.trim_end().ends_with(" ok installed"))
    }

    fn install(&self, name: &str) -> anyhow::Result<()> {
        self.refresh_index()?;
        self.apt_get(&["install", "-y", name])
            .with_context(|| format!("install package {name}"))
    }

    fn uninstall(&self, name: &str) -> anyhow::Result<()> {
        self.apt_get(&["purge", "-y", name])
            .with_context(|| format!("uninstall package {name}"))
    }
}

/// A validated `type: package` resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageResource {
    /// Qualified resource name.
    pub id: String,
    /// Provider the packages are managed through.
    pub provider: Provider,
    /// Desired state of every package.
    pub state: State,
    /// Package names, in order.
    pub packages: Vec<String>,
}

impl PackageResource {
    /// Check provider, state and package names.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::UnsupportedProvider`],
    /// [`BuildError::UnsupportedState`], or [`BuildError::Schema`] for an
    /// empty package name.
    pub fn new(id: &str, spec: PackageSpec) -> Result<Self> {
        let provider = Provider::parse(id, &spec.provider)?;
        let state = State::parse(id, &spec.state)?;
        if spec.packages.iter().any(|p| p.trim().is_empty()) {
            return Err(BuildError::schema(id, "package names must not be empty"));
        }
        Ok(Self {
            id: id.to_string(),
            provider,
            state,
            packages: spec.packages,
        })
    }

    /// Install or uninstall each package in order, skipping those already in
    /// the desired state.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::Apply`] on the first failed query or change; the
    /// remaining packages are not touched.
    pub fn apply(&self, ctx: &Context<'_>) -> Result<ResourceChange> {
        let manager = ctx.package_manager(self.provider);
        let mut change = ResourceChange::AlreadyCorrect;

        for name in &self.packages {
            let installed = manager
                .is_installed(name)
                .map_err(|e| BuildError::from_collaborator(&self.id, &e))?;

            match (self.state, installed) {
                (State::Present, true) => ctx.log.debug(&format!("{name}: already installed")),
                (State::Absent, false) => ctx.log.debug(&format!("{name}: not installed")),
                (State::Present, false) => {
                    ctx.log.info(&format!("installing {name} ({})", self.provider));
                    manager
                        .install(name)
                        .map_err(|e| BuildError::from_collaborator(&self.id, &e))?;
                    change = ResourceChange::Applied;
                }
                (State::Absent, true) => {
                    ctx.log.info(&format!("removing {name} ({})", self.provider));
                    manager
                        .uninstall(name)
                        .map_err(|e| BuildError::from_collaborator(&self.id, &e))?;
                    change = ResourceChange::Applied;
                }
            }
        }

        Ok(change)
    }
}
