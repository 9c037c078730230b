//! Collaborators borrowed by resources for the duration of one build.
use crate::exec::Executor;
use crate::identity::IdentityResolver;
use crate::logging::Log;
use crate::operations::FileSystemOps;
use crate::resources::package::{PackageManager, Provider};

/// Shared context for applying resources.
pub struct Context<'a> {
    /// Diagnostics sink.
    pub log: &'a dyn Log,
    /// Process execution (command resources).
    pub executor: &'a dyn Executor,
    /// Filesystem primitives (file resources).
    pub fs: &'a dyn FileSystemOps,
    /// User and group lookup (file resources).
    pub identity: &'a dyn IdentityResolver,
    /// Client for the `apt` provider.
    pub apt: &'a dyn PackageManager,
}

impl std::fmt::Debug for Context<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("log", &"<dyn Log>")
            .field("executor", &self.executor)
            .field("fs", &self.fs)
            .field("identity", &"<dyn IdentityResolver>")
            .field("apt", &"<dyn PackageManager>")
            .finish()
    }
}

impl<'a> Context<'a> {
    /// Client implementing `provider`.
    #[must_use]
    pub fn package_manager(&self, provider: Provider) -> &'a dyn PackageManager {
        match provider {
            Provider::Apt => self.apt,
        }
    }
}
