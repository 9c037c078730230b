//! Error taxonomy for the build engine.
//!
//! Every failure the engine can hit is one [`BuildError`] variant, and every
//! variant is fatal to the current build: nothing is retried and nothing is
//! rolled back. Internal modules return [`Result`]; collaborator traits
//! (executor, filesystem, package manager, identity lookup) return
//! [`anyhow::Result`] and are wrapped into [`BuildError::Apply`] by the
//! resource that called them. The CLI boundary converts to
//! [`anyhow::Error`] via `?` and downcasts to tell build failures apart from
//! unexpected errors.
//!
//! # Error kinds
//!
//! ```text
//! BuildError
//! ├── Schema              : unknown/missing attribute, ill-typed value
//! ├── UnknownKind         : `type` is not a registered resource kind
//! ├── Load                : manifest or brick set unreadable/malformed
//! ├── UnsupportedProvider : package provider other than the supported set
//! ├── UnsupportedState    : state other than present/absent
//! └── Apply               : side effect failed (install, copy, command, ...)
//! ```

use std::path::PathBuf;

use thiserror::Error;

/// Convenience alias used throughout the engine.
pub type Result<T, E = BuildError> = std::result::Result<T, E>;

/// A fatal error raised while loading or applying brick sets.
#[derive(Error, Debug)]
pub enum BuildError {
    /// A resource definition does not match its kind's schema.
    #[error("schema error in '{resource}': {reason}")]
    Schema {
        /// Qualified resource name (`<brick set>/<resource>`).
        resource: String,
        /// Human-readable explanation.
        reason: String,
    },

    /// A resource names a `type` that is not registered.
    #[error("unknown type '{kind}' for '{resource}': registered types are {known}")]
    UnknownKind {
        /// Qualified resource name.
        resource: String,
        /// The offending discriminator.
        kind: String,
        /// Comma-separated registered kinds.
        known: String,
    },

    /// A manifest or brick-set file could not be read or parsed.
    #[error("failed to load {}: {reason}", path.display())]
    Load {
        /// Path of the offending file.
        path: PathBuf,
        /// Human-readable explanation.
        reason: String,
    },

    /// A package resource names a provider this build does not support.
    #[error("package provider '{provider}' for '{resource}' is not supported: supported providers are {supported}")]
    UnsupportedProvider {
        /// Qualified resource name.
        resource: String,
        /// The requested provider.
        provider: String,
        /// Comma-separated supported providers.
        supported: String,
    },

    /// A resource asks for a state other than `present` or `absent`.
    #[error("unsupported state '{state}' for '{resource}': supported states are {supported}")]
    UnsupportedState {
        /// Qualified resource name.
        resource: String,
        /// The requested state.
        state: String,
        /// Comma-separated supported states.
        supported: String,
    },

    /// A side-effecting step failed while applying a resource.
    #[error("failed to apply '{resource}': {reason}")]
    Apply {
        /// Qualified resource name.
        resource: String,
        /// Human-readable explanation, including the collaborator's error chain.
        reason: String,
    },
}

impl BuildError {
    /// Build a [`BuildError::Schema`] for `resource`.
    pub fn schema(resource: &str, reason: impl Into<String>) -> Self {
        Self::Schema {
            resource: resource.to_string(),
            reason: reason.into(),
        }
    }

    /// Build a [`BuildError::Load`] for `path`.
    pub fn load(path: impl Into<PathBuf>, reason: impl std::fmt::Display) -> Self {
        Self::Load {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Build a [`BuildError::Apply`] for `resource`.
    pub fn apply(resource: &str, reason: impl Into<String>) -> Self {
        Self::Apply {
            resource: resource.to_string(),
            reason: reason.into(),
        }
    }

    /// Wrap a collaborator error into a [`BuildError::Apply`], keeping the
    /// whole context chain in the message.
    #[must_use]
    pub fn from_collaborator(resource: &str, err: &anyhow::Error) -> Self {
        Self::apply(resource, format!("{err:#}"))
    }
}
