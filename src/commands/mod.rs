pub mod build;

/// Version string reported in logs: the build-time `LEGO_VERSION`, or the
/// crate version for development builds.
#[must_use]
pub fn version() -> &'static str {
    option_env!("LEGO_VERSION").unwrap_or(env!("CARGO_PKG_VERSION"))
}
