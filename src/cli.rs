use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Top-level CLI entry point for lego.
#[derive(Parser, Debug)]
#[command(
    name = "lego",
    about = "Minimal declarative configuration management",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(flatten)]
    pub global: GlobalOpts,
}

/// Options shared across all subcommands.
#[derive(Parser, Debug, Clone)]
pub struct GlobalOpts {
    /// Directory holding `brick_sets/` (default: $LEGO_ROOT, then the manifest's directory)
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Apply every brick set named by a manifest
    Build(BuildOpts),
}

impl Command {
    /// Subcommand name, used to name the log file.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Build(_) => "build",
        }
    }
}

/// Options for the `build` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct BuildOpts {
    /// Path to the manifest (YAML, or TOML with a `.toml` extension)
    pub manifest: PathBuf,
}
