//! Minimal declarative configuration management.
//!
//! A manifest names an ordered list of **brick sets**; each brick set is a
//! definition file mapping resource names to resource definitions, plus a
//! `files/` directory of sources. Every resource is one of three kinds
//! (package, file, command) and is validated against its kind's schema
//! before it is applied.
//!
//! The public API is organised into layers:
//!
//! - **[`config`]**: parse the manifest and brick-set documents (YAML or TOML)
//! - **[`resources`]**: schemas, typed resources and their idempotent apply logic
//! - **[`builder`]**: load everything, then apply in order, stopping at the first error
//! - **[`exec`]**, **[`operations`]**, **[`identity`]**: collaborator seams
//!   over processes, the filesystem and user/group lookup
//! - **[`commands`]**: the `build` subcommand wired to the live system
#![deny(clippy::or_fun_call)]
#![deny(clippy::bool_to_int_with_if)]

pub mod builder;
pub mod cli;
pub mod commands;
pub mod config;
pub mod context;
pub mod error;
pub mod exec;
pub mod identity;
pub mod logging;
pub mod operations;
pub mod resources;
