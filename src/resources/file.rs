//! File resource: copy sources into place, enforce ownership and mode.
use std::path::{Component, Path, PathBuf};

use serde::Deserialize;

use super::schema::Schema;
use super::{ResourceChange, State};
use crate::context::Context;
use crate::error::{BuildError, Result};

/// Attribute schema of `type: file`.
pub const SCHEMA: Schema = Schema {
    supported: &["type", "state", "owner", "group", "mode", "files"],
    compulsory: &["type", "state", "owner", "group", "mode", "files"],
};

/// `mode` as written in a definition.
///
/// Only the text form is a valid mask. YAML and TOML have already turned
/// `0o644` into 420 by the time an integer arrives, so the original
/// digits cannot be recovered and integers are rejected. An unquoted
/// `0644` stays text in YAML.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ModeValue {
    /// A bare number, e.g. `644` or `0o644`.
    Int(u64),
    /// String form, e.g. `"0644"`.
    Str(String),
}

/// A validated permission mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mode(u32);

impl Mode {
    /// Parse an octal mask of 3 or 4 digits, optionally prefixed by `0o`.
    ///
    /// # Errors
    ///
    /// Returns a human-readable reason if `value` is not a valid mask,
    /// including every integer.
    pub fn parse(value: &ModeValue) -> std::result::Result<Self, String> {
        let text = match value {
            ModeValue::Int(n) => {
                return Err(format!(
                    "mode was read as the number {n}; quote it as octal text, e.g. \"0644\""
                ));
            }
            ModeValue::Str(s) => s.trim(),
        };
        let digits = text.strip_prefix("0o").unwrap_or(text);
        let valid = (3..=4).contains(&digits.len()) && digits.chars().all(|c| ('0'..='7').contains(&c));
        if !valid {
            return Err(format!(
                "invalid mode '{text}': expected 3 or 4 octal digits, e.g. \"0644\""
            ));
        }
        u32::from_str_radix(digits, 8)
            .map(Self)
            .map_err(|e| format!("invalid mode '{text}': {e}"))
    }

    /// Permission bits.
    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04o}", self.0)
    }
}

/// One `files` entry as written in a definition.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileEntry {
    /// Path relative to the brick set's `files/` directory.
    pub source: Option<PathBuf>,
    /// Absolute target path.
    pub destination: Option<PathBuf>,
}

/// Raw attributes of a file definition.
#[derive(Debug, Clone, Deserialize)]
pub struct FileSpec {
    /// Desired state, checked by [`State::parse`].
    pub state: String,
    /// Owning user name (or numeric uid).
    pub owner: String,
    /// Owning group name (or numeric gid).
    pub group: String,
    /// Permission mask, checked by [`Mode::parse`].
    pub mode: ModeValue,
    /// Entries, in apply order.
    pub files: Vec<FileEntry>,
}

/// A resolved entry: where content comes from and where it goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePlacement {
    /// Absolute source path, if content is managed.
    pub source: Option<PathBuf>,
    /// Target path.
    pub destination: PathBuf,
}

/// A validated `type: file` resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileResource {
    /// Qualified resource name.
    pub id: String,
    /// Desired state of every entry.
    pub state: State,
    /// Owning user.
    pub owner: String,
    /// Owning group.
    pub group: String,
    /// Permission mask applied to every entry.
    pub mode: Mode,
    /// Entries, in order.
    pub entries: Vec<FilePlacement>,
}

impl FileResource {
    /// Check the parsed attributes and resolve sources against `files_dir`.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::UnsupportedState`] for a bad state and
    /// [`BuildError::Schema`] for an invalid mode, an entry without a
    /// destination, or a source escaping `files_dir`.
    pub fn new(id: &str, spec: FileSpec, files_dir: &Path) -> Result<Self> {
        let state = State::parse(id, &spec.state)?;
        let mode = Mode::parse(&spec.mode).map_err(|reason| BuildError::schema(id, reason))?;

        let entries = spec
            .files
            .into_iter()
            .enumerate()
            .map(|(index, entry)| {
                let destination = entry.destination.ok_or_else(|| {
                    BuildError::schema(id, format!("files entry {index} has no destination"))
                })?;
                let source = entry
                    .source
                    .map(|source| resolve_source(id, index, files_dir, &source))
                    .transpose()?;
                Ok(FilePlacement {
                    source,
                    destination,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            id: id.to_string(),
            state,
            owner: spec.owner,
            group: spec.group,
            mode,
            entries,
        })
    }

    /// Apply every entry in order.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::Apply`] on the first failed lookup or
    /// filesystem operation; later entries are not touched.
    pub fn apply(&self, ctx: &Context<'_>) -> Result<ResourceChange> {
        match self.state {
            State::Absent => self.remove_all(ctx),
            State::Present => self.place_all(ctx),
        }
    }

    fn remove_all(&self, ctx: &Context<'_>) -> Result<ResourceChange> {
        for entry in &self.entries {
            ctx.log
                .info(&format!("removing {}", entry.destination.display()));
            ctx.fs
                .remove(&entry.destination)
                .map_err(|e| BuildError::from_collaborator(&self.id, &e))?;
        }
        Ok(if self.entries.is_empty() {
            ResourceChange::AlreadyCorrect
        } else {
            ResourceChange::Applied
        })
    }

    fn place_all(&self, ctx: &Context<'_>) -> Result<ResourceChange> {
        let uid = ctx
            .identity
            .uid_for_user(&self.owner)
            .map_err(|e| BuildError::from_collaborator(&self.id, &e))?;
        let gid = ctx
            .identity
            .gid_for_group(&self.group)
            .map_err(|e| BuildError::from_collaborator(&self.id, &e))?;

        let mut change = ResourceChange::AlreadyCorrect;
        for entry in &self.entries {
            change = change.merge(self.place(ctx, entry, uid, gid)?);
        }
        Ok(change)
    }

    fn place(
        &self,
        ctx: &Context<'_>,
        entry: &FilePlacement,
        uid: u32,
        gid: u32,
    ) -> Result<ResourceChange> {
        let dst = &entry.destination;
        let collaborator = |e: anyhow::Error| BuildError::from_collaborator(&self.id, &e);

        let change = match &entry.source {
            Some(src) => {
                let wanted = ctx.fs.checksum(src).map_err(collaborator)?;
                let current = if ctx.fs.exists(dst) {
                    Some(ctx.fs.checksum(dst).map_err(collaborator)?)
                } else {
                    None
                };
                if current.as_deref() == Some(wanted.as_str()) {
                    ctx.log.debug(&format!("{}: content up to date", dst.display()));
                    ResourceChange::AlreadyCorrect
                } else {
                    ctx.log
                        .info(&format!("copying {} to {}", src.display(), dst.display()));
                    ctx.fs.copy(src, dst).map_err(collaborator)?;
                    ResourceChange::Applied
                }
            }
            None if ctx.fs.exists(dst) => ResourceChange::AlreadyCorrect,
            None => {
                return Err(BuildError::apply(
                    &self.id,
                    format!("{} does not exist and no source is given", dst.display()),
                ));
            }
        };

        ctx.log.debug(&format!(
            "{}: mode {} owner {}:{}",
            dst.display(),
            self.mode,
            self.owner,
            self.group
        ));
        ctx.fs.chmod(dst, self.mode.bits()).map_err(collaborator)?;
        ctx.fs.chown(dst, uid, gid).map_err(collaborator)?;
        Ok(change)
    }
}

/// Join a relative `source` onto `files_dir`, refusing paths that leave it.
fn resolve_source(id: &str, index: usize, files_dir: &Path, source: &Path) -> Result<PathBuf> {
    let escapes = source
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if escapes || source.as_os_str().is_empty() {
        return Err(BuildError::schema(
            id,
            format!(
                "files entry {index}: source '{}' must be a relative path inside the brick set's files directory",
                source.display()
            ),
        ));
    }
    Ok(files_dir.join(source))
}
