//! Brick-set definition files and the resource definitions they hold.
use serde_yaml::{Mapping, Value};
use std::path::{Path, PathBuf};

use super::document::load_document;
use super::manifest::validate_brick_set_name;
use crate::error::{BuildError, Result};
use crate::resources::ResourceKind;

/// Directory under the root holding one sub-directory per brick set.
pub const BRICK_SETS_DIR: &str = "brick_sets";

/// Directory inside a brick set holding file-resource sources.
pub const FILES_DIR: &str = "files";

/// Candidate definition file names inside a brick set, in lookup order.
pub const DEFINITION_FILES: [&str; 3] = ["bricks.yaml", "bricks.yml", "bricks.toml"];

/// One declared resource: its name, kind and raw attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceDefinition {
    name: String,
    id: String,
    kind: ResourceKind,
    attributes: Mapping,
}

impl ResourceDefinition {
    /// Parse the definition `name: body` of brick set `brick_set`.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::Load`] if the name or attribute keys are not
    /// strings or the body is not a mapping, [`BuildError::Schema`] if `type`
    /// is missing, and [`BuildError::UnknownKind`] if it is not registered.
    pub fn parse(brick_set: &str, path: &Path, name: &Value, body: Value) -> Result<Self> {
        let name = name
            .as_str()
            .ok_or_else(|| BuildError::load(path, format!("resource name {name:?} is not a string")))?
            .to_string();
        let id = format!("{brick_set}/{name}");

        let Value::Mapping(attributes) = body else {
            return Err(BuildError::load(
                path,
                format!("resource '{name}' must be a mapping of attributes"),
            ));
        };
        if let Some(key) = attributes.keys().find(|k| !k.is_string()) {
            return Err(BuildError::load(
                path,
                format!("resource '{name}' has a non-string attribute name {key:?}"),
            ));
        }

        let kind = match attributes.get("type") {
            None => return Err(BuildError::schema(&id, "compulsory attribute 'type' is not provided")),
            Some(Value::String(kind)) => ResourceKind::parse(kind).ok_or_else(|| {
                BuildError::UnknownKind {
                    resource: id.clone(),
                    kind: kind.clone(),
                    known: ResourceKind::names(),
                }
            })?,
            Some(other) => {
                return Err(BuildError::schema(
                    &id,
                    format!("attribute 'type' must be a string, got {other:?}"),
                ));
            }
        };

        Ok(Self {
            name,
            id,
            kind,
            attributes,
        })
    }

    /// Resource name as declared in the brick set.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Qualified name, `<brick set>/<resource>`, used in logs and errors.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Resolved resource kind.
    #[must_use]
    pub const fn kind(&self) -> ResourceKind {
        self.kind
    }

    /// Raw attribute mapping, `type` included.
    #[must_use]
    pub const fn attributes(&self) -> &Mapping {
        &self.attributes
    }

    /// Names of the provided attributes, in declaration order.
    pub fn attribute_names(&self) -> impl Iterator<Item = &str> {
        self.attributes.keys().filter_map(Value::as_str)
    }
}

/// A named, ordered collection of resource definitions.
#[derive(Debug, Clone, PartialEq)]
pub struct BrickSet {
    name: String,
    dir: PathBuf,
    resources: Vec<ResourceDefinition>,
}

impl BrickSet {
    /// Load brick set `name` from `<root>/brick_sets/<name>/`.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::Load`] if no definition file exists or it is
    /// malformed, and the errors of [`ResourceDefinition::parse`].
    pub fn load(root: &Path, name: &str) -> Result<Self> {
        let dir = root.join(BRICK_SETS_DIR).join(name);
        validate_brick_set_name(name).map_err(|reason| BuildError::load(&dir, reason))?;
        let path = DEFINITION_FILES
            .iter()
            .map(|file| dir.join(file))
            .find(|candidate| candidate.is_file())
            .ok_or_else(|| {
                BuildError::load(
                    &dir,
                    format!(
                        "brick set '{name}' has no definition file (expected one of {})",
                        DEFINITION_FILES.join(", ")
                    ),
                )
            })?;
        let document = load_document(&path)?;
        Self::from_document(name, dir, &path, document)
    }

    /// Build a brick set from an already-parsed definition document.
    ///
    /// An empty document is an empty brick set.
    ///
    /// # Errors
    ///
    /// See [`BrickSet::load`].
    pub fn from_document(name: &str, dir: PathBuf, path: &Path, document: Value) -> Result<Self> {
        let entries = match document {
            Value::Null => Mapping::new(),
            Value::Mapping(entries) => entries,
            other => {
                return Err(BuildError::load(
                    path,
                    format!("expected a mapping of resource name to definition, got {other:?}"),
                ));
            }
        };

        let resources = entries
            .into_iter()
            .map(|(resource, body)| ResourceDefinition::parse(name, path, &resource, body))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            name: name.to_string(),
            dir,
            resources,
        })
    }

    /// Brick-set name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Directory of this brick set.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Directory file-resource sources are resolved against.
    #[must_use]
    pub fn files_dir(&self) -> PathBuf {
        self.dir.join(FILES_DIR)
    }

    /// Resource definitions, in declaration order.
    #[must_use]
    pub fn resources(&self) -> &[ResourceDefinition] {
        &self.resources
    }
}
