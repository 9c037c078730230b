//! Resource kinds ("bricks") and their idempotent apply semantics.
pub mod command;
pub mod file;
pub mod package;
pub mod schema;

use serde::de::DeserializeOwned;
use serde_yaml::Value;

use crate::config::brick_set::{BrickSet, ResourceDefinition};
use crate::context::Context;
use crate::error::{BuildError, Result};
use crate::logging::Log;
use command::CommandResource;
use file::FileResource;
use package::PackageResource;
use schema::Schema;

/// Registered resource kinds, selected by a definition's `type` attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// System packages managed through a provider.
    Package,
    /// Files copied into place with enforced ownership and mode.
    File,
    /// Shell commands run in order.
    Command,
}

impl ResourceKind {
    /// Every registered kind, in registration order.
    pub const ALL: [Self; 3] = [Self::Package, Self::File, Self::Command];

    /// The `type` value selecting this kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Package => "package",
            Self::File => "file",
            Self::Command => "command",
        }
    }

    /// Look up the kind registered under `name`.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == name)
    }

    /// Comma-separated registered kind names.
    #[must_use]
    pub fn names() -> String {
        Self::ALL.map(Self::as_str).join(", ")
    }

    /// Static attribute schema of this kind.
    #[must_use]
    pub const fn schema(self) -> &'static Schema {
        match self {
            Self::Package => &package::SCHEMA,
            Self::File => &file::SCHEMA,
            Self::Command => &command::SCHEMA,
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Desired state shared by package and file resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// The resource must exist.
    Present,
    /// The resource must not exist.
    Absent,
}

impl State {
    const SUPPORTED: &'static str = "present, absent";

    /// Parse the `state` attribute of `resource`.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::UnsupportedState`] for anything other than
    /// `present` or `absent`.
    pub fn parse(resource: &str, state: &str) -> Result<Self> {
        match state {
            "present" => Ok(Self::Present),
            "absent" => Ok(Self::Absent),
            other => Err(BuildError::UnsupportedState {
                resource: resource.to_string(),
                state: other.to_string(),
                supported: Self::SUPPORTED.to_string(),
            }),
        }
    }
}

/// Result of applying a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceChange {
    /// At least one side effect was performed.
    Applied,
    /// The system already matched; nothing was changed.
    AlreadyCorrect,
}

impl ResourceChange {
    /// Combine two outcomes: applied if either was applied.
    #[must_use]
    pub const fn merge(self, other: Self) -> Self {
        match (self, other) {
            (Self::AlreadyCorrect, Self::AlreadyCorrect) => Self::AlreadyCorrect,
            _ => Self::Applied,
        }
    }
}

/// A validated, typed resource ready to apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resource {
    /// A `type: package` resource.
    Package(PackageResource),
    /// A `type: file` resource.
    File(FileResource),
    /// A `type: command` resource.
    Command(CommandResource),
}

impl Resource {
    /// Validate `definition` against its kind's schema and build the typed
    /// resource. No side effect happens here.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::Schema`] if the attribute set or any value is
    /// invalid, and [`BuildError::UnsupportedProvider`] or
    /// [`BuildError::UnsupportedState`] for unsupported choices.
    pub fn from_definition(
        definition: &ResourceDefinition,
        brick_set: &BrickSet,
        log: &dyn Log,
    ) -> Result<Self> {
        let kind = definition.kind();
        let schema = kind.schema();
        let provided: Vec<&str> = definition.attribute_names().collect();
        if !schema.validate(&provided, log) {
            return Err(BuildError::schema(
                definition.id(),
                format!(
                    "attributes [{}] do not match the {kind} schema (supported: {}; compulsory: {})",
                    provided.join(", "),
                    schema.supported.join(", "),
                    schema.compulsory.join(", "),
                ),
            ));
        }

        match kind {
            ResourceKind::Package => {
                PackageResource::new(definition.id(), typed(definition)?).map(Self::Package)
            }
            ResourceKind::File => {
                FileResource::new(definition.id(), typed(definition)?, &brick_set.files_dir())
                    .map(Self::File)
            }
            ResourceKind::Command => {
                Ok(Self::Command(CommandResource::new(definition.id(), typed(definition)?)))
            }
        }
    }

    /// Qualified name of this resource.
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Package(r) => &r.id,
            Self::File(r) => &r.id,
            Self::Command(r) => &r.id,
        }
    }

    /// Kind of this resource.
    #[must_use]
    pub const fn kind(&self) -> ResourceKind {
        match self {
            Self::Package(_) => ResourceKind::Package,
            Self::File(_) => ResourceKind::File,
            Self::Command(_) => ResourceKind::Command,
        }
    }

    /// Drive the system toward this resource's desired state.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::Apply`] on the first failed side effect; the
    /// remaining items of the resource are not attempted.
    pub fn apply(&self, ctx: &Context<'_>) -> Result<ResourceChange> {
        match self {
            Self::Package(r) => r.apply(ctx),
            Self::File(r) => r.apply(ctx),
            Self::Command(r) => r.apply(ctx),
        }
    }
}

/// Deserialize a definition's attributes into its kind's typed attribute struct.
fn typed<T: DeserializeOwned>(definition: &ResourceDefinition) -> Result<T> {
    serde_yaml::from_value(Value::Mapping(definition.attributes().clone()))
        .map_err(|e| BuildError::schema(definition.id(), e.to_string()))
}

/// Shared test helpers for resource unit tests.
///
/// Provides a configurable [`MockExecutor`] so individual resource test
/// modules do not have to duplicate the boilerplate.
#[cfg(test)]
#[allow(missing_debug_implementations, missing_docs)]
pub mod test_helpers {
    use crate::context::Context;
    use crate::exec::{ExecResult, Executor};
    use crate::identity::MockIdentityResolver;
    use crate::logging::MemoryLog;
    use crate::operations::MockFileSystemOps;
    use crate::resources::package::MockPackageManager;
    use std::collections::VecDeque;
    use std::sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    };

    /// A configurable mock executor for resource unit tests.
    ///
    /// Maintains a queue of `(exit code, stdout)` responses consumed in FIFO
    /// order.  When the queue is empty any call returns a failed response
    /// (exit code 1, stdout = `"unexpected call"`).
    ///
    /// Every call is recorded as its command line; see [`calls`](Self::calls).
    #[derive(Debug)]
    pub struct MockExecutor {
        responses: Mutex<VecDeque<(Option<i32>, String)>>,
        calls: Mutex<Vec<String>>,
        call_count: Arc<AtomicUsize>,
    }

    impl MockExecutor {
        /// Create a mock with a single successful response.
        #[must_use]
        pub fn ok(stdout: &str) -> Self {
            Self::with_responses(vec![(true, stdout.to_string())])
        }

        /// Create a mock with a single failed response (empty stdout).
        #[must_use]
        pub fn fail() -> Self {
            Self::with_responses(vec![(false, String::new())])
        }

        /// Create a mock from an ordered list of `(success, stdout)` pairs.
        #[must_use]
        pub fn with_responses(responses: Vec<(bool, String)>) -> Self {
            Self::with_exit_codes(
                responses
                    .into_iter()
                    .map(|(success, stdout)| (Some(i32::from(!success)), stdout))
                    .collect(),
            )
        }

        /// Create a mock from an ordered list of `(exit code, stdout)` pairs;
        /// `None` simulates termination by a signal.
        #[must_use]
        pub fn with_exit_codes(responses: Vec<(Option<i32>, String)>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                calls: Mutex::new(Vec::new()),
                call_count: Arc::new(AtomicUsize::new(0)),
            }
        }

        /// Return the total number of executor calls made so far.
        #[must_use]
        pub fn call_count(&self) -> usize {
            self.call_count.load(Ordering::SeqCst)
        }

        /// Command lines of every call made so far, in order.
        #[must_use]
        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().map_or_else(|_| vec![], |g| g.clone())
        }

        fn next(&self, command_line: String) -> ExecResult {
            self.call_count.fetch_add(1, Ordering::SeqCst);
            if let Ok(mut calls) = self.calls.lock() {
                calls.push(command_line);
            }
            let (code, stdout) = self.responses.lock().map_or_else(
                |_| (Some(1), "mutex poisoned".to_string()),
                |mut guard| {
                    guard
                        .pop_front()
                        .unwrap_or_else(|| (Some(1), "unexpected call".to_string()))
                },
            );
            ExecResult {
                stdout,
                stderr: String::new(),
                success: code == Some(0),
                code,
            }
        }
    }

    /// Owns one mock of every collaborator and lends them out as a
    /// [`Context`](crate::context::Context).
    ///
    /// The executor starts with an empty queue, so any unexpected command
    /// fails; set expectations on `apt` and `identity` before calling
    /// [`ctx`](Self::ctx).
    pub struct Harness {
        pub log: MemoryLog,
        pub executor: MockExecutor,
        pub fs: MockFileSystemOps,
        pub identity: MockIdentityResolver,
        pub apt: MockPackageManager,
    }

    impl Harness {
        /// Create a harness with nothing configured.
        #[must_use]
        pub fn new() -> Self {
            Self {
                log: MemoryLog::new(),
                executor: MockExecutor::with_responses(vec![]),
                fs: MockFileSystemOps::new(),
                identity: MockIdentityResolver::new(),
                apt: MockPackageManager::new(),
            }
        }

        /// Borrow every mock as a context.
        #[must_use]
        pub fn ctx(&self) -> Context<'_> {
            Context {
                log: &self.log,
                executor: &self.executor,
                fs: &self.fs,
                identity: &self.identity,
                apt: &self.apt,
            }
        }
    }

    fn command_line(program: &str, args: &[&str]) -> String {
        std::iter::once(program)
            .chain(args.iter().copied())
            .collect::<Vec<_>>()
            .join(" ")
    }

    impl Executor for MockExecutor {
        fn run_unchecked(&self, program: &str, args: &[&str]) -> anyhow::Result<ExecResult> {
            Ok(self.next(command_line(program, args)))
        }

        fn run_with_env(
            &self,
            program: &str,
            args: &[&str],
            _: &[(&str, &str)],
        ) -> anyhow::Result<ExecResult> {
            let result = self.next(command_line(program, args));
            if result.success {
                Ok(result)
            } else {
                anyhow::bail!("mock command failed")
            }
        }

        fn shell(&self, command: &str) -> anyhow::Result<ExecResult> {
            Ok(self.next(command.to_string()))
        }
    }
}

#[cfg(test)]
#[allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::panic
)]
mod tests {
    use super::*;
    use crate::config::document::{Format, parse_document};
    use crate::logging::MemoryLog;
    use std::path::{Path, PathBuf};

    fn brick_set(content: &str) -> BrickSet {
        let value = parse_document(content, Format::Yaml).unwrap();
        BrickSet::from_document(
            "web",
            PathBuf::from("/repo/brick_sets/web"),
            Path::new("/repo/brick_sets/web/bricks.yaml"),
            value,
        )
        .unwrap()
    }

    fn build_first(content: &str) -> (Result<Resource>, MemoryLog) {
        let set = brick_set(content);
        let log = MemoryLog::new();
        let resource = Resource::from_definition(&set.resources()[0], &set, &log);
        (resource, log)
    }

    #[test]
    fn kind_parse_round_trips_names() {
        for kind in ResourceKind::ALL {
            assert_eq!(ResourceKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(ResourceKind::parse("service"), None);
        assert_eq!(ResourceKind::names(), "package, file, command");
    }

    #[test]
    fn state_rejects_unknown_values() {
        assert_eq!(State::parse("r", "present").unwrap(), State::Present);
        assert_eq!(State::parse("r", "absent").unwrap(), State::Absent);
        let err = State::parse("web/pkgs", "latest").unwrap_err();
        insta::assert_snapshot!(
            err.to_string(),
            @"unsupported state 'latest' for 'web/pkgs': supported states are present, absent"
        );
    }

    #[test]
    fn change_merge() {
        use ResourceChange::{AlreadyCorrect, Applied};
        assert_eq!(AlreadyCorrect.merge(AlreadyCorrect), AlreadyCorrect);
        assert_eq!(AlreadyCorrect.merge(Applied), Applied);
        assert_eq!(Applied.merge(AlreadyCorrect), Applied);
    }

    #[test]
    fn command_definition_builds_command_resource() {
        let (resource, _) = build_first("hello:\n  type: command\n  commands: [\"echo hi\"]\n");
        let resource = resource.unwrap();
        assert_eq!(resource.kind(), ResourceKind::Command);
        assert_eq!(resource.id(), "web/hello");
    }

    #[test]
    fn unknown_attribute_is_schema_error_and_logged() {
        let (resource, log) = build_first(
            "hello:\n  type: command\n  commands: [\"true\"]\n  colour: blue\n",
        );
        let err = resource.unwrap_err();
        assert!(matches!(err, BuildError::Schema { .. }), "got {err:?}");
        assert!(log.contains("'colour'"), "got {:?}", log.entries());
    }

    #[test]
    fn missing_compulsory_attribute_is_schema_error() {
        let (resource, log) = build_first(
            "pkgs:\n  type: package\n  provider: apt\n  packages: [nginx]\n",
        );
        let err = resource.unwrap_err();
        assert!(matches!(err, BuildError::Schema { .. }), "got {err:?}");
        assert!(log.contains("'state'"));
    }

    #[test]
    fn ill_typed_value_is_schema_error() {
        let (resource, _) = build_first("hello:\n  type: command\n  commands: echo hi\n");
        let err = resource.unwrap_err();
        assert!(matches!(err, BuildError::Schema { .. }), "got {err:?}");
        assert!(err.to_string().contains("web/hello"));
    }

    fn file_with_mode(mode: &str) -> String {
        format!(
            "site:\n  type: file\n  state: present\n  owner: root\n  group: root\n  mode: {mode}\n  files:\n    - destination: /srv/index.html\n"
        )
    }

    #[test]
    fn prefixed_integer_modes_are_rejected() {
        for mode in ["0o644", "0o640"] {
            let (resource, _) = build_first(&file_with_mode(mode));
            let err = resource.unwrap_err();
            assert!(matches!(err, BuildError::Schema { .. }), "{mode}: {err:?}");
            assert!(err.to_string().contains("quote it"), "{mode}: {err}");
        }
    }

    #[test]
    fn bare_integer_mode_is_rejected() {
        let (resource, _) = build_first(&file_with_mode("644"));
        insta::assert_snapshot!(
            resource.unwrap_err().to_string(),
            @r#"schema error in 'web/site': mode was read as the number 644; quote it as octal text, e.g. "0644""#
        );
    }

    #[test]
    fn leading_zero_mode_is_read_as_text() {
        for (mode, bits) in [("0644", 0o644), ("\"0640\"", 0o640), ("\"0o755\"", 0o755)] {
            let (resource, _) = build_first(&file_with_mode(mode));
            let Resource::File(file) = resource.unwrap() else {
                panic!("expected file resource");
            };
            assert_eq!(file.mode.bits(), bits, "{mode}");
        }
    }

    #[test]
    fn file_sources_resolve_under_brick_set_files_dir() {
        let (resource, _) = build_first(
            "site:\n  type: file\n  state: present\n  owner: root\n  group: root\n  mode: \"0644\"\n  files:\n    - source: index.html\n      destination: /srv/index.html\n",
        );
        let Resource::File(file) = resource.unwrap() else {
            panic!("expected file resource");
        };
        assert_eq!(
            file.entries[0].source.as_deref(),
            Some(Path::new("/repo/brick_sets/web/files/index.html"))
        );
    }
}
