//! Command resource: shell command lines run in order.
use serde::Deserialize;

use super::ResourceChange;
use super::schema::Schema;
use crate::context::Context;
use crate::error::{BuildError, Result};

/// Attribute schema of `type: command`.
pub const SCHEMA: Schema = Schema {
    supported: &["type", "commands"],
    compulsory: &["type", "commands"],
};

/// Raw attributes of a command definition.
#[derive(Debug, Clone, Deserialize)]
pub struct CommandSpec {
    /// Shell command lines, in order.
    pub commands: Vec<String>,
}

/// A validated `type: command` resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResource {
    /// Qualified resource name.
    pub id: String,
    /// Shell command lines, in order.
    pub commands: Vec<String>,
}

impl CommandResource {
    /// Build the resource from its parsed attributes.
    #[must_use]
    pub fn new(id: &str, spec: CommandSpec) -> Self {
        Self {
            id: id.to_string(),
            commands: spec.commands,
        }
    }

    /// Run each command through `sh -c`, stopping at the first failure.
    ///
    /// Commands are not idempotent by themselves, so a resource with at
    /// least one command always reports [`ResourceChange::Applied`].
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::Apply`] with the exit code and standard error
    /// of the first command that fails.
    pub fn apply(&self, ctx: &Context<'_>) -> Result<ResourceChange> {
        for command in &self.commands {
            ctx.log.info(&format!("running: {command}"));
            let result = ctx
                .executor
                .shell(command)
                .map_err(|e| BuildError::from_collaborator(&self.id, &e))?;

            for line in result.stdout.lines().chain(result.stderr.lines()) {
                ctx.log.debug(line);
            }

            if !result.success {
                let status = result
                    .code
                    .map_or_else(|| "terminated by signal".to_string(), |c| format!("exit code {c}"));
                let stderr = result.stderr.trim();
                let reason = if stderr.is_empty() {
                    format!("command `{command}` failed with {status}")
                } else {
                    format!("command `{command}` failed with {status}: {stderr}")
                };
                return Err(BuildError::apply(&self.id, reason));
            }
        }

        Ok(if self.commands.is_empty() {
            ResourceChange::AlreadyCorrect
        } else {
            ResourceChange::Applied
        })
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::resources::test_helpers::{Harness, MockExecutor};

    fn resource(commands: &[&str]) -> CommandResource {
        CommandResource {
            id: "db/migrate".to_string(),
            commands: commands.iter().map(ToString::to_string).collect(),
        }
    }

    #[test]
    fn runs_commands_in_order() {
        let mut harness = Harness::new();
        harness.executor = MockExecutor::with_responses(vec![
            (true, "one".to_string()),
            (true, "two".to_string()),
        ]);

        let change = resource(&["echo one", "echo two"]).apply(&harness.ctx()).unwrap();

        assert_eq!(change, ResourceChange::Applied);
        assert_eq!(harness.executor.calls(), vec!["echo one", "echo two"]);
        assert!(harness.log.contains("one"));
    }

    #[test]
    fn non_zero_exit_stops_remaining_commands() {
        let mut harness = Harness::new();
        harness.executor = MockExecutor::with_exit_codes(vec![
            (Some(0), String::new()),
            (Some(1), String::new()),
            (Some(0), String::new()),
        ]);

        let err = resource(&["true", "exit 1", "echo never"])
            .apply(&harness.ctx())
            .unwrap_err();

        insta::assert_snapshot!(err.to_string(), @"failed to apply 'db/migrate': command `exit 1` failed with exit code 1");
        assert_eq!(harness.executor.call_count(), 2);
    }

    #[test]
    fn signal_termination_is_reported() {
        let mut harness = Harness::new();
        harness.executor = MockExecutor::with_exit_codes(vec![(None, String::new())]);

        let err = resource(&["sleep 100"]).apply(&harness.ctx()).unwrap_err();
        assert!(err.to_string().contains("terminated by signal"), "got: {err}");
    }

    #[test]
    fn exit_code_is_reported_verbatim() {
        let mut harness = Harness::new();
        harness.executor = MockExecutor::with_exit_codes(vec![(Some(42), String::new())]);

        let err = resource(&["exit 42"]).apply(&harness.ctx()).unwrap_err();
        assert!(err.to_string().contains("exit code 42"), "got: {err}");
    }

    #[test]
    fn empty_command_list_changes_nothing() {
        let harness = Harness::new();
        let change = resource(&[]).apply(&harness.ctx()).unwrap();
        assert_eq!(change, ResourceChange::AlreadyCorrect);
        assert_eq!(harness.executor.call_count(), 0);
    }
}
