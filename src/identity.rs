//! User and group name resolution.
use anyhow::{Result, bail};

use crate::exec::Executor;

/// Resolves user and group names to numeric ids.
#[cfg_attr(test, mockall::automock)]
pub trait IdentityResolver {
    /// Numeric uid of the user `name`.
    ///
    /// # Errors
    ///
    /// Returns an error if no such user exists or the lookup fails.
    fn uid_for_user(&self, name: &str) -> Result<u32>;

    /// Numeric gid of the group `name`.
    ///
    /// # Errors
    ///
    /// Returns an error if no such group exists or the lookup fails.
    fn gid_for_group(&self, name: &str) -> Result<u32>;
}

/// Production [`IdentityResolver`] backed by `getent`.
///
/// Names that are already numeric are returned as-is without a lookup.
#[derive(Debug)]
pub struct SystemIdentityResolver<'a> {
    executor: &'a dyn Executor,
}

impl<'a> SystemIdentityResolver<'a> {
    /// Create a resolver that runs `getent` through `executor`.
    #[must_use]
    pub const fn new(executor: &'a dyn Executor) -> Self {
        Self { executor }
    }

    fn lookup(&self, database: &str, name: &str) -> Result<u32> {
        if let Ok(id) = name.parse::<u32>() {
            return Ok(id);
        }
        let result = self.executor.run_unchecked("getent", &[database, name])?;
        if !result.success {
            let what = if database == "passwd" { "user" } else { "group" };
            bail!("unknown {what} '{name}'");
        }
        parse_id(&result.stdout)
            .ok_or_else(|| anyhow::anyhow!("unexpected getent {database} output for '{name}'"))
    }
}

/// Extract the numeric id (third `:`-separated field) from a `getent` line.
fn parse_id(line: &str) -> Option<u32> {
    line.lines().next()?.split(':').nth(2)?.trim().parse().ok()
}

impl IdentityResolver for SystemIdentityResolver<'_> {
    fn uid_for_user(&self, name: &str) -> Result<u32> {
        self.lookup("passwd", name)
    }

    fn gid_for_group(&self, name: &str) -> Result<u32> {
        self.lookup("group", name)
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::resources::test_helpers::MockExecutor;

    #[test]
    fn parse_id_reads_third_field() {
        assert_eq!(parse_id("www-data:x:33:33:www-data:/var/www:/usr/sbin/nologin\n"), Some(33));
        assert_eq!(parse_id("adm:x:4:syslog\n"), Some(4));
        assert_eq!(parse_id("garbage"), None);
    }

    #[test]
    fn uid_for_user_uses_getent_passwd() {
        let executor = MockExecutor::ok("root:x:0:0:root:/root:/bin/bash\n");
        let resolver = SystemIdentityResolver::new(&executor);
        assert_eq!(resolver.uid_for_user("root").unwrap(), 0);
        assert_eq!(executor.call_count(), 1);
    }

    #[test]
    fn gid_for_group_uses_getent_group() {
        let executor = MockExecutor::ok("staff:x:50:\n");
        let resolver = SystemIdentityResolver::new(&executor);
        assert_eq!(resolver.gid_for_group("staff").unwrap(), 50);
    }

    #[test]
    fn numeric_names_skip_lookup() {
        let executor = MockExecutor::with_responses(vec![]);
        let resolver = SystemIdentityResolver::new(&executor);
        assert_eq!(resolver.uid_for_user("1000").unwrap(), 1000);
        assert_eq!(resolver.gid_for_group("100").unwrap(), 100);
        assert_eq!(executor.call_count(), 0);
    }

    #[test]
    fn unknown_user_is_error() {
        let executor = MockExecutor::fail();
        let resolver = SystemIdentityResolver::new(&executor);
        let err = resolver.uid_for_user("nobody-here").unwrap_err();
        assert_eq!(err.to_string(), "unknown user 'nobody-here'");
    }

    #[test]
    fn unknown_group_is_error() {
        let executor = MockExecutor::fail();
        let resolver = SystemIdentityResolver::new(&executor);
        let err = resolver.gid_for_group("no-group").unwrap_err();
        assert_eq!(err.to_string(), "unknown group 'no-group'");
    }
}
