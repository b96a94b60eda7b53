//! Collaborators supplying default field values.

use std::fmt::Debug;
use std::time::{SystemTime, UNIX_EPOCH};

/// Supplies the current deployment context, used as the default `source`.
///
/// The returned string is treated as opaque.
pub trait EnvironmentResolver: Debug + Send + Sync {
    fn current(&self) -> String;
}

/// Supplies the current Unix timestamp in seconds, used as the default `measure_time`.
pub trait Clock: Debug + Send + Sync {
    fn now(&self) -> u64;
}

/// An environment that never changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticEnvironment(String);

impl StaticEnvironment {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}

impl EnvironmentResolver for StaticEnvironment {
    fn current(&self) -> String {
        self.0.clone()
    }
}

/// Reads the environment name from a process variable on every call.
///
/// # Example
///
/// ```rust
/// use librato_types::{EnvironmentResolver, ProcessEnvironment};
///
/// let env = ProcessEnvironment::new("LIBRATO_TYPES_DOC_UNSET_VAR");
/// assert_eq!(env.current(), "development");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessEnvironment {
    var: String,
    fallback: String,
}

impl ProcessEnvironment {
    /// Default variable consulted by [`ProcessEnvironment::default`].
    pub const DEFAULT_VAR: &'static str = "APP_ENV";

    /// Environment reported when the variable is unset or empty.
    pub const DEFAULT_FALLBACK: &'static str = "development";

    /// Resolve from `var`, falling back to `"development"`.
    pub fn new(var: impl Into<String>) -> Self {
        Self {
            var: var.into(),
            fallback: Self::DEFAULT_FALLBACK.to_string(),
        }
    }

    /// Set the value reported when the variable is unset or empty.
    pub fn fallback(mut self, fallback: impl Into<String>) -> Self {
        self.fallback = fallback.into();
        self
    }
}

impl Default for ProcessEnvironment {
    fn default() -> Self {
        Self::new(Self::DEFAULT_VAR)
    }
}

impl EnvironmentResolver for ProcessEnvironment {
    fn current(&self) -> String {
        match std::env::var(&self.var) {
            Ok(value) if !value.is_empty() => value,
            _ => self.fallback.clone(),
        }
    }
}

/// Wall-clock time source.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs()
    }
}

/// A clock frozen at a given Unix timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub u64);

impl Clock for FixedClock {
    fn now(&self) -> u64 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_environment() {
        assert_eq!(StaticEnvironment::new("staging").current(), "staging");
    }

    #[test]
    fn test_process_environment_fallback() {
        let env = ProcessEnvironment::new("LIBRATO_TYPES_TEST_NEVER_SET").fallback("test");
        assert_eq!(env.current(), "test");
    }

    #[test]
    fn test_process_environment_reads_var() {
        // PATH is set in every test environment we run in.
        let env = ProcessEnvironment::new("PATH");
        assert_eq!(env.current(), std::env::var("PATH").unwrap());
    }

    #[test]
    fn test_system_clock_tracks_wall_time() {
        let expected = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs();
        let now = SystemClock.now();
        assert!(now.abs_diff(expected) <= 1);
    }
}
