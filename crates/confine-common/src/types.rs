//! Domain primitive types for a single container run.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ConfineError, Result};

/// Hostname of a container.
///
/// Doubles as the container's identity tag: it names the rootfs directory
/// under `Containers/` and the `limit-<hostname>` cgroup. Validation
/// rejects anything that would not survive verbatim as a path component,
/// so no sanitization happens downstream.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Hostname(String);

impl Hostname {
    /// Maximum accepted length, matching the kernel's `HOST_NAME_MAX`.
    pub const MAX_LEN: usize = 64;

    /// Creates a validated hostname.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is empty, longer than
    /// [`Hostname::MAX_LEN`], starts with `-`, or contains characters
    /// outside `[A-Za-z0-9_-]`.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.is_empty() || name.len() > Self::MAX_LEN {
            return Err(ConfineError::Config {
                message: format!("hostname must be 1-{} characters", Self::MAX_LEN),
            });
        }
        if name.starts_with('-')
            || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(ConfineError::Config {
                message: format!("invalid hostname {name:?}: use letters, digits, '-' or '_'"),
            });
        }
        Ok(Self(name))
    }

    /// Returns the inner string representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Hostname {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Memory ceiling for a container, in whole megabytes.
///
/// A zero limit never constructs: [`MemoryLimit::from_mb`] returns `None`,
/// and callers treat the absence of a limit as "no cgroup at all".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryLimit(u64);

impl MemoryLimit {
    /// Creates a limit from a megabyte count; `None` when `mb` is zero.
    #[must_use]
    pub fn from_mb(mb: u64) -> Option<Self> {
        (mb > 0).then_some(Self(mb))
    }

    /// Returns the limit in megabytes.
    #[must_use]
    pub const fn as_mb(self) -> u64 {
        self.0
    }

    /// Returns the limit in bytes, as written to cgroup control files.
    #[must_use]
    pub const fn as_bytes(self) -> u64 {
        self.0 * 1024 * 1024
    }
}

impl fmt::Display for MemoryLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} MiB", self.0)
    }
}

/// Immutable description of a single container run.
///
/// Built once from invocation input; nothing mutates it after the run
/// begins. The child and parent sides of the fork both read from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerSpec {
    hostname: Hostname,
    memory_limit: Option<MemoryLimit>,
}

impl ContainerSpec {
    /// Creates a spec from a validated hostname and an optional limit.
    #[must_use]
    pub const fn new(hostname: Hostname, memory_limit: Option<MemoryLimit>) -> Self {
        Self { hostname, memory_limit }
    }

    /// The container's hostname and identity tag.
    #[must_use]
    pub const fn hostname(&self) -> &Hostname {
        &self.hostname
    }

    /// The requested memory ceiling, if any.
    #[must_use]
    pub const fn memory_limit(&self) -> Option<MemoryLimit> {
        self.memory_limit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hostname_accepts_plain_tags() {
        for name in ["demo", "web-1", "box_2", "A"] {
            assert!(Hostname::new(name).is_ok(), "{name} should be valid");
        }
    }

    #[test]
    fn hostname_rejects_path_hostile_input() {
        for name in ["", "a/b", "..", "has space", "-leading", "a".repeat(65).as_str()] {
            assert!(Hostname::new(name).is_err(), "{name:?} should be rejected");
        }
    }

    #[test]
    fn zero_memory_limit_means_no_limit() {
        assert!(MemoryLimit::from_mb(0).is_none());
    }

    #[test]
    fn memory_limit_converts_to_bytes() {
        let limit = MemoryLimit::from_mb(256).expect("non-zero limit");
        assert_eq!(limit.as_mb(), 256);
        assert_eq!(limit.as_bytes(), 268_435_456);
    }

    #[test]
    fn spec_is_plain_data() {
        let spec = ContainerSpec::new(
            Hostname::new("demo").expect("valid hostname"),
            MemoryLimit::from_mb(256),
        );
        assert_eq!(spec.hostname().as_str(), "demo");
        assert_eq!(spec.memory_limit().map(MemoryLimit::as_mb), Some(256));
    }
}
