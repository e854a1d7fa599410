//! Linux namespace management for container isolation.
//!
//! The supervisor requests all isolation domains with a single
//! `unshare(2)` call in the parent, before forking. That ordering is what
//! makes the child land as PID 1 of the fresh PID namespace, and the
//! single syscall keeps the request atomic: on rejection no child exists
//! and no partial isolation state is left behind.

pub mod uts;

use confine_common::error::{ConfineError, Result};
use nix::sched::{CloneFlags, unshare};

/// Configuration for which namespaces to create.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone)]
pub struct NamespaceConfig {
    /// Isolate UTS (hostname/domain-name) namespace.
    pub uts: bool,
    /// Isolate mount namespace.
    pub mount: bool,
    /// Isolate PID namespace.
    pub pid: bool,
    /// Isolate network namespace.
    pub network: bool,
}

impl Default for NamespaceConfig {
    fn default() -> Self {
        Self { uts: true, mount: true, pid: true, network: true }
    }
}

impl NamespaceConfig {
    fn clone_flags(&self) -> CloneFlags {
        let mut flags = CloneFlags::empty();
        if self.uts {
            flags |= CloneFlags::CLONE_NEWUTS;
        }
        if self.mount {
            flags |= CloneFlags::CLONE_NEWNS;
        }
        if self.pid {
            flags |= CloneFlags::CLONE_NEWPID;
        }
        if self.network {
            flags |= CloneFlags::CLONE_NEWNET;
        }
        flags
    }
}

/// Creates all configured namespaces for the calling process.
///
/// Must run before `fork(2)`: a new PID namespace applies only to
/// children created afterwards, never to the caller itself.
///
/// # Errors
///
/// Returns [`ConfineError::Isolation`] if the kernel rejects the request,
/// typically for lack of privilege.
pub fn create_namespaces(config: &NamespaceConfig) -> Result<()> {
    let flags = config.clone_flags();
    tracing::info!(config = ?config, "creating namespaces");
    unshare(flags).map_err(|e| ConfineError::Isolation {
        message: format!("unshare rejected ({flags:?}): {e}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_requests_all_four_domains() {
        let flags = NamespaceConfig::default().clone_flags();
        assert!(flags.contains(CloneFlags::CLONE_NEWUTS));
        assert!(flags.contains(CloneFlags::CLONE_NEWNS));
        assert!(flags.contains(CloneFlags::CLONE_NEWPID));
        assert!(flags.contains(CloneFlags::CLONE_NEWNET));
    }

    #[test]
    fn disabled_domains_are_left_out() {
        let config = NamespaceConfig { network: false, ..NamespaceConfig::default() };
        let flags = config.clone_flags();
        assert!(!flags.contains(CloneFlags::CLONE_NEWNET));
        assert!(flags.contains(CloneFlags::CLONE_NEWPID));
    }
}
