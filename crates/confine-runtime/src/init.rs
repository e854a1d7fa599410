//! Child-side container initialization.
//!
//! Runs after the fork, inside the freshly unshared namespaces. The
//! sequence is a linear state machine with no retries — every step's
//! failure is fatal and terminates the child before it can become the
//! container's PID 1:
//!
//! 1. set the container hostname
//! 2. bind the memory cgroup (when a limit was requested)
//! 3. privatize mount propagation
//! 4. switch root into the provisioned rootfs
//! 5. mount `/proc`
//! 6. hand over to the container shell
//!
//! The handover replaces the process image in place; no code in this
//! module survives it, so there is deliberately no cleanup after step 6.

use std::path::{Path, PathBuf};

use confine_common::constants;
use confine_common::error::Result;
use confine_common::types::ContainerSpec;
use confine_core::cgroup::{self, MemoryGroup};
use confine_core::filesystem::{mount, root};
use confine_core::namespace::uts;

/// Outcome of the final exec step.
///
/// A real exec never returns, so [`Handover::Replaced`] is only ever
/// observed through the would-exec sentinel substituted in test builds;
/// in production the only value a caller can see is the `Err` side.
#[derive(Debug, PartialEq, Eq)]
pub enum Handover {
    /// The process image was replaced by the container shell.
    Replaced,
}

/// State accumulated across init steps.
///
/// Threaded explicitly between steps instead of living in ambient
/// process state, so each step's inputs are visible in its signature.
#[derive(Debug, Default)]
struct InitContext {
    cgroup: Option<MemoryGroup>,
    rootfs: PathBuf,
}

/// Runs the full child-side sequence and hands over to the shell.
///
/// On success this function does not return in any meaningful sense:
/// the OS process continues as the container's PID 1 running
/// [`constants::CONTAINER_SHELL`].
///
/// # Errors
///
/// Propagates the first failing step's error; the caller (the forked
/// child in the supervisor) exits non-zero with it.
pub fn run(spec: &ContainerSpec, rootfs: &Path) -> Result<Handover> {
    let mut ctx = InitContext { rootfs: rootfs.to_path_buf(), ..InitContext::default() };

    set_identity(spec)?;
    bind_cgroup(spec, &mut ctx, Path::new(constants::CGROUP_ROOT))?;
    mount::make_root_private()?;
    switch_root(&ctx)?;
    mount::mount_proc()?;

    tracing::debug!(
        rootfs = %ctx.rootfs.display(),
        cgroup = ?ctx.cgroup.as_ref().map(MemoryGroup::path),
        "container prepared, handing over"
    );
    hand_over(Path::new(constants::CONTAINER_SHELL))
}

fn set_identity(spec: &ContainerSpec) -> Result<()> {
    uts::set_hostname(spec.hostname())
}

/// Applies the memory ceiling and binds this process into the group.
///
/// A run without a limit skips the limiter entirely — no group directory
/// is created. The handle is kept in the context so the group's identity
/// is recorded up to the handover; the kernel keeps the membership alive
/// across exec.
fn bind_cgroup(spec: &ContainerSpec, ctx: &mut InitContext, cgroup_root: &Path) -> Result<()> {
    if let Some(limit) = spec.memory_limit() {
        let group = cgroup::apply_memory_limit(cgroup_root, spec.hostname().as_str(), limit)?;
        ctx.cgroup = Some(group);
    }
    Ok(())
}

/// Switches into the provisioned rootfs.
///
/// The rootfs existing is a precondition, not something provisioned
/// lazily here; its absence fails fast before any chroot side effect.
fn switch_root(ctx: &InitContext) -> Result<()> {
    root::enter(&ctx.rootfs)
}

/// Replaces the process image with the interactive container shell.
///
/// Terminal, non-returning transition: after a successful exec the OS
/// process is the container's PID 1 and nothing from this module remains.
/// Test builds substitute a would-exec sentinel so the non-returning
/// contract is assertable without losing the test runner.
#[cfg(not(test))]
fn hand_over(shell: &Path) -> Result<Handover> {
    use std::ffi::CString;
    use std::os::unix::ffi::OsStrExt;

    use confine_common::error::ConfineError;

    let program =
        CString::new(shell.as_os_str().as_bytes()).map_err(|e| ConfineError::Handover {
            shell: shell.to_path_buf(),
            message: format!("invalid shell path: {e}"),
        })?;
    let argv = [program.clone()];

    match nix::unistd::execv(&program, &argv) {
        Ok(never) => match never {},
        Err(errno) => Err(ConfineError::Handover {
            shell: shell.to_path_buf(),
            message: errno.to_string(),
        }),
    }
}

/// Would-exec sentinel: stands in for `execv` under test.
#[cfg(test)]
fn hand_over(shell: &Path) -> Result<Handover> {
    tracing::debug!(shell = %shell.display(), "would exec (test sentinel)");
    Ok(Handover::Replaced)
}

#[cfg(test)]
mod tests {
    use super::*;
    use confine_common::types::{Hostname, MemoryLimit};
    use tempfile::TempDir;

    fn spec(limit_mb: u64) -> ContainerSpec {
        ContainerSpec::new(Hostname::new("demo").unwrap(), MemoryLimit::from_mb(limit_mb))
    }

    #[test]
    fn handover_sentinel_reports_replaced() {
        let outcome = hand_over(Path::new(constants::CONTAINER_SHELL)).unwrap();
        assert_eq!(outcome, Handover::Replaced);
    }

    #[test]
    fn unlimited_run_creates_no_cgroup() {
        let cgroup_root = TempDir::new().unwrap();
        let mut ctx = InitContext::default();

        bind_cgroup(&spec(0), &mut ctx, cgroup_root.path()).unwrap();

        assert!(ctx.cgroup.is_none());
        assert!(!cgroup_root.path().join("limit-demo").exists());
        assert!(!cgroup_root.path().join("memory/limit-demo").exists());
    }

    #[test]
    fn limited_run_binds_current_process() {
        let cgroup_root = TempDir::new().unwrap();
        let mut ctx = InitContext::default();

        bind_cgroup(&spec(64), &mut ctx, cgroup_root.path()).unwrap();

        let group = ctx.cgroup.as_ref().unwrap();
        let members =
            std::fs::read_to_string(group.path().join(group.version().membership_file()))
                .unwrap();
        assert_eq!(members, std::process::id().to_string());
    }

    #[test]
    fn switch_root_fails_before_handover_when_rootfs_is_missing() {
        let ctx = InitContext {
            rootfs: PathBuf::from("Containers/never-provisioned"),
            ..InitContext::default()
        };
        let err = switch_root(&ctx).unwrap_err();
        assert!(matches!(err, confine_common::error::ConfineError::RootfsMissing { .. }));
    }
}
