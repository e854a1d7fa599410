//! Parent-side container lifecycle supervision.
//!
//! The supervisor provisions the rootfs, requests the namespaces, forks,
//! and then does exactly one thing: block until the child terminates.
//! There is no timeout, no polling, and no cancellation path — stopping a
//! running container means terminating it externally.

use std::path::Path;

use confine_common::constants;
use confine_common::error::{ConfineError, Result};
use confine_common::types::ContainerSpec;
use confine_core::cgroup;
use confine_core::filesystem::provision;
use confine_core::namespace::{self, NamespaceConfig};
use nix::sys::wait::{WaitStatus, waitpid};
use nix::unistd::{ForkResult, Pid, fork};

/// Provisions, isolates, forks, and supervises one container run.
///
/// Returns the contained process's exit code so the caller can mirror it
/// as its own, making the run's outcome observable to whoever invoked
/// us. The forked child never returns from this function: it either
/// becomes the container's PID 1 or exits 1 on an init failure.
///
/// # Errors
///
/// Returns an error for any fatal setup failure — provisioning,
/// namespace creation, fork, or the wait itself. Cgroup cleanup failures
/// are never among them.
pub fn run(spec: &ContainerSpec) -> Result<i32> {
    let base = constants::base_image_dir();
    let rootfs = constants::rootfs_dir(spec.hostname().as_str());
    provision::provision(&base, &rootfs)?;

    namespace::create_namespaces(&NamespaceConfig::default())?;

    // SAFETY: the supervisor is single-threaded, so the child cannot
    // inherit a poisoned lock or mid-update allocator state; it only
    // runs the init sequence and exec.
    match unsafe { fork() }.map_err(|e| ConfineError::Isolation {
        message: format!("fork failed: {e}"),
    })? {
        ForkResult::Child => {
            // PID 1 of the new namespace from here on. Errors cannot
            // propagate across the process boundary, so report and exit.
            let code = match crate::init::run(spec, &rootfs) {
                Ok(crate::init::Handover::Replaced) => 0,
                Err(err) => {
                    eprintln!("error: {err}");
                    1
                }
            };
            std::process::exit(code);
        }
        ForkResult::Parent { child } => supervise(child, spec),
    }
}

/// Blocks until the child exits, then reports and cleans up.
fn supervise(child: Pid, spec: &ContainerSpec) -> Result<i32> {
    tracing::info!(pid = child.as_raw(), hostname = %spec.hostname(), "container running");

    let waited = waitpid(child, None);

    // Cleanup happens whether or not the wait decoded cleanly; it is
    // advisory and must never mask the child's outcome.
    cgroup::remove_stale_groups(Path::new(constants::CGROUP_ROOT), spec.hostname().as_str());

    let status = waited.map_err(|e| ConfineError::Isolation {
        message: format!("waitpid({child}) failed: {e}"),
    })?;
    let code = exit_code(status);
    tracing::info!(code, hostname = %spec.hostname(), "container exited");
    Ok(code)
}

/// Decodes a wait status into the exit code the supervisor mirrors.
///
/// Normal exits pass their code through; signal deaths map to 128+signo,
/// the convention shells use for the same situation.
#[must_use]
pub fn exit_code(status: WaitStatus) -> i32 {
    match status {
        WaitStatus::Exited(_, code) => code,
        WaitStatus::Signaled(_, signal, _) => 128 + signal as i32,
        // waitpid without WUNTRACED/WCONTINUED only yields the two arms
        // above for a terminated child.
        _ => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nix::sys::signal::Signal;

    #[test]
    fn exit_code_mirrors_normal_exit() {
        assert_eq!(exit_code(WaitStatus::Exited(Pid::from_raw(100), 0)), 0);
        assert_eq!(exit_code(WaitStatus::Exited(Pid::from_raw(100), 7)), 7);
    }

    #[test]
    fn exit_code_maps_signal_death_to_128_plus_signo() {
        let status = WaitStatus::Signaled(Pid::from_raw(100), Signal::SIGKILL, false);
        assert_eq!(exit_code(status), 137);
    }
}
