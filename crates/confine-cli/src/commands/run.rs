//! `confine run` — provision and run a single container.

use clap::Args;
use confine_common::error::ConfineError;
use confine_common::types::{ContainerSpec, Hostname, MemoryLimit};

/// Arguments for the `run` command.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Hostname for the container; also its identity tag, naming the
    /// rootfs directory and the cgroup.
    pub hostname: String,

    /// Memory ceiling in megabytes. Omit (or pass 0) for no limit.
    pub memory_limit_mb: Option<u64>,
}

/// Executes the `run` command.
///
/// Checks privilege before any other work, builds the immutable run
/// spec, and hands control to the supervisor. The returned code is the
/// contained process's exit status.
///
/// # Errors
///
/// Returns an error on missing privilege, invalid input, or any fatal
/// setup failure in the supervisor.
pub fn execute(args: RunArgs) -> anyhow::Result<i32> {
    ensure_root()?;

    let hostname = Hostname::new(args.hostname)?;
    let limit = args.memory_limit_mb.and_then(MemoryLimit::from_mb);
    let spec = ContainerSpec::new(hostname, limit);
    tracing::info!(hostname = %spec.hostname(), limit = ?spec.memory_limit(), "starting run");

    let code = confine_runtime::supervisor::run(&spec)?;
    eprintln!("container exited with code {code}");
    Ok(code)
}

/// Containers need root-equivalent privilege for namespaces, chroot,
/// and cgroup writes; fail before touching anything if we lack it.
fn ensure_root() -> anyhow::Result<()> {
    if nix::unistd::geteuid().is_root() {
        Ok(())
    } else {
        Err(ConfineError::Privilege { message: "run me as root (sudo)".into() }.into())
    }
}
