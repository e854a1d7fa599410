//! Mount operations for container filesystem setup.
//!
//! Two operations, both child-side: privatizing mount propagation before
//! the root switch, and mounting `/proc` after it.

use std::fs;
use std::path::Path;

use confine_common::error::{ConfineError, Result};
use nix::mount::{MsFlags, mount};

/// Marks the root mount as recursively private.
///
/// Must run before the root switch: with the default shared propagation,
/// mounts performed inside the container would leak back to the host's
/// mount table and vice versa.
///
/// # Errors
///
/// Returns [`ConfineError::Isolation`] if the remount fails.
pub fn make_root_private() -> Result<()> {
    mount(None::<&str>, "/", None::<&str>, MsFlags::MS_REC | MsFlags::MS_PRIVATE, None::<&str>)
        .map_err(|e| ConfineError::Isolation {
            message: format!("cannot make / private: {e}"),
        })?;
    tracing::debug!("root mount marked private");
    Ok(())
}

/// Mounts a `proc` filesystem at `/proc` inside the new root.
///
/// Creates the mount point first in case the base image ships without
/// one. With PID isolation active, the mount shows only the container's
/// own processes, so `ps` and friends work as expected.
///
/// # Errors
///
/// Returns [`ConfineError::Isolation`] if the mount fails and
/// [`ConfineError::Io`] if the mount point cannot be created.
pub fn mount_proc() -> Result<()> {
    let target = Path::new("/proc");
    fs::create_dir_all(target).map_err(|e| ConfineError::Io {
        path: target.to_path_buf(),
        source: e,
    })?;
    mount(Some("proc"), target, Some("proc"), MsFlags::empty(), None::<&str>).map_err(|e| {
        ConfineError::Isolation {
            message: format!("cannot mount proc at {}: {e}", target.display()),
        }
    })?;
    tracing::debug!("proc mounted");
    Ok(())
}
