//! Root filesystem switching via `chroot(2)`.

use std::path::Path;

use confine_common::error::{ConfineError, Result};
use nix::unistd::{chdir, chroot};

/// Switches the process's filesystem root to `rootfs` and moves the
/// working directory to the new `/`.
///
/// The rootfs must already exist — provisioning happens in the parent,
/// and this runs in the child. The existence check fires before any
/// syscall so a missing rootfs fails fast with no side effects.
///
/// # Errors
///
/// Returns [`ConfineError::RootfsMissing`] when `rootfs` is not a
/// directory, and [`ConfineError::Io`] if `chroot(2)` or the `chdir`
/// into the new root fails.
pub fn enter(rootfs: &Path) -> Result<()> {
    if !rootfs.is_dir() {
        return Err(ConfineError::RootfsMissing { path: rootfs.to_path_buf() });
    }

    chroot(rootfs).map_err(|e| errno_at(rootfs, e))?;
    chdir("/").map_err(|e| errno_at(Path::new("/"), e))?;
    tracing::debug!(rootfs = %rootfs.display(), "switched root");
    Ok(())
}

fn errno_at(path: &Path, errno: nix::errno::Errno) -> ConfineError {
    ConfineError::Io {
        path: path.to_path_buf(),
        source: std::io::Error::from_raw_os_error(errno as i32),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_rootfs_fails_fast() {
        let err = enter(Path::new("/definitely/not/provisioned")).expect_err("must fail");
        assert!(matches!(err, ConfineError::RootfsMissing { .. }));
    }
}
