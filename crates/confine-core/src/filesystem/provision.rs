//! Rootfs provisioning from the shared base image.
//!
//! Populates `Containers/<tag>` from the base tree exactly once per
//! container identity. A populated target is never touched again, so
//! files the container wrote survive re-invocation and base-image updates
//! are deliberately not synced into existing containers.
//!
//! Population is atomic: the tree is copied into a `<target>.partial`
//! staging directory and renamed into place, so a crash mid-copy can
//! never leave a half-copied rootfs that a retry would mistake for a
//! complete one. Stale staging directories from a crashed run are removed
//! before the copy restarts.

use std::fs;
use std::os::unix::fs::{FileTypeExt, MetadataExt, PermissionsExt, chown, lchown, symlink};
use std::path::{Path, PathBuf};

use confine_common::error::{ConfineError, Result};

/// Ensures `target` holds a populated rootfs, copying from `base` on
/// first use only.
///
/// The copy preserves permissions, ownership, symlinks (as links), and
/// device/FIFO nodes — enough metadata for a general-purpose Linux
/// userspace to function inside the tree.
///
/// # Errors
///
/// Returns [`ConfineError::Provision`] if the base image is missing and
/// [`ConfineError::Io`] if the copy itself fails. A failed copy leaves
/// only the staging directory behind, never a half-populated `target`.
pub fn provision(base: &Path, target: &Path) -> Result<()> {
    if !base.is_dir() {
        return Err(ConfineError::Provision {
            message: format!("base image {} not found", base.display()),
        });
    }

    if populated(target)? {
        tracing::debug!(rootfs = %target.display(), "rootfs already populated, reusing");
        return Ok(());
    }

    tracing::info!(rootfs = %target.display(), "populating rootfs from base image");
    let staging = staging_dir(target)?;
    if staging.exists() {
        // Leftover from a copy that died mid-flight.
        fs::remove_dir_all(&staging).map_err(|e| io_at(&staging, e))?;
    }

    copy_tree(base, &staging)?;

    if target.exists() {
        // An empty directory from a previous `mkdir` is fine to replace.
        fs::remove_dir(target).map_err(|e| io_at(target, e))?;
    }
    fs::rename(&staging, target).map_err(|e| io_at(target, e))
}

/// A rootfs counts as populated when it exists and holds at least one
/// entry.
fn populated(target: &Path) -> Result<bool> {
    if !target.exists() {
        return Ok(false);
    }
    let mut entries = fs::read_dir(target).map_err(|e| io_at(target, e))?;
    Ok(entries.next().is_some())
}

fn staging_dir(target: &Path) -> Result<PathBuf> {
    let name = target.file_name().ok_or_else(|| ConfineError::Provision {
        message: format!("invalid rootfs path {}", target.display()),
    })?;
    let mut staged = name.to_os_string();
    staged.push(".partial");
    Ok(target.with_file_name(staged))
}

fn copy_tree(src: &Path, dst: &Path) -> Result<()> {
    let meta = fs::symlink_metadata(src).map_err(|e| io_at(src, e))?;
    fs::create_dir_all(dst).map_err(|e| io_at(dst, e))?;

    for entry in fs::read_dir(src).map_err(|e| io_at(src, e))? {
        let entry = entry.map_err(|e| io_at(src, e))?;
        copy_entry(&entry.path(), &dst.join(entry.file_name()))?;
    }

    // Directory metadata last: a read-only mode applied up front would
    // block the copies into it.
    apply_metadata(dst, &meta)
}

fn copy_entry(src: &Path, dst: &Path) -> Result<()> {
    let meta = fs::symlink_metadata(src).map_err(|e| io_at(src, e))?;
    let file_type = meta.file_type();

    if file_type.is_dir() {
        copy_tree(src, dst)
    } else if file_type.is_symlink() {
        let link = fs::read_link(src).map_err(|e| io_at(src, e))?;
        symlink(&link, dst).map_err(|e| io_at(dst, e))?;
        lchown(dst, Some(meta.uid()), Some(meta.gid())).map_err(|e| io_at(dst, e))
    } else if file_type.is_file() {
        let _ = fs::copy(src, dst).map_err(|e| io_at(dst, e))?;
        apply_metadata(dst, &meta)
    } else if file_type.is_fifo() || file_type.is_char_device() || file_type.is_block_device() {
        copy_special_node(dst, &meta)
    } else {
        // Sockets are runtime artifacts; their creators re-make them.
        tracing::debug!(path = %src.display(), "skipping socket during rootfs copy");
        Ok(())
    }
}

#[allow(clippy::cast_possible_truncation)]
fn copy_special_node(dst: &Path, meta: &fs::Metadata) -> Result<()> {
    use nix::sys::stat::{Mode, SFlag, mknod};

    let kind = if meta.file_type().is_fifo() {
        SFlag::S_IFIFO
    } else if meta.file_type().is_char_device() {
        SFlag::S_IFCHR
    } else {
        SFlag::S_IFBLK
    };
    let perm = Mode::from_bits_truncate(meta.mode() as libc::mode_t);
    mknod(dst, kind, perm, meta.rdev() as libc::dev_t)
        .map_err(|e| io_at(dst, std::io::Error::from_raw_os_error(e as i32)))?;
    apply_metadata(dst, meta)
}

fn apply_metadata(path: &Path, meta: &fs::Metadata) -> Result<()> {
    // chown first: it clears setuid/setgid bits, which the mode write
    // below restores.
    chown(path, Some(meta.uid()), Some(meta.gid())).map_err(|e| io_at(path, e))?;
    fs::set_permissions(path, fs::Permissions::from_mode(meta.mode()))
        .map_err(|e| io_at(path, e))
}

fn io_at(path: &Path, source: std::io::Error) -> ConfineError {
    ConfineError::Io { path: path.to_path_buf(), source }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn base_tree(dir: &TempDir) -> PathBuf {
        let base = dir.path().join("file_system");
        fs::create_dir_all(base.join("bin")).expect("base dirs");
        fs::write(base.join("bin/sh"), "#!/bin/sh\n").expect("base file");
        fs::write(base.join("etc-release"), "base\n").expect("base file");
        base
    }

    #[test]
    fn populates_empty_target_from_base() {
        let dir = TempDir::new().expect("tempdir");
        let base = base_tree(&dir);
        let target = dir.path().join("Containers/demo");

        provision(&base, &target).expect("first provision");

        assert!(target.join("bin/sh").is_file());
        assert!(target.join("etc-release").is_file());
        assert!(!dir.path().join("Containers/demo.partial").exists());
    }

    #[test]
    fn second_invocation_reuses_existing_rootfs() {
        let dir = TempDir::new().expect("tempdir");
        let base = base_tree(&dir);
        let target = dir.path().join("Containers/demo");
        provision(&base, &target).expect("first provision");

        // The container wrote a file; the base image grew another.
        fs::write(target.join("container-scratch"), "kept").expect("container file");
        fs::write(base.join("added-later"), "new").expect("base file");

        provision(&base, &target).expect("second provision");

        let kept = fs::read_to_string(target.join("container-scratch")).expect("kept file");
        assert_eq!(kept, "kept");
        assert!(!target.join("added-later").exists(), "no re-copy into populated rootfs");
    }

    #[test]
    fn copy_preserves_symlinks_and_permissions() {
        let dir = TempDir::new().expect("tempdir");
        let base = base_tree(&dir);
        fs::set_permissions(base.join("bin/sh"), fs::Permissions::from_mode(0o751))
            .expect("chmod base file");
        symlink("bin/sh", base.join("sh-link")).expect("base symlink");
        let target = dir.path().join("Containers/demo");

        provision(&base, &target).expect("provision");

        let link_meta = fs::symlink_metadata(target.join("sh-link")).expect("link meta");
        assert!(link_meta.file_type().is_symlink());
        assert_eq!(
            fs::read_link(target.join("sh-link")).expect("link target"),
            PathBuf::from("bin/sh")
        );
        let mode = fs::metadata(target.join("bin/sh")).expect("file meta").mode() & 0o7777;
        assert_eq!(mode, 0o751);
    }

    #[test]
    fn missing_base_image_is_fatal() {
        let dir = TempDir::new().expect("tempdir");
        let err = provision(&dir.path().join("no-such-base"), &dir.path().join("Containers/x"))
            .expect_err("must fail");
        assert!(matches!(err, ConfineError::Provision { .. }));
    }

    #[test]
    fn stale_staging_directory_is_discarded() {
        let dir = TempDir::new().expect("tempdir");
        let base = base_tree(&dir);
        let target = dir.path().join("Containers/demo");
        let staging = dir.path().join("Containers/demo.partial");
        fs::create_dir_all(&staging).expect("stale staging");
        fs::write(staging.join("junk"), "half-copied").expect("stale file");

        provision(&base, &target).expect("provision");

        assert!(!staging.exists());
        assert!(!target.join("junk").exists());
        assert!(target.join("bin/sh").is_file());
    }

    #[test]
    fn empty_target_directory_still_gets_populated() {
        let dir = TempDir::new().expect("tempdir");
        let base = base_tree(&dir);
        let target = dir.path().join("Containers/demo");
        fs::create_dir_all(&target).expect("pre-made empty target");

        provision(&base, &target).expect("provision");

        assert!(target.join("bin/sh").is_file());
    }
}
