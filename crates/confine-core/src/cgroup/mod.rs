//! Cgroup memory limiting across both hierarchy versions.
//!
//! The host mounts exactly one of the two mutually exclusive cgroup
//! hierarchies at `/sys/fs/cgroup`. [`CgroupVersion::detect`] probes once
//! for the unified hierarchy's `cgroup.controllers` marker; everything
//! else asks the detected variant for the right file names, so call sites
//! never branch on the version.
//!
//! The cgroup mount root is always passed in (production uses
//! [`confine_common::constants::CGROUP_ROOT`]), which lets tests exercise
//! both layouts against a temporary directory.

use std::fmt::Display;
use std::fs;
use std::path::{Path, PathBuf};

use confine_common::constants;
use confine_common::error::{ConfineError, Result};
use confine_common::types::MemoryLimit;

/// Which cgroup hierarchy the host mounts.
///
/// Selected once per run by [`CgroupVersion::detect`]; the variants answer
/// the same questions (group directory, control file names) so the rest of
/// the limiter is version-agnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CgroupVersion {
    /// Legacy hierarchy: per-controller trees, memory under `memory/`.
    V1,
    /// Unified hierarchy: a single tree with `memory.max`-style controls.
    V2,
}

impl CgroupVersion {
    /// Probes the cgroup mount root for the unified-hierarchy marker file.
    #[must_use]
    pub fn detect(root: &Path) -> Self {
        if root.join(constants::CGROUP_V2_MARKER).is_file() {
            Self::V2
        } else {
            Self::V1
        }
    }

    /// Returns the group directory for a container tag under this layout.
    #[must_use]
    pub fn group_dir(self, root: &Path, tag: &str) -> PathBuf {
        let name = constants::cgroup_name(tag);
        match self {
            Self::V1 => root.join("memory").join(name),
            Self::V2 => root.join(name),
        }
    }

    /// Control file holding the hard memory ceiling.
    #[must_use]
    pub const fn limit_file(self) -> &'static str {
        match self {
            Self::V1 => "memory.limit_in_bytes",
            Self::V2 => "memory.max",
        }
    }

    /// Control file that disables swap for the group.
    ///
    /// The legacy hierarchy has no direct swap cap; zeroing swappiness is
    /// its equivalent of `memory.swap.max = 0`.
    #[must_use]
    pub const fn swap_file(self) -> &'static str {
        match self {
            Self::V1 => "memory.swappiness",
            Self::V2 => "memory.swap.max",
        }
    }

    /// Membership file that binds a PID into the group.
    #[must_use]
    pub const fn membership_file(self) -> &'static str {
        match self {
            Self::V1 => "tasks",
            Self::V2 => "cgroup.procs",
        }
    }
}

/// Handle to a container's memory cgroup.
///
/// Created before the process image is replaced. The path is derived
/// deterministically from the container tag, so the supervisor can remove
/// the group after exit without any state shared with the child.
#[derive(Debug)]
pub struct MemoryGroup {
    version: CgroupVersion,
    path: PathBuf,
}

impl MemoryGroup {
    /// Creates (or reuses) the group for `tag` and caps its memory.
    ///
    /// Writes the ceiling and disables swap so the limit cannot be
    /// silently bypassed. Creation is idempotent: an existing group
    /// directory for the same tag is reconfigured, not an error.
    ///
    /// # Errors
    ///
    /// Returns [`ConfineError::Cgroup`] if the directory or its control
    /// files cannot be created or written.
    pub fn create(root: &Path, tag: &str, limit: MemoryLimit) -> Result<Self> {
        let version = CgroupVersion::detect(root);
        let path = version.group_dir(root, tag);

        fs::create_dir_all(&path).map_err(|e| ConfineError::Cgroup {
            path: path.clone(),
            message: format!("cannot create group: {e}"),
        })?;

        write_control(&path, version.limit_file(), limit.as_bytes())?;
        write_control(&path, version.swap_file(), 0)?;

        tracing::info!(
            version = ?version,
            path = %path.display(),
            limit = %limit,
            "memory cgroup configured"
        );
        Ok(Self { version, path })
    }

    /// Binds a process into the group by writing its PID to the
    /// membership file. Descendants of the process are accounted
    /// automatically.
    ///
    /// # Errors
    ///
    /// Returns [`ConfineError::Cgroup`] if the membership file rejects
    /// the write.
    pub fn bind(&self, pid: u32) -> Result<()> {
        write_control(&self.path, self.version.membership_file(), pid)?;
        tracing::debug!(pid, path = %self.path.display(), "process bound to cgroup");
        Ok(())
    }

    /// The group's directory, for post-exit removal by the supervisor.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The hierarchy version this group was created under.
    #[must_use]
    pub const fn version(&self) -> CgroupVersion {
        self.version
    }
}

/// Creates the memory group for `tag` and binds the *current* process
/// into it.
///
/// Called by the child before the root switch so that the shell and all
/// its descendants inherit the ceiling. Callers with no limit skip the
/// limiter entirely; no group directory is ever created for an unlimited
/// run.
///
/// # Errors
///
/// Returns [`ConfineError::Cgroup`] if group creation or the membership
/// write fails.
pub fn apply_memory_limit(root: &Path, tag: &str, limit: MemoryLimit) -> Result<MemoryGroup> {
    let group = MemoryGroup::create(root, tag, limit)?;
    group.bind(std::process::id())?;
    Ok(group)
}

/// Best-effort removal of `tag`'s group under both hierarchy layouts.
///
/// The supervisor cannot know which layout the limiter chose (or whether
/// a limit was requested at all), so it tries both. Failures — directory
/// still busy, never created, already removed — are logged and swallowed:
/// cleanup is advisory and must never mask the container's exit status.
pub fn remove_stale_groups(root: &Path, tag: &str) {
    for version in [CgroupVersion::V2, CgroupVersion::V1] {
        let dir = version.group_dir(root, tag);
        match fs::remove_dir(&dir) {
            Ok(()) => tracing::debug!(dir = %dir.display(), "removed cgroup"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::debug!(dir = %dir.display(), error = %e, "leaving cgroup behind");
            }
        }
    }
}

fn write_control(group: &Path, file: &str, value: impl Display) -> Result<()> {
    let path = group.join(file);
    fs::write(&path, value.to_string()).map_err(|e| ConfineError::Cgroup {
        path,
        message: format!("cannot write control file: {e}"),
    })
}
