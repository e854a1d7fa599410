//! Filesystem layout constants and path helpers.
//!
//! All container state is process-local to the invoking working directory:
//! the shared base image lives in `file_system/` and per-container rootfs
//! trees under `Containers/`. Only the cgroup paths are absolute.

use std::path::PathBuf;

/// Shared, read-only base image tree. Never mutated by container runs.
pub const BASE_IMAGE_DIR: &str = "file_system";

/// Parent directory of per-container rootfs trees.
pub const CONTAINERS_DIR: &str = "Containers";

/// Mount point of the host's cgroup filesystem.
pub const CGROUP_ROOT: &str = "/sys/fs/cgroup";

/// Marker file present at [`CGROUP_ROOT`] only on a unified (v2) hierarchy.
pub const CGROUP_V2_MARKER: &str = "cgroup.controllers";

/// Prefix of per-container cgroup directory names.
pub const CGROUP_PREFIX: &str = "limit-";

/// Shell the container's PID 1 becomes at handover.
pub const CONTAINER_SHELL: &str = "/bin/bash";

/// Application name used in CLI output.
pub const APP_NAME: &str = "confine";

/// Returns the base image path, relative to the working directory.
#[must_use]
pub fn base_image_dir() -> PathBuf {
    PathBuf::from(BASE_IMAGE_DIR)
}

/// Returns the rootfs path for a container tag, relative to the working
/// directory.
#[must_use]
pub fn rootfs_dir(tag: &str) -> PathBuf {
    PathBuf::from(CONTAINERS_DIR).join(tag)
}

/// Returns the cgroup directory name for a container tag.
///
/// Derived deterministically from the tag so the supervisor can locate
/// and remove the group without sharing state with the child.
#[must_use]
pub fn cgroup_name(tag: &str) -> String {
    format!("{CGROUP_PREFIX}{tag}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rootfs_dir_nests_under_containers() {
        assert_eq!(rootfs_dir("demo"), PathBuf::from("Containers/demo"));
    }

    #[test]
    fn cgroup_name_carries_limit_prefix() {
        assert_eq!(cgroup_name("demo"), "limit-demo");
    }
}
