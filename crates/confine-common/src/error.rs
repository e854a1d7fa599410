//! Unified error types for the confine workspace.
//!
//! Every failure class in a container run is unrecoverable locally and
//! propagates up to the CLI, which exits 1 with the message on stderr.
//! The single exception is cgroup cleanup, which is swallowed at the call
//! site (see `confine-core::cgroup::remove_stale_groups`) and never
//! surfaces here.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type shared across the workspace.
#[derive(Debug, Error)]
pub enum ConfineError {
    /// An I/O operation failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path where the I/O error occurred.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// An invocation input is invalid.
    #[error("invalid configuration: {message}")]
    Config {
        /// Description of the invalid input.
        message: String,
    },

    /// The process lacks the privilege to run containers.
    #[error("insufficient privilege: {message}")]
    Privilege {
        /// Description of the missing privilege.
        message: String,
    },

    /// The root filesystem could not be provisioned from the base image.
    #[error("rootfs provisioning failed: {message}")]
    Provision {
        /// Description of the provisioning failure.
        message: String,
    },

    /// The kernel rejected a namespace or process-isolation request.
    #[error("isolation failed: {message}")]
    Isolation {
        /// Description of the rejected request.
        message: String,
    },

    /// A cgroup control file could not be created or written.
    #[error("cgroup setup failed at {path}: {message}")]
    Cgroup {
        /// Cgroup path involved in the failure.
        path: PathBuf,
        /// Description of the failure.
        message: String,
    },

    /// The rootfs was absent when the child tried to switch into it.
    ///
    /// Distinct from [`ConfineError::Provision`]: provisioning happens in
    /// the parent before isolation, while this is checked from the child
    /// at switch-root time.
    #[error("rootfs {path} not found - was it provisioned?")]
    RootfsMissing {
        /// Expected rootfs location.
        path: PathBuf,
    },

    /// The container shell could not replace the process image.
    #[error("failed to hand over to {shell}: {message}")]
    Handover {
        /// Shell binary that was exec'd.
        shell: PathBuf,
        /// Description of the exec failure.
        message: String,
    },
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, ConfineError>;
