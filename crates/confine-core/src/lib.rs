//! # confine-core
//!
//! Low-level Linux isolation primitives for the confine runtime.
//!
//! This crate provides safe abstractions over:
//! - **Namespaces**: UTS, mount, PID, and network isolation via `unshare(2)`.
//! - **Cgroups**: memory ceilings on both the legacy (v1) and unified (v2)
//!   hierarchies, selected by a single capability probe.
//! - **Filesystem**: base-image provisioning, mount propagation control,
//!   `/proc` mounting, and the chroot-based root switch.
//!
//! Everything here requires Linux; there is no fallback surface for other
//! platforms. All unsafe system calls carry `// SAFETY:` documentation.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod cgroup;
pub mod filesystem;
pub mod namespace;
