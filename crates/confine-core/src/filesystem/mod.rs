//! Filesystem management for container isolation.
//!
//! Provides base-image provisioning into per-container rootfs trees,
//! mount propagation control, `/proc` mounting, and the chroot-based
//! root switch.

pub mod mount;
pub mod provision;
pub mod root;
