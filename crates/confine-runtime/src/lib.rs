//! Container lifecycle for the confine runtime.
//!
//! Two halves of one fork: [`init`] is everything the child does between
//! fork and exec, [`supervisor`] is everything the parent does from
//! provisioning to cleanup.

#![allow(unsafe_code)]
#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod init;
pub mod supervisor;
