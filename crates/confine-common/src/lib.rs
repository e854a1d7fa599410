//! # confine-common
//!
//! Shared types, error definitions, and filesystem-layout constants used
//! across the confine workspace.
//!
//! This crate is the leaf of the dependency graph — it depends on no other
//! internal crate and provides the foundational primitives that all other
//! crates build upon.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod constants;
pub mod error;
pub mod types;
