//! # vcgroup-common
//!
//! Shared types, error definitions, configuration models, and constants
//! used across the vcgroup workspace.
//!
//! This crate is the leaf of the dependency graph. It depends on no other
//! internal crate and provides the primitives the cgroup backends and the
//! `vcg` binary build upon.

pub mod config;
pub mod constants;
pub mod error;
pub mod types;
