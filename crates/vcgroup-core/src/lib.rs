//! # vcgroup-core
//!
//! Cgroup backends for enforcing per-instance resource limits on the
//! processes of a virtual machine or container.
//!
//! The [`cgroup`] module exposes:
//! - **Detection**: mount table and self-placement scanning into a [`cgroup::Group`].
//! - **Reconciliation**: matching the wanted controller set against what is mounted.
//! - **Lifecycle**: creating, populating, delegating and removing group directories.
//! - **Dispatch**: a backend trait with one implementation per hierarchy
//!   version, selected once per process.
//!
//! Every operation is a direct, blocking sequence of filesystem calls.
//! Nothing is cached across calls and nothing is locked; callers
//! serialize access to a shared group.

pub mod cgroup;
