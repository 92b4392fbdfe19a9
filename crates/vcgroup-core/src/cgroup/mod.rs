//! Cgroup hierarchy detection and group management.
//!
//! A [`Group`] is populated either from the live mount table and the
//! placement of a process ([`detect_group`]) or by deriving a child from
//! an existing group ([`derive_group`]). Backends implementing
//! [`CgroupBackend`] do the per-version work; [`backend`] selects one for
//! the process.

pub mod backend;
pub mod group;
pub mod mounts;
pub mod naming;
pub mod registry;
pub mod v1;

use nix::unistd::Pid;
use vcgroup_common::config::CgroupConfig;
use vcgroup_common::error::{Result, VcgroupError};
use vcgroup_common::types::{ControllerMask, GroupFlags};

pub use backend::{BackendType, CgroupBackend};
pub use group::{ControllerState, Group, join_placement};
pub use registry::{BackendRegistry, backend, registry};
pub use v1::V1Backend;

/// Builds a group from the current mount table and the placement of `pid`
/// (the calling process when `None`).
///
/// `path` is relative to the process placement; `""` names the process's
/// own group. Detection is re-run on every call.
///
/// # Errors
///
/// Returns an error if procfs cannot be read, the wanted controllers cannot
/// be reconciled or leave nothing mounted, or a kept controller has no
/// placement.
pub fn detect_group(
    backend: &dyn CgroupBackend,
    config: &CgroupConfig,
    path: &str,
    pid: Option<Pid>,
    wanted: Option<ControllerMask>,
) -> Result<Group> {
    let mut group = Group::new(path);

    for entry in mounts::read_mount_table(&config.mounts_file())? {
        backend.detect_mounts(&mut group, &entry.fs_type, &entry.options, &entry.dir)?;
    }

    // Detached controllers must not be asked for a placement.
    let controllers = backend.detect_controllers(&mut group, wanted)?;
    if controllers.is_empty() {
        return Err(VcgroupError::Unsupported {
            message: "at least one cgroup controller is required".into(),
        });
    }

    let placement_file = config.placement_file(pid.map(Pid::as_raw));
    for entry in mounts::read_placements(&placement_file)? {
        backend.detect_placement(&mut group, path, &entry.controllers, &entry.path)?;
    }

    backend.validate_placement(&group, pid.unwrap_or_else(Pid::this))?;
    tracing::debug!(path, controllers = ?controllers, "detected group");
    Ok(group)
}

/// Derives the child `path` of `parent` and creates its directories.
///
/// On failure no group is returned; directories created before the
/// failure are left in place.
///
/// # Errors
///
/// Returns an error if a placement cannot be derived or a directory
/// cannot be created.
pub fn derive_group(
    backend: &dyn CgroupBackend,
    parent: &Group,
    path: &str,
    create: bool,
    flags: GroupFlags,
) -> Result<Group> {
    let mut group = Group::new(path);
    backend.copy_mounts(&mut group, parent);
    backend.copy_placement(&mut group, path, parent)?;
    backend.make_group(parent, &mut group, create, flags)?;
    Ok(group)
}
