//! Backend-agnostic group model.
//!
//! A [`Group`] records, per controller, where the hierarchy is mounted and
//! where the group sits inside it. Backends fill and interpret these
//! records; the model itself performs no I/O.

use std::path::{Path, PathBuf};

use vcgroup_common::types::Controller;

/// Per-controller record of a group.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ControllerState {
    /// Absolute mount point of the hierarchy, `None` when not mounted.
    pub mount_point: Option<PathBuf>,
    /// Path of the group relative to `mount_point`. Never ends in `/`
    /// except for the root placement `/`.
    pub placement: Option<String>,
    /// Compatibility symlink pointing at a co-mounted hierarchy.
    pub link_point: Option<PathBuf>,
}

impl ControllerState {
    /// Whether the hierarchy is mounted.
    #[must_use]
    pub const fn is_mounted(&self) -> bool {
        self.mount_point.is_some()
    }

    /// On-disk directory of the group: `mount_point + placement`.
    ///
    /// Returns `None` unless both are known.
    #[must_use]
    pub fn group_dir(&self) -> Option<PathBuf> {
        let mount_point = self.mount_point.as_deref()?;
        let placement = self.placement.as_deref()?;
        Some(concat_path(mount_point, placement))
    }
}

/// A logical cgroup with one record per known controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    path: String,
    controllers: [ControllerState; Controller::COUNT],
}

impl Group {
    /// Creates an empty group named `path`; nothing is mounted yet.
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            controllers: std::array::from_fn(|_| ControllerState::default()),
        }
    }

    /// Logical path the group was created with.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Record of `controller`.
    #[must_use]
    pub const fn controller(&self, controller: Controller) -> &ControllerState {
        &self.controllers[controller.index()]
    }

    /// Mutable record of `controller`.
    pub const fn controller_mut(&mut self, controller: Controller) -> &mut ControllerState {
        &mut self.controllers[controller.index()]
    }

    /// Iterates all controller records in declaration order.
    pub fn controllers(&self) -> impl Iterator<Item = (Controller, &ControllerState)> {
        Controller::ALL.into_iter().zip(self.controllers.iter())
    }

    /// Iterates the mounted controllers in declaration order.
    pub fn mounted(&self) -> impl Iterator<Item = (Controller, &ControllerState)> {
        self.controllers().filter(|(_, state)| state.is_mounted())
    }
}

/// Joins a placement base with a relative group path.
///
/// An empty `path` yields `base` unchanged, and no separator is added after
/// the root placement `/`:
///
/// ```
/// use vcgroup_core::cgroup::join_placement;
///
/// assert_eq!(join_placement("/", ""), "/");
/// assert_eq!(join_placement("/", "foo"), "/foo");
/// assert_eq!(join_placement("/libvirt.service", ""), "/libvirt.service");
/// assert_eq!(join_placement("/libvirt.service", "foo"), "/libvirt.service/foo");
/// ```
#[must_use]
pub fn join_placement(base: &str, path: &str) -> String {
    let sep = if base == "/" || path.is_empty() { "" } else { "/" };
    format!("{base}{sep}{path}")
}

/// Appends `placement` to `mount_point` as a plain string concatenation.
///
/// `Path::join` would discard the mount point since placements are absolute.
pub(crate) fn concat_path(mount_point: &Path, placement: &str) -> PathBuf {
    let mut raw = mount_point.as_os_str().to_owned();
    raw.push(placement);
    PathBuf::from(raw)
}
