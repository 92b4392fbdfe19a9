//! Creation and removal of group directories.

use std::io::ErrorKind;
use std::path::Path;

use nix::errno::Errno;
use nix::sys::stat::Mode;
use vcgroup_common::constants::{CPUSET_INHERITED_FILES, GROUP_DIR_MODE};
use vcgroup_common::error::{Result, VcgroupError};
use vcgroup_common::types::{Controller, GroupFlags};

use super::controllers::path_of_controller;
use super::tunables::{get_value_str, get_value_u64, set_value_str, set_value_u64};
use crate::cgroup::group::Group;

const MEMORY_USE_HIERARCHY: &str = "memory.use_hierarchy";

pub(super) fn make_group(
    parent: &Group,
    group: &mut Group,
    create: bool,
    flags: GroupFlags,
) -> Result<()> {
    tracing::debug!(group = group.path(), "making group");
    for controller in Controller::ALL {
        // Never mkdir in systemd's hierarchy.
        if controller == Controller::Systemd {
            tracing::debug!("not creating systemd controller group");
            continue;
        }
        if !group.controller(controller).is_mounted() {
            tracing::debug!(controller = %controller, "skipping unmounted controller");
            continue;
        }

        let dir = path_of_controller(group, controller, None)?;
        if dir.exists() {
            continue;
        }

        tracing::debug!(path = %dir.display(), "making controller directory");
        let created = if create {
            nix::unistd::mkdir(&dir, Mode::from_bits_truncate(GROUP_DIR_MODE))
        } else {
            Err(Errno::ENOENT)
        };
        match mkdir_outcome(controller, &dir, created)? {
            Mkdir::Created => {}
            Mkdir::Raced => continue,
            Mkdir::Detached => {
                group.controller_mut(controller).mount_point = None;
                continue;
            }
        }

        // An empty cpuset mask would make the kernel reject every task.
        if controller == Controller::Cpuset {
            cpuset_inherit(parent, group)?;
        }
        // Must precede sub-group creation and task attachment.
        if controller == Controller::Memory && flags.contains(GroupFlags::MEM_HIERARCHY) {
            set_memory_use_hierarchy(group)?;
        }
    }
    tracing::info!(group = group.path(), "group created");
    Ok(())
}

/// What to do with a controller after its `mkdir`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mkdir {
    /// Freshly created: initialise it.
    Created,
    /// Another process created it first: leave it as is.
    Raced,
    /// The controller cannot nest groups here: stop using it.
    Detached,
}

fn mkdir_outcome(controller: Controller, dir: &Path, result: nix::Result<()>) -> Result<Mkdir> {
    match result {
        Ok(()) => Ok(Mkdir::Created),
        Err(Errno::EEXIST) => Ok(Mkdir::Raced),
        // Kernels without nested blkio groups reject the mkdir; carry on
        // without blkio rather than failing every other controller.
        Err(errno) if controller == Controller::Blkio => {
            tracing::warn!(
                path = %dir.display(),
                error = %errno,
                "ignoring mkdir failure with blkio controller, kernel probably too old"
            );
            Ok(Mkdir::Detached)
        }
        Err(errno) => Err(VcgroupError::io(dir, errno)),
    }
}

fn cpuset_inherit(parent: &Group, group: &Group) -> Result<()> {
    tracing::debug!(parent = parent.path(), group = group.path(), "setting up cpuset inheritance");
    for key in CPUSET_INHERITED_FILES {
        let value = get_value_str(parent, Controller::Cpuset, key)?;
        tracing::debug!(key, value, "inherit");
        set_value_str(group, Controller::Cpuset, key, &value)?;
    }
    Ok(())
}

fn set_memory_use_hierarchy(group: &Group) -> Result<()> {
    // Writing 1 twice is an error, so skip when already enabled.
    if get_value_u64(group, Controller::Memory, MEMORY_USE_HIERARCHY)? == 1 {
        return Ok(());
    }
    tracing::debug!(group = group.path(), "enabling {MEMORY_USE_HIERARCHY}");
    set_value_u64(group, Controller::Memory, MEMORY_USE_HIERARCHY, 1)
}

pub(super) fn remove(group: &Group) -> Result<()> {
    tracing::debug!(group = group.path(), "removing group");
    let mut outcome = Ok(());
    for (controller, state) in group.mounted() {
        if controller == Controller::Systemd {
            continue;
        }
        // Never delete the root group, should we have ended up in it.
        if state.placement.as_deref() == Some("/") {
            continue;
        }
        let Ok(dir) = path_of_controller(group, controller, None) else {
            continue;
        };
        tracing::debug!(path = %dir.display(), "removing group and all child groups");
        outcome = remove_recursively(&dir);
    }
    if outcome.is_ok() {
        tracing::info!(group = group.path(), "group removed");
    }
    outcome
}

/// Removes `dir` and its sub-directories, deepest first.
///
/// Only directories are removed: control files vanish with their group.
/// Children disappearing underneath us are not an error.
pub(super) fn remove_recursively(dir: &Path) -> Result<()> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
        Err(e) => {
            tracing::error!(path = %dir.display(), error = %e, "unable to open group directory");
            return Err(VcgroupError::io(dir, e));
        }
    };
    for entry in entries {
        let entry = entry.map_err(|e| VcgroupError::io(dir, e))?;
        let is_dir = match entry.file_type() {
            Ok(kind) => kind.is_dir(),
            Err(e) if e.kind() == ErrorKind::NotFound => continue,
            Err(e) => return Err(VcgroupError::io(entry.path(), e)),
        };
        if is_dir {
            remove_recursively(&entry.path())?;
        }
    }
    match std::fs::remove_dir(dir) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => {
            tracing::error!(path = %dir.display(), error = %e, "unable to remove group directory");
            Err(VcgroupError::io(dir, e))
        }
    }
}
