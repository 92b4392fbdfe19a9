//! Ownership delegation of group directories.

use nix::unistd::{Gid, Uid, chown};
use vcgroup_common::error::{Result, VcgroupError};
use vcgroup_common::types::ControllerMask;

use crate::cgroup::group::Group;

/// Chowns each selected group directory and its direct entries.
///
/// Child groups are not descended into: only the group's own control
/// files are delegated.
pub(super) fn set_owner(group: &Group, uid: Uid, gid: Gid, controllers: ControllerMask) -> Result<()> {
    for (controller, state) in group.mounted() {
        if !controllers.has(controller) {
            continue;
        }
        let Some(base) = state.group_dir() else {
            return Err(VcgroupError::internal(format!(
                "v1 controller '{controller}' is not enabled for group"
            )));
        };

        let entries = std::fs::read_dir(&base).map_err(|e| VcgroupError::io(&base, e))?;
        for entry in entries {
            let entry = entry.map_err(|e| VcgroupError::io(&base, e))?;
            let path = entry.path();
            chown(&path, Some(uid), Some(gid)).map_err(|e| VcgroupError::io(&path, e))?;
        }
        chown(&base, Some(uid), Some(gid)).map_err(|e| VcgroupError::io(&base, e))?;
        tracing::debug!(
            controller = %controller,
            path = %base.display(),
            uid = uid.as_raw(),
            gid = gid.as_raw(),
            "delegated group"
        );
    }
    Ok(())
}
