//! Controller reconciliation and lookup.

use std::path::PathBuf;

use vcgroup_common::error::{Result, VcgroupError};
use vcgroup_common::types::{Controller, ControllerMask};

use crate::cgroup::group::{Group, concat_path};

pub(super) fn detect_controllers(
    group: &mut Group,
    wanted: Option<ControllerMask>,
) -> Result<ControllerMask> {
    let Some(mut wanted) = wanted else {
        tracing::debug!("auto-detecting controllers");
        return Ok(group.mounted().map(|(c, _)| c).collect());
    };

    tracing::debug!(wanted = ?wanted, "filtering controllers");
    for controller in wanted.controllers() {
        if !group.controller(controller).is_mounted() {
            tracing::debug!(controller = %controller, "requested controller not mounted, ignoring");
            wanted.remove(controller.mask());
        }
    }

    for controller in Controller::ALL {
        if wanted.has(controller) {
            continue;
        }
        let Some(mount_point) = group.controller(controller).mount_point.as_deref() else {
            continue;
        };
        // Two controllers merged into one hierarchy cannot be split apart.
        if let Some(comounted) = wanted
            .controllers()
            .find(|c| group.controller(*c).mount_point.as_deref() == Some(mount_point))
        {
            return Err(VcgroupError::Unsupported {
                message: format!(
                    "v1 controller '{controller}' is not wanted, but '{comounted}' is co-mounted"
                ),
            });
        }
        tracing::debug!(controller = %controller, "detaching unwanted controller");
        group.controller_mut(controller).mount_point = None;
    }
    Ok(wanted)
}

pub(super) fn any_controller(group: &Group) -> Option<Controller> {
    // The root placement must never be touched.
    group
        .mounted()
        .find(|(_, state)| state.placement.as_deref().is_some_and(|p| p != "/"))
        .map(|(c, _)| c)
}

pub(super) fn path_of_controller(
    group: &Group,
    controller: Controller,
    key: Option<&str>,
) -> Result<PathBuf> {
    let state = group.controller(controller);
    let Some(mount_point) = state.mount_point.as_deref() else {
        return Err(VcgroupError::internal(format!(
            "v1 controller '{controller}' is not mounted"
        )));
    };
    let Some(placement) = state.placement.as_deref() else {
        return Err(VcgroupError::internal(format!(
            "v1 controller '{controller}' is not enabled for group"
        )));
    };
    let dir = concat_path(mount_point, placement);
    Ok(match key {
        Some(key) => dir.join(key),
        None => dir,
    })
}
