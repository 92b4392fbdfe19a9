//! Placement validation against the expected machine identity.

use nix::unistd::Pid;
use vcgroup_common::constants::{EMULATOR_LEAF, PARTITION_DRIVER_INFIX};
use vcgroup_common::error::{Result, VcgroupError};
use vcgroup_common::types::Controller;

use crate::cgroup::group::Group;
use crate::cgroup::naming::{escape_partition, make_scope_name};

/// Leaf names a machine group may legitimately carry.
fn machine_candidates(name: &str, driver: &str, machine_name: &str) -> [String; 6] {
    [
        name.to_string(),
        machine_name.to_string(),
        escape_partition(&format!("{name}{PARTITION_DRIVER_INFIX}{driver}")),
        escape_partition(&format!("{machine_name}{PARTITION_DRIVER_INFIX}{driver}")),
        escape_partition(&make_scope_name(name, driver, true)),
        escape_partition(&make_scope_name(machine_name, driver, false)),
    ]
}

/// Final component naming the machine. For the cpu family an `emulator`
/// leaf is looked through, as emulator threads live one level deeper.
fn machine_leaf(controller: Controller, placement: &str) -> Option<&str> {
    let (dir, leaf) = placement.rsplit_once('/')?;
    if controller.is_cpu_family() && leaf == EMULATOR_LEAF {
        return dir.rsplit_once('/').map(|(_, leaf)| leaf);
    }
    Some(leaf)
}

pub(super) fn validate_machine_group(
    group: &Group,
    name: &str,
    driver: &str,
    machine_name: &str,
) -> bool {
    let candidates = machine_candidates(name, driver, machine_name);
    for (controller, state) in group.controllers() {
        if controller == Controller::Systemd {
            continue;
        }
        let Some(placement) = state.placement.as_deref() else {
            continue;
        };
        let Some(leaf) = machine_leaf(controller, placement) else {
            tracing::debug!(controller = %controller, placement, "placement has no leaf");
            return false;
        };
        if !candidates.iter().any(|c| c == leaf) {
            tracing::debug!(
                controller = %controller,
                leaf,
                candidates = ?candidates,
                "group leaf does not match machine"
            );
            return false;
        }
    }
    true
}

pub(super) fn validate_placement(group: &Group, pid: Pid) -> Result<()> {
    for (controller, state) in group.mounted() {
        let Some(placement) = state.placement.as_deref() else {
            return Err(VcgroupError::internal(format!(
                "could not find placement for v1 controller '{controller}'"
            )));
        };
        tracing::debug!(
            controller = %controller,
            mount = ?state.mount_point,
            placement,
            pid = pid.as_raw(),
            "detected mount/mapping"
        );
    }
    Ok(())
}

pub(super) fn steal_placement(group: &mut Group) -> Option<String> {
    group.controller_mut(Controller::Systemd).placement.take()
}
