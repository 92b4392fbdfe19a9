//! Task attachment and membership queries.

use nix::unistd::Pid;
use vcgroup_common::constants::TASKS_FILE;
use vcgroup_common::error::Result;
use vcgroup_common::types::{Controller, TaskFlags};

use super::tunables::{get_value_str, set_value_i64};
use crate::cgroup::group::Group;

pub(super) fn add_task(group: &Group, pid: Pid, flags: TaskFlags) -> Result<()> {
    for (controller, _) in group.mounted() {
        // Only move tasks into systemd's hierarchy when asked to.
        if controller == Controller::Systemd && !flags.contains(TaskFlags::SYSTEMD) {
            continue;
        }
        set_value_i64(group, controller, TASKS_FILE, i64::from(pid.as_raw()))?;
    }
    tracing::debug!(group = group.path(), pid = pid.as_raw(), "task attached");
    Ok(())
}

pub(super) fn has_empty_tasks(group: &Group, controller: Controller) -> Result<bool> {
    Ok(get_value_str(group, controller, TASKS_FILE)?.is_empty())
}
