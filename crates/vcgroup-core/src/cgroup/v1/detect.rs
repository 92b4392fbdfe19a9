//! Mount and placement detection.

use std::io::ErrorKind;
use std::path::PathBuf;

use vcgroup_common::config::CgroupConfig;
use vcgroup_common::constants::{CGROUP_FS_TYPE, NAMED_HIERARCHY_PREFIX};
use vcgroup_common::error::{Result, VcgroupError};
use vcgroup_common::types::Controller;

use crate::cgroup::group::{Group, join_placement};
use crate::cgroup::mounts::{options_match, read_mount_table};

/// At least one unnamed `cgroup` mount must exist next to the kernel marker.
pub(super) fn available(config: &CgroupConfig) -> bool {
    if !config.cgroups_marker().exists() {
        return false;
    }
    match read_mount_table(&config.mounts_file()) {
        Ok(entries) => entries.iter().any(|e| {
            e.fs_type == CGROUP_FS_TYPE
                && !e.option_tokens().any(|t| t.starts_with(NAMED_HIERARCHY_PREFIX))
        }),
        Err(e) => {
            tracing::debug!(error = %e, "mount table unreadable, cgroup v1 unavailable");
            false
        }
    }
}

pub(super) fn detect_mounts(
    group: &mut Group,
    fs_type: &str,
    mount_options: &str,
    mount_dir: &str,
) -> Result<()> {
    if fs_type != CGROUP_FS_TYPE {
        return Ok(());
    }
    for controller in Controller::ALL {
        if !options_match(mount_options, controller.mount_token()) {
            continue;
        }
        // Bind mounts repeat a hierarchy later in the table; the last line wins.
        let link_point = resolve_mount_link(mount_dir, controller)?;
        let state = group.controller_mut(controller);
        state.mount_point = Some(PathBuf::from(mount_dir));
        state.link_point = link_point;
    }
    Ok(())
}

/// Finds the compatibility symlink of a co-mounted hierarchy.
///
/// A hierarchy mounted at `/sys/fs/cgroup/cpu,cpuacct` is usually also
/// reachable through `/sys/fs/cgroup/cpu` and `/sys/fs/cgroup/cpuacct`.
/// Older distributions do not create these links, so their absence is
/// only reported.
fn resolve_mount_link(mount_dir: &str, controller: Controller) -> Result<Option<PathBuf>> {
    let Some((parent, leaf)) = mount_dir.rsplit_once('/') else {
        return Err(VcgroupError::internal(format!(
            "missing '/' separator in cgroup mount '{mount_dir}'"
        )));
    };
    if !leaf.contains(',') {
        return Ok(None);
    }

    let link = PathBuf::from(format!("{parent}/{}", controller.mount_token()));
    match std::fs::symlink_metadata(&link) {
        Ok(meta) if meta.file_type().is_symlink() => Ok(Some(link)),
        Ok(_) => {
            tracing::warn!(
                controller = %controller,
                path = %link.display(),
                "expecting a symlink for co-mounted controller"
            );
            Ok(None)
        }
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::warn!(
                controller = %controller,
                mount = mount_dir,
                path = %link.display(),
                "co-mounted controller is missing its symlink"
            );
            Ok(None)
        }
        Err(e) => Err(VcgroupError::io(link, e)),
    }
}

pub(super) fn detect_placement(group: &mut Group, path: &str, controllers: &str, self_path: &str) {
    for controller in Controller::ALL {
        if !options_match(controllers, controller.mount_token()) {
            continue;
        }
        let state = group.controller_mut(controller);
        if state.mount_point.is_none() || state.placement.is_some() {
            continue;
        }
        state.placement = Some(if controller == Controller::Systemd {
            self_path.to_string()
        } else {
            join_placement(self_path, path)
        });
    }
}

pub(super) fn copy_mounts(group: &mut Group, parent: &Group) {
    for (controller, state) in parent.mounted() {
        let target = group.controller_mut(controller);
        target.mount_point.clone_from(&state.mount_point);
        target.link_point.clone_from(&state.link_point);
    }
}

/// Derives placements from `parent`. An absolute `path` is used as is.
pub(super) fn copy_placement(group: &mut Group, path: &str, parent: &Group) -> Result<()> {
    for controller in Controller::ALL {
        // The systemd placement is only ever detected for the running process.
        if controller == Controller::Systemd || !group.controller(controller).is_mounted() {
            continue;
        }
        let placement = if path.starts_with('/') {
            path.to_string()
        } else {
            let base = parent
                .controller(controller)
                .placement
                .as_deref()
                .ok_or_else(|| {
                    VcgroupError::internal(format!(
                        "parent of '{}' has no placement for controller '{controller}'",
                        group.path()
                    ))
                })?;
            join_placement(base, path)
        };
        group.controller_mut(controller).placement = Some(placement);
    }
    Ok(())
}
