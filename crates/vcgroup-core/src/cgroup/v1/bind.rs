//! Private cgroup tree for sandboxed callers.
//!
//! Inside a fresh mount namespace the host hierarchies are re-exposed
//! under a small tmpfs: one bind mount per controller plus the
//! compatibility symlinks of co-mounted controllers. Undoing a partial
//! build is left to the namespace teardown.

use std::path::{Path, PathBuf};

use vcgroup_common::error::{Result, VcgroupError};

use crate::cgroup::group::Group;

/// Directory holding the first mounted hierarchy, e.g. `/sys/fs/cgroup`.
pub(super) fn identify_root(group: &Group) -> Result<PathBuf> {
    let Some(mount_point) = group.mounted().find_map(|(_, s)| s.mount_point.as_deref()) else {
        return Err(VcgroupError::internal("could not find any mounted v1 controllers"));
    };
    mount_point.parent().map(Path::to_path_buf).ok_or_else(|| {
        VcgroupError::internal(format!(
            "could not find directory separator in {}",
            mount_point.display()
        ))
    })
}

/// tmpfs options: fixed mode and size, then the caller's extras.
pub(super) fn tmpfs_options(size: u64, extra: &str) -> String {
    let sep = if extra.is_empty() || extra.starts_with(',') { "" } else { "," };
    format!("mode=755,size={size}{sep}{extra}")
}

/// Source of a bind mount: the host path seen through `old_root`.
fn under_old_root(old_root: &Path, mount_point: &Path) -> PathBuf {
    let mut raw = old_root.as_os_str().to_owned();
    raw.push(mount_point.as_os_str());
    PathBuf::from(raw)
}

#[cfg(target_os = "linux")]
pub(super) fn bind_mount(
    group: &Group,
    old_root: &Path,
    mount_opts: &str,
    tmpfs_size: u64,
) -> Result<()> {
    use nix::mount::{MsFlags, mount};

    let root = identify_root(group)?;
    tracing::debug!(root = %root.display(), "mounting cgroups");
    std::fs::create_dir_all(&root).map_err(|e| VcgroupError::io(&root, e))?;

    let opts = tmpfs_options(tmpfs_size, mount_opts);
    mount(
        Some("tmpfs"),
        &root,
        Some("tmpfs"),
        MsFlags::MS_NOSUID | MsFlags::MS_NODEV | MsFlags::MS_NOEXEC,
        Some(opts.as_str()),
    )
    .map_err(|e| VcgroupError::io(&root, e))?;

    for (controller, state) in group.mounted() {
        let Some(mount_point) = state.mount_point.as_deref() else {
            continue;
        };
        // Co-mounted controllers share a target; bind it only once.
        if !mount_point.exists() {
            let src = under_old_root(old_root, mount_point);
            tracing::debug!(controller = %controller, path = %mount_point.display(), "creating mount point");
            std::fs::create_dir_all(mount_point).map_err(|e| VcgroupError::io(mount_point, e))?;
            mount(
                Some(&src),
                mount_point,
                Some("none"),
                MsFlags::MS_BIND,
                None::<&str>,
            )
            .map_err(|e| VcgroupError::io(mount_point, e))?;
        }

        if let Some(link) = state.link_point.as_deref() {
            tracing::debug!(
                target = %mount_point.display(),
                link = %link.display(),
                "linking mount point"
            );
            std::os::unix::fs::symlink(mount_point, link).map_err(|e| VcgroupError::io(link, e))?;
        }
    }
    tracing::info!(root = %root.display(), "cgroup tree bind mounted");
    Ok(())
}

/// Stub for non-Linux platforms.
///
/// # Errors
///
/// Always returns an error: mounting requires Linux.
#[cfg(not(target_os = "linux"))]
pub(super) fn bind_mount(
    _group: &Group,
    _old_root: &Path,
    _mount_opts: &str,
    _tmpfs_size: u64,
) -> Result<()> {
    Err(VcgroupError::Config {
        message: "Linux required for cgroup mounts".into(),
    })
}
