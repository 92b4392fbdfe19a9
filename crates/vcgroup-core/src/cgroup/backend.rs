//! Backend abstraction over cgroup hierarchy versions.

use std::fmt;
use std::path::{Path, PathBuf};

use nix::unistd::{Gid, Pid, Uid};
use vcgroup_common::error::Result;
use vcgroup_common::types::{Controller, ControllerMask, GroupFlags, TaskFlags};

use super::group::Group;

/// Identifies the hierarchy version a backend drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum BackendType {
    /// Legacy per-controller hierarchies.
    V1,
}

impl fmt::Display for BackendType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::V1 => write!(f, "cgroup-v1"),
        }
    }
}

/// Operation table of one hierarchy version.
///
/// Implementors hold no per-group state: every method receives the
/// [`Group`] it works on, so groups stay backend-agnostic. Methods
/// performing several filesystem calls stop at the first hard failure and
/// do not roll back what was already done.
pub trait CgroupBackend: Send + Sync {
    /// Hierarchy version served by this backend.
    fn backend_type(&self) -> BackendType;

    /// Whether the running kernel exposes this hierarchy version.
    ///
    /// Never fails: any I/O error means "not available".
    fn available(&self) -> bool;

    /// Checks that every placement of `group` names the expected machine.
    fn validate_machine_group(
        &self,
        group: &Group,
        name: &str,
        driver: &str,
        machine_name: &str,
    ) -> bool;

    /// Copies mount and link points of every controller mounted in `parent`.
    fn copy_mounts(&self, group: &mut Group, parent: &Group);

    /// Derives the placements of `group` from those of `parent`.
    ///
    /// # Errors
    ///
    /// Returns an error if a mounted controller of `parent` lacks a placement.
    fn copy_placement(&self, group: &mut Group, path: &str, parent: &Group) -> Result<()>;

    /// Records one mount table line.
    ///
    /// # Errors
    ///
    /// Returns an error if a co-mount link path cannot be inspected.
    fn detect_mounts(
        &self,
        group: &mut Group,
        fs_type: &str,
        mount_options: &str,
        mount_dir: &str,
    ) -> Result<()>;

    /// Records one placement line of the calling process.
    ///
    /// # Errors
    ///
    /// Never fails for the v1 backend; kept fallible for other versions.
    fn detect_placement(
        &self,
        group: &mut Group,
        path: &str,
        controllers: &str,
        self_path: &str,
    ) -> Result<()>;

    /// Checks that every mounted controller received a placement.
    ///
    /// # Errors
    ///
    /// Returns an internal error naming the first controller without one.
    fn validate_placement(&self, group: &Group, pid: Pid) -> Result<()>;

    /// Moves the placement of the `systemd` hierarchy out of `group`.
    fn steal_placement(&self, group: &mut Group) -> Option<String>;

    /// Reconciles the wanted controllers with the mounted ones.
    ///
    /// `None` auto-detects and returns every mounted controller.
    ///
    /// # Errors
    ///
    /// Returns an unsupported-configuration error when an unwanted
    /// controller is co-mounted with a wanted one.
    fn detect_controllers(
        &self,
        group: &mut Group,
        wanted: Option<ControllerMask>,
    ) -> Result<ControllerMask>;

    /// Whether `controller` is mounted for `group`.
    fn has_controller(&self, group: &Group, controller: Controller) -> bool;

    /// First mounted controller whose placement is not the root group.
    fn any_controller(&self, group: &Group) -> Option<Controller>;

    /// Path of `key` (or of the group directory) under `controller`.
    ///
    /// # Errors
    ///
    /// Returns an internal error if the controller is not mounted or has no
    /// placement.
    fn path_of_controller(
        &self,
        group: &Group,
        controller: Controller,
        key: Option<&str>,
    ) -> Result<PathBuf>;

    /// Creates the on-disk directories of `group`.
    ///
    /// # Errors
    ///
    /// Returns an error if a directory cannot be created or initialised.
    fn make_group(
        &self,
        parent: &Group,
        group: &mut Group,
        create: bool,
        flags: GroupFlags,
    ) -> Result<()>;

    /// Recursively removes the on-disk directories of `group`.
    ///
    /// # Errors
    ///
    /// Returns the outcome of the last controller removed.
    fn remove(&self, group: &Group) -> Result<()>;

    /// Attaches `pid` to every mounted controller.
    ///
    /// # Errors
    ///
    /// Returns the first write failure; later controllers are not touched.
    fn add_task(&self, group: &Group, pid: Pid, flags: TaskFlags) -> Result<()>;

    /// Whether no task is attached to `group` under `controller`.
    ///
    /// # Errors
    ///
    /// Returns an error if the `tasks` file cannot be read.
    fn has_empty_tasks(&self, group: &Group, controller: Controller) -> Result<bool>;

    /// Builds a private cgroup tree for a sandbox from `old_root`.
    ///
    /// # Errors
    ///
    /// Returns the first mount, mkdir or symlink failure.
    fn bind_mount(&self, group: &Group, old_root: &Path, mount_opts: &str) -> Result<()>;

    /// Hands the group directories of the selected controllers to `uid:gid`.
    ///
    /// # Errors
    ///
    /// Returns the first directory read or `chown` failure.
    fn set_owner(&self, group: &Group, uid: Uid, gid: Gid, controllers: ControllerMask)
    -> Result<()>;

    /// Sets `blkio.weight`.
    ///
    /// # Errors
    ///
    /// Returns an error if the control file cannot be written.
    fn set_blkio_weight(&self, group: &Group, weight: u32) -> Result<()>;

    /// Reads `blkio.weight`.
    ///
    /// # Errors
    ///
    /// Returns an error if the control file cannot be read or parsed.
    fn blkio_weight(&self, group: &Group) -> Result<u32>;

    /// Sets `cpu.shares`.
    ///
    /// # Errors
    ///
    /// Returns an error if the control file cannot be written.
    fn set_cpu_shares(&self, group: &Group, shares: u64) -> Result<()>;

    /// Reads `cpu.shares`.
    ///
    /// # Errors
    ///
    /// Returns an error if the control file cannot be read or parsed.
    fn cpu_shares(&self, group: &Group) -> Result<u64>;

    /// Sets `cpu.cfs_period_us`.
    ///
    /// # Errors
    ///
    /// Returns an error if the control file cannot be written.
    fn set_cpu_cfs_period(&self, group: &Group, period_us: u64) -> Result<()>;

    /// Reads `cpu.cfs_period_us`.
    ///
    /// # Errors
    ///
    /// Returns an error if the control file cannot be read or parsed.
    fn cpu_cfs_period(&self, group: &Group) -> Result<u64>;

    /// Sets `cpu.cfs_quota_us`; `-1` removes the limit.
    ///
    /// # Errors
    ///
    /// Returns an error if the control file cannot be written.
    fn set_cpu_cfs_quota(&self, group: &Group, quota_us: i64) -> Result<()>;

    /// Reads `cpu.cfs_quota_us`.
    ///
    /// # Errors
    ///
    /// Returns an error if the control file cannot be read or parsed.
    fn cpu_cfs_quota(&self, group: &Group) -> Result<i64>;

    /// Sets `memory.limit_in_bytes`.
    ///
    /// # Errors
    ///
    /// Returns an error if the control file cannot be written.
    fn set_memory_limit(&self, group: &Group, bytes: u64) -> Result<()>;

    /// Reads `memory.limit_in_bytes`.
    ///
    /// # Errors
    ///
    /// Returns an error if the control file cannot be read or parsed.
    fn memory_limit(&self, group: &Group) -> Result<u64>;

    /// Sets `memory.soft_limit_in_bytes`.
    ///
    /// # Errors
    ///
    /// Returns an error if the control file cannot be written.
    fn set_memory_soft_limit(&self, group: &Group, bytes: u64) -> Result<()>;

    /// Reads `memory.soft_limit_in_bytes`.
    ///
    /// # Errors
    ///
    /// Returns an error if the control file cannot be read or parsed.
    fn memory_soft_limit(&self, group: &Group) -> Result<u64>;

    /// Sets `memory.memsw.limit_in_bytes`.
    ///
    /// # Errors
    ///
    /// Returns an error if the control file cannot be written.
    fn set_memory_swap_limit(&self, group: &Group, bytes: u64) -> Result<()>;

    /// Reads `memory.memsw.limit_in_bytes`.
    ///
    /// # Errors
    ///
    /// Returns an error if the control file cannot be read or parsed.
    fn memory_swap_limit(&self, group: &Group) -> Result<u64>;

    /// Reads `memory.use_hierarchy`.
    ///
    /// # Errors
    ///
    /// Returns an error if the control file cannot be read or parsed.
    fn memory_use_hierarchy(&self, group: &Group) -> Result<bool>;

    /// Sets `cpuset.cpus`, e.g. `0-3,8`.
    ///
    /// # Errors
    ///
    /// Returns an error if the control file cannot be written.
    fn set_cpuset_cpus(&self, group: &Group, cpus: &str) -> Result<()>;

    /// Reads `cpuset.cpus`.
    ///
    /// # Errors
    ///
    /// Returns an error if the control file cannot be read.
    fn cpuset_cpus(&self, group: &Group) -> Result<String>;

    /// Sets `cpuset.mems`.
    ///
    /// # Errors
    ///
    /// Returns an error if the control file cannot be written.
    fn set_cpuset_mems(&self, group: &Group, mems: &str) -> Result<()>;

    /// Reads `cpuset.mems`.
    ///
    /// # Errors
    ///
    /// Returns an error if the control file cannot be read.
    fn cpuset_mems(&self, group: &Group) -> Result<String>;

    /// Sets `cpuset.memory_migrate`.
    ///
    /// # Errors
    ///
    /// Returns an error if the control file cannot be written.
    fn set_cpuset_memory_migrate(&self, group: &Group, migrate: bool) -> Result<()>;

    /// Reads `cpuset.memory_migrate`.
    ///
    /// # Errors
    ///
    /// Returns an error if the control file cannot be read or parsed.
    fn cpuset_memory_migrate(&self, group: &Group) -> Result<bool>;

    /// Writes `freezer.state` (`FROZEN` or `THAWED`).
    ///
    /// # Errors
    ///
    /// Returns an error if the control file cannot be written.
    fn set_freezer_state(&self, group: &Group, state: &str) -> Result<()>;

    /// Reads `freezer.state`.
    ///
    /// # Errors
    ///
    /// Returns an error if the control file cannot be read.
    fn freezer_state(&self, group: &Group) -> Result<String>;
}
