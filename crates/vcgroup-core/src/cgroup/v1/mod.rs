//! Cgroup v1 backend.
//!
//! Each controller lives in its own hierarchy (or shares one when
//! co-mounted), so every group operation is a loop over controllers in
//! declaration order. Loops stop at the first hard failure and leave the
//! controllers already handled as they are.

mod bind;
mod controllers;
mod detect;
mod lifecycle;
mod owner;
mod tasks;
mod tunables;
mod validate;

use std::path::{Path, PathBuf};

use nix::unistd::{Gid, Pid, Uid};
use vcgroup_common::config::CgroupConfig;
use vcgroup_common::error::Result;
use vcgroup_common::types::{Controller, ControllerMask, GroupFlags, TaskFlags};

use super::backend::{BackendType, CgroupBackend};
use super::group::Group;

/// Backend driving legacy per-controller hierarchies.
#[derive(Debug, Clone, Default)]
pub struct V1Backend {
    config: CgroupConfig,
}

impl V1Backend {
    /// Creates a backend over the live `/proc`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a backend reading procfs and sizing mounts from `config`.
    #[must_use]
    pub const fn with_config(config: CgroupConfig) -> Self {
        Self { config }
    }

    /// Configuration in use.
    #[must_use]
    pub const fn config(&self) -> &CgroupConfig {
        &self.config
    }
}

impl CgroupBackend for V1Backend {
    fn backend_type(&self) -> BackendType {
        BackendType::V1
    }

    fn available(&self) -> bool {
        detect::available(&self.config)
    }

    fn validate_machine_group(
        &self,
        group: &Group,
        name: &str,
        driver: &str,
        machine_name: &str,
    ) -> bool {
        validate::validate_machine_group(group, name, driver, machine_name)
    }

    fn copy_mounts(&self, group: &mut Group, parent: &Group) {
        detect::copy_mounts(group, parent);
    }

    fn copy_placement(&self, group: &mut Group, path: &str, parent: &Group) -> Result<()> {
        detect::copy_placement(group, path, parent)
    }

    fn detect_mounts(
        &self,
        group: &mut Group,
        fs_type: &str,
        mount_options: &str,
        mount_dir: &str,
    ) -> Result<()> {
        detect::detect_mounts(group, fs_type, mount_options, mount_dir)
    }

    fn detect_placement(
        &self,
        group: &mut Group,
        path: &str,
        controllers: &str,
        self_path: &str,
    ) -> Result<()> {
        detect::detect_placement(group, path, controllers, self_path);
        Ok(())
    }

    fn validate_placement(&self, group: &Group, pid: Pid) -> Result<()> {
        validate::validate_placement(group, pid)
    }

    fn steal_placement(&self, group: &mut Group) -> Option<String> {
        validate::steal_placement(group)
    }

    fn detect_controllers(
        &self,
        group: &mut Group,
        wanted: Option<ControllerMask>,
    ) -> Result<ControllerMask> {
        controllers::detect_controllers(group, wanted)
    }

    fn has_controller(&self, group: &Group, controller: Controller) -> bool {
        group.controller(controller).is_mounted()
    }

    fn any_controller(&self, group: &Group) -> Option<Controller> {
        controllers::any_controller(group)
    }

    fn path_of_controller(
        &self,
        group: &Group,
        controller: Controller,
        key: Option<&str>,
    ) -> Result<PathBuf> {
        controllers::path_of_controller(group, controller, key)
    }

    fn make_group(
        &self,
        parent: &Group,
        group: &mut Group,
        create: bool,
        flags: GroupFlags,
    ) -> Result<()> {
        lifecycle::make_group(parent, group, create, flags)
    }

    fn remove(&self, group: &Group) -> Result<()> {
        lifecycle::remove(group)
    }

    fn add_task(&self, group: &Group, pid: Pid, flags: TaskFlags) -> Result<()> {
        tasks::add_task(group, pid, flags)
    }

    fn has_empty_tasks(&self, group: &Group, controller: Controller) -> Result<bool> {
        tasks::has_empty_tasks(group, controller)
    }

    fn bind_mount(&self, group: &Group, old_root: &Path, mount_opts: &str) -> Result<()> {
        bind::bind_mount(group, old_root, mount_opts, self.config.bind_tmpfs_size)
    }

    fn set_owner(
        &self,
        group: &Group,
        uid: Uid,
        gid: Gid,
        controllers: ControllerMask,
    ) -> Result<()> {
        owner::set_owner(group, uid, gid, controllers)
    }

    fn set_blkio_weight(&self, group: &Group, weight: u32) -> Result<()> {
        tunables::set_value_u64(group, Controller::Blkio, "blkio.weight", u64::from(weight))
    }

    fn blkio_weight(&self, group: &Group) -> Result<u32> {
        tunables::get_value_u32(group, Controller::Blkio, "blkio.weight")
    }

    fn set_cpu_shares(&self, group: &Group, shares: u64) -> Result<()> {
        tunables::set_value_u64(group, Controller::Cpu, "cpu.shares", shares)
    }

    fn cpu_shares(&self, group: &Group) -> Result<u64> {
        tunables::get_value_u64(group, Controller::Cpu, "cpu.shares")
    }

    fn set_cpu_cfs_period(&self, group: &Group, period_us: u64) -> Result<()> {
        tunables::set_value_u64(group, Controller::Cpu, "cpu.cfs_period_us", period_us)
    }

    fn cpu_cfs_period(&self, group: &Group) -> Result<u64> {
        tunables::get_value_u64(group, Controller::Cpu, "cpu.cfs_period_us")
    }

    fn set_cpu_cfs_quota(&self, group: &Group, quota_us: i64) -> Result<()> {
        tunables::set_value_i64(group, Controller::Cpu, "cpu.cfs_quota_us", quota_us)
    }

    fn cpu_cfs_quota(&self, group: &Group) -> Result<i64> {
        tunables::get_value_i64(group, Controller::Cpu, "cpu.cfs_quota_us")
    }

    fn set_memory_limit(&self, group: &Group, bytes: u64) -> Result<()> {
        tunables::set_value_u64(group, Controller::Memory, "memory.limit_in_bytes", bytes)
    }

    fn memory_limit(&self, group: &Group) -> Result<u64> {
        tunables::get_value_u64(group, Controller::Memory, "memory.limit_in_bytes")
    }

    fn set_memory_soft_limit(&self, group: &Group, bytes: u64) -> Result<()> {
        tunables::set_value_u64(group, Controller::Memory, "memory.soft_limit_in_bytes", bytes)
    }

    fn memory_soft_limit(&self, group: &Group) -> Result<u64> {
        tunables::get_value_u64(group, Controller::Memory, "memory.soft_limit_in_bytes")
    }

    fn set_memory_swap_limit(&self, group: &Group, bytes: u64) -> Result<()> {
        tunables::set_value_u64(group, Controller::Memory, "memory.memsw.limit_in_bytes", bytes)
    }

    fn memory_swap_limit(&self, group: &Group) -> Result<u64> {
        tunables::get_value_u64(group, Controller::Memory, "memory.memsw.limit_in_bytes")
    }

    fn memory_use_hierarchy(&self, group: &Group) -> Result<bool> {
        tunables::get_flag(group, Controller::Memory, "memory.use_hierarchy")
    }

    fn set_cpuset_cpus(&self, group: &Group, cpus: &str) -> Result<()> {
        tunables::set_value_str(group, Controller::Cpuset, "cpuset.cpus", cpus)
    }

    fn cpuset_cpus(&self, group: &Group) -> Result<String> {
        tunables::get_value_str(group, Controller::Cpuset, "cpuset.cpus")
    }

    fn set_cpuset_mems(&self, group: &Group, mems: &str) -> Result<()> {
        tunables::set_value_str(group, Controller::Cpuset, "cpuset.mems", mems)
    }

    fn cpuset_mems(&self, group: &Group) -> Result<String> {
        tunables::get_value_str(group, Controller::Cpuset, "cpuset.mems")
    }

    fn set_cpuset_memory_migrate(&self, group: &Group, migrate: bool) -> Result<()> {
        tunables::set_flag(group, Controller::Cpuset, "cpuset.memory_migrate", migrate)
    }

    fn cpuset_memory_migrate(&self, group: &Group) -> Result<bool> {
        tunables::get_flag(group, Controller::Cpuset, "cpuset.memory_migrate")
    }

    fn set_freezer_state(&self, group: &Group, state: &str) -> Result<()> {
        tunables::set_value_str(group, Controller::Freezer, "freezer.state", state)
    }

    fn freezer_state(&self, group: &Group) -> Result<String> {
        tunables::get_value_str(group, Controller::Freezer, "freezer.state")
    }
}
