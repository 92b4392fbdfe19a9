//! Integration tests for the cgroup v1 backend.
//!
//! A scratch directory stands in for both procfs and the cgroup mounts:
//! 1. Availability probing against fake `/proc` contents
//! 2. Mount table scanning, co-mount symlinks and bind-mount duplicates
//! 3. Live detection of a group from mounts plus self-placement
//! 4. Child derivation, creation races and the blkio fallback
//! 5. Removal, task attachment and machine name validation
//! 6. Process-wide backend selection

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::path::{Path, PathBuf};

use nix::unistd::Pid;
use tempfile::TempDir;
use vcgroup_common::config::CgroupConfig;
use vcgroup_common::error::VcgroupError;
use vcgroup_common::types::{Controller, ControllerMask, GroupFlags, TaskFlags};
use vcgroup_core::cgroup::{
    BackendRegistry, BackendType, CgroupBackend, Group, V1Backend, derive_group, detect_group,
    registry,
};

/// Scratch host with a fake procfs under `proc/` and hierarchies under `cgroup/`.
struct FakeHost {
    dir: TempDir,
}

impl FakeHost {
    fn new() -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::create_dir_all(dir.path().join("proc/self")).expect("mkdir proc");
        std::fs::create_dir_all(dir.path().join("cgroup")).expect("mkdir cgroup");
        Self { dir }
    }

    fn proc(&self) -> PathBuf {
        self.dir.path().join("proc")
    }

    fn cgroup(&self, leaf: &str) -> PathBuf {
        self.dir.path().join("cgroup").join(leaf)
    }

    fn cgroup_str(&self, leaf: &str) -> String {
        self.cgroup(leaf).to_str().expect("utf8 path").to_string()
    }

    fn config(&self) -> CgroupConfig {
        CgroupConfig::with_proc_root(self.proc())
    }

    fn backend(&self) -> V1Backend {
        V1Backend::with_config(self.config())
    }

    fn write_marker(&self) {
        std::fs::write(self.proc().join("cgroups"), "#subsys_name\thierarchy\n").expect("marker");
    }

    fn write_mounts(&self, lines: &[String]) {
        std::fs::write(self.proc().join("mounts"), lines.join("\n")).expect("mounts");
    }

    fn write_self_cgroup(&self, content: &str) {
        std::fs::write(self.proc().join("self/cgroup"), content).expect("self cgroup");
    }

    fn mount_line(&self, leaf: &str, options: &str) -> String {
        format!("cgroup {} cgroup rw,nosuid,nodev,noexec,relatime,{options} 0 0", self.cgroup_str(leaf))
    }

    fn link(&self, name: &str, target: &str) {
        std::os::unix::fs::symlink(target, self.cgroup(name)).expect("symlink");
    }
}

fn mkdirs(path: &Path) {
    std::fs::create_dir_all(path).expect("mkdir");
}

// ── Availability ─────────────────────────────────────────────────────

#[test]
fn available_with_marker_and_unnamed_cgroup_mount() {
    let host = FakeHost::new();
    host.write_marker();
    host.write_mounts(&[
        host.mount_line("systemd", "xattr,name=systemd"),
        host.mount_line("memory", "memory"),
    ]);
    assert!(host.backend().available());
}

#[test]
fn unavailable_with_only_named_hierarchies() {
    let host = FakeHost::new();
    host.write_marker();
    host.write_mounts(&[host.mount_line("systemd", "xattr,name=systemd")]);
    assert!(!host.backend().available());
}

#[test]
fn unavailable_without_marker_or_mount_table() {
    let host = FakeHost::new();
    host.write_mounts(&[host.mount_line("memory", "memory")]);
    assert!(!host.backend().available());

    let host = FakeHost::new();
    host.write_marker();
    assert!(!host.backend().available());
}

#[test]
fn registry_selects_available_v1() {
    let host = FakeHost::new();
    host.write_marker();
    host.write_mounts(&[host.mount_line("cpuset", "cpuset")]);
    let registry = BackendRegistry::with_builtin(&host.config());
    let selected = registry.select_available().expect("v1 available");
    assert_eq!(selected.backend_type(), BackendType::V1);
}

// ── Mount detection ──────────────────────────────────────────────────

#[test]
fn comounted_controllers_share_mount_and_resolve_links() {
    let host = FakeHost::new();
    mkdirs(&host.cgroup("cpu,cpuacct"));
    host.link("cpuacct", "cpu,cpuacct");

    let backend = host.backend();
    let mut group = Group::new("/");
    backend
        .detect_mounts(&mut group, "cgroup", "rw,cpu,cpuacct", &host.cgroup_str("cpu,cpuacct"))
        .expect("detect");

    let cpu = group.controller(Controller::Cpu);
    let cpuacct = group.controller(Controller::Cpuacct);
    assert_eq!(cpu.mount_point, Some(host.cgroup("cpu,cpuacct")));
    assert_eq!(cpuacct.mount_point, cpu.mount_point);
    assert_eq!(cpuacct.link_point, Some(host.cgroup("cpuacct")));
    // No `cpu` link on this host: only a warning.
    assert_eq!(cpu.link_point, None);

    host.link("cpu", "cpu,cpuacct");
    backend
        .detect_mounts(&mut group, "cgroup", "rw,cpu,cpuacct", &host.cgroup_str("cpu,cpuacct"))
        .expect("detect again");
    assert_eq!(group.controller(Controller::Cpu).link_point, Some(host.cgroup("cpu")));
    assert_eq!(group.controller(Controller::Cpuacct).link_point, Some(host.cgroup("cpuacct")));
}

#[test]
fn bind_mount_duplicates_converge_on_last_line() {
    let host = FakeHost::new();
    mkdirs(&host.cgroup("cpu,cpuacct"));
    host.link("cpu", "cpu,cpuacct");
    host.link("cpuacct", "cpu,cpuacct");
    let backend = host.backend();

    let base = [
        ("rw,memory", host.cgroup_str("memory")),
        ("rw,cpu,cpuacct", host.cgroup_str("cpu,cpuacct")),
        ("rw,blkio", host.cgroup_str("blkio")),
    ];
    let mut with_duplicates = vec![
        ("rw,memory", "/elsewhere/memory".to_string()),
        ("rw,cpu,cpuacct", "/elsewhere/cpu,cpuacct".to_string()),
    ];
    with_duplicates.extend(base.iter().cloned());

    let scan = |lines: &[(&str, String)]| {
        let mut group = Group::new("/");
        for (options, dir) in lines {
            backend.detect_mounts(&mut group, "cgroup", options, dir).expect("detect");
        }
        group
    };
    assert_eq!(scan(&base[..]), scan(&with_duplicates[..]));
}

// ── Live detection ───────────────────────────────────────────────────

fn populated_host() -> FakeHost {
    let host = FakeHost::new();
    host.write_marker();
    mkdirs(&host.cgroup("cpu,cpuacct/machine.slice"));
    mkdirs(&host.cgroup("memory/machine.slice"));
    mkdirs(&host.cgroup("systemd/machine.slice"));
    host.link("cpu", "cpu,cpuacct");
    host.link("cpuacct", "cpu,cpuacct");
    host.write_mounts(&[
        "proc /proc proc rw,nosuid,nodev,noexec,relatime 0 0".to_string(),
        host.mount_line("systemd", "xattr,name=systemd"),
        host.mount_line("cpu,cpuacct", "cpu,cpuacct"),
        host.mount_line("memory", "memory"),
        host.mount_line("blkio", "blkio"),
    ]);
    host.write_self_cgroup(
        "5:blkio:/machine.slice\n\
         4:memory:/machine.slice\n\
         3:cpu,cpuacct:/machine.slice\n\
         1:name=systemd:/machine.slice/machine-qemu\\x2d1\\x2ddemo.scope\n",
    );
    host
}

#[test]
fn detect_group_reads_mounts_and_self_placement() {
    let host = populated_host();
    let backend = host.backend();
    let group = detect_group(&backend, &host.config(), "", None, None).expect("detect");

    assert_eq!(group.controller(Controller::Memory).placement.as_deref(), Some("/machine.slice"));
    assert_eq!(group.controller(Controller::Cpuacct).placement.as_deref(), Some("/machine.slice"));
    assert_eq!(
        group.controller(Controller::Systemd).placement.as_deref(),
        Some("/machine.slice/machine-qemu\\x2d1\\x2ddemo.scope")
    );
    assert!(!group.controller(Controller::Devices).is_mounted());
}

#[test]
fn detect_group_rejects_partial_comount_request() {
    let host = populated_host();
    let backend = host.backend();
    let err = detect_group(
        &backend,
        &host.config(),
        "",
        None,
        Some(ControllerMask::CPU | ControllerMask::MEMORY),
    )
    .unwrap_err();
    assert!(matches!(err, VcgroupError::Unsupported { .. }));
}

#[test]
fn detect_group_drops_unmounted_request() {
    let host = populated_host();
    let backend = host.backend();
    let mut group = detect_group(
        &backend,
        &host.config(),
        "",
        None,
        Some(ControllerMask::MEMORY | ControllerMask::FREEZER),
    )
    .expect("detect");
    assert!(!backend.has_controller(&group, Controller::Freezer));
    assert!(!backend.has_controller(&group, Controller::Cpu));
    assert_eq!(
        backend.detect_controllers(&mut group, None).expect("auto"),
        ControllerMask::MEMORY
    );
}

#[test]
fn detect_group_without_placement_is_internal_error() {
    let host = populated_host();
    host.write_self_cgroup("4:memory:/machine.slice\n");
    let backend = host.backend();
    let err = detect_group(&backend, &host.config(), "", None, None).unwrap_err();
    assert!(matches!(err, VcgroupError::Internal { .. }));
}

#[test]
fn detached_controller_needs_no_placement() {
    let host = populated_host();
    host.write_self_cgroup(
        "4:memory:/machine.slice\n\
         3:cpu,cpuacct:/machine.slice\n\
         1:name=systemd:/machine.slice\n",
    );
    let backend = host.backend();
    let group = detect_group(
        &backend,
        &host.config(),
        "",
        None,
        Some(ControllerMask::MEMORY | ControllerMask::CPU | ControllerMask::CPUACCT | ControllerMask::SYSTEMD),
    )
    .expect("blkio is detached before placements are checked");
    assert!(!backend.has_controller(&group, Controller::Blkio));
    assert_eq!(group.controller(Controller::Blkio).placement, None);
    assert_eq!(group.controller(Controller::Memory).placement.as_deref(), Some("/machine.slice"));
}

#[test]
fn detect_group_requires_one_controller() {
    let host = populated_host();
    let backend = host.backend();
    let err = detect_group(&backend, &host.config(), "", None, Some(ControllerMask::FREEZER))
        .unwrap_err();
    assert!(matches!(err, VcgroupError::Unsupported { .. }));
    assert!(err.to_string().contains("at least one cgroup controller"));
}

#[test]
fn detect_group_fails_without_any_mounted_hierarchy() {
    let host = FakeHost::new();
    host.write_marker();
    host.write_mounts(&["proc /proc proc rw 0 0".to_string()]);
    host.write_self_cgroup("0::/\n");
    let err = detect_group(&host.backend(), &host.config(), "", None, None).unwrap_err();
    assert!(matches!(err, VcgroupError::Unsupported { .. }));
}

#[test]
fn steal_placement_hands_over_systemd_scope() {
    let host = populated_host();
    let backend = host.backend();
    let mut group = detect_group(&backend, &host.config(), "", None, None).expect("detect");
    let scope = backend.steal_placement(&mut group);
    assert_eq!(scope.as_deref(), Some("/machine.slice/machine-qemu\\x2d1\\x2ddemo.scope"));
    assert_eq!(group.controller(Controller::Systemd).placement, None);
}

// ── Derivation and creation ──────────────────────────────────────────

#[test]
fn derive_group_creates_controller_directories() {
    let host = populated_host();
    let backend = host.backend();
    let parent = detect_group(&backend, &host.config(), "", None, None).expect("detect");

    let child = derive_group(&backend, &parent, "demo", true, GroupFlags::empty()).expect("derive");
    assert!(host.cgroup("cpu,cpuacct/machine.slice/demo").is_dir());
    assert!(host.cgroup("memory/machine.slice/demo").is_dir());
    assert!(!host.cgroup("systemd/machine.slice/demo").exists());
    assert_eq!(
        backend.path_of_controller(&child, Controller::Memory, Some("tasks")).expect("path"),
        host.cgroup("memory/machine.slice/demo/tasks")
    );
    assert_eq!(backend.any_controller(&child), Some(Controller::Cpu));
}

#[test]
fn derive_group_tolerates_existing_directories() {
    let host = populated_host();
    let backend = host.backend();
    let parent = detect_group(&backend, &host.config(), "", None, None).expect("detect");
    mkdirs(&host.cgroup("memory/machine.slice/demo"));

    derive_group(&backend, &parent, "demo", true, GroupFlags::empty()).expect("first");
    derive_group(&backend, &parent, "demo", true, GroupFlags::empty()).expect("second");
    assert!(host.cgroup("memory/machine.slice/demo").is_dir());
}

#[test]
fn blkio_mkdir_failure_detaches_blkio_only() {
    let host = populated_host();
    let backend = host.backend();
    let parent = detect_group(&backend, &host.config(), "", None, None).expect("detect");
    // The blkio hierarchy directory was never created, so mkdir fails.
    assert!(!host.cgroup("blkio").exists());

    let child = derive_group(&backend, &parent, "demo", true, GroupFlags::empty()).expect("derive");
    assert!(!backend.has_controller(&child, Controller::Blkio));
    assert!(backend.has_controller(&child, Controller::Memory));
}

#[test]
fn non_blkio_mkdir_failure_aborts() {
    let host = populated_host();
    let backend = host.backend();
    let parent = detect_group(&backend, &host.config(), "", None, None).expect("detect");
    let err = derive_group(&backend, &parent, "missing/demo", true, GroupFlags::empty()).unwrap_err();
    assert_eq!(err.io_kind(), Some(std::io::ErrorKind::NotFound));
}

// ── Removal ──────────────────────────────────────────────────────────

#[test]
fn remove_deletes_group_tree() {
    let host = populated_host();
    let backend = host.backend();
    let parent = detect_group(&backend, &host.config(), "", None, None).expect("detect");
    let child = derive_group(&backend, &parent, "demo", true, GroupFlags::empty()).expect("derive");
    mkdirs(&host.cgroup("memory/machine.slice/demo/emulator"));

    backend.remove(&child).expect("remove");
    assert!(!host.cgroup("memory/machine.slice/demo").exists());
    assert!(!host.cgroup("cpu,cpuacct/machine.slice/demo").exists());
    assert!(host.cgroup("memory/machine.slice").is_dir());
}

#[test]
fn remove_never_touches_root_placement() {
    let host = FakeHost::new();
    mkdirs(&host.cgroup("memory/child"));
    let mut group = Group::new("/");
    let state = group.controller_mut(Controller::Memory);
    state.mount_point = Some(host.cgroup("memory"));
    state.placement = Some("/".into());

    host.backend().remove(&group).expect("remove");
    assert!(host.cgroup("memory/child").is_dir());
}

// ── Tasks ────────────────────────────────────────────────────────────

#[test]
fn add_task_stops_at_first_failure() {
    let host = FakeHost::new();
    mkdirs(&host.cgroup("cpu/vm"));
    mkdirs(&host.cgroup("blkio/vm"));
    std::fs::write(host.cgroup("cpu/vm/tasks"), "").expect("cpu tasks");
    std::fs::write(host.cgroup("blkio/vm/tasks"), "").expect("blkio tasks");
    let mut group = Group::new("/vm");
    for (c, leaf) in [
        (Controller::Cpu, "cpu"),
        (Controller::Memory, "memory"),
        (Controller::Blkio, "blkio"),
    ] {
        let state = group.controller_mut(c);
        state.mount_point = Some(host.cgroup(leaf));
        state.placement = Some("/vm".into());
    }

    let err = host
        .backend()
        .add_task(&group, Pid::from_raw(1234), TaskFlags::empty())
        .unwrap_err();
    assert_eq!(err.io_kind(), Some(std::io::ErrorKind::NotFound));
    assert_eq!(std::fs::read_to_string(host.cgroup("cpu/vm/tasks")).expect("cpu tasks"), "1234");
    assert_eq!(std::fs::read_to_string(host.cgroup("blkio/vm/tasks")).expect("blkio tasks"), "");
}

#[test]
fn has_empty_tasks_after_attach() {
    let host = populated_host();
    let backend = host.backend();
    let parent = detect_group(&backend, &host.config(), "", None, None).expect("detect");
    let child = derive_group(&backend, &parent, "demo", true, GroupFlags::empty()).expect("derive");
    std::fs::write(host.cgroup("memory/machine.slice/demo/tasks"), "").expect("tasks");
    std::fs::write(host.cgroup("cpu,cpuacct/machine.slice/demo/tasks"), "").expect("tasks");
    assert!(backend.has_empty_tasks(&child, Controller::Memory).expect("empty"));

    backend.add_task(&child, Pid::from_raw(77), TaskFlags::empty()).expect("attach");
    assert!(!backend.has_empty_tasks(&child, Controller::Memory).expect("not empty"));
}

// ── Machine validation ───────────────────────────────────────────────

#[test]
fn machine_group_validation_guards_against_foreign_groups() {
    let host = populated_host();
    let backend = host.backend();
    let parent = detect_group(&backend, &host.config(), "", None, None).expect("detect");

    let ours = derive_group(&backend, &parent, "demo.libvirt-qemu", true, GroupFlags::empty())
        .expect("derive");
    assert!(backend.validate_machine_group(&ours, "demo", "qemu", "qemu-1-demo"));

    let theirs = derive_group(&backend, &parent, "other-process", true, GroupFlags::empty())
        .expect("derive");
    assert!(!backend.validate_machine_group(&theirs, "demo", "qemu", "qemu-1-demo"));
}

// ── Process-wide selection ───────────────────────────────────────────

// The only test in this binary touching the process-wide registry.
#[test]
fn process_backend_is_selected_once() {
    let host = FakeHost::new();
    host.write_marker();
    host.write_mounts(&[host.mount_line("memory", "memory")]);

    let installed = registry::init(&host.config());
    assert!(std::ptr::eq(installed, registry::registry()));
    assert!(std::ptr::eq(installed, registry::init(&CgroupConfig::default())));

    let first = registry::backend().expect("v1 available on the fake host");
    assert_eq!(first.backend_type(), BackendType::V1);

    // The probe would now fail, but the choice is already fixed.
    std::fs::remove_file(host.proc().join("cgroups")).expect("remove marker");
    assert!(!first.available());
    let second = registry::backend().expect("selection is kept");
    assert!(std::ptr::addr_eq(first, second));
}
