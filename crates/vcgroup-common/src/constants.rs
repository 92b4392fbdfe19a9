//! System-wide constants and default paths.

/// Default procfs mount point.
pub const PROC_ROOT: &str = "/proc";

/// File under [`PROC_ROOT`] whose presence signals kernel cgroup support.
pub const CGROUPS_MARKER_FILE: &str = "cgroups";

/// Mount table under [`PROC_ROOT`].
pub const MOUNTS_FILE: &str = "mounts";

/// Per-process placement file under `<proc>/<pid>/`.
pub const PROC_CGROUP_FILE: &str = "cgroup";

/// Filesystem type of v1 hierarchies in the mount table.
pub const CGROUP_FS_TYPE: &str = "cgroup";

/// Mount option prefix used by named (controller-less) hierarchies.
pub const NAMED_HIERARCHY_PREFIX: &str = "name=";

/// Control file listing the thread IDs attached to a group.
pub const TASKS_FILE: &str = "tasks";

/// Size in bytes of the tmpfs used as the bootstrap cgroup root.
pub const BIND_TMPFS_SIZE: u64 = 65_536;

/// Mode of group directories created by the backend.
pub const GROUP_DIR_MODE: u32 = 0o755;

/// Infix between a machine name and the driver name in partition leaves.
pub const PARTITION_DRIVER_INFIX: &str = ".libvirt-";

/// Leaf holding emulator helper threads below a machine group.
pub const EMULATOR_LEAF: &str = "emulator";

/// Files copied from the parent cpuset before tasks can be attached.
pub const CPUSET_INHERITED_FILES: [&str; 3] =
    ["cpuset.cpus", "cpuset.mems", "cpuset.memory_migrate"];
