//! Domain primitive types shared by the cgroup backends.

use std::fmt;
use std::str::FromStr;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::error::VcgroupError;

/// A cgroup v1 controller known to the backends.
///
/// The declaration order is the enumeration order used by every
/// per-controller loop (task attachment, removal, bind mounting).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Controller {
    /// CPU scheduler shares and bandwidth.
    Cpu,
    /// CPU usage accounting.
    Cpuacct,
    /// CPU and memory node pinning.
    Cpuset,
    /// Memory limits and accounting.
    Memory,
    /// Device node access control.
    Devices,
    /// Task freezing.
    Freezer,
    /// Block I/O weights and throttling.
    Blkio,
    /// Network packet classification.
    NetCls,
    /// Per-group perf events.
    PerfEvent,
    /// Named `systemd` hierarchy, used for bookkeeping only.
    Systemd,
}

/// Controller names, indexed by [`Controller::index`].
const NAMES: [&str; Controller::COUNT] = [
    "cpu",
    "cpuacct",
    "cpuset",
    "memory",
    "devices",
    "freezer",
    "blkio",
    "net_cls",
    "perf_event",
    "systemd",
];

/// Mount option tokens, indexed by [`Controller::index`].
const MOUNT_TOKENS: [&str; Controller::COUNT] = [
    "cpu",
    "cpuacct",
    "cpuset",
    "memory",
    "devices",
    "freezer",
    "blkio",
    "net_cls",
    "perf_event",
    "name=systemd",
];

// One table entry per variant, and variants are dense from zero.
const _: () = assert!(Controller::Systemd as usize + 1 == Controller::COUNT);

impl Controller {
    /// Number of known controllers.
    pub const COUNT: usize = 10;

    /// All controllers in declaration order.
    pub const ALL: [Self; Self::COUNT] = [
        Self::Cpu,
        Self::Cpuacct,
        Self::Cpuset,
        Self::Memory,
        Self::Devices,
        Self::Freezer,
        Self::Blkio,
        Self::NetCls,
        Self::PerfEvent,
        Self::Systemd,
    ];

    /// Position of this controller in [`Controller::ALL`].
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Short name, e.g. `net_cls`.
    #[must_use]
    pub const fn name(self) -> &'static str {
        NAMES[self.index()]
    }

    /// Token identifying this controller in mount options and in
    /// `/proc/<pid>/cgroup`, e.g. `name=systemd`.
    #[must_use]
    pub const fn mount_token(self) -> &'static str {
        MOUNT_TOKENS[self.index()]
    }

    /// Single-bit mask selecting this controller.
    #[must_use]
    pub const fn mask(self) -> ControllerMask {
        ControllerMask::from_bits_retain(1 << self.index())
    }

    /// Whether vCPU helper threads may sit one level below the machine group.
    #[must_use]
    pub const fn is_cpu_family(self) -> bool {
        matches!(self, Self::Cpu | Self::Cpuacct | Self::Cpuset)
    }
}

impl fmt::Display for Controller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Controller {
    type Err = VcgroupError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.name() == s || c.mount_token() == s)
            .ok_or_else(|| VcgroupError::Config {
                message: format!("unknown cgroup controller: {s}"),
            })
    }
}

bitflags! {
    /// Set of controllers, one bit per [`Controller::index`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ControllerMask: u32 {
        /// `cpu`
        const CPU = 1 << 0;
        /// `cpuacct`
        const CPUACCT = 1 << 1;
        /// `cpuset`
        const CPUSET = 1 << 2;
        /// `memory`
        const MEMORY = 1 << 3;
        /// `devices`
        const DEVICES = 1 << 4;
        /// `freezer`
        const FREEZER = 1 << 5;
        /// `blkio`
        const BLKIO = 1 << 6;
        /// `net_cls`
        const NET_CLS = 1 << 7;
        /// `perf_event`
        const PERF_EVENT = 1 << 8;
        /// `name=systemd`
        const SYSTEMD = 1 << 9;
    }
}

impl ControllerMask {
    /// Whether `controller` is part of this set.
    #[must_use]
    pub const fn has(self, controller: Controller) -> bool {
        self.contains(controller.mask())
    }

    /// Iterates the selected controllers in declaration order.
    pub fn controllers(self) -> impl Iterator<Item = Controller> {
        Controller::ALL.into_iter().filter(move |c| self.has(*c))
    }
}

impl FromIterator<Controller> for ControllerMask {
    fn from_iter<I: IntoIterator<Item = Controller>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Self::empty(), |mask, c| mask | c.mask())
    }
}

bitflags! {
    /// Options for group creation.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct GroupFlags: u32 {
        /// Turn on `memory.use_hierarchy` in freshly created memory groups.
        const MEM_HIERARCHY = 1 << 0;
    }
}

bitflags! {
    /// Options for task attachment.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct TaskFlags: u32 {
        /// Also write the task into the `systemd` hierarchy, moving it into
        /// a systemd-managed scope on purpose.
        const SYSTEMD = 1 << 0;
    }
}
