//! Pure naming helpers for machine groups.
//!
//! Machine groups are named either after a partition leaf
//! (`<name>.libvirt-<driver>`) or after a systemd scope unit
//! (`machine-<name>.scope`). Both helpers are deterministic and perform
//! no I/O.

use std::fmt::Write as _;

use vcgroup_common::types::Controller;

/// Kernel subsystems outside [`Controller`] whose `<name>.` prefix is reserved
/// for control files.
const EXTRA_SUBSYSTEMS: [&str; 5] = ["net_prio", "hugetlb", "pids", "rdma", "misc"];

/// Control files living in every group directory.
const RESERVED_LEAVES: [&str; 3] = ["notify_on_release", "release_agent", "tasks"];

/// Whether a group leaf would collide with kernel-provided control files.
fn partition_needs_escaping(leaf: &str) -> bool {
    if leaf.starts_with('_') || leaf.starts_with('.') || leaf.starts_with("cgroup.") {
        return true;
    }
    if RESERVED_LEAVES.contains(&leaf) {
        return true;
    }
    Controller::ALL
        .into_iter()
        .filter(|c| *c != Controller::Systemd)
        .map(Controller::name)
        .chain(EXTRA_SUBSYSTEMS)
        .any(|subsys| {
            leaf.strip_prefix(subsys)
                .is_some_and(|rest| rest.starts_with('.'))
        })
}

/// Escapes a group leaf so it cannot be mistaken for a control file.
///
/// ```
/// use vcgroup_core::cgroup::naming::escape_partition;
///
/// assert_eq!(escape_partition("vm1.libvirt-qemu"), "vm1.libvirt-qemu");
/// assert_eq!(escape_partition("cpu.shares"), "_cpu.shares");
/// assert_eq!(escape_partition("tasks"), "_tasks");
/// ```
#[must_use]
pub fn escape_partition(leaf: &str) -> String {
    if partition_needs_escaping(leaf) {
        format!("_{leaf}")
    } else {
        leaf.to_string()
    }
}

/// Escapes a string for use inside a systemd unit name.
fn escape_unit_name(out: &mut String, name: &str) {
    let mut bytes = name.as_bytes();
    if let Some((b'.', rest)) = bytes.split_first() {
        push_hex(out, b'.');
        bytes = rest;
    }
    for &b in bytes {
        match b {
            b'/' => out.push('-'),
            b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b':' | b'_' | b'.' => out.push(char::from(b)),
            _ => push_hex(out, b),
        }
    }
}

fn push_hex(out: &mut String, b: u8) {
    // Writing into a String cannot fail.
    let _ = write!(out, "\\x{b:02x}");
}

/// Builds the systemd scope unit name of a machine.
///
/// The legacy form embeds the driver name (`machine-qemu\x2dvm1.scope`);
/// the current form relies on the machine name being unique already
/// (`machine-qemu\x2d1\x2dvm1.scope` for machine `qemu-1-vm1`).
#[must_use]
pub fn make_scope_name(name: &str, driver: &str, legacy: bool) -> String {
    let mut out = String::from("machine-");
    if legacy {
        escape_unit_name(&mut out, driver);
        out.push_str("\\x2d");
    }
    escape_unit_name(&mut out, name);
    out.push_str(".scope");
    out
}
