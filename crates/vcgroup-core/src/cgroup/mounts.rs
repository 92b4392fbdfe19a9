//! Readers for the kernel mount table and per-process placement files.
//!
//! Both are re-read on every call. Mounts can change between two group
//! constructions (sandbox setup does exactly that), so nothing is cached.

use std::path::Path;

use vcgroup_common::error::{Result, VcgroupError};

/// One line of `/proc/mounts`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountEntry {
    /// Mounted device or pseudo source.
    pub device: String,
    /// Absolute mount directory.
    pub dir: String,
    /// Filesystem type, e.g. `cgroup`.
    pub fs_type: String,
    /// Comma-separated mount options.
    pub options: String,
}

impl MountEntry {
    /// Iterates the comma-separated mount options.
    pub fn option_tokens(&self) -> impl Iterator<Item = &str> {
        self.options.split(',')
    }
}

/// Parses mount table content. Lines with fewer than four fields are skipped.
#[must_use]
pub fn parse_mount_table(content: &str) -> Vec<MountEntry> {
    content
        .lines()
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            let device = fields.next()?;
            let dir = fields.next()?;
            let fs_type = fields.next()?;
            let options = fields.next()?;
            Some(MountEntry {
                device: unescape_octal(device),
                dir: unescape_octal(dir),
                fs_type: unescape_octal(fs_type),
                options: unescape_octal(options),
            })
        })
        .collect()
}

/// Reads and parses a mount table file.
///
/// # Errors
///
/// Returns an error if the file cannot be read.
pub fn read_mount_table(path: &Path) -> Result<Vec<MountEntry>> {
    let content = std::fs::read_to_string(path).map_err(|e| VcgroupError::io(path, e))?;
    Ok(parse_mount_table(&content))
}

/// Decodes the `\NNN` octal escapes the kernel uses for blanks and
/// backslashes in mount table fields.
fn unescape_octal(field: &str) -> String {
    if !field.contains('\\') {
        return field.to_string();
    }
    let bytes = field.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'\\' && i + 3 < bytes.len() && is_octal_triplet(&bytes[i + 1..i + 4]) {
            let value =
                (bytes[i + 1] - b'0') * 64 + (bytes[i + 2] - b'0') * 8 + (bytes[i + 3] - b'0');
            out.push(value);
            i += 4;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn is_octal_triplet(digits: &[u8]) -> bool {
    digits.len() == 3
        && digits[0] <= b'3'
        && digits.iter().all(|d| (b'0'..=b'7').contains(d))
}

/// One line of `/proc/<pid>/cgroup`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacementEntry {
    /// Comma-separated controller tokens of the hierarchy, e.g. `cpu,cpuacct`.
    pub controllers: String,
    /// Placement of the process inside that hierarchy.
    pub path: String,
}

/// Parses `/proc/<pid>/cgroup` content (`id:controllers:path` per line).
///
/// Malformed lines are skipped. The path may itself contain `:`.
#[must_use]
pub fn parse_placements(content: &str) -> Vec<PlacementEntry> {
    content
        .lines()
        .filter_map(|line| {
            let mut fields = line.splitn(3, ':');
            let _hierarchy_id = fields.next()?;
            let controllers = fields.next()?;
            let path = fields.next()?;
            Some(PlacementEntry {
                controllers: controllers.to_string(),
                path: path.to_string(),
            })
        })
        .collect()
}

/// Reads and parses a placement file.
///
/// # Errors
///
/// Returns an error if the file cannot be read.
pub fn read_placements(path: &Path) -> Result<Vec<PlacementEntry>> {
    let content = std::fs::read_to_string(path).map_err(|e| VcgroupError::io(path, e))?;
    Ok(parse_placements(&content))
}

/// Whether `token` is exactly one of the comma-separated entries of `options`.
///
/// `cpu` does not match `cpuacct` or `cpuset`.
#[must_use]
pub fn options_match(options: &str, token: &str) -> bool {
    options.split(',').any(|opt| opt == token)
}
