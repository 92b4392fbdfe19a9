//! Runtime configuration model for the cgroup backends.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, VcgroupError};

/// Root configuration for the cgroup backends.
///
/// The defaults describe a live host; tests point `proc_root` at a
/// scratch directory holding fake `cgroups`, `mounts` and `<pid>/cgroup` files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CgroupConfig {
    /// Location of procfs.
    pub proc_root: PathBuf,
    /// Size in bytes of the tmpfs mounted by the bootstrap builder.
    pub bind_tmpfs_size: u64,
}

impl Default for CgroupConfig {
    fn default() -> Self {
        Self {
            proc_root: PathBuf::from(crate::constants::PROC_ROOT),
            bind_tmpfs_size: crate::constants::BIND_TMPFS_SIZE,
        }
    }
}

impl CgroupConfig {
    /// Creates a configuration reading procfs from `proc_root`.
    #[must_use]
    pub fn with_proc_root(proc_root: impl Into<PathBuf>) -> Self {
        Self {
            proc_root: proc_root.into(),
            ..Self::default()
        }
    }

    /// Parses a configuration from JSON, filling missing fields with defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or the tmpfs size is zero.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or does not parse.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| VcgroupError::io(path, e))?;
        Self::from_json_str(&raw)
    }

    /// Checks that the configuration can be used.
    ///
    /// # Errors
    ///
    /// Returns an error if the tmpfs size is zero or `proc_root` is relative.
    pub fn validate(&self) -> Result<()> {
        if self.bind_tmpfs_size == 0 {
            return Err(VcgroupError::Config {
                message: "bind_tmpfs_size must be non-zero".into(),
            });
        }
        if !self.proc_root.is_absolute() {
            return Err(VcgroupError::Config {
                message: format!("proc_root must be absolute: {}", self.proc_root.display()),
            });
        }
        Ok(())
    }

    /// Path of the kernel cgroup support marker.
    #[must_use]
    pub fn cgroups_marker(&self) -> PathBuf {
        self.proc_root.join(crate::constants::CGROUPS_MARKER_FILE)
    }

    /// Path of the mount table.
    #[must_use]
    pub fn mounts_file(&self) -> PathBuf {
        self.proc_root.join(crate::constants::MOUNTS_FILE)
    }

    /// Path of the placement file of `pid`, or of the calling process if `None`.
    #[must_use]
    pub fn placement_file(&self, pid: Option<i32>) -> PathBuf {
        let dir = pid.map_or_else(|| "self".to_string(), |p| p.to_string());
        self.proc_root
            .join(dir)
            .join(crate::constants::PROC_CGROUP_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_live_procfs() {
        let config = CgroupConfig::default();
        assert_eq!(config.mounts_file(), PathBuf::from("/proc/mounts"));
        assert_eq!(config.cgroups_marker(), PathBuf::from("/proc/cgroups"));
        assert_eq!(config.placement_file(None), PathBuf::from("/proc/self/cgroup"));
        assert_eq!(config.placement_file(Some(42)), PathBuf::from("/proc/42/cgroup"));
    }

    #[test]
    fn partial_json_uses_defaults() {
        let config = CgroupConfig::from_json_str(r#"{"proc_root": "/tmp/fakeproc"}"#)
            .expect("should parse");
        assert_eq!(config.proc_root, PathBuf::from("/tmp/fakeproc"));
        assert_eq!(config.bind_tmpfs_size, 65_536);
    }

    #[test]
    fn zero_tmpfs_size_is_rejected() {
        let err = CgroupConfig::from_json_str(r#"{"bind_tmpfs_size": 0}"#).unwrap_err();
        assert!(matches!(err, VcgroupError::Config { .. }));
    }

    #[test]
    fn relative_proc_root_is_rejected() {
        let err = CgroupConfig::from_json_str(r#"{"proc_root": "proc"}"#).unwrap_err();
        assert!(matches!(err, VcgroupError::Config { .. }));
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let file = dir.path().join("vcgroup.json");
        std::fs::write(&file, r#"{"bind_tmpfs_size": 131072}"#).expect("write");
        let config = CgroupConfig::load(&file).expect("load");
        assert_eq!(config.bind_tmpfs_size, 131_072);
    }
}
