//! Unified error types for the vcgroup workspace.
//!
//! Variants follow three broad classes: failed system calls ([`VcgroupError::Io`]),
//! broken internal contracts ([`VcgroupError::Internal`], [`VcgroupError::Parse`])
//! and configurations the host cannot honour ([`VcgroupError::Unsupported`]).

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type shared across the workspace.
#[derive(Debug, Error)]
pub enum VcgroupError {
    /// An I/O operation or system call failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path where the I/O error occurred.
        path: PathBuf,
        /// Underlying I/O error, carrying the errno.
        source: std::io::Error,
    },

    /// An internal invariant was violated (missing placement, malformed path).
    #[error("internal error: {message}")]
    Internal {
        /// Description of the violated invariant.
        message: String,
    },

    /// A control file held content that could not be parsed.
    #[error("invalid value '{value}' in {path}")]
    Parse {
        /// Control file that was read.
        path: PathBuf,
        /// Raw content that failed to parse.
        value: String,
    },

    /// The requested configuration cannot be honoured on this host.
    #[error("unsupported configuration: {message}")]
    Unsupported {
        /// Description of the rejected configuration.
        message: String,
    },

    /// A configuration value is invalid.
    #[error("invalid configuration: {message}")]
    Config {
        /// Description of the invalid configuration.
        message: String,
    },

    /// Serialization or deserialization failed.
    #[error("serialization error: {source}")]
    Serialization {
        /// Underlying serialization error.
        #[from]
        source: serde_json::Error,
    },
}

impl VcgroupError {
    /// Builds an [`VcgroupError::Io`] from any error convertible to `std::io::Error`.
    ///
    /// `nix::Errno` converts this way, so syscall failures keep their errno.
    pub fn io(path: impl Into<PathBuf>, source: impl Into<std::io::Error>) -> Self {
        Self::Io {
            path: path.into(),
            source: source.into(),
        }
    }

    /// Builds an [`VcgroupError::Internal`] error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns the `std::io::ErrorKind` if this is an I/O error.
    #[must_use]
    pub fn io_kind(&self) -> Option<std::io::ErrorKind> {
        match self {
            Self::Io { source, .. } => Some(source.kind()),
            _ => None,
        }
    }
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, VcgroupError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_keeps_kind_and_path() {
        let err = VcgroupError::io(
            "/sys/fs/cgroup/cpu/tasks",
            std::io::Error::from(std::io::ErrorKind::NotFound),
        );
        assert_eq!(err.io_kind(), Some(std::io::ErrorKind::NotFound));
        assert!(err.to_string().contains("/sys/fs/cgroup/cpu/tasks"));
    }

    #[test]
    fn unsupported_reads_as_rejection() {
        let err = VcgroupError::Unsupported {
            message: "controller 'cpuacct' is not wanted, but 'cpu' is co-mounted".into(),
        };
        assert!(err.to_string().starts_with("unsupported configuration"));
        assert_eq!(err.io_kind(), None);
    }
}
