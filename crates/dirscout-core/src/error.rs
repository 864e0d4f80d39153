//! Error types for scanning operations.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use thiserror::Error;

use crate::permission::PermissionCategory;

/// Scan-level failures reported to the caller.
///
/// Everything else a scan runs into is absorbed into the error log as a
/// [`ScanError`] and the scan still reports best-effort results.
#[derive(Debug, Error)]
pub enum ScanFailure {
    /// The platform refused every requested permission category.
    #[error("Permission denied for {categories:?}")]
    PermissionDenied { categories: Vec<PermissionCategory> },

    /// Root path does not exist or is not a directory.
    #[error("Root directory not found: {path}")]
    RootNotFound { path: PathBuf },

    /// Invalid configuration.
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },
}

/// Stage of the scan in which a [`ScanError`] was recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum ErrorPhase {
    /// Listing a directory failed.
    Enumerate,
    /// The entry has a kind the scanner cannot handle.
    Classify,
    /// An entry exists but its metadata could not be read.
    Access,
}

/// Non-fatal error recorded during a scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanError {
    /// Path where the error occurred.
    pub path: PathBuf,
    /// Stage that produced it.
    pub phase: ErrorPhase,
    /// Human-readable message.
    pub message: String,
}

impl ScanError {
    /// Create a new scan error.
    pub fn new(path: impl Into<PathBuf>, phase: ErrorPhase, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            phase,
            message: message.into(),
        }
    }

    /// Create an enumeration error.
    pub fn enumerate(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::new(path, ErrorPhase::Enumerate, message)
    }

    /// Create a classification error for an unsupported entry kind.
    pub fn classify(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::new(path, ErrorPhase::Classify, message)
    }

    /// Create an access error from a failed metadata query.
    pub fn access(path: impl Into<PathBuf>, error: &std::io::Error) -> Self {
        Self::new(path, ErrorPhase::Access, format!("Access error: {error}"))
    }
}

impl std::fmt::Display for ScanError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}: {}", self.phase, self.path.display(), self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_not_found_message() {
        let err = ScanFailure::RootNotFound {
            path: PathBuf::from("/test/path"),
        };
        assert_eq!(err.to_string(), "Root directory not found: /test/path");
    }

    #[test]
    fn test_scan_error_creation() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let error = ScanError::access("/test/path", &io);
        assert_eq!(error.phase, ErrorPhase::Access);
        assert!(error.message.contains("denied"));
        assert_eq!(error.to_string(), "[access] /test/path: Access error: denied");
    }

    #[test]
    fn test_phase_parses() {
        assert_eq!("enumerate".parse::<ErrorPhase>().unwrap(), ErrorPhase::Enumerate);
    }
}
