//! Scan status and terminal reports.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use strum::Display;

use crate::error::{ErrorPhase, ScanError, ScanFailure};
use crate::record::FileRecord;

/// Lifecycle status of a scan session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display)]
pub enum ScanStatus {
    #[default]
    Idle,
    Scanning,
    Completed,
    Cancelled,
    Failed,
}

impl ScanStatus {
    /// Check if this status ends a session.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::Failed)
    }
}

/// Result of the external directory picker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectorySelection {
    Selected(PathBuf),
    Cancelled,
}

impl DirectorySelection {
    /// Interpret a raw answer; blank input means the user backed out.
    pub fn from_input(input: &str) -> Self {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            Self::Cancelled
        } else {
            Self::Selected(PathBuf::from(trimmed))
        }
    }
}

/// Status line for a scan in the given state with `count` files so far.
pub fn status_line(status: ScanStatus, count: usize) -> String {
    match status {
        ScanStatus::Idle => "Idle".to_string(),
        ScanStatus::Scanning => format!("Scanning… ({count} files found)"),
        ScanStatus::Completed if count == 0 => "No files found".to_string(),
        ScanStatus::Completed if count == 1 => "1 file found".to_string(),
        ScanStatus::Completed => format!("{count} files found"),
        ScanStatus::Cancelled => format!("Scan cancelled ({count} files found)"),
        ScanStatus::Failed => "Scan failed".to_string(),
    }
}

/// Terminal snapshot of one scan session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanReport {
    /// Root the scan was started on.
    pub root: PathBuf,
    /// Fallback directory scanned instead of the root, if any.
    pub fallback: Option<PathBuf>,
    /// Terminal status.
    pub status: ScanStatus,
    /// Accepted files, sorted ascending by path.
    pub files: Vec<FileRecord>,
    /// Number of accepted files.
    pub file_count: usize,
    /// Non-fatal errors logged during the scan.
    pub errors: Vec<ScanError>,
    /// Wall time of the scan.
    pub elapsed: Duration,
}

impl ScanReport {
    /// Build a report, sorting `files` by path.
    pub fn new(
        root: PathBuf,
        fallback: Option<PathBuf>,
        status: ScanStatus,
        mut files: Vec<FileRecord>,
        errors: Vec<ScanError>,
        elapsed: Duration,
    ) -> Self {
        files.sort_by(|a, b| a.path.as_os_str().cmp(b.path.as_os_str()));
        let file_count = files.len();
        Self {
            root,
            fallback,
            status,
            files,
            file_count,
            errors,
            elapsed,
        }
    }

    /// Total bytes across files with a known size.
    pub fn total_size(&self) -> u64 {
        self.files.iter().filter(|f| f.size_known).map(|f| f.size).sum()
    }

    /// Whether the files came from the fallback directory.
    pub fn used_fallback(&self) -> bool {
        self.fallback.is_some()
    }

    /// Errors logged in the given phase.
    pub fn errors_in(&self, phase: ErrorPhase) -> impl Iterator<Item = &ScanError> {
        self.errors.iter().filter(move |e| e.phase == phase)
    }

    /// Scan-level failure for a `Failed` report.
    pub fn failure(&self) -> Option<ScanFailure> {
        (self.status == ScanStatus::Failed).then(|| ScanFailure::RootNotFound {
            path: self.root.clone(),
        })
    }

    /// Human-readable status line.
    pub fn status_line(&self) -> String {
        status_line(self.status, self.file_count)
    }
}
