//! Core types for dirscout.
//!
//! This crate provides the plain data structures shared by the scanning
//! engine and its consumers: scan configuration, discovered file records,
//! the error log, terminal reports, and the permission vocabulary.

mod config;
mod error;
mod permission;
mod record;
mod report;

pub use config::{DEFAULT_PACING, ScanConfig, ScanConfigBuilder};
pub use error::{ErrorPhase, ScanError, ScanFailure};
pub use permission::{
    MANAGE_ALL_MIN_SDK, MODERN_MEDIA_MIN_SDK, PermissionCategory, PermissionDecision,
    PermissionStatus, PlatformKind,
};
pub use record::{EntryKind, FileRecord};
pub use report::{DirectorySelection, ScanReport, ScanStatus, status_line};
