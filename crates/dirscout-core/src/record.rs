//! Discovered file records and entry kinds.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use strum::Display;

/// Kind of a filesystem entry as seen by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
pub enum EntryKind {
    /// Regular file whose length could be read.
    RegularFile,
    /// Directory.
    Directory,
    /// Symbolic link. Never followed.
    Symlink,
    /// Anything that could not be read, or is not a plain file.
    Inaccessible,
}

impl EntryKind {
    /// Check if this entry is accepted into scan results.
    pub fn is_file(&self) -> bool {
        matches!(self, Self::RegularFile)
    }
}

/// A regular file accepted by a scan.
///
/// Identity is the path: two records with the same path are duplicates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileRecord {
    /// Absolute path of the file.
    pub path: PathBuf,
    /// Whether the length query succeeded.
    pub size_known: bool,
    /// Length in bytes (0 when unknown).
    pub size: u64,
}

impl FileRecord {
    /// Record for a file whose length was read.
    pub fn new(path: impl Into<PathBuf>, size: u64) -> Self {
        Self {
            path: path.into(),
            size_known: true,
            size,
        }
    }

    /// Record for a file whose length is unknown.
    pub fn without_size(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            size_known: false,
            size: 0,
        }
    }
}

impl PartialEq for FileRecord {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
    }
}

impl Eq for FileRecord {}

impl std::hash::Hash for FileRecord {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.path.hash(state);
    }
}
