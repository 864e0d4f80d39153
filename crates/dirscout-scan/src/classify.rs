//! Entry classification.

use std::path::Path;

use tracing::trace;

use dirscout_core::{EntryKind, ScanError};

/// Result of classifying one entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub kind: EntryKind,
    /// Length in bytes, present only for regular files.
    pub len: Option<u64>,
    /// Error recorded while classifying, if any.
    pub issue: Option<ScanError>,
}

impl Classification {
    fn of(kind: EntryKind) -> Self {
        Self {
            kind,
            len: None,
            issue: None,
        }
    }

    fn file(len: u64) -> Self {
        Self {
            kind: EntryKind::RegularFile,
            len: Some(len),
            issue: None,
        }
    }

    fn inaccessible(issue: ScanError) -> Self {
        Self {
            kind: EntryKind::Inaccessible,
            len: None,
            issue: Some(issue),
        }
    }
}

/// Classifies filesystem entries without following symlinks.
///
/// A regular file is accepted only when both the existence check and a
/// separate length query succeed. A length of zero is a valid result.
#[derive(Debug, Default, Clone, Copy)]
pub struct EntryClassifier;

impl EntryClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Classify the entry at `path`. Never fails; problems become
    /// [`EntryKind::Inaccessible`] with an error attached.
    pub async fn classify(&self, path: &Path) -> Classification {
        let metadata = match tokio::fs::symlink_metadata(path).await {
            Ok(m) => m,
            Err(err) => return Classification::inaccessible(ScanError::access(path, &err)),
        };

        let file_type = metadata.file_type();
        if file_type.is_symlink() {
            return Classification::of(EntryKind::Symlink);
        }
        if file_type.is_dir() {
            return Classification::of(EntryKind::Directory);
        }
        if !file_type.is_file() {
            // FIFOs, sockets and device nodes
            trace!(path = %path.display(), "special file");
            return Classification::inaccessible(ScanError::classify(path, "Not a regular file"));
        }

        match tokio::fs::metadata(path).await {
            Ok(m) => Classification::file(m.len()),
            Err(err) => Classification::inaccessible(ScanError::access(path, &err)),
        }
    }
}
