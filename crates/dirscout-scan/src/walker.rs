//! Sequential recursive directory walker.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use dirscout_core::{FileRecord, ScanConfig, ScanError, ScanStatus};

use crate::classify::EntryClassifier;
use crate::session::ScanState;
use crate::sink::GuardedSink;
use crate::source::{EntrySource, EntryStream, WalkItem};

/// Default fallback directory: the parent of the process temporary directory.
pub fn default_fallback_root() -> Option<PathBuf> {
    std::env::temp_dir().parent().map(Path::to_path_buf)
}

/// Walks a tree one entity at a time, feeding accepted files to a sink.
///
/// Entities are never processed concurrently. Per-entry failures are
/// logged and skipped; only a missing root fails the walk.
pub struct DirectoryWalker {
    config: ScanConfig,
    source: Arc<dyn EntrySource>,
    classifier: EntryClassifier,
}

impl DirectoryWalker {
    /// Create a walker over `source` using `config` for traversal options.
    pub fn new(config: ScanConfig, source: Arc<dyn EntrySource>) -> Self {
        Self {
            config,
            source,
            classifier: EntryClassifier::new(),
        }
    }

    /// Directory to scan when the root cannot be listed.
    pub fn fallback_root(&self) -> Option<PathBuf> {
        self.config.fallback_root.clone().or_else(default_fallback_root)
    }

    /// Walk `state.root`, returning the terminal status.
    ///
    /// Files accumulated in `state` are kept on cancellation.
    pub async fn walk(
        &self,
        state: &mut ScanState,
        sink: &GuardedSink,
        cancel: &CancellationToken,
    ) -> ScanStatus {
        let root = state.root().to_path_buf();

        match tokio::fs::metadata(&root).await {
            Ok(m) if m.is_dir() => {}
            Ok(_) => {
                record_error(state, sink, ScanError::enumerate(&root, "Not a directory"));
                return ScanStatus::Failed;
            }
            Err(err) => {
                record_error(state, sink, ScanError::enumerate(&root, err.to_string()));
                return ScanStatus::Failed;
            }
        }

        match self.source.open(&root, &self.config).await {
            Ok(stream) => self.drain(stream, state, sink, cancel).await,
            Err(err) => {
                record_error(
                    state,
                    sink,
                    ScanError::enumerate(&root, format!("Cannot list directory: {err}")),
                );
                self.walk_fallback(state, sink, cancel).await
            }
        }
    }

    /// Best-effort, non-recursive walk of the fallback directory into the
    /// same state.
    async fn walk_fallback(
        &self,
        state: &mut ScanState,
        sink: &GuardedSink,
        cancel: &CancellationToken,
    ) -> ScanStatus {
        let Some(fallback) = self.fallback_root() else {
            debug!("no fallback directory available");
            return ScanStatus::Completed;
        };

        let exists = tokio::fs::metadata(&fallback)
            .await
            .is_ok_and(|m| m.is_dir());
        if !exists {
            debug!(fallback = %fallback.display(), "fallback directory missing");
            return ScanStatus::Completed;
        }

        debug!(fallback = %fallback.display(), "root not listable, scanning fallback");

        // The fallback only gets a shallow pass over its direct children
        let config = ScanConfig {
            max_depth: Some(1),
            ..self.config.clone()
        };

        match self.source.open(&fallback, &config).await {
            Ok(stream) => {
                state.fallback = Some(fallback);
                self.drain(stream, state, sink, cancel).await
            }
            Err(err) => {
                record_error(
                    state,
                    sink,
                    ScanError::enumerate(&fallback, format!("Cannot list fallback: {err}")),
                );
                ScanStatus::Completed
            }
        }
    }

    /// Consume a stream until it ends or the scan is cancelled.
    async fn drain(
        &self,
        mut stream: EntryStream,
        state: &mut ScanState,
        sink: &GuardedSink,
        cancel: &CancellationToken,
    ) -> ScanStatus {
        loop {
            if cancel.is_cancelled() {
                debug!(files = state.files().len(), "scan cancelled");
                return ScanStatus::Cancelled;
            }

            let item = tokio::select! {
                biased;
                _ = cancel.cancelled() => continue,
                item = stream.next() => item,
            };
            let Some(item) = item else {
                return ScanStatus::Completed;
            };

            if self.process(item, state, sink).await && self.config.is_paced() {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {}
                    _ = tokio::time::sleep(self.config.pacing) => {}
                }
            }
        }
    }

    /// Handle one entity. Returns `true` if a file was accepted.
    async fn process(&self, item: WalkItem, state: &mut ScanState, sink: &GuardedSink) -> bool {
        let path = match item {
            Ok(path) => path,
            Err(failure) => {
                record_error(state, sink, ScanError::enumerate(failure.path, failure.message));
                return false;
            }
        };

        let classification = self.classifier.classify(&path).await;
        if let Some(issue) = classification.issue {
            record_error(state, sink, issue);
        }
        if !classification.kind.is_file() {
            return false;
        }

        let record = match classification.len {
            Some(len) => FileRecord::new(path, len),
            None => FileRecord::without_size(path),
        };

        if !state.accept(record.clone()) {
            trace!(path = %record.path.display(), "duplicate path, not emitted");
            return false;
        }

        trace!(path = %record.path.display(), size = record.size, "file discovered");
        sink.file_discovered(&record);
        true
    }
}

impl std::fmt::Debug for DirectoryWalker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectoryWalker")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

fn record_error(state: &mut ScanState, sink: &GuardedSink, error: ScanError) {
    warn!(path = %error.path.display(), phase = %error.phase, "{}", error.message);
    sink.error(&error);
    state.log(error);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::ChannelSink;
    use crate::source::JwalkSource;
    use std::fs;
    use tempfile::TempDir;

    fn walker(config: ScanConfig) -> DirectoryWalker {
        DirectoryWalker::new(config.without_pacing(), Arc::new(JwalkSource::new()))
    }

    fn guarded() -> GuardedSink {
        let (sink, _events) = ChannelSink::new();
        GuardedSink::new(Arc::new(sink))
    }

    #[tokio::test]
    async fn test_walk_collects_regular_files() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("a/b")).unwrap();
        fs::write(temp.path().join("top.txt"), "1").unwrap();
        fs::write(temp.path().join("a/b/deep.txt"), "22").unwrap();
        fs::write(temp.path().join("a/empty"), "").unwrap();

        let mut state = ScanState::new(temp.path(), true);
        let status = walker(ScanConfig::new(temp.path()))
            .walk(&mut state, &guarded(), &CancellationToken::new())
            .await;

        assert_eq!(status, ScanStatus::Completed);
        assert_eq!(state.files().len(), 3);
        assert!(state.errors().is_empty());
    }

    #[tokio::test]
    async fn test_missing_root_fails_without_fallback() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("missing");
        let fallback = TempDir::new().unwrap();
        fs::write(fallback.path().join("f.txt"), "x").unwrap();

        let mut config = ScanConfig::new(&missing);
        config.fallback_root = Some(fallback.path().to_path_buf());

        let mut state = ScanState::new(&missing, true);
        let status = walker(config)
            .walk(&mut state, &guarded(), &CancellationToken::new())
            .await;

        assert_eq!(status, ScanStatus::Failed);
        assert!(state.files().is_empty());
        assert_eq!(state.errors().len(), 1);
        assert!(state.fallback.is_none());
    }

    #[tokio::test]
    async fn test_file_root_fails() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("plain.txt");
        fs::write(&file, "x").unwrap();

        let mut state = ScanState::new(&file, true);
        let status = walker(ScanConfig::new(&file))
            .walk(&mut state, &guarded(), &CancellationToken::new())
            .await;
        assert_eq!(status, ScanStatus::Failed);
    }

    #[tokio::test]
    async fn test_already_cancelled_walk_emits_nothing() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a.txt"), "a").unwrap();

        let cancel = CancellationToken::new();
        cancel.cancel();

        let mut state = ScanState::new(temp.path(), true);
        let status = walker(ScanConfig::new(temp.path()))
            .walk(&mut state, &guarded(), &cancel)
            .await;

        assert_eq!(status, ScanStatus::Cancelled);
        assert!(state.files().is_empty());
    }

    #[test]
    fn test_fallback_root_override() {
        let mut config = ScanConfig::new("/root");
        config.fallback_root = Some(PathBuf::from("/override"));
        assert_eq!(walker(config).fallback_root(), Some(PathBuf::from("/override")));
    }
}
