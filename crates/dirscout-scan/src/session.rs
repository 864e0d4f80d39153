//! Scan session lifecycle.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use dirscout_core::{
    FileRecord, PlatformKind, ScanConfig, ScanError, ScanFailure, ScanReport, ScanStatus,
};

use crate::permission::PermissionGate;
use crate::sink::{ChannelSink, GuardedSink, ResultSink, ScanEvents};
use crate::source::{EntrySource, JwalkSource};
use crate::walker::DirectoryWalker;

/// Accumulated results of one run, owned by the walk task.
///
/// `files` only grows while the walk runs; [`finish`](Self::finish) sorts
/// it once and freezes it into a [`ScanReport`].
#[derive(Debug)]
pub struct ScanState {
    root: PathBuf,
    /// Fallback directory that was scanned instead of the root.
    pub fallback: Option<PathBuf>,
    files: Vec<FileRecord>,
    errors: Vec<ScanError>,
    seen: HashSet<PathBuf>,
    dedupe: bool,
}

impl ScanState {
    /// Fresh state for a scan of `root`.
    pub fn new(root: impl Into<PathBuf>, dedupe: bool) -> Self {
        Self {
            root: root.into(),
            fallback: None,
            files: Vec::new(),
            errors: Vec::new(),
            seen: HashSet::new(),
            dedupe,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Files accepted so far, in discovery order.
    pub fn files(&self) -> &[FileRecord] {
        &self.files
    }

    pub fn errors(&self) -> &[ScanError] {
        &self.errors
    }

    /// Append a record. Returns `false` if its path was already accepted.
    pub fn accept(&mut self, record: FileRecord) -> bool {
        if self.dedupe && !self.seen.insert(record.path.clone()) {
            return false;
        }
        self.files.push(record);
        true
    }

    /// Log a non-fatal error.
    pub fn log(&mut self, error: ScanError) {
        self.errors.push(error);
    }

    /// Freeze into a sorted report.
    pub fn finish(self, status: ScanStatus, elapsed: Duration) -> ScanReport {
        ScanReport::new(
            self.root,
            self.fallback,
            status,
            self.files,
            self.errors,
            elapsed,
        )
    }
}

/// One scanner instance with at most one active scan.
///
/// Starting a new scan cancels the one in flight and begins from empty
/// state. Dropping the session cancels its scan.
pub struct ScanSession {
    template: ScanConfig,
    platform: PlatformKind,
    gate: PermissionGate,
    source: Arc<dyn EntrySource>,
    cancel: CancellationToken,
    status_rx: watch::Receiver<ScanStatus>,
    task: Option<JoinHandle<ScanReport>>,
}

impl ScanSession {
    /// Create a session. The root of `template` is replaced on every start.
    pub fn new(template: ScanConfig) -> Self {
        let (_, status_rx) = watch::channel(ScanStatus::Idle);
        Self {
            template,
            platform: PlatformKind::default(),
            gate: PermissionGate::unrestricted(),
            source: Arc::new(JwalkSource::new()),
            cancel: CancellationToken::new(),
            status_rx,
            task: None,
        }
    }

    /// Use a different entity source.
    pub fn with_source(mut self, source: impl EntrySource + 'static) -> Self {
        self.source = Arc::new(source);
        self
    }

    /// Gate scans behind `gate` on the given platform.
    pub fn with_permissions(mut self, gate: PermissionGate, platform: PlatformKind) -> Self {
        self.gate = gate;
        self.platform = platform;
        self
    }

    /// Start scanning `root`, returning the live event stream.
    pub async fn start(&mut self, root: impl Into<PathBuf>) -> Result<ScanEvents, ScanFailure> {
        let (sink, events) = ChannelSink::new();
        self.start_with_sink(root, sink).await?;
        Ok(events)
    }

    /// Start scanning `root`, delivering events to `sink`.
    ///
    /// Fails only if permission is denied, in which case nothing is
    /// enumerated and the status stays `Idle`.
    pub async fn start_with_sink(
        &mut self,
        root: impl Into<PathBuf>,
        sink: impl ResultSink + 'static,
    ) -> Result<(), ScanFailure> {
        self.supersede();

        let decision = self.gate.check(self.platform).await;
        if !decision.granted {
            return Err(ScanFailure::PermissionDenied {
                categories: decision.checked_categories.into_iter().collect(),
            });
        }

        let root: PathBuf = root.into();
        let root = std::path::absolute(&root).unwrap_or(root);
        let config = self.template.with_root(root);
        info!(root = %config.root.display(), "starting scan");

        let cancel = CancellationToken::new();
        let (status_tx, status_rx) = watch::channel(ScanStatus::Scanning);
        self.cancel = cancel.clone();
        self.status_rx = status_rx;

        let state = ScanState::new(config.root.clone(), config.dedupe_paths);
        let walker = DirectoryWalker::new(config, self.source.clone());
        let sink = GuardedSink::new(Arc::new(sink));

        self.task = Some(tokio::spawn(run_scan(
            walker, state, sink, cancel, status_tx,
        )));
        Ok(())
    }

    /// Request cancellation of the running scan.
    ///
    /// Takes effect before the next entity; partial results are kept.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Token that cancels the running scan.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Current status of the latest scan.
    pub fn status(&self) -> ScanStatus {
        *self.status_rx.borrow()
    }

    /// Watch status changes of the latest scan.
    pub fn subscribe_status(&self) -> watch::Receiver<ScanStatus> {
        self.status_rx.clone()
    }

    /// Wait for the latest scan to finish and return its report.
    ///
    /// Returns `None` if no scan is running, it was already awaited, or
    /// the scan task panicked.
    pub async fn wait(&mut self) -> Option<ScanReport> {
        let task = self.task.take()?;
        match task.await {
            Ok(report) => Some(report),
            Err(err) => {
                warn!(error = %err, "scan task did not finish");
                None
            }
        }
    }

    /// Cancel any previous run and reset to `Idle`.
    fn supersede(&mut self) {
        if self.task.take().is_some() {
            debug!("superseding previous scan");
        }
        self.cancel.cancel();
        let (_, status_rx) = watch::channel(ScanStatus::Idle);
        self.status_rx = status_rx;
    }
}

impl Drop for ScanSession {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl std::fmt::Debug for ScanSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScanSession")
            .field("platform", &self.platform)
            .field("status", &self.status())
            .finish_non_exhaustive()
    }
}

async fn run_scan(
    walker: DirectoryWalker,
    mut state: ScanState,
    sink: GuardedSink,
    cancel: CancellationToken,
    status_tx: watch::Sender<ScanStatus>,
) -> ScanReport {
    let start = Instant::now();
    let status = walker.walk(&mut state, &sink, &cancel).await;
    let report = state.finish(status, start.elapsed());

    info!(
        root = %report.root.display(),
        status = %report.status,
        files = report.file_count,
        errors = report.errors.len(),
        "scan finished"
    );

    status_tx.send_replace(status);
    sink.finished(&report);
    report
}
