//! Consumer-facing delivery of scan results.

use std::sync::{Arc, Weak};

use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::trace;

use dirscout_core::{FileRecord, ScanError, ScanReport};

/// Receives incremental results of a scan.
///
/// Events arrive in discovery order; only the [`ScanReport`] passed to
/// [`on_scan_finished`](ResultSink::on_scan_finished) is sorted.
pub trait ResultSink: Send + Sync {
    /// A regular file was accepted.
    fn on_file_discovered(&self, record: &FileRecord);

    /// The scan reached a terminal status. Called exactly once per scan.
    fn on_scan_finished(&self, report: &ScanReport);

    /// A non-fatal error was logged.
    fn on_error(&self, _error: &ScanError) {}

    /// Whether the context owning this sink still wants events.
    ///
    /// Events for a dead sink are dropped without error.
    fn is_alive(&self) -> bool {
        true
    }
}

impl<S: ResultSink + ?Sized> ResultSink for Arc<S> {
    fn on_file_discovered(&self, record: &FileRecord) {
        (**self).on_file_discovered(record);
    }

    fn on_scan_finished(&self, report: &ScanReport) {
        (**self).on_scan_finished(report);
    }

    fn on_error(&self, error: &ScanError) {
        (**self).on_error(error);
    }

    fn is_alive(&self) -> bool {
        (**self).is_alive()
    }
}

/// A weak handle is alive as long as its owner is.
impl<S: ResultSink> ResultSink for Weak<S> {
    fn on_file_discovered(&self, record: &FileRecord) {
        if let Some(sink) = self.upgrade() {
            sink.on_file_discovered(record);
        }
    }

    fn on_scan_finished(&self, report: &ScanReport) {
        if let Some(sink) = self.upgrade() {
            sink.on_scan_finished(report);
        }
    }

    fn on_error(&self, error: &ScanError) {
        if let Some(sink) = self.upgrade() {
            sink.on_error(error);
        }
    }

    fn is_alive(&self) -> bool {
        self.upgrade().is_some_and(|sink| sink.is_alive())
    }
}

/// Event delivered through a [`ChannelSink`].
#[derive(Debug, Clone)]
pub enum ScanEvent {
    /// A regular file was accepted.
    FileDiscovered(FileRecord),
    /// A non-fatal error was logged.
    Error(ScanError),
    /// The scan finished; always the last event.
    Finished(ScanReport),
}

/// Stream of events for one scan.
pub type ScanEvents = UnboundedReceiverStream<ScanEvent>;

/// Sink that forwards events into a channel consumed as [`ScanEvents`].
///
/// Dropping the stream tears the sink down.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<ScanEvent>,
}

impl ChannelSink {
    /// Create a sink and the stream it feeds.
    pub fn new() -> (Self, ScanEvents) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, UnboundedReceiverStream::new(rx))
    }

    fn send(&self, event: ScanEvent) {
        let _ = self.tx.send(event);
    }
}

impl ResultSink for ChannelSink {
    fn on_file_discovered(&self, record: &FileRecord) {
        self.send(ScanEvent::FileDiscovered(record.clone()));
    }

    fn on_scan_finished(&self, report: &ScanReport) {
        self.send(ScanEvent::Finished(report.clone()));
    }

    fn on_error(&self, error: &ScanError) {
        self.send(ScanEvent::Error(error.clone()));
    }

    fn is_alive(&self) -> bool {
        !self.tx.is_closed()
    }
}

/// Checks sink liveness before every delivery.
///
/// Used by the walker and session so that a torn-down consumer never sees
/// an event and never causes an error.
pub struct GuardedSink {
    sink: Arc<dyn ResultSink>,
}

impl GuardedSink {
    pub fn new(sink: Arc<dyn ResultSink>) -> Self {
        Self { sink }
    }

    fn alive(&self, what: &str) -> bool {
        let alive = self.sink.is_alive();
        if !alive {
            trace!(event = what, "sink torn down, dropping event");
        }
        alive
    }

    pub fn file_discovered(&self, record: &FileRecord) {
        if self.alive("file") {
            self.sink.on_file_discovered(record);
        }
    }

    pub fn error(&self, error: &ScanError) {
        if self.alive("error") {
            self.sink.on_error(error);
        }
    }

    pub fn finished(&self, report: &ScanReport) {
        if self.alive("finished") {
            self.sink.on_scan_finished(report);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dirscout_core::ScanStatus;
    use std::path::PathBuf;
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    struct Recording {
        files: Mutex<Vec<PathBuf>>,
    }

    impl ResultSink for Recording {
        fn on_file_discovered(&self, record: &FileRecord) {
            self.files.lock().unwrap().push(record.path.clone());
        }

        fn on_scan_finished(&self, _report: &ScanReport) {}
    }

    fn report() -> ScanReport {
        ScanReport::new(
            PathBuf::from("/r"),
            None,
            ScanStatus::Completed,
            Vec::new(),
            Vec::new(),
            Duration::ZERO,
        )
    }

    #[test]
    fn test_channel_sink_dies_with_stream() {
        let (sink, events) = ChannelSink::new();
        assert!(sink.is_alive());
        drop(events);
        assert!(!sink.is_alive());

        // Sending into a closed channel is silently ignored
        sink.on_scan_finished(&report());
    }

    #[test]
    fn test_weak_sink_drops_after_owner() {
        let owner = Arc::new(Recording::default());
        let weak = Arc::downgrade(&owner);
        let guarded = GuardedSink::new(Arc::new(weak));

        guarded.file_discovered(&FileRecord::new("/r/a", 1));
        assert_eq!(owner.files.lock().unwrap().len(), 1);

        drop(owner);
        guarded.file_discovered(&FileRecord::new("/r/b", 1));
        guarded.finished(&report());
    }

    #[tokio::test]
    async fn test_channel_sink_forwards_in_order() {
        use tokio_stream::StreamExt;

        let (sink, mut events) = ChannelSink::new();
        let guarded = GuardedSink::new(Arc::new(sink));
        guarded.file_discovered(&FileRecord::new("/r/a", 1));
        guarded.error(&ScanError::enumerate("/r/x", "boom"));
        guarded.finished(&report());
        drop(guarded);

        assert!(matches!(events.next().await, Some(ScanEvent::FileDiscovered(_))));
        assert!(matches!(events.next().await, Some(ScanEvent::Error(_))));
        assert!(matches!(events.next().await, Some(ScanEvent::Finished(_))));
        assert!(events.next().await.is_none());
    }
}
