//! Incremental directory scanning engine for dirscout.
//!
//! # Overview
//!
//! `dirscout-scan` walks a directory tree and streams every regular file it
//! finds to a consumer while the walk is still running. Key features:
//!
//! - **Live results** via a [`ResultSink`] or a [`ScanEvents`] stream
//! - **Error isolation**: unreadable entries are logged, never fatal
//! - **Fallback scanning** when the root cannot be listed at all
//! - **Cooperative cancellation** that keeps partial results
//! - **Permission gating** on platforms with runtime storage permissions
//!
//! # Example
//!
//! ```rust,no_run
//! use dirscout_scan::{ScanConfig, ScanEvent, ScanSession};
//! use tokio_stream::StreamExt;
//!
//! # async fn run() -> Result<(), dirscout_scan::ScanFailure> {
//! let mut session = ScanSession::new(ScanConfig::default());
//! let mut events = session.start("/path/to/scan").await?;
//!
//! while let Some(event) = events.next().await {
//!     match event {
//!         ScanEvent::FileDiscovered(file) => println!("{}", file.path.display()),
//!         ScanEvent::Error(err) => eprintln!("{err}"),
//!         ScanEvent::Finished(report) => println!("{}", report.status_line()),
//!     }
//! }
//! # Ok(())
//! # }
//! ```

mod classify;
mod permission;
mod session;
mod sink;
mod source;
mod walker;

pub use classify::{Classification, EntryClassifier};
pub use permission::{BoxFuture, GrantAll, PermissionBackend, PermissionGate};
pub use session::{ScanSession, ScanState};
pub use sink::{ChannelSink, GuardedSink, ResultSink, ScanEvent, ScanEvents};
pub use source::{ENTRY_CHANNEL_SIZE, EntryStream, EntrySource, JwalkSource, WalkFailure, WalkItem};
pub use walker::{DirectoryWalker, default_fallback_root};

// Re-export core types for convenience
pub use dirscout_core::{
    DirectorySelection, EntryKind, ErrorPhase, FileRecord, PermissionCategory,
    PermissionDecision, PermissionStatus, PlatformKind, ScanConfig, ScanError, ScanFailure,
    ScanReport, ScanStatus, status_line,
};
