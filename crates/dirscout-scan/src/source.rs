//! Lazy entity enumeration.
//!
//! Sources produce a back-pressured stream of paths below a root. The
//! default [`JwalkSource`] walks the tree serially on a blocking thread and
//! stops as soon as the consumer drops its end of the stream. Directories
//! below the root that cannot be read show up as `Err` items.

use std::io;
use std::path::{Path, PathBuf};

use jwalk::{Parallelism, WalkDir};
use tokio::sync::mpsc;
use tracing::debug;

use dirscout_core::ScanConfig;

use crate::permission::BoxFuture;

/// Buffer between the blocking walker thread and the async consumer.
pub const ENTRY_CHANNEL_SIZE: usize = 64;

/// A listing failure reported mid-stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkFailure {
    /// Directory (or entry) that could not be read.
    pub path: PathBuf,
    /// Human-readable message.
    pub message: String,
}

impl WalkFailure {
    pub fn new(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// One step of an enumeration.
pub type WalkItem = Result<PathBuf, WalkFailure>;

/// Stream of entities produced by an [`EntrySource`].
#[derive(Debug)]
pub struct EntryStream {
    rx: mpsc::Receiver<WalkItem>,
}

impl EntryStream {
    /// Wrap the receiving end of a producer channel.
    pub fn new(rx: mpsc::Receiver<WalkItem>) -> Self {
        Self { rx }
    }

    /// Stream over a fixed list of items.
    pub fn from_items(items: impl IntoIterator<Item = WalkItem>) -> Self {
        let items: Vec<WalkItem> = items.into_iter().collect();
        let (tx, rx) = mpsc::channel(items.len().max(1));
        for item in items {
            // Capacity matches the item count, so this never fails
            let _ = tx.try_send(item);
        }
        Self { rx }
    }

    /// Await the next entity. `None` once the source is exhausted.
    pub async fn next(&mut self) -> Option<WalkItem> {
        self.rx.recv().await
    }
}

/// Something that can enumerate the entities below a root.
pub trait EntrySource: Send + Sync {
    /// Open a recursive, lazy enumeration of everything below `root`.
    ///
    /// The root itself is not yielded and symlinks are never followed. An
    /// `Err` means the root could not be listed at all.
    fn open<'a>(
        &'a self,
        root: &'a Path,
        config: &'a ScanConfig,
    ) -> BoxFuture<'a, io::Result<EntryStream>>;
}

/// Serial jwalk traversal on a blocking thread.
///
/// Must be opened from within a tokio runtime.
#[derive(Debug, Default, Clone, Copy)]
pub struct JwalkSource;

impl JwalkSource {
    pub fn new() -> Self {
        Self
    }
}

impl EntrySource for JwalkSource {
    fn open<'a>(
        &'a self,
        root: &'a Path,
        config: &'a ScanConfig,
    ) -> BoxFuture<'a, io::Result<EntryStream>> {
        Box::pin(spawn_walk(root, config))
    }
}

async fn spawn_walk(root: &Path, config: &ScanConfig) -> io::Result<EntryStream> {
    // Surface a root that cannot be listed before any walking starts
    tokio::fs::read_dir(root).await?;

    let walker = WalkDir::new(root)
        .parallelism(Parallelism::Serial)
        .skip_hidden(!config.include_hidden)
        .follow_links(false)
        .sort(true)
        .min_depth(1)
        .max_depth(config.max_depth.map(|d| d as usize).unwrap_or(usize::MAX));

    let (tx, rx) = mpsc::channel(ENTRY_CHANNEL_SIZE);
    let root = root.to_path_buf();

    tokio::task::spawn_blocking(move || {
        for entry_result in walker {
            let (item, unreadable) = match entry_result {
                Ok(mut entry) => {
                    let path = entry.path();
                    // jwalk yields an unreadable directory as an entry
                    // carrying the listing error
                    let unreadable = entry
                        .read_children_error
                        .take()
                        .map(|err| WalkFailure::new(path.clone(), err.to_string()));
                    (Ok(path), unreadable)
                }
                Err(err) => {
                    let path = err
                        .path()
                        .map(|p| p.to_path_buf())
                        .unwrap_or_else(|| root.clone());
                    (Err(WalkFailure::new(path, err.to_string())), None)
                }
            };

            let delivered = std::iter::once(item)
                .chain(unreadable.map(Err))
                .all(|item| tx.blocking_send(item).is_ok());
            if !delivered {
                debug!(root = %root.display(), "entry consumer dropped, stopping walk");
                break;
            }
        }
    });

    Ok(EntryStream::new(rx))
}
