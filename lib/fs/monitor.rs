//! Change-notification feed driving active invalidation.
//!
//! An OS-specific watcher (or any other producer) pushes changed paths
//! into an mpsc channel; a spawned worker drains the channel and marks
//! the owning listings stale via [`FsCache::mark_changed`]. Delivery is
//! at-least-once; marking is idempotent, so duplicates cost nothing.

use tokio::sync::mpsc::Receiver;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::sync::Arc;

use super::MetadataSource;
use super::dircache::FsCache;

/// Worker applying a stream of changed-path events to a cache.
#[derive(Debug)]
pub struct ChangeMonitor {
    worker: JoinHandle<()>,
}

impl ChangeMonitor {
    /// Spawns a worker draining `events` into [`FsCache::mark_changed`].
    ///
    /// The worker exits once every sender for the channel has been
    /// dropped.
    #[must_use]
    pub fn spawn<S>(cache: Arc<FsCache<S>>, mut events: Receiver<String>) -> Self
    where
        S: MetadataSource + 'static,
    {
        let worker = tokio::spawn(async move {
            while let Some(path) = events.recv().await {
                cache.mark_changed(&path);
            }
            debug!("change feed closed; monitor exiting");
        });
        Self { worker }
    }

    /// Waits for the worker to drain the channel and exit.
    pub async fn join(self) {
        let _ = self.worker.await;
    }

    /// Stops the worker without waiting for the channel to close.
    pub fn abort(&self) {
        self.worker.abort();
    }
}
