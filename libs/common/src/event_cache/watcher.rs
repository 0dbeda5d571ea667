//! Polling log watcher.
//!
//! Periodically runs the [`LogIndexer`] against the shared store and, when
//! configured, persists a snapshot after every poll that found new logs.
//! The loop stops when its [`CancellationToken`] fires.

use std::sync::Arc;
use std::time::Duration;

use alloy::providers::Provider;
use tokio_util::sync::CancellationToken;

use super::indexer::{IndexerError, LogIndexer, SyncResult};
use super::manager::{SnapshotError, SnapshotManager};
use super::memory::InMemoryEventStore;

/// Default polling interval in seconds
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 12;

#[derive(Debug, Clone)]
pub struct WatcherConfig {
    pub poll_interval_secs: u64,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
        }
    }
}

impl WatcherConfig {
    pub fn with_poll_interval(mut self, secs: u64) -> Self {
        self.poll_interval_secs = secs;
        self
    }
}

#[derive(Debug)]
pub enum WatcherError {
    IndexerError(IndexerError),
    SnapshotError(SnapshotError),
    Stopped,
}

impl core::fmt::Display for WatcherError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            WatcherError::IndexerError(e) => write!(f, "Indexer error: {}", e),
            WatcherError::SnapshotError(e) => write!(f, "Snapshot error: {}", e),
            WatcherError::Stopped => write!(f, "Watcher stopped"),
        }
    }
}

impl std::error::Error for WatcherError {}

impl From<IndexerError> for WatcherError {
    fn from(e: IndexerError) -> Self {
        WatcherError::IndexerError(e)
    }
}

impl From<SnapshotError> for WatcherError {
    fn from(e: SnapshotError) -> Self {
        WatcherError::SnapshotError(e)
    }
}

pub struct LogWatcher<P> {
    config: WatcherConfig,
    indexer: Arc<LogIndexer<P>>,
    store: Arc<InMemoryEventStore>,
    snapshots: Option<Arc<SnapshotManager>>,
}

impl<P> Clone for LogWatcher<P> {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            indexer: Arc::clone(&self.indexer),
            store: Arc::clone(&self.store),
            snapshots: self.snapshots.clone(),
        }
    }
}

impl<P: Provider + Clone + 'static> LogWatcher<P> {
    pub fn new(config: WatcherConfig, indexer: LogIndexer<P>, store: Arc<InMemoryEventStore>) -> Self {
        Self {
            config,
            indexer: Arc::new(indexer),
            store,
            snapshots: None,
        }
    }

    pub fn with_snapshots(mut self, manager: SnapshotManager) -> Self {
        self.snapshots = Some(Arc::new(manager));
        self
    }

    pub fn store(&self) -> &Arc<InMemoryEventStore> {
        &self.store
    }

    /// Syncs once and persists a snapshot if anything new arrived.
    pub async fn poll_once(&self) -> Result<SyncResult, WatcherError> {
        let result = self.indexer.sync(&self.store).await?;
        if let Some(snapshots) = &self.snapshots {
            if result.logs_added > 0 {
                snapshots.save(&self.store.snapshot())?;
            }
        }
        Ok(result)
    }

    /// Polls until `cancel` fires. Poll failures are logged and retried on
    /// the next tick.
    pub async fn run(&self, cancel: CancellationToken) {
        let interval = Duration::from_secs(self.config.poll_interval_secs);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!(target: "log_watcher", "Watcher stopped");
                    return;
                }
                result = self.poll_once() => match result {
                    Ok(result) if result.logs_added > 0 => {
                        tracing::debug!(target: "log_watcher", %result, "Poll found new logs");
                    }
                    Ok(_) => {}
                    Err(e) => {
                        tracing::warn!(
                            target: "log_watcher",
                            error = %e,
                            "Poll error (will retry)"
                        );
                    }
                }
            }

            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!(target: "log_watcher", "Watcher stopped");
                    return;
                }
                _ = tokio::time::sleep(interval) => {}
            }
        }
    }

    /// Spawns [`run`](Self::run) on the runtime.
    pub fn spawn(&self, cancel: CancellationToken) -> tokio::task::JoinHandle<()>
    where
        P: Send + Sync,
    {
        let watcher = self.clone();
        tokio::spawn(async move { watcher.run(cancel).await })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_watcher_config() {
        assert_eq!(WatcherConfig::default().poll_interval_secs, DEFAULT_POLL_INTERVAL_SECS);
        assert_eq!(WatcherConfig::default().with_poll_interval(30).poll_interval_secs, 30);
    }

    #[test]
    fn test_watcher_error_display() {
        assert!(WatcherError::Stopped.to_string().contains("stopped"));

        let err: WatcherError = IndexerError::RpcError("test".to_string()).into();
        assert!(err.to_string().contains("Indexer"));
    }
}
