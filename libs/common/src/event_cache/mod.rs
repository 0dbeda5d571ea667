//! Local index of contract logs.
//!
//! This module provides:
//! - Raw log and filter types, with confirmation-depth semantics
//! - The `EventStore` query trait and an in-memory implementation
//! - Auto-sync caches invalidated by newly ingested logs
//! - JSON snapshot persistence
//! - An indexer and polling watcher that feed the store from a provider
//!
//! # Usage
//!
//! ```ignore
//! use common::event_cache::{CacheRegistry, InMemoryEventStore, LogIndexer, LogWatcher};
//!
//! let registry = Arc::new(CacheRegistry::new());
//! let store = Arc::new(InMemoryEventStore::with_registry(registry.clone()));
//! let watcher = LogWatcher::new(WatcherConfig::default(), LogIndexer::new(provider, IndexerConfig::default()), store.clone());
//! let handle = watcher.spawn(cancel.clone());
//! ```

pub mod auto_sync;
pub mod indexer;
pub mod manager;
pub mod memory;
pub mod store;
pub mod types;
pub mod watcher;

pub use auto_sync::{AutoSyncCache, CacheRegistry, SyncedCache};
pub use indexer::{IndexerConfig, IndexerError, LogIndexer, SyncResult, DEFAULT_MAX_BLOCK_RANGE};
pub use manager::{SnapshotConfig, SnapshotError, SnapshotManager, DEFAULT_SNAPSHOT_PATH, SNAPSHOT_PATH_ENV_VAR};
pub use memory::InMemoryEventStore;
pub use store::{EventStore, EventStoreError};
pub use types::{
    filter_name, word_from_address, word_from_u64, ChainHead, Confirmations, EventSnapshot, Log, LogFilter,
};
pub use watcher::{LogWatcher, WatcherConfig, WatcherError, DEFAULT_POLL_INTERVAL_SECS};
