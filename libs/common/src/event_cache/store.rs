//! Query interface over a chain's indexed log storage.

use alloy_primitives::{Address, B256};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::types::{ChainHead, Confirmations, Log, LogFilter};

/// Errors surfaced by an event store backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventStoreError {
    /// A filter with this name has a different definition already
    FilterConflict(String),
    /// Backend failure (database, RPC, ...)
    Backend(String),
    /// The store has not observed any block yet
    NoHead,
}

impl core::fmt::Display for EventStoreError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            EventStoreError::FilterConflict(name) => {
                write!(f, "Filter '{}' already registered with a different definition", name)
            }
            EventStoreError::Backend(msg) => write!(f, "Event store backend error: {}", msg),
            EventStoreError::NoHead => write!(f, "Event store has no chain head yet"),
        }
    }
}

impl std::error::Error for EventStoreError {}

/// Read access to historical logs, plus filter registration.
///
/// Every query only returns logs that satisfy the given [`Confirmations`]
/// and orders results by `(block_number, log_index)`.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Registers a named filter. Registering the same filter twice is a no-op.
    async fn register_filter(&self, filter: LogFilter) -> Result<(), EventStoreError>;

    /// Unregisters a filter by name. Unknown names are ignored.
    async fn unregister_filter(&self, name: &str) -> Result<(), EventStoreError>;

    fn has_filter(&self, name: &str) -> bool;

    async fn latest_block(&self) -> Result<ChainHead, EventStoreError>;

    async fn latest_log_by_event_sig_with_confs(
        &self,
        event_sig: B256,
        address: Address,
        confs: Confirmations,
    ) -> Result<Option<Log>, EventStoreError>;

    /// Logs whose block timestamp is strictly after `after`.
    async fn logs_created_after(
        &self,
        event_sig: B256,
        address: Address,
        after: DateTime<Utc>,
        confs: Confirmations,
    ) -> Result<Vec<Log>, EventStoreError>;

    /// Logs whose topic at `topic_index` is one of `topic_values`.
    async fn indexed_logs(
        &self,
        event_sig: B256,
        address: Address,
        topic_index: usize,
        topic_values: &[B256],
        confs: Confirmations,
    ) -> Result<Vec<Log>, EventStoreError>;

    /// Logs whose topic at `topic_index` is within `[min, max]`.
    async fn indexed_logs_topic_range(
        &self,
        event_sig: B256,
        address: Address,
        topic_index: usize,
        min: B256,
        max: B256,
        confs: Confirmations,
    ) -> Result<Vec<Log>, EventStoreError>;

    async fn indexed_logs_created_after(
        &self,
        event_sig: B256,
        address: Address,
        topic_index: usize,
        topic_values: &[B256],
        after: DateTime<Utc>,
        confs: Confirmations,
    ) -> Result<Vec<Log>, EventStoreError>;

    /// Logs emitted in the given transaction, regardless of depth.
    async fn indexed_logs_by_tx_hash(
        &self,
        event_sig: B256,
        address: Address,
        tx_hash: B256,
    ) -> Result<Vec<Log>, EventStoreError>;

    /// Logs whose data word at `word_index` is within `[min, max]`.
    async fn logs_data_word_range(
        &self,
        event_sig: B256,
        address: Address,
        word_index: usize,
        min: B256,
        max: B256,
        confs: Confirmations,
    ) -> Result<Vec<Log>, EventStoreError>;

    /// Logs whose data word at `word_index` is `>= value`.
    async fn logs_data_word_greater_than(
        &self,
        event_sig: B256,
        address: Address,
        word_index: usize,
        value: B256,
        confs: Confirmations,
    ) -> Result<Vec<Log>, EventStoreError>;

    /// Logs where `word[word_index_min] <= value <= word[word_index_max]`.
    async fn logs_data_word_between(
        &self,
        event_sig: B256,
        address: Address,
        word_index_min: usize,
        word_index_max: usize,
        value: B256,
        confs: Confirmations,
    ) -> Result<Vec<Log>, EventStoreError>;

    /// Highest block at or after `from_block` containing any matching log,
    /// or 0 when there is none.
    async fn latest_block_by_event_sigs_addrs_with_confs(
        &self,
        from_block: u64,
        event_sigs: &[B256],
        addresses: &[Address],
        confs: Confirmations,
    ) -> Result<u64, EventStoreError>;
}
