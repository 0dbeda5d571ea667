//! Log indexer that syncs registered filters from a JSON-RPC provider into an
//! [`InMemoryEventStore`].

use std::collections::HashMap;

use alloy::eips::BlockNumberOrTag;
use alloy::providers::Provider;
use alloy::rpc::types::Filter;
use chrono::{DateTime, Utc};

use super::memory::InMemoryEventStore;
use super::types::{ChainHead, Log, LogFilter};

/// Default upper bound on blocks per `eth_getLogs` request
pub const DEFAULT_MAX_BLOCK_RANGE: u64 = 2_000;

/// Errors that can occur during indexing
#[derive(Debug)]
pub enum IndexerError {
    /// Failed to communicate with RPC
    RpcError(String),
    /// Log returned by the node misses a field we index on
    IncompleteLog { field: &'static str },
    ConfigError(String),
}

impl core::fmt::Display for IndexerError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            IndexerError::RpcError(msg) => write!(f, "RPC error: {}", msg),
            IndexerError::IncompleteLog { field } => {
                write!(f, "Log returned without {}", field)
            }
            IndexerError::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for IndexerError {}

#[derive(Debug, Clone)]
pub struct IndexerConfig {
    /// Block to start syncing from when the store is empty
    pub start_block: u64,
    pub max_block_range: u64,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            start_block: 0,
            max_block_range: DEFAULT_MAX_BLOCK_RANGE,
        }
    }
}

impl IndexerConfig {
    pub fn with_start_block(mut self, block: u64) -> Self {
        self.start_block = block;
        self
    }

    pub fn with_max_block_range(mut self, range: u64) -> Self {
        self.max_block_range = range.max(1);
        self
    }
}

/// Fetches logs for every filter registered in the store.
#[derive(Debug)]
pub struct LogIndexer<P> {
    provider: P,
    config: IndexerConfig,
}

impl<P: Provider + Clone> LogIndexer<P> {
    pub fn new(provider: P, config: IndexerConfig) -> Self {
        Self { provider, config }
    }

    pub fn config(&self) -> &IndexerConfig {
        &self.config
    }

    /// Reads the latest and finalized block. Nodes without a finalized tag
    /// report the latest block as finalized.
    pub async fn fetch_head(&self) -> Result<ChainHead, IndexerError> {
        let number = self
            .provider
            .get_block_number()
            .await
            .map_err(|e| IndexerError::RpcError(format!("Failed to get block number: {}", e)))?;

        let finalized = match self
            .provider
            .get_block_by_number(BlockNumberOrTag::Finalized)
            .await
        {
            Ok(Some(block)) => block.header.number,
            Ok(None) => number,
            Err(e) => {
                tracing::debug!(error = %e, "Finalized tag unsupported, using latest");
                number
            }
        };

        Ok(ChainHead {
            number,
            finalized: finalized.min(number),
            timestamp: None,
        })
    }

    /// Syncs every registered filter up to head. Each filter resumes after
    /// the last block fetched for it, and a filter never synced before is
    /// backfilled from `start_block`.
    pub async fn sync(&self, store: &InMemoryEventStore) -> Result<SyncResult, IndexerError> {
        let head = self.fetch_head().await?;
        let plan = pending_ranges(&self.config, store, head.number);

        let mut from_block = head.number.saturating_add(1);
        let mut logs_added = 0;
        let mut block_times = HashMap::new();

        for (filter, ranges) in &plan {
            for &(chunk_start, chunk_end) in ranges {
                from_block = from_block.min(chunk_start);
                let logs = self
                    .fetch_filter_logs(filter, chunk_start, chunk_end, &mut block_times)
                    .await?;
                logs_added += store.ingest_logs(logs);
                // Only advance once the chunk's logs are stored
                store.set_filter_synced_block(&filter.name, chunk_end);
            }
        }

        store.set_head(head);

        tracing::debug!(
            from_block,
            to_block = head.number,
            filters = plan.len(),
            logs_added,
            "Synced logs"
        );

        Ok(SyncResult {
            from_block,
            to_block: head.number,
            logs_added,
        })
    }

    async fn fetch_filter_logs(
        &self,
        filter: &LogFilter,
        from_block: u64,
        to_block: u64,
        block_times: &mut HashMap<u64, DateTime<Utc>>,
    ) -> Result<Vec<Log>, IndexerError> {
        if filter.addresses.is_empty() || filter.event_sigs.is_empty() {
            return Ok(Vec::new());
        }

        let rpc_filter = Filter::new()
            .address(filter.addresses.clone())
            .event_signature(filter.event_sigs.clone())
            .from_block(from_block)
            .to_block(to_block);

        let raw_logs = self
            .provider
            .get_logs(&rpc_filter)
            .await
            .map_err(|e| IndexerError::RpcError(format!("Failed to get logs: {}", e)))?;

        let mut logs = Vec::with_capacity(raw_logs.len());
        for raw in raw_logs {
            let block_number = raw
                .block_number
                .ok_or(IndexerError::IncompleteLog { field: "block_number" })?;
            let block_timestamp = match raw.block_timestamp {
                Some(ts) => timestamp_from_secs(ts),
                None => self.block_time(block_number, block_times).await?,
            };

            logs.push(Log {
                address: raw.inner.address,
                topics: raw.inner.data.topics().to_vec(),
                data: raw.inner.data.data.clone(),
                block_number,
                block_hash: raw
                    .block_hash
                    .ok_or(IndexerError::IncompleteLog { field: "block_hash" })?,
                block_timestamp,
                tx_hash: raw
                    .transaction_hash
                    .ok_or(IndexerError::IncompleteLog { field: "transaction_hash" })?,
                log_index: raw
                    .log_index
                    .ok_or(IndexerError::IncompleteLog { field: "log_index" })?,
            });
        }
        Ok(logs)
    }

    async fn block_time(
        &self,
        block_number: u64,
        block_times: &mut HashMap<u64, DateTime<Utc>>,
    ) -> Result<DateTime<Utc>, IndexerError> {
        if let Some(ts) = block_times.get(&block_number) {
            return Ok(*ts);
        }
        let block = self
            .provider
            .get_block_by_number(BlockNumberOrTag::Number(block_number))
            .await
            .map_err(|e| IndexerError::RpcError(format!("Failed to get block {}: {}", block_number, e)))?
            .ok_or_else(|| IndexerError::RpcError(format!("Block {} not found", block_number)))?;

        let ts = timestamp_from_secs(block.header.timestamp);
        block_times.insert(block_number, ts);
        Ok(ts)
    }
}

/// Block ranges still to fetch for each registered filter, split into
/// chunks of at most `max_block_range` blocks. Filters already at `head` are
/// left out.
pub fn pending_ranges(
    config: &IndexerConfig,
    store: &InMemoryEventStore,
    head: u64,
) -> Vec<(LogFilter, Vec<(u64, u64)>)> {
    store
        .filters()
        .into_iter()
        .filter_map(|filter| {
            let from = match store.filter_synced_block(&filter.name) {
                Some(synced) => synced.saturating_add(1),
                None => config.start_block,
            };
            let ranges = block_chunks(from, head, config.max_block_range);
            (!ranges.is_empty()).then_some((filter, ranges))
        })
        .collect()
}

fn block_chunks(from: u64, to: u64, max_block_range: u64) -> Vec<(u64, u64)> {
    let step = max_block_range.max(1);
    let mut chunks = Vec::new();
    let mut start = from;
    while start <= to {
        let end = start.saturating_add(step - 1).min(to);
        chunks.push((start, end));
        if end == u64::MAX {
            break;
        }
        start = end + 1;
    }
    chunks
}

fn timestamp_from_secs(secs: u64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs as i64, 0).unwrap_or_default()
}

/// Result of a sync operation
#[derive(Debug, Clone, Default)]
pub struct SyncResult {
    pub from_block: u64,
    pub to_block: u64,
    pub logs_added: usize,
}

impl core::fmt::Display for SyncResult {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "Synced blocks {}..={}, {} new logs",
            self.from_block, self.to_block, self.logs_added
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indexer_config() {
        let config = IndexerConfig::default()
            .with_start_block(1000)
            .with_max_block_range(0);

        assert_eq!(config.start_block, 1000);
        assert_eq!(config.max_block_range, 1);
        assert_eq!(IndexerConfig::default().max_block_range, DEFAULT_MAX_BLOCK_RANGE);
    }

    #[test]
    fn test_indexer_error_display() {
        let error = IndexerError::RpcError("connection refused".to_string());
        assert!(error.to_string().contains("RPC error"));
        assert!(error.to_string().contains("connection refused"));

        let error = IndexerError::IncompleteLog { field: "log_index" };
        assert!(error.to_string().contains("log_index"));
    }

    #[test]
    fn test_sync_result_display() {
        let result = SyncResult {
            from_block: 10,
            to_block: 20,
            logs_added: 3,
        };
        let display = result.to_string();
        assert!(display.contains("10..=20"));
        assert!(display.contains("3 new logs"));
    }

    #[test]
    fn test_timestamp_from_secs() {
        assert_eq!(timestamp_from_secs(1_700_000_000).timestamp(), 1_700_000_000);
    }

    #[test]
    fn test_block_chunks() {
        assert_eq!(block_chunks(1, 5, 2), vec![(1, 2), (3, 4), (5, 5)]);
        assert_eq!(block_chunks(5, 5, 100), vec![(5, 5)]);
        assert!(block_chunks(6, 5, 100).is_empty());
    }

    #[tokio::test]
    async fn test_late_filter_is_backfilled_from_start_block() {
        use crate::event_cache::store::EventStore;
        use alloy_primitives::{Address, B256};

        let config = IndexerConfig::default()
            .with_start_block(100)
            .with_max_block_range(50);
        let store = InMemoryEventStore::new();
        let early = LogFilter::new("early".to_string(), vec![B256::repeat_byte(1)], vec![Address::repeat_byte(1)]);
        store.register_filter(early).await.unwrap();
        store.set_filter_synced_block("early", 180);

        // Registered after the store already synced past its history
        let late = LogFilter::new("late".to_string(), vec![B256::repeat_byte(2)], vec![Address::repeat_byte(2)]);
        store.register_filter(late).await.unwrap();

        let plan = pending_ranges(&config, &store, 200);
        let ranges: Vec<(&str, Vec<(u64, u64)>)> = plan
            .iter()
            .map(|(filter, ranges)| (filter.name.as_str(), ranges.clone()))
            .collect();
        assert_eq!(
            ranges,
            vec![
                ("early", vec![(181, 200)]),
                ("late", vec![(100, 149), (150, 199), (200, 200)]),
            ]
        );

        store.set_filter_synced_block("early", 200);
        store.set_filter_synced_block("late", 200);
        assert!(pending_ranges(&config, &store, 200).is_empty());
        assert_eq!(store.last_synced_block(), 200);
    }
}
