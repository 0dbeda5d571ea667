//! In-memory [`EventStore`] backed by a sorted log vector.
//!
//! Logs are pushed in by a [`LogIndexer`](super::indexer::LogIndexer) (or by
//! tests) through [`InMemoryEventStore::ingest_logs`]. Every ingest is also
//! forwarded to the attached [`CacheRegistry`] so auto-sync caches see new
//! events without polling.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use alloy_primitives::{Address, B256};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use super::auto_sync::CacheRegistry;
use super::store::{EventStore, EventStoreError};
use super::types::{ChainHead, Confirmations, EventSnapshot, Log, LogFilter};

#[derive(Debug, Default)]
struct StoreState {
    filters: HashMap<String, LogFilter>,
    /// Sorted by (block_number, log_index)
    logs: Vec<Log>,
    seen: HashSet<(B256, u64)>,
    head: ChainHead,
    /// Highest block fetched for each registered filter
    synced_blocks: BTreeMap<String, u64>,
}

impl StoreState {
    fn select<F>(&self, event_sig: B256, address: Address, confs: Confirmations, pred: F) -> Vec<Log>
    where
        F: Fn(&Log) -> bool,
    {
        let Some(max_block) = confs.max_block(&self.head) else {
            return Vec::new();
        };
        self.logs
            .iter()
            .filter(|log| log.block_number <= max_block)
            .filter(|log| log.address == address && log.event_sig() == Some(event_sig))
            .filter(|log| pred(log))
            .cloned()
            .collect()
    }
}

/// Thread-safe in-memory event store.
#[derive(Debug, Default)]
pub struct InMemoryEventStore {
    state: RwLock<StoreState>,
    registry: Option<Arc<CacheRegistry>>,
}

impl InMemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store that notifies `registry` of every ingested log.
    pub fn with_registry(registry: Arc<CacheRegistry>) -> Self {
        Self {
            state: RwLock::new(StoreState::default()),
            registry: Some(registry),
        }
    }

    pub fn from_snapshot(snapshot: EventSnapshot, registry: Option<Arc<CacheRegistry>>) -> Self {
        let store = Self {
            state: RwLock::new(StoreState::default()),
            registry,
        };
        store.restore(snapshot);
        store
    }

    pub fn registry(&self) -> Option<&Arc<CacheRegistry>> {
        self.registry.as_ref()
    }

    /// Adds logs, skipping ones already stored. Returns how many were new.
    pub fn ingest_logs(&self, logs: Vec<Log>) -> usize {
        let fresh: Vec<Log> = {
            let mut state = self.state.write();
            let fresh: Vec<Log> = logs
                .into_iter()
                .filter(|log| state.seen.insert(log.id()))
                .collect();
            if fresh.is_empty() {
                return 0;
            }
            state.logs.extend(fresh.iter().cloned());
            state.logs.sort_by_key(|log| log.position());
            fresh
        };

        tracing::debug!(count = fresh.len(), "Ingested logs");

        if let Some(registry) = &self.registry {
            registry.notify(&fresh);
        }
        fresh.len()
    }

    /// Updates the chain head. The finalized block never moves backwards.
    pub fn set_head(&self, head: ChainHead) {
        let mut state = self.state.write();
        let finalized = head.finalized.max(state.head.finalized);
        state.head = ChainHead { finalized, ..head };
    }

    pub fn head(&self) -> ChainHead {
        self.state.read().head
    }

    /// Block every registered filter has been fetched up to. Zero while any
    /// filter still waits for its first sync.
    pub fn last_synced_block(&self) -> u64 {
        let state = self.state.read();
        state
            .filters
            .keys()
            .map(|name| state.synced_blocks.get(name).copied().unwrap_or(0))
            .min()
            .unwrap_or(0)
    }

    /// Highest block fetched for filter `name`, `None` if it was never synced.
    pub fn filter_synced_block(&self, name: &str) -> Option<u64> {
        self.state.read().synced_blocks.get(name).copied()
    }

    /// Records that filter `name` has been fetched up to `block`. Ignored for
    /// filters that are no longer registered.
    pub fn set_filter_synced_block(&self, name: &str, block: u64) {
        let mut state = self.state.write();
        if state.filters.contains_key(name) {
            state.synced_blocks.insert(name.to_string(), block);
        }
    }

    pub fn filters(&self) -> Vec<LogFilter> {
        let state = self.state.read();
        let mut filters: Vec<LogFilter> = state.filters.values().cloned().collect();
        filters.sort_by(|a, b| a.name.cmp(&b.name));
        filters
    }

    pub fn log_count(&self) -> usize {
        self.state.read().logs.len()
    }

    pub fn snapshot(&self) -> EventSnapshot {
        let state = self.state.read();
        let mut filters: Vec<LogFilter> = state.filters.values().cloned().collect();
        filters.sort_by(|a, b| a.name.cmp(&b.name));
        EventSnapshot {
            version: EventSnapshot::VERSION,
            filters,
            logs: state.logs.clone(),
            head: state.head,
            synced_blocks: state.synced_blocks.clone(),
        }
    }

    /// Replaces the store contents with `snapshot`.
    pub fn restore(&self, snapshot: EventSnapshot) {
        let mut state = self.state.write();
        let mut logs = snapshot.logs;
        logs.sort_by_key(|log| log.position());
        state.seen = logs.iter().map(|log| log.id()).collect();
        state.logs = logs;
        state.filters = snapshot
            .filters
            .into_iter()
            .map(|filter| (filter.name.clone(), filter))
            .collect();
        state.head = snapshot.head;
        let synced_blocks: BTreeMap<String, u64> = snapshot
            .synced_blocks
            .into_iter()
            .filter(|(name, _)| state.filters.contains_key(name))
            .collect();
        state.synced_blocks = synced_blocks;
    }
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    async fn register_filter(&self, filter: LogFilter) -> Result<(), EventStoreError> {
        let mut state = self.state.write();
        match state.filters.get(&filter.name) {
            Some(existing) if *existing == filter => Ok(()),
            Some(_) => Err(EventStoreError::FilterConflict(filter.name)),
            None => {
                tracing::debug!(name = %filter.name, "Registered log filter");
                state.filters.insert(filter.name.clone(), filter);
                Ok(())
            }
        }
    }

    async fn unregister_filter(&self, name: &str) -> Result<(), EventStoreError> {
        let mut state = self.state.write();
        // A filter registered again later is backfilled from scratch
        state.synced_blocks.remove(name);
        if state.filters.remove(name).is_none() {
            tracing::warn!(name, "Unregistering unknown log filter");
        }
        Ok(())
    }

    fn has_filter(&self, name: &str) -> bool {
        self.state.read().filters.contains_key(name)
    }

    async fn latest_block(&self) -> Result<ChainHead, EventStoreError> {
        let head = self.state.read().head;
        if head.number == 0 {
            return Err(EventStoreError::NoHead);
        }
        Ok(head)
    }

    async fn latest_log_by_event_sig_with_confs(
        &self,
        event_sig: B256,
        address: Address,
        confs: Confirmations,
    ) -> Result<Option<Log>, EventStoreError> {
        let state = self.state.read();
        Ok(state.select(event_sig, address, confs, |_| true).pop())
    }

    async fn logs_created_after(
        &self,
        event_sig: B256,
        address: Address,
        after: DateTime<Utc>,
        confs: Confirmations,
    ) -> Result<Vec<Log>, EventStoreError> {
        let state = self.state.read();
        Ok(state.select(event_sig, address, confs, |log| log.block_timestamp > after))
    }

    async fn indexed_logs(
        &self,
        event_sig: B256,
        address: Address,
        topic_index: usize,
        topic_values: &[B256],
        confs: Confirmations,
    ) -> Result<Vec<Log>, EventStoreError> {
        let state = self.state.read();
        Ok(state.select(event_sig, address, confs, |log| {
            log.topic(topic_index)
                .map(|topic| topic_values.contains(&topic))
                .unwrap_or(false)
        }))
    }

    async fn indexed_logs_topic_range(
        &self,
        event_sig: B256,
        address: Address,
        topic_index: usize,
        min: B256,
        max: B256,
        confs: Confirmations,
    ) -> Result<Vec<Log>, EventStoreError> {
        let state = self.state.read();
        Ok(state.select(event_sig, address, confs, |log| {
            log.topic(topic_index)
                .map(|topic| min <= topic && topic <= max)
                .unwrap_or(false)
        }))
    }

    async fn indexed_logs_created_after(
        &self,
        event_sig: B256,
        address: Address,
        topic_index: usize,
        topic_values: &[B256],
        after: DateTime<Utc>,
        confs: Confirmations,
    ) -> Result<Vec<Log>, EventStoreError> {
        let state = self.state.read();
        Ok(state.select(event_sig, address, confs, |log| {
            log.block_timestamp > after
                && log
                    .topic(topic_index)
                    .map(|topic| topic_values.contains(&topic))
                    .unwrap_or(false)
        }))
    }

    async fn indexed_logs_by_tx_hash(
        &self,
        event_sig: B256,
        address: Address,
        tx_hash: B256,
    ) -> Result<Vec<Log>, EventStoreError> {
        let state = self.state.read();
        Ok(state
            .logs
            .iter()
            .filter(|log| log.address == address && log.event_sig() == Some(event_sig))
            .filter(|log| log.tx_hash == tx_hash)
            .cloned()
            .collect())
    }

    async fn logs_data_word_range(
        &self,
        event_sig: B256,
        address: Address,
        word_index: usize,
        min: B256,
        max: B256,
        confs: Confirmations,
    ) -> Result<Vec<Log>, EventStoreError> {
        let state = self.state.read();
        Ok(state.select(event_sig, address, confs, |log| {
            log.data_word(word_index)
                .map(|word| min <= word && word <= max)
                .unwrap_or(false)
        }))
    }

    async fn logs_data_word_greater_than(
        &self,
        event_sig: B256,
        address: Address,
        word_index: usize,
        value: B256,
        confs: Confirmations,
    ) -> Result<Vec<Log>, EventStoreError> {
        let state = self.state.read();
        Ok(state.select(event_sig, address, confs, |log| {
            log.data_word(word_index)
                .map(|word| word >= value)
                .unwrap_or(false)
        }))
    }

    async fn logs_data_word_between(
        &self,
        event_sig: B256,
        address: Address,
        word_index_min: usize,
        word_index_max: usize,
        value: B256,
        confs: Confirmations,
    ) -> Result<Vec<Log>, EventStoreError> {
        let state = self.state.read();
        Ok(state.select(event_sig, address, confs, |log| {
            match (log.data_word(word_index_min), log.data_word(word_index_max)) {
                (Some(lo), Some(hi)) => lo <= value && value <= hi,
                _ => false,
            }
        }))
    }

    async fn latest_block_by_event_sigs_addrs_with_confs(
        &self,
        from_block: u64,
        event_sigs: &[B256],
        addresses: &[Address],
        confs: Confirmations,
    ) -> Result<u64, EventStoreError> {
        let state = self.state.read();
        let Some(max_block) = confs.max_block(&state.head) else {
            return Ok(0);
        };
        Ok(state
            .logs
            .iter()
            .filter(|log| log.block_number >= from_block && log.block_number <= max_block)
            .filter(|log| addresses.contains(&log.address))
            .filter(|log| log.event_sig().map(|sig| event_sigs.contains(&sig)).unwrap_or(false))
            .map(|log| log.block_number)
            .max()
            .unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event_cache::auto_sync::AutoSyncCache;
    use crate::event_cache::types::word_from_u64;
    use alloy_primitives::address;

    const CONTRACT: Address = address!("00000000000000000000000000000000000000c1");

    fn sig() -> B256 {
        B256::repeat_byte(0x11)
    }

    fn log_at(block: u64, index: u64, words: &[u64]) -> Log {
        let mut data = Vec::new();
        for word in words {
            data.extend_from_slice(word_from_u64(*word).as_slice());
        }
        Log {
            address: CONTRACT,
            topics: vec![sig(), word_from_u64(block)],
            data: data.into(),
            block_number: block,
            block_hash: B256::ZERO,
            block_timestamp: DateTime::from_timestamp(1_000 + block as i64, 0).unwrap(),
            tx_hash: word_from_u64(block * 100 + index),
            log_index: index,
        }
    }

    fn store_with_head(number: u64, finalized: u64) -> InMemoryEventStore {
        let store = InMemoryEventStore::new();
        store.set_head(ChainHead {
            number,
            finalized,
            timestamp: None,
        });
        store
    }

    #[tokio::test]
    async fn test_results_are_ordered_and_deduplicated() {
        let store = store_with_head(100, 100);
        assert_eq!(store.ingest_logs(vec![log_at(5, 1, &[]), log_at(3, 0, &[]), log_at(5, 0, &[])]), 3);
        assert_eq!(store.ingest_logs(vec![log_at(3, 0, &[])]), 0);

        let logs = store
            .logs_created_after(sig(), CONTRACT, DateTime::from_timestamp(0, 0).unwrap(), Confirmations::UNCONFIRMED)
            .await
            .unwrap();
        let positions: Vec<_> = logs.iter().map(|l| l.position()).collect();
        assert_eq!(positions, vec![(3, 0), (5, 0), (5, 1)]);
    }

    async fn latest_block(store: &InMemoryEventStore, confs: Confirmations) -> Option<u64> {
        store
            .latest_log_by_event_sig_with_confs(sig(), CONTRACT, confs)
            .await
            .unwrap()
            .map(|log| log.block_number)
    }

    #[tokio::test]
    async fn test_confirmations() {
        let store = store_with_head(20, 12);
        store.ingest_logs(vec![log_at(10, 0, &[]), log_at(15, 0, &[]), log_at(20, 0, &[])]);

        assert_eq!(latest_block(&store, Confirmations::UNCONFIRMED).await, Some(20));
        assert_eq!(latest_block(&store, Confirmations::Blocks(5)).await, Some(15));
        assert_eq!(latest_block(&store, Confirmations::Finalized).await, Some(10));
        assert_eq!(latest_block(&store, Confirmations::Blocks(25)).await, None);
    }

    #[tokio::test]
    async fn test_data_word_queries() {
        let store = store_with_head(100, 100);
        // words: [min, max]
        store.ingest_logs(vec![log_at(1, 0, &[1, 10]), log_at(2, 0, &[11, 20])]);
        let confs = Confirmations::Finalized;

        let between = store
            .logs_data_word_between(sig(), CONTRACT, 0, 1, word_from_u64(10), confs)
            .await
            .unwrap();
        assert_eq!(between.len(), 1);
        assert_eq!(between[0].block_number, 1);

        let range = store
            .logs_data_word_range(sig(), CONTRACT, 1, word_from_u64(15), word_from_u64(25), confs)
            .await
            .unwrap();
        assert_eq!(range.len(), 1);
        assert_eq!(range[0].block_number, 2);

        let gt = store
            .logs_data_word_greater_than(sig(), CONTRACT, 0, word_from_u64(1), confs)
            .await
            .unwrap();
        assert_eq!(gt.len(), 2);

        // Missing word never matches
        let none = store
            .logs_data_word_greater_than(sig(), CONTRACT, 5, word_from_u64(0), confs)
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_topic_queries() {
        let store = store_with_head(100, 100);
        store.ingest_logs((1..=5).map(|b| log_at(b, 0, &[])).collect());
        let confs = Confirmations::Finalized;

        let range = store
            .indexed_logs_topic_range(sig(), CONTRACT, 1, word_from_u64(2), word_from_u64(4), confs)
            .await
            .unwrap();
        assert_eq!(range.len(), 3);

        let exact = store
            .indexed_logs(sig(), CONTRACT, 1, &[word_from_u64(1), word_from_u64(5)], confs)
            .await
            .unwrap();
        assert_eq!(exact.len(), 2);

        let after = store
            .indexed_logs_created_after(
                sig(),
                CONTRACT,
                1,
                &[word_from_u64(1), word_from_u64(5)],
                DateTime::from_timestamp(1_001, 0).unwrap(),
                confs,
            )
            .await
            .unwrap();
        assert_eq!(after.len(), 1);
        assert_eq!(after[0].block_number, 5);

        let by_tx = store
            .indexed_logs_by_tx_hash(sig(), CONTRACT, word_from_u64(300))
            .await
            .unwrap();
        assert_eq!(by_tx.len(), 1);
        assert_eq!(by_tx[0].block_number, 3);

        let latest = store
            .latest_block_by_event_sigs_addrs_with_confs(2, &[sig()], &[CONTRACT], confs)
            .await
            .unwrap();
        assert_eq!(latest, 5);
        let none = store
            .latest_block_by_event_sigs_addrs_with_confs(6, &[sig()], &[CONTRACT], confs)
            .await
            .unwrap();
        assert_eq!(none, 0);
    }

    #[tokio::test]
    async fn test_filter_registration() {
        let store = InMemoryEventStore::new();
        let filter = LogFilter::new("a".to_string(), vec![sig()], vec![CONTRACT]);

        store.register_filter(filter.clone()).await.unwrap();
        store.register_filter(filter.clone()).await.unwrap();
        assert!(store.has_filter("a"));

        let conflicting = LogFilter::new("a".to_string(), vec![], vec![CONTRACT]);
        assert_eq!(
            store.register_filter(conflicting).await,
            Err(EventStoreError::FilterConflict("a".to_string()))
        );

        store.unregister_filter("a").await.unwrap();
        store.unregister_filter("a").await.unwrap();
        assert!(!store.has_filter("a"));
    }

    #[tokio::test]
    async fn test_ingest_notifies_registry() {
        let registry = Arc::new(CacheRegistry::new());
        let store = InMemoryEventStore::with_registry(registry.clone());
        let cache = Arc::new(AutoSyncCache::<u64>::new(CONTRACT, vec![sig()]));
        registry.register(cache.clone());

        cache.get(|| async { Ok::<_, String>(9) }).await.unwrap();
        store.ingest_logs(vec![log_at(1, 0, &[])]);
        assert_eq!(cache.cached(), None);
    }

    #[tokio::test]
    async fn test_snapshot_restore() {
        let store = store_with_head(50, 40);
        store.ingest_logs(vec![log_at(1, 0, &[]), log_at(2, 0, &[])]);
        store
            .register_filter(LogFilter::new("a".to_string(), vec![sig()], vec![CONTRACT]))
            .await
            .unwrap();
        store.set_filter_synced_block("a", 50);

        let restored = InMemoryEventStore::from_snapshot(store.snapshot(), None);
        assert_eq!(restored.log_count(), 2);
        assert_eq!(restored.head().finalized, 40);
        assert_eq!(restored.last_synced_block(), 50);
        assert_eq!(restored.filter_synced_block("a"), Some(50));
        assert!(restored.has_filter("a"));
        assert_eq!(restored.ingest_logs(vec![log_at(1, 0, &[])]), 0);
    }

    #[test]
    fn test_finalized_never_moves_back() {
        let store = store_with_head(50, 40);
        store.set_head(ChainHead {
            number: 51,
            finalized: 30,
            timestamp: None,
        });
        assert_eq!(store.head().number, 51);
        assert_eq!(store.head().finalized, 40);
    }

    #[tokio::test]
    async fn test_sync_progress_is_tracked_per_filter() {
        let store = InMemoryEventStore::new();
        let a = LogFilter::new("a".to_string(), vec![sig()], vec![CONTRACT]);
        let b = LogFilter::new("b".to_string(), vec![sig()], vec![Address::repeat_byte(0xc2)]);

        store.register_filter(a).await.unwrap();
        store.set_filter_synced_block("a", 100);
        assert_eq!(store.last_synced_block(), 100);

        // A late filter holds the store back until it catches up
        store.register_filter(b).await.unwrap();
        assert_eq!(store.filter_synced_block("b"), None);
        assert_eq!(store.last_synced_block(), 0);
        store.set_filter_synced_block("b", 100);
        assert_eq!(store.last_synced_block(), 100);

        store.unregister_filter("b").await.unwrap();
        assert_eq!(store.filter_synced_block("b"), None);
        store.set_filter_synced_block("b", 120);
        assert_eq!(store.filter_synced_block("b"), None);
    }
}
