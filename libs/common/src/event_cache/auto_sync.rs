//! Read-through caches invalidated by on-chain events.
//!
//! An [`AutoSyncCache`] holds one value derived from a contract's state. The
//! value stays valid until a log with one of the configured signatures is
//! emitted by the contract. Whoever ingests logs (the in-memory store does
//! this on every ingest) hands them to a [`CacheRegistry`], which invalidates
//! every matching cache.

use std::future::Future;
use std::sync::Arc;

use alloy_primitives::{Address, B256};
use dashmap::DashMap;
use parking_lot::RwLock;

use super::types::Log;

#[derive(Debug)]
struct Slot<T> {
    value: Option<T>,
    generation: u64,
}

/// Cache for a single value tied to `address` and a set of event signatures.
#[derive(Debug)]
pub struct AutoSyncCache<T> {
    address: Address,
    event_sigs: Vec<B256>,
    slot: RwLock<Slot<T>>,
}

impl<T: Clone + Send + Sync> AutoSyncCache<T> {
    pub fn new(address: Address, event_sigs: Vec<B256>) -> Self {
        Self {
            address,
            event_sigs,
            slot: RwLock::new(Slot {
                value: None,
                generation: 0,
            }),
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn event_sigs(&self) -> &[B256] {
        &self.event_sigs
    }

    /// Returns the cached value, or runs `produce` and caches its result.
    ///
    /// `produce` runs without holding the lock. If the cache was invalidated
    /// while it ran, the result is returned but not stored. When two callers
    /// race to fill an empty slot, the first stored value wins.
    pub async fn get<F, Fut, E>(&self, produce: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let generation = {
            let slot = self.slot.read();
            if let Some(value) = &slot.value {
                return Ok(value.clone());
            }
            slot.generation
        };

        let value = produce().await?;

        let mut slot = self.slot.write();
        if slot.generation != generation {
            tracing::debug!(address = %self.address, "Cache invalidated while producing, not storing");
            return Ok(value);
        }
        match &slot.value {
            Some(existing) => Ok(existing.clone()),
            None => {
                slot.value = Some(value.clone());
                Ok(value)
            }
        }
    }

    pub fn cached(&self) -> Option<T> {
        self.slot.read().value.clone()
    }

    pub fn invalidate(&self) {
        let mut slot = self.slot.write();
        slot.value = None;
        slot.generation += 1;
    }
}

/// Type-erased view of a cache, used by the registry.
pub trait SyncedCache: Send + Sync {
    fn address(&self) -> Address;

    fn invalidate(&self);

    /// Invalidates if `log` was emitted by this cache's contract with one of
    /// its signatures. Returns whether it did.
    fn observe(&self, log: &Log) -> bool;
}

impl<T: Clone + Send + Sync> SyncedCache for AutoSyncCache<T> {
    fn address(&self) -> Address {
        self.address
    }

    fn invalidate(&self) {
        AutoSyncCache::invalidate(self)
    }

    fn observe(&self, log: &Log) -> bool {
        if log.address != self.address {
            return false;
        }
        match log.event_sig() {
            Some(sig) if self.event_sigs.contains(&sig) => {
                AutoSyncCache::invalidate(self);
                true
            }
            _ => false,
        }
    }
}

/// Address-keyed set of caches that are invalidated from observed logs.
#[derive(Default)]
pub struct CacheRegistry {
    caches: DashMap<Address, Vec<Arc<dyn SyncedCache>>>,
}

impl CacheRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, cache: Arc<dyn SyncedCache>) {
        self.caches.entry(cache.address()).or_default().push(cache);
    }

    /// Drops every cache registered for `address`.
    pub fn remove(&self, address: &Address) -> usize {
        self.caches
            .remove(address)
            .map(|(_, caches)| caches.len())
            .unwrap_or(0)
    }

    /// Feeds `logs` to the caches of their emitting contracts. Returns how
    /// many invalidations happened.
    pub fn notify(&self, logs: &[Log]) -> usize {
        let mut invalidated = 0;
        for log in logs {
            if let Some(caches) = self.caches.get(&log.address) {
                for cache in caches.iter() {
                    if cache.observe(log) {
                        invalidated += 1;
                    }
                }
            }
        }
        if invalidated > 0 {
            tracing::debug!(invalidated, "Invalidated caches from new logs");
        }
        invalidated
    }

    pub fn len(&self) -> usize {
        self.caches.iter().map(|entry| entry.value().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl core::fmt::Debug for CacheRegistry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CacheRegistry")
            .field("addresses", &self.caches.len())
            .finish()
    }
}
