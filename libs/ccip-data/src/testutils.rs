//! Test doubles shared by reader tests.

use std::collections::HashMap;
use std::sync::Arc;

use alloy_primitives::{Address, Bytes, B256};
use alloy_sol_types::{SolCall, SolEvent, SolValue};
use async_trait::async_trait;
use chrono::DateTime;
use common::event_cache::{CacheRegistry, ChainHead, InMemoryEventStore, Log};
use parking_lot::Mutex;

use crate::caller::{CallError, ContractCaller};
use crate::factory::ChainContext;

#[derive(Debug, Clone)]
enum Response {
    Return(Bytes),
    Revert,
}

/// Contract caller answering from a table keyed by `(to, calldata)`.
/// Unknown calls fail with a transport error.
#[derive(Debug, Default)]
pub(crate) struct MockCaller {
    responses: Mutex<HashMap<(Address, Bytes), Response>>,
    calls: Mutex<HashMap<(Address, Bytes), usize>>,
}

impl MockCaller {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answers `call` on `to` with `ret`, ABI-encoded as the function's
    /// single return value.
    pub fn expect<C: SolCall, V: SolValue>(&self, to: Address, call: C, ret: V) {
        self.responses
            .lock()
            .insert((to, call.abi_encode().into()), Response::Return(ret.abi_encode().into()));
    }

    pub fn expect_revert<C: SolCall>(&self, to: Address, call: C) {
        self.responses
            .lock()
            .insert((to, call.abi_encode().into()), Response::Revert);
    }

    pub fn call_count<C: SolCall>(&self, to: Address, call: C) -> usize {
        self.calls
            .lock()
            .get(&(to, Bytes::from(call.abi_encode())))
            .copied()
            .unwrap_or(0)
    }
}

#[async_trait]
impl ContractCaller for MockCaller {
    async fn call(&self, to: Address, calldata: Bytes) -> Result<Bytes, CallError> {
        let key = (to, calldata);
        *self.calls.lock().entry(key.clone()).or_default() += 1;
        match self.responses.lock().get(&key) {
            Some(Response::Return(data)) => Ok(data.clone()),
            Some(Response::Revert) => Err(CallError::Reverted("execution reverted".to_string())),
            None => Err(CallError::Transport(format!("no mock for call to {}", to))),
        }
    }
}

pub(crate) struct TestChain {
    pub caller: Arc<MockCaller>,
    pub store: Arc<InMemoryEventStore>,
    pub registry: Arc<CacheRegistry>,
}

impl TestChain {
    pub fn new() -> Self {
        Self::with_head(1_000, 1_000)
    }

    /// Fresh chain whose head is `number` with `finalized` as the finalized
    /// block.
    pub fn with_head(number: u64, finalized: u64) -> Self {
        let registry = Arc::new(CacheRegistry::new());
        let store = Arc::new(InMemoryEventStore::with_registry(registry.clone()));
        store.set_head(ChainHead {
            number,
            finalized,
            timestamp: None,
        });
        Self {
            caller: Arc::new(MockCaller::new()),
            store,
            registry,
        }
    }

    pub fn context(&self) -> ChainContext {
        ChainContext::new(self.caller.clone(), self.store.clone(), self.registry.clone())
    }
}

/// Builds a stored log for `event` emitted by `address`.
pub(crate) fn event_log<E: SolEvent>(address: Address, event: &E, block_number: u64, log_index: u64) -> Log {
    let data = event.encode_log_data();
    Log {
        address,
        topics: data.topics().to_vec(),
        data: data.data.clone(),
        block_number,
        block_hash: B256::with_last_byte(block_number as u8),
        block_timestamp: DateTime::from_timestamp(1_700_000_000 + block_number as i64, 0).unwrap(),
        tx_hash: B256::from(alloy_primitives::U256::from(block_number * 1_000 + log_index).to_be_bytes::<32>()),
        log_index,
    }
}
