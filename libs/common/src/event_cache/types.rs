//! Log and filter types shared by every event store implementation.
//!
//! Logs are kept in their raw form (topics + data words) so that range
//! queries over indexed topics and data words can be answered without
//! knowing the event ABI.

use std::collections::BTreeMap;

use alloy_primitives::{Address, Bytes, B256, U256};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single raw log as stored by an [`EventStore`](super::store::EventStore).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Log {
    /// Emitting contract
    pub address: Address,
    /// Topic 0 is the event signature hash
    pub topics: Vec<B256>,
    /// Non-indexed ABI-encoded payload
    pub data: Bytes,
    pub block_number: u64,
    pub block_hash: B256,
    pub block_timestamp: DateTime<Utc>,
    pub tx_hash: B256,
    pub log_index: u64,
}

impl Log {
    pub fn event_sig(&self) -> Option<B256> {
        self.topics.first().copied()
    }

    pub fn topic(&self, index: usize) -> Option<B256> {
        self.topics.get(index).copied()
    }

    /// Returns the `index`-th 32 byte word of the data section.
    pub fn data_word(&self, index: usize) -> Option<B256> {
        let start = index.checked_mul(32)?;
        self.data
            .get(start..start + 32)
            .map(B256::from_slice)
    }

    /// Ordering key used for every query result.
    pub fn position(&self) -> (u64, u64) {
        (self.block_number, self.log_index)
    }

    /// Uniqueness key: a log is identified by its transaction and index.
    pub fn id(&self) -> (B256, u64) {
        (self.tx_hash, self.log_index)
    }
}

/// Left-pads an integer into the 32 byte word form used in topics and data.
pub fn word_from_u64(value: u64) -> B256 {
    B256::from(U256::from(value).to_be_bytes::<32>())
}

/// Left-pads an address into a topic word.
pub fn word_from_address(address: Address) -> B256 {
    address.into_word()
}

/// Named log filter registered by a reader.
///
/// A log matches when its address is in `addresses` and its signature is in
/// `event_sigs`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LogFilter {
    pub name: String,
    pub event_sigs: Vec<B256>,
    pub addresses: Vec<Address>,
}

impl LogFilter {
    pub fn new(name: String, event_sigs: Vec<B256>, addresses: Vec<Address>) -> Self {
        Self {
            name,
            event_sigs,
            addresses,
        }
    }

    pub fn matches(&self, log: &Log) -> bool {
        self.addresses.contains(&log.address)
            && log
                .event_sig()
                .map(|sig| self.event_sigs.contains(&sig))
                .unwrap_or(false)
    }
}

/// Deterministic filter name derived from a purpose label and an address,
/// so repeated registration of the same filter is idempotent.
pub fn filter_name(label: &str, address: Address) -> String {
    format!("{} - {}", label, address.to_checksum(None))
}

/// Minimum depth a log must have before a query returns it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confirmations {
    /// Only logs at or below the latest finalized block.
    #[default]
    Finalized,
    /// Only logs with at least this many blocks on top of them.
    Blocks(u64),
}

impl Confirmations {
    pub const UNCONFIRMED: Confirmations = Confirmations::Blocks(0);

    /// Highest block number a log may have to satisfy this depth.
    ///
    /// `None` means no block qualifies yet.
    pub fn max_block(&self, head: &ChainHead) -> Option<u64> {
        match self {
            Confirmations::Finalized => Some(head.finalized),
            Confirmations::Blocks(n) => head.number.checked_sub(*n),
        }
    }
}

/// Latest and latest-finalized block as last observed by the store.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChainHead {
    pub number: u64,
    pub finalized: u64,
    pub timestamp: Option<DateTime<Utc>>,
}

/// Serializable contents of an in-memory store, used for persistence
/// across restarts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventSnapshot {
    /// Layout version, checked on load
    pub version: u32,
    pub filters: Vec<LogFilter>,
    pub logs: Vec<Log>,
    pub head: ChainHead,
    /// Highest block fetched per filter name
    #[serde(default)]
    pub synced_blocks: BTreeMap<String, u64>,
}

impl Default for EventSnapshot {
    fn default() -> Self {
        Self {
            version: Self::VERSION,
            filters: Vec::new(),
            logs: Vec::new(),
            head: ChainHead::default(),
            synced_blocks: BTreeMap::new(),
        }
    }
}

impl EventSnapshot {
    pub const VERSION: u32 = 1;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn log_count(&self) -> usize {
        self.logs.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    fn log_with_data(data: Vec<u8>) -> Log {
        Log {
            address: address!("0000000000000000000000000000000000000001"),
            topics: vec![B256::repeat_byte(0xaa), word_from_u64(7)],
            data: data.into(),
            block_number: 10,
            block_hash: B256::ZERO,
            block_timestamp: DateTime::from_timestamp(0, 0).unwrap(),
            tx_hash: B256::repeat_byte(1),
            log_index: 0,
        }
    }

    #[test]
    fn test_data_word_bounds() {
        let mut data = vec![0u8; 64];
        data[63] = 5;
        let log = log_with_data(data);

        assert_eq!(log.data_word(0), Some(B256::ZERO));
        assert_eq!(log.data_word(1), Some(word_from_u64(5)));
        assert_eq!(log.data_word(2), None);
    }

    #[test]
    fn test_topics() {
        let log = log_with_data(vec![]);
        assert_eq!(log.event_sig(), Some(B256::repeat_byte(0xaa)));
        assert_eq!(log.topic(1), Some(word_from_u64(7)));
        assert_eq!(log.topic(2), None);
    }

    #[test]
    fn test_filter_name_is_deterministic() {
        let addr = address!("00000000000000000000000000000000000000ff");
        assert_eq!(filter_name("Commit report accepted", addr), filter_name("Commit report accepted", addr));
        assert!(filter_name("Commit report accepted", addr).starts_with("Commit report accepted - 0x"));
    }

    #[test]
    fn test_confirmations_max_block() {
        let head = ChainHead {
            number: 100,
            finalized: 90,
            timestamp: None,
        };
        assert_eq!(Confirmations::Finalized.max_block(&head), Some(90));
        assert_eq!(Confirmations::Blocks(10).max_block(&head), Some(90));
        assert_eq!(Confirmations::UNCONFIRMED.max_block(&head), Some(100));
        assert_eq!(Confirmations::Blocks(101).max_block(&head), None);
    }

    #[test]
    fn test_filter_matches() {
        let log = log_with_data(vec![]);
        let filter = LogFilter::new("f".to_string(), vec![B256::repeat_byte(0xaa)], vec![log.address]);
        assert!(filter.matches(&log));

        let other = LogFilter::new("g".to_string(), vec![B256::repeat_byte(0xbb)], vec![log.address]);
        assert!(!other.matches(&log));
    }
}
