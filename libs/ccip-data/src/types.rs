//! Version-independent domain types.
//!
//! Readers and codecs translate every schema version into these shapes, so
//! callers never see the per-version binding structs.

use std::collections::HashMap;

use alloy_primitives::{Address, Bytes, B256, U256};
use chrono::{DateTime, Utc};
use common::event_cache::Log;
use serde::{Deserialize, Serialize};

/// Closed range of sequence numbers covered by a commit report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interval {
    pub min: u64,
    pub max: u64,
}

impl Interval {
    pub fn new(min: u64, max: u64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, seq_num: u64) -> bool {
        self.min <= seq_num && seq_num <= self.max
    }
}

impl core::fmt::Display for Interval {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "[{}, {}]", self.min, self.max)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPrice {
    pub token: Address,
    pub value: U256,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GasPrice {
    pub dest_chain_selector: u64,
    pub value: U256,
}

/// A committed batch: merkle root over the messages in `interval` plus the
/// price updates that travelled with it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitStoreReport {
    pub token_prices: Vec<TokenPrice>,
    pub gas_prices: Vec<GasPrice>,
    pub interval: Interval,
    pub merkle_root: B256,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenAmount {
    pub token: Address,
    pub amount: U256,
}

/// A message as emitted by an on-ramp, normalized across versions.
///
/// `source_token_data` is always empty for messages from 1.0.0/1.1.0
/// on-ramps. `hash` is the leaf hash, filled in by the reader.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EVM2EVMMessage {
    pub source_chain_selector: u64,
    pub sequence_number: u64,
    pub fee_token_amount: U256,
    pub sender: Address,
    pub nonce: u64,
    pub gas_limit: U256,
    pub strict: bool,
    pub receiver: Address,
    pub data: Bytes,
    pub token_amounts: Vec<TokenAmount>,
    pub source_token_data: Vec<Bytes>,
    pub fee_token: Address,
    pub message_id: B256,
    pub hash: B256,
}

/// Everything needed to execute a batch of messages against a committed root.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ExecReport {
    pub messages: Vec<EVM2EVMMessage>,
    pub offchain_token_data: Vec<Vec<Bytes>>,
    pub proofs: Vec<B256>,
    pub proof_flag_bits: U256,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FinalityStatus {
    #[default]
    Unknown,
    Finalized,
    NotFinalized,
}

/// Where and when a decoded event was emitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxMeta {
    pub block_timestamp: DateTime<Utc>,
    pub block_number: u64,
    pub tx_hash: B256,
    pub log_index: u64,
    pub finality: FinalityStatus,
}

impl TxMeta {
    pub fn from_log(log: &Log) -> Self {
        Self {
            block_timestamp: log.block_timestamp,
            block_number: log.block_number,
            tx_hash: log.tx_hash,
            log_index: log.log_index,
            finality: FinalityStatus::Unknown,
        }
    }
}

/// Decoded event payload together with its log metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event<T> {
    pub data: T,
    pub meta: TxMeta,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageExecutionState {
    Untouched = 0,
    InProgress = 1,
    Success = 2,
    Failure = 3,
}

impl TryFrom<u8> for MessageExecutionState {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(MessageExecutionState::Untouched),
            1 => Ok(MessageExecutionState::InProgress),
            2 => Ok(MessageExecutionState::Success),
            3 => Ok(MessageExecutionState::Failure),
            other => Err(other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionStateChanged {
    pub sequence_number: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPriceUpdate {
    pub token_price: TokenPrice,
    pub timestamp_unix_sec: U256,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GasPriceUpdate {
    pub gas_price: GasPrice,
    pub timestamp_unix_sec: U256,
}

/// Tokens an off-ramp can release, and the pool serving each of them.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OffRampTokens {
    pub destination_tokens: Vec<Address>,
    pub source_tokens: Vec<Address>,
    pub destination_pool: HashMap<Address, Address>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitStoreStaticConfig {
    pub chain_selector: u64,
    pub source_chain_selector: u64,
    pub on_ramp: Address,
    pub arm_proxy: Address,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnRampStaticConfig {
    pub link_token: Address,
    pub chain_selector: u64,
    pub dest_chain_selector: u64,
    pub default_tx_gas_limit: u64,
    pub max_nop_fees_juels: u128,
    pub prev_on_ramp: Address,
    pub arm_proxy: Address,
}

/// On-ramp dynamic config. Fields a given version does not have are zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OnRampDynamicConfig {
    pub router: Address,
    pub max_number_of_tokens_per_msg: u16,
    pub dest_gas_overhead: u32,
    pub dest_gas_per_payload_byte: u16,
    pub dest_data_availability_overhead_gas: u32,
    pub dest_gas_per_data_availability_byte: u16,
    pub dest_data_availability_multiplier_bps: u16,
    pub price_registry: Address,
    pub max_data_bytes: u32,
    pub max_per_msg_gas_limit: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OffRampStaticConfig {
    pub commit_store: Address,
    pub chain_selector: u64,
    pub source_chain_selector: u64,
    pub on_ramp: Address,
    pub prev_off_ramp: Address,
    pub arm_proxy: Address,
}
