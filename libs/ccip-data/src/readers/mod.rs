//! Versioned readers for the four lane contracts.
//!
//! Each contract has one trait and one implementation per supported schema
//! version. Later versions hold the earlier reader and only override what
//! changed on-chain.

pub mod commit_store;
pub mod offramp;
pub mod onramp;
pub mod price_registry;

use std::collections::HashMap;
use std::sync::Arc;

use alloy_primitives::{Address, Bytes, B256};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use common::event_cache::{ChainHead, Confirmations, EventStore, LogFilter};
use common::interfaces::arm::IARM;

pub use commit_store::{CommitStoreReaderV1_0_0, CommitStoreReaderV1_1_0, CommitStoreReaderV1_2_0};
pub use offramp::{OffRampReaderV1_0_0, OffRampReaderV1_1_0, OffRampReaderV1_2_0};
pub use onramp::{OnRampReaderV1_0_0, OnRampReaderV1_1_0, OnRampReaderV1_2_0};
pub use price_registry::{PriceRegistryReaderV1_0_0, PriceRegistryReaderV1_2_0};

use crate::caller::{call_contract, ContractCaller};
use crate::config::{CommitOffchainConfig, ExecOffchainConfig, ExecOnchainConfig};
use crate::errors::Result;
use crate::prices::GasPriceEstimator;
use crate::rate_limiter::RateLimiterState;
use crate::types::{
    CommitStoreReport, CommitStoreStaticConfig, EVM2EVMMessage, Event, ExecReport, ExecutionStateChanged,
    FinalityStatus, GasPriceUpdate, MessageExecutionState, OffRampStaticConfig, OffRampTokens, OnRampDynamicConfig,
    OnRampStaticConfig, TokenPriceUpdate,
};

pub type SharedGasPriceEstimator = Arc<dyn GasPriceEstimator>;

#[async_trait]
pub trait OnRampReader: Send + Sync {
    fn address(&self) -> Address;

    fn version(&self) -> &'static str;

    async fn get_static_config(&self) -> Result<OnRampStaticConfig>;

    async fn get_dynamic_config(&self) -> Result<OnRampDynamicConfig>;

    async fn router_address(&self) -> Result<Address> {
        Ok(self.get_dynamic_config().await?.router)
    }

    async fn source_price_registry_address(&self) -> Result<Address> {
        Ok(self.get_dynamic_config().await?.price_registry)
    }

    /// Messages with `min <= sequence_number <= max`, each with its leaf hash
    /// set. `finalized` restricts the result to finalized logs.
    async fn get_send_requests_between_seq_nums(
        &self,
        min: u64,
        max: u64,
        finalized: bool,
    ) -> Result<Vec<Event<EVM2EVMMessage>>>;

    /// Curse flag of the source chain's ARM. A failed read counts as cursed.
    async fn is_source_cursed(&self) -> bool;

    async fn is_source_chain_healthy(&self) -> bool;

    async fn close(&self) -> Result<()>;
}

#[async_trait]
pub trait CommitStoreReader: Send + Sync {
    fn address(&self) -> Address;

    fn version(&self) -> &'static str;

    /// Decodes and installs new configs, returning the price registry the
    /// commit store reports into. Nothing is replaced if either config is
    /// invalid.
    async fn change_config(&self, onchain_config: &[u8], offchain_config: &[u8]) -> Result<Address>;

    fn offchain_config(&self) -> Result<CommitOffchainConfig>;

    fn gas_price_estimator(&self) -> Result<SharedGasPriceEstimator>;

    async fn get_static_config(&self) -> Result<CommitStoreStaticConfig>;

    async fn get_expected_next_sequence_number(&self) -> Result<u64>;

    async fn get_latest_price_epoch_and_round(&self) -> Result<u64>;

    /// Accepted reports whose interval contains `seq_num`.
    async fn get_commit_reports_matching_seq_num(
        &self,
        seq_num: u64,
        confs: Confirmations,
    ) -> Result<Vec<Event<CommitStoreReport>>>;

    /// Accepted reports emitted at or after `ts`.
    async fn get_accepted_commit_reports_gte_timestamp(
        &self,
        ts: DateTime<Utc>,
        confs: Confirmations,
    ) -> Result<Vec<Event<CommitStoreReport>>>;

    /// Paused or cursed. A failed read counts as down.
    async fn is_down(&self) -> bool;

    /// Curse flag of the destination chain's ARM. A failed read counts as
    /// cursed.
    async fn is_cursed(&self) -> bool;

    async fn is_blessed(&self, root: B256) -> Result<bool>;

    /// Asks the commit store whether the report's messages are included in a
    /// committed root. Any failure means "not verified".
    async fn verify_execution_report(&self, report: &ExecReport) -> bool;

    fn encode_commit_report(&self, report: &CommitStoreReport) -> Result<Bytes>;

    fn decode_commit_report(&self, encoded: &[u8]) -> Result<CommitStoreReport>;

    async fn close(&self) -> Result<()>;
}

#[async_trait]
pub trait OffRampReader: Send + Sync {
    fn address(&self) -> Address;

    fn version(&self) -> &'static str;

    /// Decodes and installs new configs, returning the destination price
    /// registry.
    async fn change_config(&self, onchain_config: &[u8], offchain_config: &[u8]) -> Result<Address>;

    fn offchain_config(&self) -> Result<ExecOffchainConfig>;

    fn onchain_config(&self) -> Result<ExecOnchainConfig>;

    fn gas_price_estimator(&self) -> Result<SharedGasPriceEstimator>;

    async fn get_static_config(&self) -> Result<OffRampStaticConfig>;

    async fn current_rate_limiter_state(&self) -> Result<RateLimiterState>;

    async fn get_execution_state(&self, seq_num: u64) -> Result<MessageExecutionState>;

    async fn get_execution_state_changes_between_seq_nums(
        &self,
        min: u64,
        max: u64,
        confs: Confirmations,
    ) -> Result<Vec<Event<ExecutionStateChanged>>>;

    async fn get_sender_nonce(&self, sender: Address) -> Result<u64>;

    async fn list_sender_nonces(&self, senders: &[Address]) -> Result<HashMap<Address, u64>>;

    async fn get_tokens(&self) -> Result<OffRampTokens>;

    async fn get_source_to_dest_tokens_mapping(&self) -> Result<HashMap<Address, Address>>;

    /// Rate limiter of each pool for this off-ramp, in input order.
    async fn get_token_pool_rate_limits(&self, pools: &[Address]) -> Result<Vec<RateLimiterState>>;

    fn encode_execution_report(&self, report: &ExecReport) -> Result<Bytes>;

    fn decode_execution_report(&self, encoded: &[u8]) -> Result<ExecReport>;

    async fn close(&self) -> Result<()>;
}

#[async_trait]
pub trait PriceRegistryReader: Send + Sync {
    fn address(&self) -> Address;

    fn version(&self) -> &'static str;

    async fn get_fee_tokens(&self) -> Result<Vec<Address>>;

    /// Latest on-chain price of each token, in input order.
    async fn get_token_prices(&self, tokens: &[Address]) -> Result<Vec<TokenPriceUpdate>>;

    async fn get_token_price_updates_created_after(
        &self,
        ts: DateTime<Utc>,
        confs: Confirmations,
    ) -> Result<Vec<Event<TokenPriceUpdate>>>;

    async fn get_gas_price_updates_created_after(
        &self,
        dest_chain_selector: u64,
        ts: DateTime<Utc>,
        confs: Confirmations,
    ) -> Result<Vec<Event<GasPriceUpdate>>>;

    /// Gas price updates for every destination chain.
    async fn get_all_gas_price_updates_created_after(
        &self,
        ts: DateTime<Utc>,
        confs: Confirmations,
    ) -> Result<Vec<Event<GasPriceUpdate>>>;

    async fn get_tokens_decimals(&self, tokens: &[Address]) -> Result<Vec<u8>>;

    async fn close(&self) -> Result<()>;
}

pub(crate) async fn register_filters(store: &dyn EventStore, filters: &[LogFilter]) -> Result<()> {
    for filter in filters {
        store.register_filter(filter.clone()).await?;
    }
    Ok(())
}

/// Unregisters `filters` and drops every cache kept for `address`.
pub(crate) async fn release(
    store: &dyn EventStore,
    registry: &common::event_cache::CacheRegistry,
    address: Address,
    filters: &[LogFilter],
) -> Result<()> {
    for filter in filters {
        store.unregister_filter(&filter.name).await?;
    }
    let caches = registry.remove(&address);
    tracing::debug!(%address, filters = filters.len(), caches, "Released reader");
    Ok(())
}

pub(crate) fn finality(block_number: u64, head: &ChainHead) -> FinalityStatus {
    if block_number <= head.finalized {
        FinalityStatus::Finalized
    } else {
        FinalityStatus::NotFinalized
    }
}

pub(crate) fn logs_confirmations(finalized: bool) -> Confirmations {
    if finalized {
        Confirmations::Finalized
    } else {
        Confirmations::UNCONFIRMED
    }
}

/// Store time queries are strict, so "at or after `ts`" starts just before it.
pub(crate) fn at_or_after(ts: DateTime<Utc>) -> DateTime<Utc> {
    ts - Duration::nanoseconds(1)
}

pub(crate) async fn is_arm_cursed(caller: &dyn ContractCaller, arm_proxy: Address) -> bool {
    match call_contract(caller, arm_proxy, &IARM::isCursedCall {}).await {
        Ok(cursed) => cursed,
        Err(e) => {
            tracing::error!(%arm_proxy, error = %e, "Unable to read ARM curse status, assuming cursed");
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finality() {
        let head = ChainHead {
            number: 20,
            finalized: 10,
            timestamp: None,
        };
        assert_eq!(finality(10, &head), FinalityStatus::Finalized);
        assert_eq!(finality(11, &head), FinalityStatus::NotFinalized);
    }

    #[test]
    fn test_at_or_after_is_just_before() {
        let ts = DateTime::from_timestamp(100, 0).unwrap();
        assert!(at_or_after(ts) < ts);
        assert!(at_or_after(ts) > DateTime::from_timestamp(99, 999_999_998).unwrap());
    }

    #[tokio::test]
    async fn test_arm_read_failure_counts_as_cursed() {
        let caller = crate::testutils::MockCaller::new();
        let arm = Address::repeat_byte(0xa1);
        assert!(is_arm_cursed(&caller, arm).await);

        caller.expect(arm, IARM::isCursedCall {}, false);
        assert!(!is_arm_cursed(&caller, arm).await);
    }
}
