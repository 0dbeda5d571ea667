use std::collections::HashMap;

use alloy_primitives::{Address, Bytes};
use async_trait::async_trait;
use common::event_cache::Confirmations;

use super::OffRampReaderV1_0_0;
use crate::config::{ExecOffchainConfig, ExecOnchainConfig};
use crate::errors::Result;
use crate::factory::ChainContext;
use crate::rate_limiter::RateLimiterState;
use crate::readers::{OffRampReader, SharedGasPriceEstimator};
use crate::types::{Event, ExecReport, ExecutionStateChanged, MessageExecutionState, OffRampStaticConfig, OffRampTokens};
use crate::version::V1_1_0;

/// 1.1.0 kept the 1.0.0 off-ramp ABI unchanged.
pub struct OffRampReaderV1_1_0 {
    inner: OffRampReaderV1_0_0,
}

impl OffRampReaderV1_1_0 {
    pub async fn new(address: Address, ctx: ChainContext) -> Result<Self> {
        Ok(Self {
            inner: OffRampReaderV1_0_0::new(address, ctx).await?,
        })
    }
}

#[async_trait]
impl OffRampReader for OffRampReaderV1_1_0 {
    fn address(&self) -> Address {
        self.inner.address()
    }

    fn version(&self) -> &'static str {
        V1_1_0
    }

    async fn change_config(&self, onchain_config: &[u8], offchain_config: &[u8]) -> Result<Address> {
        self.inner.change_config(onchain_config, offchain_config).await
    }

    fn offchain_config(&self) -> Result<ExecOffchainConfig> {
        self.inner.offchain_config()
    }

    fn onchain_config(&self) -> Result<ExecOnchainConfig> {
        self.inner.onchain_config()
    }

    fn gas_price_estimator(&self) -> Result<SharedGasPriceEstimator> {
        self.inner.gas_price_estimator()
    }

    async fn get_static_config(&self) -> Result<OffRampStaticConfig> {
        self.inner.get_static_config().await
    }

    async fn current_rate_limiter_state(&self) -> Result<RateLimiterState> {
        self.inner.current_rate_limiter_state().await
    }

    async fn get_execution_state(&self, seq_num: u64) -> Result<MessageExecutionState> {
        self.inner.get_execution_state(seq_num).await
    }

    async fn get_execution_state_changes_between_seq_nums(
        &self,
        min: u64,
        max: u64,
        confs: Confirmations,
    ) -> Result<Vec<Event<ExecutionStateChanged>>> {
        self.inner.get_execution_state_changes_between_seq_nums(min, max, confs).await
    }

    async fn get_sender_nonce(&self, sender: Address) -> Result<u64> {
        self.inner.get_sender_nonce(sender).await
    }

    async fn list_sender_nonces(&self, senders: &[Address]) -> Result<HashMap<Address, u64>> {
        self.inner.list_sender_nonces(senders).await
    }

    async fn get_tokens(&self) -> Result<OffRampTokens> {
        self.inner.get_tokens().await
    }

    async fn get_source_to_dest_tokens_mapping(&self) -> Result<HashMap<Address, Address>> {
        self.inner.get_source_to_dest_tokens_mapping().await
    }

    async fn get_token_pool_rate_limits(&self, pools: &[Address]) -> Result<Vec<RateLimiterState>> {
        self.inner.get_token_pool_rate_limits(pools).await
    }

    fn encode_execution_report(&self, report: &ExecReport) -> Result<Bytes> {
        self.inner.encode_execution_report(report)
    }

    fn decode_execution_report(&self, encoded: &[u8]) -> Result<ExecReport> {
        self.inner.decode_execution_report(encoded)
    }

    async fn close(&self) -> Result<()> {
        self.inner.close().await
    }
}
