use std::collections::HashMap;
use std::sync::Arc;

use alloy_primitives::{Address, Bytes, U256};
use async_trait::async_trait;
use common::event_cache::Confirmations;
use common::interfaces::offramp_v1_2_0::EVM2EVMOffRampV1_2_0;
use common::interfaces::token_pool::ITokenPoolV1_2_0;

use super::{ExecConfigState, OffRampReaderV1_0_0};
use crate::caller::batch_call_contract;
use crate::codec::{ExecReportCodec, ExecReportCodecV1_2_0};
use crate::config::{
    decode_offchain_config, decode_onchain_config, ExecOffchainConfig, ExecOffchainConfigV1_2_0, ExecOnchainConfig,
    ExecOnchainConfigV1_2_0,
};
use crate::errors::Result;
use crate::factory::ChainContext;
use crate::prices::{DaGasPriceEstimator, ExecGasPriceEstimator};
use crate::rate_limiter::RateLimiterState;
use crate::readers::{OffRampReader, SharedGasPriceEstimator};
use crate::types::{Event, ExecReport, ExecutionStateChanged, MessageExecutionState, OffRampStaticConfig, OffRampTokens};
use crate::version::V1_2_0;

/// Off-ramp 1.2.0: new message layout, per-pool rate limits and a pool gas
/// limit in the dynamic config. Logs and views otherwise match 1.0.0.
pub struct OffRampReaderV1_2_0 {
    inner: OffRampReaderV1_0_0,
}

impl OffRampReaderV1_2_0 {
    pub async fn new(address: Address, ctx: ChainContext) -> Result<Self> {
        Ok(Self {
            inner: OffRampReaderV1_0_0::new(address, ctx).await?,
        })
    }
}

#[async_trait]
impl OffRampReader for OffRampReaderV1_2_0 {
    fn address(&self) -> Address {
        self.inner.address()
    }

    fn version(&self) -> &'static str {
        V1_2_0
    }

    /// Gas prices are capped by the commit store on 1.2.0 lanes, so the
    /// estimator built here neither caps nor checks deviation.
    async fn change_config(&self, onchain_config: &[u8], offchain_config: &[u8]) -> Result<Address> {
        let onchain: ExecOnchainConfigV1_2_0 =
            decode_onchain_config::<EVM2EVMOffRampV1_2_0::DynamicConfig, _>(onchain_config)?;
        let offchain: ExecOffchainConfigV1_2_0 = decode_offchain_config(offchain_config)?;

        let ctx = self.inner.context();
        let estimator = DaGasPriceEstimator::new(
            ExecGasPriceEstimator::new(ctx.fee_quoter.clone(), U256::MAX, 0),
            ctx.da_fee_quoter.clone(),
            0,
        );
        Ok(self.inner.set_config(ExecConfigState {
            offchain: ExecOffchainConfig::from(offchain),
            onchain: onchain.0,
            estimator: Arc::new(estimator),
        }))
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
        let off_ramp = self.address();
        let calls = pools
            .iter()
            .map(|pool| (*pool, ITokenPoolV1_2_0::currentOffRampRateLimiterStateCall { offRamp: off_ramp }))
            .collect();
        let buckets = batch_call_contract(self.inner.context().caller.as_ref(), calls).await?;
        Ok(buckets.into_iter().map(RateLimiterState::from).collect())
    }

    fn encode_execution_report(&self, report: &ExecReport) -> Result<Bytes> {
        ExecReportCodecV1_2_0.encode_execution_report(report)
    }

    fn decode_execution_report(&self, encoded: &[u8]) -> Result<ExecReport> {
        ExecReportCodecV1_2_0.decode_execution_report(encoded)
    }

    async fn close(&self) -> Result<()> {
        self.inner.close().await
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use alloy_sol_types::SolValue;

    use super::*;
    use crate::config::encode_offchain_config;
    use crate::errors::CcipDataError;
    use crate::prices::FixedFeeQuoter;
    use crate::readers::offramp::v1_0_0::tests::{OFF_RAMP, PRICE_REGISTRY};
    use crate::testutils::TestChain;

    fn onchain_config(max_pool_gas: u32) -> Vec<u8> {
        EVM2EVMOffRampV1_2_0::DynamicConfig {
            permissionLessExecutionThresholdSeconds: 3_600,
            router: Address::repeat_byte(0x22),
            priceRegistry: PRICE_REGISTRY,
            maxNumberOfTokensPerMsg: 5,
            maxDataBytes: 30_000,
            maxPoolReleaseOrMintGas: max_pool_gas,
        }
        .abi_encode()
    }

    fn offchain_config() -> Bytes {
        encode_offchain_config(&ExecOffchainConfigV1_2_0 {
            source_finality_depth: 3,
            dest_optimistic_confirmations: 6,
            dest_finality_depth: 3,
            batch_gas_limit: 5_000_000,
            relative_boost_per_wait_hour: 0.07,
            inflight_cache_expiry: Duration::from_secs(64),
            root_snooze_time: Duration::from_secs(128),
            message_visibility_interval: Duration::from_secs(28_800),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_change_config_uncapped_estimator() {
        let chain = TestChain::new();
        let ctx = chain.context().with_fee_quoter(Arc::new(FixedFeeQuoter(U256::from(1_000_000))));
        let reader = OffRampReaderV1_2_0::new(OFF_RAMP, ctx).await.unwrap();

        let err = reader.change_config(&onchain_config(0), &offchain_config()).await.unwrap_err();
        assert_eq!(err, CcipDataError::InvalidConfig("must set MaxPoolReleaseOrMintGas".to_string()));
        assert_eq!(reader.onchain_config().unwrap_err(), CcipDataError::ConfigNotSet);

        let price_registry = reader.change_config(&onchain_config(200_000), &offchain_config()).await.unwrap();
        assert_eq!(price_registry, PRICE_REGISTRY);
        assert_eq!(reader.onchain_config().unwrap().max_pool_release_or_mint_gas, 200_000);
        assert_eq!(
            reader.offchain_config().unwrap().message_visibility_interval,
            Duration::from_secs(28_800)
        );
        let price = reader.gas_price_estimator().unwrap().get_gas_price().await.unwrap();
        assert_eq!(price, U256::from(1_000_000));
    }

    #[tokio::test]
    async fn test_token_pool_rate_limits() {
        let chain = TestChain::new();
        let reader = OffRampReaderV1_2_0::new(OFF_RAMP, chain.context()).await.unwrap();
        let pools = [Address::repeat_byte(0x51), Address::repeat_byte(0x52)];
        for (i, pool) in pools.iter().enumerate() {
            chain.caller.expect(
                *pool,
                ITokenPoolV1_2_0::currentOffRampRateLimiterStateCall { offRamp: OFF_RAMP },
                ITokenPoolV1_2_0::TokenBucket {
                    tokens: 100 * (i as u128 + 1),
                    lastUpdated: 1_700_000_000,
                    isEnabled: true,
                    capacity: 1_000,
                    rate: 1,
                },
            );
        }

        let limits = reader.get_token_pool_rate_limits(&pools).await.unwrap();
        assert_eq!(limits.len(), 2);
        assert_eq!(limits[0].tokens, 100);
        assert_eq!(limits[1].tokens, 200);
        assert!(reader.get_token_pool_rate_limits(&[]).await.unwrap().is_empty());
    }
}
