use std::collections::HashMap;
use std::sync::Arc;

use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::SolEvent;
use async_trait::async_trait;
use common::event_cache::{filter_name, word_from_u64, AutoSyncCache, Confirmations, LogFilter};
use common::interfaces::offramp_v1_0_0::EVM2EVMOffRampV1_0_0;
use parking_lot::RwLock;
use tokio::sync::OnceCell;

use super::{
    ExecConfigState, EXECUTION_STATE_SEQ_NUM_TOPIC, EXEC_EXECUTION_STATE_CHANGES, TOKEN_POOL_ADDED, TOKEN_POOL_REMOVED,
};
use crate::caller::{batch_call_contract, call_contract};
use crate::codec::{ExecReportCodec, ExecReportCodecV1_0_0};
use crate::config::{
    decode_offchain_config, decode_onchain_config, ExecOffchainConfig, ExecOffchainConfigV1_0_0, ExecOnchainConfig,
};
use crate::errors::{CcipDataError, Result};
use crate::factory::ChainContext;
use crate::logs::{decode_event, parse_logs};
use crate::prices::ExecGasPriceEstimator;
use crate::rate_limiter::RateLimiterState;
use crate::readers::{finality, register_filters, release, OffRampReader, SharedGasPriceEstimator};
use crate::types::{
    Event, ExecReport, ExecutionStateChanged, MessageExecutionState, OffRampStaticConfig, OffRampTokens,
};
use crate::version::V1_0_0;

pub fn filters(address: Address) -> Vec<LogFilter> {
    vec![
        LogFilter::new(
            filter_name(EXEC_EXECUTION_STATE_CHANGES, address),
            vec![EVM2EVMOffRampV1_0_0::ExecutionStateChanged::SIGNATURE_HASH],
            vec![address],
        ),
        LogFilter::new(
            filter_name(TOKEN_POOL_ADDED, address),
            vec![EVM2EVMOffRampV1_0_0::PoolAdded::SIGNATURE_HASH],
            vec![address],
        ),
        LogFilter::new(
            filter_name(TOKEN_POOL_REMOVED, address),
            vec![EVM2EVMOffRampV1_0_0::PoolRemoved::SIGNATURE_HASH],
            vec![address],
        ),
    ]
}

/// Off-ramp 1.0.0.
///
/// The token list is cached until a pool is added or removed. Plugin
/// configs are swapped whole by `change_config`.
pub struct OffRampReaderV1_0_0 {
    address: Address,
    ctx: ChainContext,
    filters: Vec<LogFilter>,
    static_config: OnceCell<OffRampStaticConfig>,
    config: RwLock<Option<ExecConfigState>>,
    tokens: Arc<AutoSyncCache<OffRampTokens>>,
}

impl OffRampReaderV1_0_0 {
    pub async fn new(address: Address, ctx: ChainContext) -> Result<Self> {
        let filters = filters(address);
        register_filters(ctx.store.as_ref(), &filters).await?;
        let tokens = Arc::new(AutoSyncCache::new(
            address,
            vec![
                EVM2EVMOffRampV1_0_0::PoolAdded::SIGNATURE_HASH,
                EVM2EVMOffRampV1_0_0::PoolRemoved::SIGNATURE_HASH,
            ],
        ));
        ctx.registry.register(tokens.clone());
        Ok(Self {
            address,
            ctx,
            filters,
            static_config: OnceCell::new(),
            config: RwLock::new(None),
            tokens,
        })
    }

    pub(crate) fn context(&self) -> &ChainContext {
        &self.ctx
    }

    pub(crate) fn set_config(&self, state: ExecConfigState) -> Address {
        let price_registry = state.onchain.price_registry;
        tracing::info!(
            address = %self.address,
            %price_registry,
            router = %state.onchain.router,
            batch_gas_limit = state.offchain.batch_gas_limit,
            "Off-ramp config changed"
        );
        *self.config.write() = Some(state);
        price_registry
    }

    fn config_state(&self) -> Result<ExecConfigState> {
        self.config.read().clone().ok_or(CcipDataError::ConfigNotSet)
    }

    async fn fetch_tokens(&self) -> Result<OffRampTokens> {
        let caller = self.ctx.caller.as_ref();
        let source_tokens = call_contract(caller, self.address, &EVM2EVMOffRampV1_0_0::getSupportedTokensCall {}).await?;
        let destination_tokens =
            call_contract(caller, self.address, &EVM2EVMOffRampV1_0_0::getDestinationTokensCall {}).await?;

        let calls = destination_tokens
            .iter()
            .map(|token| {
                (
                    self.address,
                    EVM2EVMOffRampV1_0_0::getPoolByDestTokenCall { destToken: *token },
                )
            })
            .collect();
        let pools = batch_call_contract(caller, calls).await?;

        tracing::debug!(address = %self.address, tokens = destination_tokens.len(), "Fetched off-ramp tokens");
        Ok(OffRampTokens {
            destination_pool: destination_tokens.iter().copied().zip(pools).collect(),
            destination_tokens,
            source_tokens,
        })
    }
}

#[async_trait]
impl OffRampReader for OffRampReaderV1_0_0 {
    fn address(&self) -> Address {
        self.address
    }

    fn version(&self) -> &'static str {
        V1_0_0
    }

    async fn change_config(&self, onchain_config: &[u8], offchain_config: &[u8]) -> Result<Address> {
        let onchain: ExecOnchainConfig =
            decode_onchain_config::<EVM2EVMOffRampV1_0_0::DynamicConfig, _>(onchain_config)?;
        let offchain: ExecOffchainConfigV1_0_0 = decode_offchain_config(offchain_config)?;

        let estimator = ExecGasPriceEstimator::new(self.ctx.fee_quoter.clone(), U256::from(offchain.max_gas_price), 0);
        Ok(self.set_config(ExecConfigState {
            offchain: ExecOffchainConfig::from(offchain),
            onchain,
            estimator: Arc::new(estimator),
        }))
    }

    fn offchain_config(&self) -> Result<ExecOffchainConfig> {
        Ok(self.config_state()?.offchain)
    }

    fn onchain_config(&self) -> Result<ExecOnchainConfig> {
        Ok(self.config_state()?.onchain)
    }

    fn gas_price_estimator(&self) -> Result<SharedGasPriceEstimator> {
        Ok(self.config_state()?.estimator)
    }

    async fn get_static_config(&self) -> Result<OffRampStaticConfig> {
        self.static_config
            .get_or_try_init(|| async {
                let config =
                    call_contract(self.ctx.caller.as_ref(), self.address, &EVM2EVMOffRampV1_0_0::getStaticConfigCall {})
                        .await?;
                Ok::<_, CcipDataError>(OffRampStaticConfig {
                    commit_store: config.commitStore,
                    chain_selector: config.chainSelector,
                    source_chain_selector: config.sourceChainSelector,
                    on_ramp: config.onRamp,
                    prev_off_ramp: config.prevOffRamp,
                    arm_proxy: config.armProxy,
                })
            })
            .await
            .copied()
    }

    async fn current_rate_limiter_state(&self) -> Result<RateLimiterState> {
        let bucket = call_contract(
            self.ctx.caller.as_ref(),
            self.address,
            &EVM2EVMOffRampV1_0_0::currentRateLimiterStateCall {},
        )
        .await?;
        Ok(RateLimiterState::from(bucket))
    }

    async fn get_execution_state(&self, seq_num: u64) -> Result<MessageExecutionState> {
        let state = call_contract(
            self.ctx.caller.as_ref(),
            self.address,
            &EVM2EVMOffRampV1_0_0::getExecutionStateCall {
                sequenceNumber: seq_num,
            },
        )
        .await?;
        MessageExecutionState::try_from(state)
            .map_err(|v| CcipDataError::Abi(format!("unknown execution state {} for seq num {}", v, seq_num)))
    }

    async fn get_execution_state_changes_between_seq_nums(
        &self,
        min: u64,
        max: u64,
        confs: Confirmations,
    ) -> Result<Vec<Event<ExecutionStateChanged>>> {
        let head = self.ctx.store.latest_block().await?;
        let logs = self
            .ctx
            .store
            .indexed_logs_topic_range(
                EVM2EVMOffRampV1_0_0::ExecutionStateChanged::SIGNATURE_HASH,
                self.address,
                EXECUTION_STATE_SEQ_NUM_TOPIC,
                word_from_u64(min),
                word_from_u64(max),
                confs,
            )
            .await?;

        Ok(parse_logs(&logs, |log| {
            let event = decode_event::<EVM2EVMOffRampV1_0_0::ExecutionStateChanged>(log)?;
            Ok(ExecutionStateChanged {
                sequence_number: event.sequenceNumber,
            })
        })?
        .into_iter()
        .map(|mut event| {
            event.meta.finality = finality(event.meta.block_number, &head);
            event
        })
        .collect())
    }

    async fn get_sender_nonce(&self, sender: Address) -> Result<u64> {
        call_contract(
            self.ctx.caller.as_ref(),
            self.address,
            &EVM2EVMOffRampV1_0_0::getSenderNonceCall { sender },
        )
        .await
    }

    async fn list_sender_nonces(&self, senders: &[Address]) -> Result<HashMap<Address, u64>> {
        let calls = senders
            .iter()
            .map(|sender| (self.address, EVM2EVMOffRampV1_0_0::getSenderNonceCall { sender: *sender }))
            .collect();
        let nonces = batch_call_contract(self.ctx.caller.as_ref(), calls).await?;
        Ok(senders.iter().copied().zip(nonces).collect())
    }

    async fn get_tokens(&self) -> Result<OffRampTokens> {
        self.tokens.get(|| self.fetch_tokens()).await
    }

    async fn get_source_to_dest_tokens_mapping(&self) -> Result<HashMap<Address, Address>> {
        let caller = self.ctx.caller.as_ref();
        let source_tokens = call_contract(caller, self.address, &EVM2EVMOffRampV1_0_0::getSupportedTokensCall {}).await?;
        let calls = source_tokens
            .iter()
            .map(|token| {
                (
                    self.address,
                    EVM2EVMOffRampV1_0_0::getDestinationTokenCall { sourceToken: *token },
                )
            })
            .collect();
        let destination_tokens = batch_call_contract(caller, calls).await?;
        Ok(source_tokens.into_iter().zip(destination_tokens).collect())
    }

    async fn get_token_pool_rate_limits(&self, _pools: &[Address]) -> Result<Vec<RateLimiterState>> {
        Ok(Vec::new())
    }

    fn encode_execution_report(&self, report: &ExecReport) -> Result<Bytes> {
        ExecReportCodecV1_0_0.encode_execution_report(report)
    }

    fn decode_execution_report(&self, encoded: &[u8]) -> Result<ExecReport> {
        ExecReportCodecV1_0_0.decode_execution_report(encoded)
    }

    async fn close(&self) -> Result<()> {
        release(self.ctx.store.as_ref(), &self.ctx.registry, self.address, &self.filters).await
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::time::Duration;

    use alloy_primitives::B256;
    use alloy_sol_types::SolValue;
    use common::event_cache::EventStore;

    use super::*;
    use crate::config::encode_offchain_config;
    use crate::prices::FixedFeeQuoter;
    use crate::testutils::{event_log, TestChain};
    use crate::types::FinalityStatus;

    pub const OFF_RAMP: Address = Address::repeat_byte(0x0f);
    pub const PRICE_REGISTRY: Address = Address::repeat_byte(0x42);

    fn onchain_config(price_registry: Address) -> Bytes {
        EVM2EVMOffRampV1_0_0::DynamicConfig {
            permissionLessExecutionThresholdSeconds: 3_600,
            router: Address::repeat_byte(0x22),
            priceRegistry: price_registry,
            maxTokensLength: 5,
            maxDataSize: 30_000,
        }
        .abi_encode()
        .into()
    }

    fn offchain_config(max_gas_price: u64) -> Bytes {
        encode_offchain_config(&ExecOffchainConfigV1_0_0 {
            source_finality_depth: 3,
            dest_optimistic_confirmations: 6,
            dest_finality_depth: 3,
            batch_gas_limit: 5_000_000,
            relative_boost_per_wait_hour: 0.07,
            max_gas_price,
            inflight_cache_expiry: Duration::from_secs(64),
            root_snooze_time: Duration::from_secs(128),
        })
        .unwrap()
    }

    pub fn state_changed(seq_num: u64) -> EVM2EVMOffRampV1_0_0::ExecutionStateChanged {
        EVM2EVMOffRampV1_0_0::ExecutionStateChanged {
            sequenceNumber: seq_num,
            messageId: B256::with_last_byte(seq_num as u8),
            state: 2,
            returnData: Bytes::new(),
        }
    }

    #[tokio::test]
    async fn test_change_config() {
        let chain = TestChain::new();
        let ctx = chain.context().with_fee_quoter(Arc::new(FixedFeeQuoter(U256::from(500))));
        let reader = OffRampReaderV1_0_0::new(OFF_RAMP, ctx).await.unwrap();
        assert_eq!(reader.offchain_config().unwrap_err(), CcipDataError::ConfigNotSet);

        let price_registry = reader
            .change_config(&onchain_config(PRICE_REGISTRY), &offchain_config(100))
            .await
            .unwrap();
        assert_eq!(price_registry, PRICE_REGISTRY);
        assert_eq!(reader.onchain_config().unwrap().max_data_bytes, 30_000);
        assert_eq!(reader.offchain_config().unwrap().root_snooze_time, Duration::from_secs(128));
        let price = reader.gas_price_estimator().unwrap().get_gas_price().await.unwrap();
        assert_eq!(price, U256::from(100));

        let err = reader
            .change_config(&onchain_config(Address::ZERO), &offchain_config(200))
            .await
            .unwrap_err();
        assert_eq!(err, CcipDataError::InvalidConfig("must set PriceRegistry".to_string()));
        assert_eq!(reader.onchain_config().unwrap().price_registry, PRICE_REGISTRY);
    }

    #[tokio::test]
    async fn test_tokens_cached_until_pool_change() {
        let chain = TestChain::new();
        let reader = OffRampReaderV1_0_0::new(OFF_RAMP, chain.context()).await.unwrap();
        let (source, dest, pool) = (Address::repeat_byte(1), Address::repeat_byte(2), Address::repeat_byte(3));
        chain
            .caller
            .expect(OFF_RAMP, EVM2EVMOffRampV1_0_0::getSupportedTokensCall {}, vec![source]);
        chain
            .caller
            .expect(OFF_RAMP, EVM2EVMOffRampV1_0_0::getDestinationTokensCall {}, vec![dest]);
        chain
            .caller
            .expect(OFF_RAMP, EVM2EVMOffRampV1_0_0::getPoolByDestTokenCall { destToken: dest }, pool);

        let tokens = reader.get_tokens().await.unwrap();
        assert_eq!(tokens.source_tokens, vec![source]);
        assert_eq!(tokens.destination_tokens, vec![dest]);
        assert_eq!(tokens.destination_pool.get(&dest), Some(&pool));
        reader.get_tokens().await.unwrap();
        assert_eq!(
            chain.caller.call_count(OFF_RAMP, EVM2EVMOffRampV1_0_0::getDestinationTokensCall {}),
            1
        );

        let added = EVM2EVMOffRampV1_0_0::PoolAdded {
            token: Address::repeat_byte(4),
            pool: Address::repeat_byte(5),
        };
        chain.store.ingest_logs(vec![event_log(OFF_RAMP, &added, 40, 0)]);
        reader.get_tokens().await.unwrap();
        assert_eq!(
            chain.caller.call_count(OFF_RAMP, EVM2EVMOffRampV1_0_0::getDestinationTokensCall {}),
            2
        );
    }

    #[tokio::test]
    async fn test_source_to_dest_mapping_and_nonces() {
        let chain = TestChain::new();
        let reader = OffRampReaderV1_0_0::new(OFF_RAMP, chain.context()).await.unwrap();
        let (a, b) = (Address::repeat_byte(1), Address::repeat_byte(2));
        chain
            .caller
            .expect(OFF_RAMP, EVM2EVMOffRampV1_0_0::getSupportedTokensCall {}, vec![a, b]);
        chain.caller.expect(
            OFF_RAMP,
            EVM2EVMOffRampV1_0_0::getDestinationTokenCall { sourceToken: a },
            Address::repeat_byte(0xaa),
        );
        chain.caller.expect(
            OFF_RAMP,
            EVM2EVMOffRampV1_0_0::getDestinationTokenCall { sourceToken: b },
            Address::repeat_byte(0xbb),
        );

        let mapping = reader.get_source_to_dest_tokens_mapping().await.unwrap();
        assert_eq!(mapping.len(), 2);
        assert_eq!(mapping[&b], Address::repeat_byte(0xbb));

        chain
            .caller
            .expect(OFF_RAMP, EVM2EVMOffRampV1_0_0::getSenderNonceCall { sender: a }, 7u64);
        chain
            .caller
            .expect(OFF_RAMP, EVM2EVMOffRampV1_0_0::getSenderNonceCall { sender: b }, 9u64);
        let nonces = reader.list_sender_nonces(&[a, b]).await.unwrap();
        assert_eq!(nonces[&a], 7);
        assert_eq!(nonces[&b], 9);
        assert!(reader.list_sender_nonces(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_execution_state_changes_between_seq_nums() {
        let chain = TestChain::with_head(20, 10);
        chain.store.ingest_logs(vec![
            event_log(OFF_RAMP, &state_changed(4), 9, 0),
            event_log(OFF_RAMP, &state_changed(5), 10, 0),
            event_log(OFF_RAMP, &state_changed(6), 12, 0),
        ]);
        let reader = OffRampReaderV1_0_0::new(OFF_RAMP, chain.context()).await.unwrap();

        let changes = reader
            .get_execution_state_changes_between_seq_nums(5, 6, Confirmations::UNCONFIRMED)
            .await
            .unwrap();
        let seq_nums: Vec<u64> = changes.iter().map(|e| e.data.sequence_number).collect();
        assert_eq!(seq_nums, vec![5, 6]);
        assert_eq!(changes[0].meta.finality, FinalityStatus::Finalized);
        assert_eq!(changes[1].meta.finality, FinalityStatus::NotFinalized);
    }

    #[tokio::test]
    async fn test_execution_state() {
        let chain = TestChain::new();
        let reader = OffRampReaderV1_0_0::new(OFF_RAMP, chain.context()).await.unwrap();
        chain.caller.expect(
            OFF_RAMP,
            EVM2EVMOffRampV1_0_0::getExecutionStateCall { sequenceNumber: 1 },
            2u16,
        );
        chain.caller.expect(
            OFF_RAMP,
            EVM2EVMOffRampV1_0_0::getExecutionStateCall { sequenceNumber: 2 },
            9u16,
        );
        assert_eq!(reader.get_execution_state(1).await.unwrap(), MessageExecutionState::Success);
        assert!(reader.get_execution_state(2).await.is_err());
    }

    #[tokio::test]
    async fn test_token_pool_rate_limits_unsupported() {
        let chain = TestChain::new();
        let reader = OffRampReaderV1_0_0::new(OFF_RAMP, chain.context()).await.unwrap();
        let limits = reader.get_token_pool_rate_limits(&[Address::repeat_byte(3)]).await.unwrap();
        assert!(limits.is_empty());
    }

    #[tokio::test]
    async fn test_close() {
        let chain = TestChain::new();
        let reader = OffRampReaderV1_0_0::new(OFF_RAMP, chain.context()).await.unwrap();
        for label in [EXEC_EXECUTION_STATE_CHANGES, TOKEN_POOL_ADDED, TOKEN_POOL_REMOVED] {
            assert!(chain.store.has_filter(&filter_name(label, OFF_RAMP)));
        }
        reader.close().await.unwrap();
        assert!(!chain.store.has_filter(&filter_name(TOKEN_POOL_ADDED, OFF_RAMP)));
        assert!(chain.registry.is_empty());
    }
}
