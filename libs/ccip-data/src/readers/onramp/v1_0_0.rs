use std::future::Future;
use std::sync::Arc;

use alloy_primitives::{Address, B256};
use alloy_sol_types::SolEvent;
use async_trait::async_trait;
use common::event_cache::{filter_name, word_from_u64, AutoSyncCache, Log, LogFilter};
use common::interfaces::onramp_v1_0_0::EVM2EVMOnRampV1_0_0;
use tokio::sync::OnceCell;

use super::{COMMIT_CCIP_SENDS, CONFIG_CHANGED};
use crate::caller::call_contract;
use crate::errors::{CcipDataError, Result};
use crate::factory::ChainContext;
use crate::hashing::{LeafHasher, LeafHasherV1_0_0};
use crate::logs::{decode_event, parse_logs};
use crate::readers::{finality, is_arm_cursed, logs_confirmations, register_filters, release, OnRampReader};
use crate::types::{EVM2EVMMessage, Event, OnRampDynamicConfig, OnRampStaticConfig};
use crate::version::V1_0_0;

/// Data word of `CCIPSendRequested` holding the sequence number.
const SEND_REQUESTED_SEQ_NUM_WORD: usize = 2;

pub(crate) type MessageParser = fn(&Log) -> Result<EVM2EVMMessage>;

pub fn filters(address: Address) -> Vec<LogFilter> {
    vec![
        LogFilter::new(
            filter_name(COMMIT_CCIP_SENDS, address),
            vec![EVM2EVMOnRampV1_0_0::CCIPSendRequested::SIGNATURE_HASH],
            vec![address],
        ),
        LogFilter::new(
            filter_name(CONFIG_CHANGED, address),
            vec![EVM2EVMOnRampV1_0_0::ConfigSet::SIGNATURE_HASH],
            vec![address],
        ),
    ]
}

fn parse_message(log: &Log) -> Result<EVM2EVMMessage> {
    let event = decode_event::<EVM2EVMOnRampV1_0_0::CCIPSendRequested>(log)?;
    Ok(EVM2EVMMessage::from(event.message))
}

impl From<EVM2EVMOnRampV1_0_0::StaticConfig> for OnRampStaticConfig {
    fn from(c: EVM2EVMOnRampV1_0_0::StaticConfig) -> Self {
        Self {
            link_token: c.linkToken,
            chain_selector: c.chainSelector,
            dest_chain_selector: c.destChainSelector,
            default_tx_gas_limit: c.defaultTxGasLimit,
            max_nop_fees_juels: c.maxNopFeesJuels.to::<u128>(),
            prev_on_ramp: c.prevOnRamp,
            arm_proxy: c.armProxy,
        }
    }
}

impl From<EVM2EVMOnRampV1_0_0::DynamicConfig> for OnRampDynamicConfig {
    fn from(c: EVM2EVMOnRampV1_0_0::DynamicConfig) -> Self {
        Self {
            router: c.router,
            max_number_of_tokens_per_msg: c.maxTokensLength,
            price_registry: c.priceRegistry,
            max_data_bytes: c.maxDataSize,
            max_per_msg_gas_limit: c.maxGasLimit,
            ..Default::default()
        }
    }
}

/// On-ramp 1.0.0.
///
/// The static config is read once. The dynamic config is cached until the
/// contract emits `ConfigSet`.
pub struct OnRampReaderV1_0_0 {
    address: Address,
    ctx: ChainContext,
    filters: Vec<LogFilter>,
    static_config: OnceCell<OnRampStaticConfig>,
    leaf_hasher: OnceCell<LeafHasherV1_0_0>,
    dynamic_config: Arc<AutoSyncCache<OnRampDynamicConfig>>,
}

impl OnRampReaderV1_0_0 {
    pub async fn new(address: Address, ctx: ChainContext) -> Result<Self> {
        Self::with_parts(
            address,
            ctx,
            filters(address),
            EVM2EVMOnRampV1_0_0::ConfigSet::SIGNATURE_HASH,
        )
        .await
    }

    /// Builds the reader with the filters and config event of a later
    /// version that kept this message layout or static config.
    pub(crate) async fn with_parts(
        address: Address,
        ctx: ChainContext,
        filters: Vec<LogFilter>,
        config_set_sig: B256,
    ) -> Result<Self> {
        register_filters(ctx.store.as_ref(), &filters).await?;
        let dynamic_config = Arc::new(AutoSyncCache::new(address, vec![config_set_sig]));
        ctx.registry.register(dynamic_config.clone());
        Ok(Self {
            address,
            ctx,
            filters,
            static_config: OnceCell::new(),
            leaf_hasher: OnceCell::new(),
            dynamic_config,
        })
    }

    pub(crate) fn context(&self) -> &ChainContext {
        &self.ctx
    }

    /// Cached dynamic config, filled by `fetch` on a miss.
    pub(crate) async fn cached_dynamic_config<F, Fut>(&self, fetch: F) -> Result<OnRampDynamicConfig>
    where
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = Result<OnRampDynamicConfig>> + Send,
    {
        self.dynamic_config.get(fetch).await
    }

    async fn leaf_hasher(&self) -> Result<&LeafHasherV1_0_0> {
        self.leaf_hasher
            .get_or_try_init(|| async {
                let config = self.get_static_config().await?;
                Ok::<_, CcipDataError>(LeafHasherV1_0_0::new(
                    config.chain_selector,
                    config.dest_chain_selector,
                    self.address,
                ))
            })
            .await
    }

    #[allow(clippy::too_many_arguments)]
    pub(crate) async fn send_requests_between(
        &self,
        event_sig: B256,
        seq_num_word: usize,
        parse: MessageParser,
        hasher: &dyn LeafHasher,
        min: u64,
        max: u64,
        finalized: bool,
    ) -> Result<Vec<Event<EVM2EVMMessage>>> {
        let head = self.ctx.store.latest_block().await?;
        let logs = self
            .ctx
            .store
            .logs_data_word_range(
                event_sig,
                self.address,
                seq_num_word,
                word_from_u64(min),
                word_from_u64(max),
                logs_confirmations(finalized),
            )
            .await?;

        let messages = parse_logs(&logs, |log| {
            let mut msg = parse(log)?;
            msg.hash = hasher.hash_leaf(&msg);
            Ok(msg)
        })?;

        Ok(messages
            .into_iter()
            .filter(|event| {
                let seq_num = event.data.sequence_number;
                let in_range = min <= seq_num && seq_num <= max;
                if !in_range {
                    tracing::warn!(address = %self.address, seq_num, min, max, "Send request outside queried range");
                }
                in_range
            })
            .map(|mut event| {
                event.meta.finality = finality(event.meta.block_number, &head);
                event
            })
            .collect())
    }
}

#[async_trait]
impl OnRampReader for OnRampReaderV1_0_0 {
    fn address(&self) -> Address {
        self.address
    }

    fn version(&self) -> &'static str {
        V1_0_0
    }

    async fn get_static_config(&self) -> Result<OnRampStaticConfig> {
        self.static_config
            .get_or_try_init(|| async {
                let config =
                    call_contract(self.ctx.caller.as_ref(), self.address, &EVM2EVMOnRampV1_0_0::getStaticConfigCall {})
                        .await?;
                Ok::<_, CcipDataError>(OnRampStaticConfig::from(config))
            })
            .await
            .copied()
    }

    async fn get_dynamic_config(&self) -> Result<OnRampDynamicConfig> {
        self.cached_dynamic_config(|| async {
            let config =
                call_contract(self.ctx.caller.as_ref(), self.address, &EVM2EVMOnRampV1_0_0::getDynamicConfigCall {})
                    .await?;
            Ok(OnRampDynamicConfig::from(config))
        })
        .await
    }

    async fn get_send_requests_between_seq_nums(
        &self,
        min: u64,
        max: u64,
        finalized: bool,
    ) -> Result<Vec<Event<EVM2EVMMessage>>> {
        let hasher = self.leaf_hasher().await?;
        self.send_requests_between(
            EVM2EVMOnRampV1_0_0::CCIPSendRequested::SIGNATURE_HASH,
            SEND_REQUESTED_SEQ_NUM_WORD,
            parse_message,
            hasher,
            min,
            max,
            finalized,
        )
        .await
    }

    async fn is_source_cursed(&self) -> bool {
        match self.get_static_config().await {
            Ok(config) => is_arm_cursed(self.ctx.caller.as_ref(), config.arm_proxy).await,
            Err(e) => {
                tracing::error!(address = %self.address, error = %e, "Unable to read ARM proxy, assuming cursed");
                true
            }
        }
    }

    async fn is_source_chain_healthy(&self) -> bool {
        !self.is_source_cursed().await
    }

    async fn close(&self) -> Result<()> {
        release(self.ctx.store.as_ref(), &self.ctx.registry, self.address, &self.filters).await
    }
}
