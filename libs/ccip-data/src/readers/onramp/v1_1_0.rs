use alloy_primitives::Address;
use alloy_sol_types::SolEvent;
use async_trait::async_trait;
use common::event_cache::{filter_name, LogFilter};
use common::interfaces::onramp_v1_0_0::EVM2EVMOnRampV1_0_0;
use common::interfaces::onramp_v1_1_0::EVM2EVMOnRampV1_1_0;

use super::{OnRampReaderV1_0_0, COMMIT_CCIP_SENDS, CONFIG_CHANGED};
use crate::caller::call_contract;
use crate::errors::Result;
use crate::factory::ChainContext;
use crate::readers::OnRampReader;
use crate::types::{EVM2EVMMessage, Event, OnRampDynamicConfig, OnRampStaticConfig};
use crate::version::V1_1_0;

pub fn filters(address: Address) -> Vec<LogFilter> {
    vec![
        LogFilter::new(
            filter_name(COMMIT_CCIP_SENDS, address),
            vec![EVM2EVMOnRampV1_0_0::CCIPSendRequested::SIGNATURE_HASH],
            vec![address],
        ),
        LogFilter::new(
            filter_name(CONFIG_CHANGED, address),
            vec![EVM2EVMOnRampV1_1_0::ConfigSet::SIGNATURE_HASH],
            vec![address],
        ),
    ]
}

impl From<EVM2EVMOnRampV1_1_0::DynamicConfig> for OnRampDynamicConfig {
    fn from(c: EVM2EVMOnRampV1_1_0::DynamicConfig) -> Self {
        Self {
            router: c.router,
            max_number_of_tokens_per_msg: c.maxTokensLength,
            dest_gas_overhead: c.destGasOverhead,
            dest_gas_per_payload_byte: c.destGasPerPayloadByte,
            price_registry: c.priceRegistry,
            max_data_bytes: c.maxDataSize,
            max_per_msg_gas_limit: c.maxGasLimit,
            ..Default::default()
        }
    }
}

/// On-ramp 1.1.0. Messages and static config are laid out as in 1.0.0; the
/// dynamic config gained destination gas fields.
pub struct OnRampReaderV1_1_0 {
    inner: OnRampReaderV1_0_0,
}

impl OnRampReaderV1_1_0 {
    pub async fn new(address: Address, ctx: ChainContext) -> Result<Self> {
        Ok(Self {
            inner: OnRampReaderV1_0_0::with_parts(
                address,
                ctx,
                filters(address),
                EVM2EVMOnRampV1_1_0::ConfigSet::SIGNATURE_HASH,
            )
            .await?,
        })
    }
}

#[async_trait]
impl OnRampReader for OnRampReaderV1_1_0 {
    fn address(&self) -> Address {
        self.inner.address()
    }

    fn version(&self) -> &'static str {
        V1_1_0
    }

    async fn get_static_config(&self) -> Result<OnRampStaticConfig> {
        self.inner.get_static_config().await
    }

    async fn get_dynamic_config(&self) -> Result<OnRampDynamicConfig> {
        let address = self.address();
        let caller = self.inner.context().caller.clone();
        self.inner
            .cached_dynamic_config(|| async move {
                let config =
                    call_contract(caller.as_ref(), address, &EVM2EVMOnRampV1_1_0::getDynamicConfigCall {}).await?;
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
        self.inner.get_send_requests_between_seq_nums(min, max, finalized).await
    }

    async fn is_source_cursed(&self) -> bool {
        self.inner.is_source_cursed().await
    }

    async fn is_source_chain_healthy(&self) -> bool {
        self.inner.is_source_chain_healthy().await
    }

    async fn close(&self) -> Result<()> {
        self.inner.close().await
    }
}

#[cfg(test)]
mod tests {
    use common::event_cache::EventStore;

    use super::*;
    use crate::readers::onramp::v1_0_0::tests::{static_config, ON_RAMP};
    use crate::testutils::{event_log, TestChain};

    fn dynamic_config(dest_gas_overhead: u32) -> EVM2EVMOnRampV1_1_0::DynamicConfig {
        EVM2EVMOnRampV1_1_0::DynamicConfig {
            router: Address::repeat_byte(0x22),
            maxTokensLength: 5,
            destGasOverhead: dest_gas_overhead,
            destGasPerPayloadByte: 16,
            priceRegistry: Address::repeat_byte(0x33),
            maxDataSize: 30_000,
            maxGasLimit: 4_000_000,
        }
    }

    #[tokio::test]
    async fn test_dynamic_config_follows_v1_1_0_config_set() {
        let chain = TestChain::new();
        let reader = OnRampReaderV1_1_0::new(ON_RAMP, chain.context()).await.unwrap();
        assert!(chain.store.has_filter(&filter_name(CONFIG_CHANGED, ON_RAMP)));

        chain
            .caller
            .expect(ON_RAMP, EVM2EVMOnRampV1_1_0::getDynamicConfigCall {}, dynamic_config(350_000));
        let config = reader.get_dynamic_config().await.unwrap();
        assert_eq!(config.dest_gas_overhead, 350_000);
        assert_eq!(config.dest_gas_per_payload_byte, 16);
        assert_eq!(config.dest_data_availability_overhead_gas, 0);

        chain
            .caller
            .expect(ON_RAMP, EVM2EVMOnRampV1_1_0::getDynamicConfigCall {}, dynamic_config(400_000));
        let stale = EVM2EVMOnRampV1_0_0::ConfigSet {
            staticConfig: static_config(),
            dynamicConfig: EVM2EVMOnRampV1_0_0::DynamicConfig {
                router: Address::ZERO,
                maxTokensLength: 0,
                priceRegistry: Address::ZERO,
                maxDataSize: 0,
                maxGasLimit: 0,
            },
        };
        chain.store.ingest_logs(vec![event_log(ON_RAMP, &stale, 30, 0)]);
        assert_eq!(reader.get_dynamic_config().await.unwrap().dest_gas_overhead, 350_000);

        let config_set = EVM2EVMOnRampV1_1_0::ConfigSet {
            staticConfig: EVM2EVMOnRampV1_1_0::StaticConfig {
                linkToken: Address::repeat_byte(0x11),
                chainSelector: 1_000,
                destChainSelector: 2_000,
                defaultTxGasLimit: 200_000,
                maxNopFeesJuels: Default::default(),
                prevOnRamp: Address::ZERO,
                armProxy: Address::ZERO,
            },
            dynamicConfig: dynamic_config(400_000),
        };
        chain.store.ingest_logs(vec![event_log(ON_RAMP, &config_set, 31, 0)]);
        assert_eq!(reader.get_dynamic_config().await.unwrap().dest_gas_overhead, 400_000);
    }

    #[test]
    fn test_config_set_signature_changed() {
        assert_ne!(
            EVM2EVMOnRampV1_1_0::ConfigSet::SIGNATURE_HASH,
            EVM2EVMOnRampV1_0_0::ConfigSet::SIGNATURE_HASH
        );
    }
}
