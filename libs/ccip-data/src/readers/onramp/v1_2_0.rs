use alloy_primitives::Address;
use alloy_sol_types::SolEvent;
use async_trait::async_trait;
use common::event_cache::{filter_name, Log, LogFilter};
use common::interfaces::onramp_v1_2_0::EVM2EVMOnRampV1_2_0;
use tokio::sync::OnceCell;

use super::{OnRampReaderV1_0_0, COMMIT_CCIP_SENDS, CONFIG_CHANGED};
use crate::caller::call_contract;
use crate::errors::{CcipDataError, Result};
use crate::factory::ChainContext;
use crate::hashing::LeafHasherV1_2_0;
use crate::logs::decode_event;
use crate::readers::OnRampReader;
use crate::types::{EVM2EVMMessage, Event, OnRampDynamicConfig, OnRampStaticConfig};
use crate::version::V1_2_0;

/// Data word of `CCIPSendRequested` holding the sequence number. Sender and
/// receiver now precede it.
const SEND_REQUESTED_SEQ_NUM_WORD: usize = 4;

pub fn filters(address: Address) -> Vec<LogFilter> {
    vec![
        LogFilter::new(
            filter_name(COMMIT_CCIP_SENDS, address),
            vec![EVM2EVMOnRampV1_2_0::CCIPSendRequested::SIGNATURE_HASH],
            vec![address],
        ),
        LogFilter::new(
            filter_name(CONFIG_CHANGED, address),
            vec![EVM2EVMOnRampV1_2_0::ConfigSet::SIGNATURE_HASH],
            vec![address],
        ),
    ]
}

fn parse_message(log: &Log) -> Result<EVM2EVMMessage> {
    let event = decode_event::<EVM2EVMOnRampV1_2_0::CCIPSendRequested>(log)?;
    Ok(EVM2EVMMessage::from(event.message))
}

impl From<EVM2EVMOnRampV1_2_0::DynamicConfig> for OnRampDynamicConfig {
    fn from(c: EVM2EVMOnRampV1_2_0::DynamicConfig) -> Self {
        Self {
            router: c.router,
            max_number_of_tokens_per_msg: c.maxNumberOfTokensPerMsg,
            dest_gas_overhead: c.destGasOverhead,
            dest_gas_per_payload_byte: c.destGasPerPayloadByte,
            dest_data_availability_overhead_gas: c.destDataAvailabilityOverheadGas,
            dest_gas_per_data_availability_byte: c.destGasPerDataAvailabilityByte,
            dest_data_availability_multiplier_bps: c.destDataAvailabilityMultiplierBps,
            price_registry: c.priceRegistry,
            max_data_bytes: c.maxDataBytes,
            max_per_msg_gas_limit: u64::from(c.maxPerMsgGasLimit),
        }
    }
}

/// On-ramp 1.2.0: new message layout and leaf hash, data availability
/// fields in the dynamic config, and a pause switch.
pub struct OnRampReaderV1_2_0 {
    inner: OnRampReaderV1_0_0,
    leaf_hasher: OnceCell<LeafHasherV1_2_0>,
}

impl OnRampReaderV1_2_0 {
    pub async fn new(address: Address, ctx: ChainContext) -> Result<Self> {
        Ok(Self {
            inner: OnRampReaderV1_0_0::with_parts(
                address,
                ctx,
                filters(address),
                EVM2EVMOnRampV1_2_0::ConfigSet::SIGNATURE_HASH,
            )
            .await?,
            leaf_hasher: OnceCell::new(),
        })
    }

    async fn leaf_hasher(&self) -> Result<&LeafHasherV1_2_0> {
        self.leaf_hasher
            .get_or_try_init(|| async {
                let config = self.get_static_config().await?;
                Ok::<_, CcipDataError>(LeafHasherV1_2_0::new(
                    config.chain_selector,
                    config.dest_chain_selector,
                    self.address(),
                ))
            })
            .await
    }

    async fn is_paused(&self) -> Result<bool> {
        call_contract(
            self.inner.context().caller.as_ref(),
            self.address(),
            &EVM2EVMOnRampV1_2_0::pausedCall {},
        )
        .await
    }
}

#[async_trait]
impl OnRampReader for OnRampReaderV1_2_0 {
    fn address(&self) -> Address {
        self.inner.address()
    }

    fn version(&self) -> &'static str {
        V1_2_0
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
                    call_contract(caller.as_ref(), address, &EVM2EVMOnRampV1_2_0::getDynamicConfigCall {}).await?;
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
        self.inner
            .send_requests_between(
                EVM2EVMOnRampV1_2_0::CCIPSendRequested::SIGNATURE_HASH,
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
        self.inner.is_source_cursed().await
    }

    async fn is_source_chain_healthy(&self) -> bool {
        match self.is_paused().await {
            Ok(false) => {}
            Ok(true) => return false,
            Err(e) => {
                tracing::error!(address = %self.address(), error = %e, "Unable to read on-ramp pause state");
                return false;
            }
        }
        !self.is_source_cursed().await
    }

    async fn close(&self) -> Result<()> {
        self.inner.close().await
    }
}

#[cfg(test)]
mod tests {
    use alloy_primitives::aliases::U96;
    use alloy_primitives::{Bytes, B256, U256};
    use common::interfaces::arm::IARM;

    use super::*;
    use crate::hashing::LeafHasher;
    use crate::readers::onramp::v1_0_0::tests::{ARM, ON_RAMP};
    use crate::testutils::{event_log, TestChain};

    fn static_config() -> EVM2EVMOnRampV1_2_0::StaticConfig {
        EVM2EVMOnRampV1_2_0::StaticConfig {
            linkToken: Address::repeat_byte(0x11),
            chainSelector: 1_000,
            destChainSelector: 2_000,
            defaultTxGasLimit: 200_000,
            maxNopFeesJuels: U96::from(1_000_000u64),
            prevOnRamp: Address::ZERO,
            armProxy: ARM,
        }
    }

    fn send_requested(seq_num: u64) -> EVM2EVMOnRampV1_2_0::CCIPSendRequested {
        EVM2EVMOnRampV1_2_0::CCIPSendRequested {
            message: EVM2EVMOnRampV1_2_0::EVM2EVMMessage {
                sourceChainSelector: 1_000,
                sender: Address::repeat_byte(0x44),
                receiver: Address::repeat_byte(0x55),
                sequenceNumber: seq_num,
                gasLimit: U256::from(100_000),
                strict: false,
                nonce: seq_num,
                feeToken: Address::repeat_byte(0x11),
                feeTokenAmount: U256::from(10),
                data: Bytes::from_static(b"hello"),
                tokenAmounts: vec![EVM2EVMOnRampV1_2_0::EVMTokenAmount {
                    token: Address::repeat_byte(0x66),
                    amount: U256::from(5),
                }],
                sourceTokenData: vec![Bytes::from_static(b"pool data")],
                messageId: B256::with_last_byte(seq_num as u8),
            },
        }
    }

    #[tokio::test]
    async fn test_send_requests_use_v1_2_0_layout() {
        let chain = TestChain::new();
        chain.store.ingest_logs(vec![
            event_log(ON_RAMP, &send_requested(7), 10, 0),
            event_log(ON_RAMP, &send_requested(8), 10, 1),
            event_log(ON_RAMP, &send_requested(9), 11, 0),
        ]);
        chain
            .caller
            .expect(ON_RAMP, EVM2EVMOnRampV1_2_0::getStaticConfigCall {}, static_config());
        let reader = OnRampReaderV1_2_0::new(ON_RAMP, chain.context()).await.unwrap();

        let events = reader.get_send_requests_between_seq_nums(8, 9, true).await.unwrap();
        let seq_nums: Vec<u64> = events.iter().map(|e| e.data.sequence_number).collect();
        assert_eq!(seq_nums, vec![8, 9]);
        assert_eq!(events[0].data.source_token_data, vec![Bytes::from_static(b"pool data")]);

        let hasher = LeafHasherV1_2_0::new(1_000, 2_000, ON_RAMP);
        let mut unhashed = events[0].data.clone();
        unhashed.hash = B256::ZERO;
        assert_eq!(events[0].data.hash, hasher.hash_leaf(&unhashed));
    }

    #[tokio::test]
    async fn test_dynamic_config_carries_data_availability_fields() {
        let chain = TestChain::new();
        let reader = OnRampReaderV1_2_0::new(ON_RAMP, chain.context()).await.unwrap();
        chain.caller.expect(
            ON_RAMP,
            EVM2EVMOnRampV1_2_0::getDynamicConfigCall {},
            EVM2EVMOnRampV1_2_0::DynamicConfig {
                router: Address::repeat_byte(0x22),
                maxNumberOfTokensPerMsg: 5,
                destGasOverhead: 350_000,
                destGasPerPayloadByte: 16,
                destDataAvailabilityOverheadGas: 33_596,
                destGasPerDataAvailabilityByte: 16,
                destDataAvailabilityMultiplierBps: 6_840,
                priceRegistry: Address::repeat_byte(0x33),
                maxDataBytes: 30_000,
                maxPerMsgGasLimit: 3_000_000,
            },
        );

        let config = reader.get_dynamic_config().await.unwrap();
        assert_eq!(config.dest_data_availability_overhead_gas, 33_596);
        assert_eq!(config.dest_data_availability_multiplier_bps, 6_840);
        assert_eq!(config.max_per_msg_gas_limit, 3_000_000);
    }

    #[tokio::test]
    async fn test_paused_source_is_unhealthy() {
        let chain = TestChain::new();
        let reader = OnRampReaderV1_2_0::new(ON_RAMP, chain.context()).await.unwrap();
        chain
            .caller
            .expect(ON_RAMP, EVM2EVMOnRampV1_2_0::getStaticConfigCall {}, static_config());
        chain.caller.expect(ARM, IARM::isCursedCall {}, false);

        chain.caller.expect(ON_RAMP, EVM2EVMOnRampV1_2_0::pausedCall {}, true);
        assert!(!reader.is_source_cursed().await);
        assert!(!reader.is_source_chain_healthy().await);

        chain.caller.expect(ON_RAMP, EVM2EVMOnRampV1_2_0::pausedCall {}, false);
        assert!(reader.is_source_chain_healthy().await);

        chain.caller.expect(ARM, IARM::isCursedCall {}, true);
        assert!(!reader.is_source_chain_healthy().await);
    }
}
