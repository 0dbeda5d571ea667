use std::sync::Arc;

use alloy_primitives::{Address, Bytes, B256, U256};
use alloy_sol_types::SolEvent;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::event_cache::{filter_name, Confirmations, Log, LogFilter};
use common::interfaces::commit_store_v1_2_0::CommitStoreV1_2_0;

use super::{CommitConfigState, CommitStoreReaderV1_0_0, EXEC_REPORT_ACCEPTS};
use crate::caller::call_contract;
use crate::codec::{CommitReportCodec, CommitReportCodecV1_2_0};
use crate::config::{
    decode_offchain_config, decode_onchain_config, CommitOffchainConfig, CommitOffchainConfigV1_2_0,
    CommitOnchainConfig,
};
use crate::errors::Result;
use crate::factory::ChainContext;
use crate::logs::decode_event;
use crate::prices::{DaGasPriceEstimator, ExecGasPriceEstimator};
use crate::readers::{CommitStoreReader, SharedGasPriceEstimator};
use crate::types::{CommitStoreReport, CommitStoreStaticConfig, Event, ExecReport};
use crate::version::V1_2_0;

pub fn filters(address: Address) -> Vec<LogFilter> {
    vec![LogFilter::new(
        filter_name(EXEC_REPORT_ACCEPTS, address),
        vec![CommitStoreV1_2_0::ReportAccepted::SIGNATURE_HASH],
        vec![address],
    )]
}

fn parse_report(log: &Log) -> Result<CommitStoreReport> {
    let event = decode_event::<CommitStoreV1_2_0::ReportAccepted>(log)?;
    Ok(CommitReportCodecV1_2_0::from_binding(event.report))
}

/// Commit store 1.2.0: gas price lists, split exec and data availability
/// prices, and a curse-aware pause check.
pub struct CommitStoreReaderV1_2_0 {
    inner: CommitStoreReaderV1_0_0,
}

impl CommitStoreReaderV1_2_0 {
    pub async fn new(address: Address, ctx: ChainContext) -> Result<Self> {
        Ok(Self {
            inner: CommitStoreReaderV1_0_0::with_filters(address, ctx, filters(address)).await?,
        })
    }
}

#[async_trait]
impl CommitStoreReader for CommitStoreReaderV1_2_0 {
    fn address(&self) -> Address {
        self.inner.address()
    }

    fn version(&self) -> &'static str {
        V1_2_0
    }

    async fn change_config(&self, onchain_config: &[u8], offchain_config: &[u8]) -> Result<Address> {
        let onchain: CommitOnchainConfig =
            decode_onchain_config::<CommitStoreV1_2_0::DynamicConfig, _>(onchain_config)?;
        let offchain: CommitOffchainConfigV1_2_0 = decode_offchain_config(offchain_config)?;

        let ctx = self.inner.context();
        let exec = ExecGasPriceEstimator::new(
            ctx.fee_quoter.clone(),
            U256::from(offchain.source_max_gas_price),
            u64::from(offchain.exec_gas_price_deviation_ppb),
        );
        let estimator = DaGasPriceEstimator::new(
            exec,
            ctx.da_fee_quoter.clone(),
            u64::from(offchain.da_gas_price_deviation_ppb),
        );
        Ok(self.inner.set_config(CommitConfigState {
            offchain: CommitOffchainConfig::from(offchain),
            estimator: Arc::new(estimator),
            price_registry: onchain.price_registry,
        }))
    }

    fn offchain_config(&self) -> Result<CommitOffchainConfig> {
        self.inner.offchain_config()
    }

    fn gas_price_estimator(&self) -> Result<SharedGasPriceEstimator> {
        self.inner.gas_price_estimator()
    }

    async fn get_static_config(&self) -> Result<CommitStoreStaticConfig> {
        self.inner.get_static_config().await
    }

    async fn get_expected_next_sequence_number(&self) -> Result<u64> {
        self.inner.get_expected_next_sequence_number().await
    }

    async fn get_latest_price_epoch_and_round(&self) -> Result<u64> {
        self.inner.get_latest_price_epoch_and_round().await
    }

    async fn get_commit_reports_matching_seq_num(
        &self,
        seq_num: u64,
        confs: Confirmations,
    ) -> Result<Vec<Event<CommitStoreReport>>> {
        self.inner
            .reports_matching_seq_num(CommitStoreV1_2_0::ReportAccepted::SIGNATURE_HASH, parse_report, seq_num, confs)
            .await
    }

    async fn get_accepted_commit_reports_gte_timestamp(
        &self,
        ts: DateTime<Utc>,
        confs: Confirmations,
    ) -> Result<Vec<Event<CommitStoreReport>>> {
        self.inner
            .reports_gte_timestamp(CommitStoreV1_2_0::ReportAccepted::SIGNATURE_HASH, parse_report, ts, confs)
            .await
    }

    async fn is_down(&self) -> bool {
        let address = self.address();
        match call_contract(
            self.inner.context().caller.as_ref(),
            address,
            &CommitStoreV1_2_0::isUnpausedAndNotCursedCall {},
        )
        .await
        {
            Ok(healthy) => !healthy,
            Err(e) => {
                tracing::error!(%address, error = %e, "Unable to read commit store health, assuming down");
                true
            }
        }
    }

    async fn is_cursed(&self) -> bool {
        self.inner.is_cursed().await
    }

    async fn is_blessed(&self, root: B256) -> Result<bool> {
        self.inner.is_blessed(root).await
    }

    async fn verify_execution_report(&self, report: &ExecReport) -> bool {
        self.inner.verify_execution_report(report).await
    }

    fn encode_commit_report(&self, report: &CommitStoreReport) -> Result<Bytes> {
        CommitReportCodecV1_2_0.encode_commit_report(report)
    }

    fn decode_commit_report(&self, encoded: &[u8]) -> Result<CommitStoreReport> {
        CommitReportCodecV1_2_0.decode_commit_report(encoded)
    }

    async fn close(&self) -> Result<()> {
        self.inner.close().await
    }
}
