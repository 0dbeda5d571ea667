use alloy_primitives::{Address, Bytes, B256};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::event_cache::Confirmations;

use super::CommitStoreReaderV1_0_0;
use crate::config::CommitOffchainConfig;
use crate::errors::Result;
use crate::factory::ChainContext;
use crate::readers::{CommitStoreReader, SharedGasPriceEstimator};
use crate::types::{CommitStoreReport, CommitStoreStaticConfig, Event, ExecReport};
use crate::version::V1_1_0;

/// 1.1.0 kept the 1.0.0 commit store ABI unchanged.
pub struct CommitStoreReaderV1_1_0 {
    inner: CommitStoreReaderV1_0_0,
}

impl CommitStoreReaderV1_1_0 {
    pub async fn new(address: Address, ctx: ChainContext) -> Result<Self> {
        Ok(Self {
            inner: CommitStoreReaderV1_0_0::new(address, ctx).await?,
        })
    }
}

#[async_trait]
impl CommitStoreReader for CommitStoreReaderV1_1_0 {
    fn address(&self) -> Address {
        self.inner.address()
    }

    fn version(&self) -> &'static str {
        V1_1_0
    }

    async fn change_config(&self, onchain_config: &[u8], offchain_config: &[u8]) -> Result<Address> {
        self.inner.change_config(onchain_config, offchain_config).await
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
        self.inner.get_commit_reports_matching_seq_num(seq_num, confs).await
    }

    async fn get_accepted_commit_reports_gte_timestamp(
        &self,
        ts: DateTime<Utc>,
        confs: Confirmations,
    ) -> Result<Vec<Event<CommitStoreReport>>> {
        self.inner.get_accepted_commit_reports_gte_timestamp(ts, confs).await
    }

    async fn is_down(&self) -> bool {
        self.inner.is_down().await
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
        self.inner.encode_commit_report(report)
    }

    fn decode_commit_report(&self, encoded: &[u8]) -> Result<CommitStoreReport> {
        self.inner.decode_commit_report(encoded)
    }

    async fn close(&self) -> Result<()> {
        self.inner.close().await
    }
}
