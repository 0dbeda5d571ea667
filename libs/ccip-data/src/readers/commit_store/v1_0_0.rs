use std::sync::Arc;

use alloy_primitives::{Address, Bytes, B256, U256};
use alloy_sol_types::SolEvent;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::event_cache::{filter_name, word_from_u64, Confirmations, Log, LogFilter};
use common::interfaces::commit_store_v1_0_0::CommitStoreV1_0_0;
use parking_lot::RwLock;
use tokio::sync::OnceCell;

use super::{CommitConfigState, EXEC_REPORT_ACCEPTS, REPORT_INTERVAL_MAX_WORD, REPORT_INTERVAL_MIN_WORD};
use crate::caller::call_contract;
use crate::codec::{CommitReportCodec, CommitReportCodecV1_0_0};
use crate::config::{
    decode_offchain_config, decode_onchain_config, CommitOffchainConfig, CommitOffchainConfigV1_0_0,
    CommitOnchainConfig,
};
use crate::errors::{CcipDataError, Result};
use crate::factory::ChainContext;
use crate::logs::{decode_event, parse_logs};
use crate::prices::ExecGasPriceEstimator;
use crate::readers::{
    at_or_after, finality, is_arm_cursed, register_filters, release, CommitStoreReader, SharedGasPriceEstimator,
};
use crate::types::{CommitStoreReport, CommitStoreStaticConfig, Event, ExecReport};
use crate::version::V1_0_0;

pub(crate) type ReportParser = fn(&Log) -> Result<CommitStoreReport>;

pub fn filters(address: Address) -> Vec<LogFilter> {
    vec![LogFilter::new(
        filter_name(EXEC_REPORT_ACCEPTS, address),
        vec![CommitStoreV1_0_0::ReportAccepted::SIGNATURE_HASH],
        vec![address],
    )]
}

fn parse_report(log: &Log) -> Result<CommitStoreReport> {
    let event = decode_event::<CommitStoreV1_0_0::ReportAccepted>(log)?;
    Ok(CommitReportCodecV1_0_0::from_binding(event.report))
}

/// Commit store 1.0.0. Later versions embed it and reuse its queries with
/// their own event layout.
pub struct CommitStoreReaderV1_0_0 {
    address: Address,
    ctx: ChainContext,
    filters: Vec<LogFilter>,
    static_config: OnceCell<CommitStoreStaticConfig>,
    config: RwLock<Option<CommitConfigState>>,
}

impl CommitStoreReaderV1_0_0 {
    pub async fn new(address: Address, ctx: ChainContext) -> Result<Self> {
        Self::with_filters(address, ctx, filters(address)).await
    }

    pub(crate) async fn with_filters(address: Address, ctx: ChainContext, filters: Vec<LogFilter>) -> Result<Self> {
        register_filters(ctx.store.as_ref(), &filters).await?;
        Ok(Self {
            address,
            ctx,
            filters,
            static_config: OnceCell::new(),
            config: RwLock::new(None),
        })
    }

    pub(crate) fn context(&self) -> &ChainContext {
        &self.ctx
    }

    /// Installs a fully decoded config and returns its price registry.
    pub(crate) fn set_config(&self, state: CommitConfigState) -> Address {
        let price_registry = state.price_registry;
        tracing::info!(
            address = %self.address,
            %price_registry,
            gas_price_deviation_ppb = state.offchain.gas_price_deviation_ppb,
            "Commit store config changed"
        );
        *self.config.write() = Some(state);
        price_registry
    }

    fn config_state(&self) -> Result<CommitConfigState> {
        self.config.read().clone().ok_or(CcipDataError::ConfigNotSet)
    }

    pub(crate) async fn reports_matching_seq_num(
        &self,
        event_sig: B256,
        parse: ReportParser,
        seq_num: u64,
        confs: Confirmations,
    ) -> Result<Vec<Event<CommitStoreReport>>> {
        let logs = self
            .ctx
            .store
            .logs_data_word_between(
                event_sig,
                self.address,
                REPORT_INTERVAL_MIN_WORD,
                REPORT_INTERVAL_MAX_WORD,
                word_from_u64(seq_num),
                confs,
            )
            .await?;

        let mut reports: Vec<_> = parse_logs(&logs, parse)?
            .into_iter()
            .filter(|report| report.data.interval.contains(seq_num))
            .collect();

        if reports.len() > 1 {
            let intervals: Vec<String> = reports.iter().map(|r| r.data.interval.to_string()).collect();
            tracing::error!(address = %self.address, seq_num, ?intervals, "More than one report found for sequence number");
            reports.truncate(1);
        }
        Ok(reports)
    }

    pub(crate) async fn reports_gte_timestamp(
        &self,
        event_sig: B256,
        parse: ReportParser,
        ts: DateTime<Utc>,
        confs: Confirmations,
    ) -> Result<Vec<Event<CommitStoreReport>>> {
        let head = self.ctx.store.latest_block().await?;
        let logs = self
            .ctx
            .store
            .logs_created_after(event_sig, self.address, at_or_after(ts), confs)
            .await?;

        Ok(parse_logs(&logs, parse)?
            .into_iter()
            .map(|mut report| {
                report.meta.finality = finality(report.meta.block_number, &head);
                report
            })
            .collect())
    }
}

#[async_trait]
impl CommitStoreReader for CommitStoreReaderV1_0_0 {
    fn address(&self) -> Address {
        self.address
    }

    fn version(&self) -> &'static str {
        V1_0_0
    }

    async fn change_config(&self, onchain_config: &[u8], offchain_config: &[u8]) -> Result<Address> {
        let onchain: CommitOnchainConfig =
            decode_onchain_config::<CommitStoreV1_0_0::DynamicConfig, _>(onchain_config)?;
        let offchain: CommitOffchainConfigV1_0_0 = decode_offchain_config(offchain_config)?;

        let estimator = ExecGasPriceEstimator::new(
            self.ctx.fee_quoter.clone(),
            U256::from(offchain.max_gas_price),
            u64::from(offchain.fee_update_deviation_ppb),
        );
        Ok(self.set_config(CommitConfigState {
            offchain: CommitOffchainConfig::from(offchain),
            estimator: Arc::new(estimator),
            price_registry: onchain.price_registry,
        }))
    }

    fn offchain_config(&self) -> Result<CommitOffchainConfig> {
        Ok(self.config_state()?.offchain)
    }

    fn gas_price_estimator(&self) -> Result<SharedGasPriceEstimator> {
        Ok(self.config_state()?.estimator)
    }

    async fn get_static_config(&self) -> Result<CommitStoreStaticConfig> {
        self.static_config
            .get_or_try_init(|| async {
                let config =
                    call_contract(self.ctx.caller.as_ref(), self.address, &CommitStoreV1_0_0::getStaticConfigCall {})
                        .await?;
                Ok::<_, CcipDataError>(CommitStoreStaticConfig {
                    chain_selector: config.chainSelector,
                    source_chain_selector: config.sourceChainSelector,
                    on_ramp: config.onRamp,
                    arm_proxy: config.armProxy,
                })
            })
            .await
            .copied()
    }

    async fn get_expected_next_sequence_number(&self) -> Result<u64> {
        call_contract(
            self.ctx.caller.as_ref(),
            self.address,
            &CommitStoreV1_0_0::getExpectedNextSequenceNumberCall {},
        )
        .await
    }

    async fn get_latest_price_epoch_and_round(&self) -> Result<u64> {
        call_contract(
            self.ctx.caller.as_ref(),
            self.address,
            &CommitStoreV1_0_0::getLatestPriceEpochAndRoundCall {},
        )
        .await
    }

    async fn get_commit_reports_matching_seq_num(
        &self,
        seq_num: u64,
        confs: Confirmations,
    ) -> Result<Vec<Event<CommitStoreReport>>> {
        self.reports_matching_seq_num(CommitStoreV1_0_0::ReportAccepted::SIGNATURE_HASH, parse_report, seq_num, confs)
            .await
    }

    async fn get_accepted_commit_reports_gte_timestamp(
        &self,
        ts: DateTime<Utc>,
        confs: Confirmations,
    ) -> Result<Vec<Event<CommitStoreReport>>> {
        self.reports_gte_timestamp(CommitStoreV1_0_0::ReportAccepted::SIGNATURE_HASH, parse_report, ts, confs)
            .await
    }

    async fn is_down(&self) -> bool {
        match call_contract(
            self.ctx.caller.as_ref(),
            self.address,
            &CommitStoreV1_0_0::isUnpausedAndARMHealthyCall {},
        )
        .await
        {
            Ok(healthy) => !healthy,
            Err(e) => {
                tracing::error!(address = %self.address, error = %e, "Unable to read commit store health, assuming down");
                true
            }
        }
    }

    async fn is_cursed(&self) -> bool {
        match self.get_static_config().await {
            Ok(config) => is_arm_cursed(self.ctx.caller.as_ref(), config.arm_proxy).await,
            Err(e) => {
                tracing::error!(address = %self.address, error = %e, "Unable to read ARM proxy, assuming cursed");
                true
            }
        }
    }

    async fn is_blessed(&self, root: B256) -> Result<bool> {
        call_contract(self.ctx.caller.as_ref(), self.address, &CommitStoreV1_0_0::isBlessedCall { root }).await
    }

    async fn verify_execution_report(&self, report: &ExecReport) -> bool {
        let call = CommitStoreV1_0_0::verifyCall {
            hashedLeaves: report.messages.iter().map(|m| m.hash).collect(),
            proofs: report.proofs.clone(),
            proofFlagBits: report.proof_flag_bits,
        };
        match call_contract(self.ctx.caller.as_ref(), self.address, &call).await {
            Ok(timestamp) if !timestamp.is_zero() => true,
            Ok(_) => {
                tracing::error!(address = %self.address, messages = report.messages.len(), "Root does not verify");
                false
            }
            Err(e) => {
                tracing::error!(address = %self.address, error = %e, "Unable to call verify");
                false
            }
        }
    }

    fn encode_commit_report(&self, report: &CommitStoreReport) -> Result<Bytes> {
        CommitReportCodecV1_0_0.encode_commit_report(report)
    }

    fn decode_commit_report(&self, encoded: &[u8]) -> Result<CommitStoreReport> {
        CommitReportCodecV1_0_0.decode_commit_report(encoded)
    }

    async fn close(&self) -> Result<()> {
        release(self.ctx.store.as_ref(), &self.ctx.registry, self.address, &self.filters).await
    }
}
