use std::time::Duration;

use alloy_primitives::Address;
use common::interfaces::commit_store_v1_0_0::CommitStoreV1_0_0;
use common::interfaces::commit_store_v1_2_0::CommitStoreV1_2_0;
use serde::{Deserialize, Serialize};

use super::{duration, require_non_zero, Validate};
use crate::errors::Result;

/// Commit plugin settings, as seen by callers regardless of version.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CommitOffchainConfig {
    pub gas_price_deviation_ppb: u32,
    pub gas_price_heart_beat: Duration,
    pub token_price_deviation_ppb: u32,
    pub token_price_heart_beat: Duration,
    pub inflight_cache_expiry: Duration,
    pub price_reporting_disabled: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CommitOffchainConfigV1_0_0 {
    #[serde(rename = "SourceFinalityDepth")]
    pub source_finality_depth: u32,
    #[serde(rename = "DestFinalityDepth")]
    pub dest_finality_depth: u32,
    #[serde(rename = "FeeUpdateHeartBeat", with = "duration")]
    pub fee_update_heart_beat: Duration,
    #[serde(rename = "FeeUpdateDeviationPPB")]
    pub fee_update_deviation_ppb: u32,
    #[serde(rename = "MaxGasPrice")]
    pub max_gas_price: u64,
    #[serde(rename = "InflightCacheExpiry", with = "duration")]
    pub inflight_cache_expiry: Duration,
}

impl Validate for CommitOffchainConfigV1_0_0 {
    fn validate(&self) -> Result<()> {
        require_non_zero(&self.source_finality_depth, "SourceFinalityDepth")?;
        require_non_zero(&self.dest_finality_depth, "DestFinalityDepth")?;
        require_non_zero(&self.fee_update_heart_beat, "FeeUpdateHeartBeat")?;
        require_non_zero(&self.fee_update_deviation_ppb, "FeeUpdateDeviationPPB")?;
        require_non_zero(&self.max_gas_price, "MaxGasPrice")?;
        require_non_zero(&self.inflight_cache_expiry, "InflightCacheExpiry")
    }
}

impl From<CommitOffchainConfigV1_0_0> for CommitOffchainConfig {
    /// 1.0.0 has a single deviation and heartbeat for both gas and tokens.
    fn from(c: CommitOffchainConfigV1_0_0) -> Self {
        Self {
            gas_price_deviation_ppb: c.fee_update_deviation_ppb,
            gas_price_heart_beat: c.fee_update_heart_beat,
            token_price_deviation_ppb: c.fee_update_deviation_ppb,
            token_price_heart_beat: c.fee_update_heart_beat,
            inflight_cache_expiry: c.inflight_cache_expiry,
            price_reporting_disabled: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CommitOffchainConfigV1_2_0 {
    #[serde(rename = "SourceFinalityDepth")]
    pub source_finality_depth: u32,
    #[serde(rename = "DestFinalityDepth")]
    pub dest_finality_depth: u32,
    #[serde(rename = "GasPriceHeartBeat", with = "duration")]
    pub gas_price_heart_beat: Duration,
    /// Zero on chains without a data availability component
    #[serde(rename = "DAGasPriceDeviationPPB")]
    pub da_gas_price_deviation_ppb: u32,
    #[serde(rename = "ExecGasPriceDeviationPPB")]
    pub exec_gas_price_deviation_ppb: u32,
    #[serde(rename = "TokenPriceHeartBeat", with = "duration")]
    pub token_price_heart_beat: Duration,
    #[serde(rename = "TokenPriceDeviationPPB")]
    pub token_price_deviation_ppb: u32,
    #[serde(rename = "SourceMaxGasPrice")]
    pub source_max_gas_price: u64,
    #[serde(rename = "InflightCacheExpiry", with = "duration")]
    pub inflight_cache_expiry: Duration,
    #[serde(rename = "PriceReportingDisabled")]
    pub price_reporting_disabled: bool,
}

impl Validate for CommitOffchainConfigV1_2_0 {
    fn validate(&self) -> Result<()> {
        require_non_zero(&self.source_finality_depth, "SourceFinalityDepth")?;
        require_non_zero(&self.dest_finality_depth, "DestFinalityDepth")?;
        require_non_zero(&self.gas_price_heart_beat, "GasPriceHeartBeat")?;
        require_non_zero(&self.exec_gas_price_deviation_ppb, "ExecGasPriceDeviationPPB")?;
        require_non_zero(&self.token_price_heart_beat, "TokenPriceHeartBeat")?;
        require_non_zero(&self.token_price_deviation_ppb, "TokenPriceDeviationPPB")?;
        require_non_zero(&self.source_max_gas_price, "SourceMaxGasPrice")?;
        require_non_zero(&self.inflight_cache_expiry, "InflightCacheExpiry")
    }
}

impl From<CommitOffchainConfigV1_2_0> for CommitOffchainConfig {
    fn from(c: CommitOffchainConfigV1_2_0) -> Self {
        Self {
            gas_price_deviation_ppb: c.exec_gas_price_deviation_ppb,
            gas_price_heart_beat: c.gas_price_heart_beat,
            token_price_deviation_ppb: c.token_price_deviation_ppb,
            token_price_heart_beat: c.token_price_heart_beat,
            inflight_cache_expiry: c.inflight_cache_expiry,
            price_reporting_disabled: c.price_reporting_disabled,
        }
    }
}

/// Onchain commit config: the destination price registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CommitOnchainConfig {
    pub price_registry: Address,
}

impl Validate for CommitOnchainConfig {
    fn validate(&self) -> Result<()> {
        require_non_zero(&self.price_registry, "PriceRegistry")
    }
}

impl From<CommitStoreV1_0_0::DynamicConfig> for CommitOnchainConfig {
    fn from(c: CommitStoreV1_0_0::DynamicConfig) -> Self {
        Self {
            price_registry: c.priceRegistry,
        }
    }
}

impl From<CommitStoreV1_2_0::DynamicConfig> for CommitOnchainConfig {
    fn from(c: CommitStoreV1_2_0::DynamicConfig) -> Self {
        Self {
            price_registry: c.priceRegistry,
        }
    }
}
