use std::time::Duration;

use alloy_primitives::Address;
use common::interfaces::offramp_v1_0_0::EVM2EVMOffRampV1_0_0;
use common::interfaces::offramp_v1_2_0::EVM2EVMOffRampV1_2_0;
use serde::{Deserialize, Serialize};

use super::{duration, require_non_zero, Validate};
use crate::errors::Result;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ExecOffchainConfig {
    pub dest_optimistic_confirmations: u32,
    pub batch_gas_limit: u32,
    pub relative_boost_per_wait_hour: f64,
    pub inflight_cache_expiry: Duration,
    pub root_snooze_time: Duration,
    /// Zero for 1.0.0 lanes
    pub message_visibility_interval: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecOffchainConfigV1_0_0 {
    #[serde(rename = "SourceFinalityDepth")]
    pub source_finality_depth: u32,
    #[serde(rename = "DestOptimisticConfirmations")]
    pub dest_optimistic_confirmations: u32,
    #[serde(rename = "DestFinalityDepth")]
    pub dest_finality_depth: u32,
    #[serde(rename = "BatchGasLimit")]
    pub batch_gas_limit: u32,
    #[serde(rename = "RelativeBoostPerWaitHour")]
    pub relative_boost_per_wait_hour: f64,
    #[serde(rename = "MaxGasPrice")]
    pub max_gas_price: u64,
    #[serde(rename = "InflightCacheExpiry", with = "duration")]
    pub inflight_cache_expiry: Duration,
    #[serde(rename = "RootSnoozeTime", with = "duration")]
    pub root_snooze_time: Duration,
}

impl Validate for ExecOffchainConfigV1_0_0 {
    fn validate(&self) -> Result<()> {
        require_non_zero(&self.source_finality_depth, "SourceFinalityDepth")?;
        require_non_zero(&self.dest_optimistic_confirmations, "DestOptimisticConfirmations")?;
        require_non_zero(&self.dest_finality_depth, "DestFinalityDepth")?;
        require_non_zero(&self.batch_gas_limit, "BatchGasLimit")?;
        require_non_zero(&self.relative_boost_per_wait_hour, "RelativeBoostPerWaitHour")?;
        require_non_zero(&self.max_gas_price, "MaxGasPrice")?;
        require_non_zero(&self.inflight_cache_expiry, "InflightCacheExpiry")?;
        require_non_zero(&self.root_snooze_time, "RootSnoozeTime")
    }
}

impl From<ExecOffchainConfigV1_0_0> for ExecOffchainConfig {
    fn from(c: ExecOffchainConfigV1_0_0) -> Self {
        Self {
            dest_optimistic_confirmations: c.dest_optimistic_confirmations,
            batch_gas_limit: c.batch_gas_limit,
            relative_boost_per_wait_hour: c.relative_boost_per_wait_hour,
            inflight_cache_expiry: c.inflight_cache_expiry,
            root_snooze_time: c.root_snooze_time,
            message_visibility_interval: Duration::ZERO,
        }
    }
}

/// 1.2.0 exec config. Gas price limits come from the commit store config.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecOffchainConfigV1_2_0 {
    #[serde(rename = "SourceFinalityDepth")]
    pub source_finality_depth: u32,
    #[serde(rename = "DestOptimisticConfirmations")]
    pub dest_optimistic_confirmations: u32,
    #[serde(rename = "DestFinalityDepth")]
    pub dest_finality_depth: u32,
    #[serde(rename = "BatchGasLimit")]
    pub batch_gas_limit: u32,
    #[serde(rename = "RelativeBoostPerWaitHour")]
    pub relative_boost_per_wait_hour: f64,
    #[serde(rename = "InflightCacheExpiry", with = "duration")]
    pub inflight_cache_expiry: Duration,
    #[serde(rename = "RootSnoozeTime", with = "duration")]
    pub root_snooze_time: Duration,
    #[serde(rename = "MessageVisibilityInterval", with = "duration")]
    pub message_visibility_interval: Duration,
}

impl Validate for ExecOffchainConfigV1_2_0 {
    fn validate(&self) -> Result<()> {
        require_non_zero(&self.source_finality_depth, "SourceFinalityDepth")?;
        require_non_zero(&self.dest_optimistic_confirmations, "DestOptimisticConfirmations")?;
        require_non_zero(&self.dest_finality_depth, "DestFinalityDepth")?;
        require_non_zero(&self.batch_gas_limit, "BatchGasLimit")?;
        require_non_zero(&self.relative_boost_per_wait_hour, "RelativeBoostPerWaitHour")?;
        require_non_zero(&self.inflight_cache_expiry, "InflightCacheExpiry")?;
        require_non_zero(&self.root_snooze_time, "RootSnoozeTime")?;
        require_non_zero(&self.message_visibility_interval, "MessageVisibilityInterval")
    }
}

impl From<ExecOffchainConfigV1_2_0> for ExecOffchainConfig {
    fn from(c: ExecOffchainConfigV1_2_0) -> Self {
        Self {
            dest_optimistic_confirmations: c.dest_optimistic_confirmations,
            batch_gas_limit: c.batch_gas_limit,
            relative_boost_per_wait_hour: c.relative_boost_per_wait_hour,
            inflight_cache_expiry: c.inflight_cache_expiry,
            root_snooze_time: c.root_snooze_time,
            message_visibility_interval: c.message_visibility_interval,
        }
    }
}

/// Off-ramp dynamic config, normalized. `max_pool_release_or_mint_gas` is
/// zero for 1.0.0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ExecOnchainConfig {
    pub permissionless_exec_threshold_seconds: u32,
    pub router: Address,
    pub price_registry: Address,
    pub max_number_of_tokens_per_msg: u16,
    pub max_data_bytes: u32,
    pub max_pool_release_or_mint_gas: u32,
}

impl ExecOnchainConfig {
    fn validate_common(&self) -> Result<()> {
        require_non_zero(
            &self.permissionless_exec_threshold_seconds,
            "PermissionLessExecutionThresholdSeconds",
        )?;
        require_non_zero(&self.router, "Router")?;
        require_non_zero(&self.price_registry, "PriceRegistry")?;
        require_non_zero(&self.max_number_of_tokens_per_msg, "MaxNumberOfTokensPerMsg")?;
        require_non_zero(&self.max_data_bytes, "MaxDataBytes")
    }
}

impl Validate for ExecOnchainConfig {
    fn validate(&self) -> Result<()> {
        self.validate_common()
    }
}

impl From<EVM2EVMOffRampV1_0_0::DynamicConfig> for ExecOnchainConfig {
    fn from(c: EVM2EVMOffRampV1_0_0::DynamicConfig) -> Self {
        Self {
            permissionless_exec_threshold_seconds: c.permissionLessExecutionThresholdSeconds,
            router: c.router,
            price_registry: c.priceRegistry,
            max_number_of_tokens_per_msg: c.maxTokensLength,
            max_data_bytes: c.maxDataSize,
            max_pool_release_or_mint_gas: 0,
        }
    }
}

/// Onchain exec config of a 1.2.0 off-ramp, which additionally requires the
/// pool gas limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct ExecOnchainConfigV1_2_0(pub ExecOnchainConfig);

impl Validate for ExecOnchainConfigV1_2_0 {
    fn validate(&self) -> Result<()> {
        self.0.validate_common()?;
        require_non_zero(&self.0.max_pool_release_or_mint_gas, "MaxPoolReleaseOrMintGas")
    }
}

impl From<EVM2EVMOffRampV1_2_0::DynamicConfig> for ExecOnchainConfigV1_2_0 {
    fn from(c: EVM2EVMOffRampV1_2_0::DynamicConfig) -> Self {
        Self(ExecOnchainConfig {
            permissionless_exec_threshold_seconds: c.permissionLessExecutionThresholdSeconds,
            router: c.router,
            price_registry: c.priceRegistry,
            max_number_of_tokens_per_msg: c.maxNumberOfTokensPerMsg,
            max_data_bytes: c.maxDataBytes,
            max_pool_release_or_mint_gas: c.maxPoolReleaseOrMintGas,
        })
    }
}

#[cfg(test)]
mod tests {
    use alloy_sol_types::SolValue;

    use super::*;
    use crate::config::{decode_offchain_config, decode_onchain_config, encode_offchain_config};

    fn v1_2_0() -> ExecOffchainConfigV1_2_0 {
        ExecOffchainConfigV1_2_0 {
            source_finality_depth: 3,
            dest_optimistic_confirmations: 6,
            dest_finality_depth: 3,
            batch_gas_limit: 5_000_000,
            relative_boost_per_wait_hour: 0.07,
            inflight_cache_expiry: Duration::from_secs(64),
            root_snooze_time: Duration::from_secs(128),
            message_visibility_interval: Duration::from_secs(8 * 3600),
        }
    }

    #[test]
    fn test_round_trip() {
        let encoded = encode_offchain_config(&v1_2_0()).unwrap();
        let decoded: ExecOffchainConfigV1_2_0 = decode_offchain_config(&encoded).unwrap();
        assert_eq!(decoded, v1_2_0());
    }

    #[test]
    fn test_missing_boost_rejected() {
        let config = ExecOffchainConfigV1_2_0 {
            relative_boost_per_wait_hour: 0.0,
            ..v1_2_0()
        };
        let err = decode_offchain_config::<ExecOffchainConfigV1_2_0>(&encode_offchain_config(&config).unwrap())
            .unwrap_err();
        assert!(err.to_string().contains("must set RelativeBoostPerWaitHour"));
    }

    #[test]
    fn test_v1_0_0_requires_max_gas_price() {
        let json = br#"{
            "SourceFinalityDepth": 3,
            "DestOptimisticConfirmations": 6,
            "DestFinalityDepth": 3,
            "BatchGasLimit": 5000000,
            "RelativeBoostPerWaitHour": 0.07,
            "InflightCacheExpiry": "1m4s",
            "RootSnoozeTime": "2m8s"
        }"#;
        let err = decode_offchain_config::<ExecOffchainConfigV1_0_0>(json).unwrap_err();
        assert!(err.to_string().contains("must set MaxGasPrice"));
    }

    #[test]
    fn test_onchain_v1_2_0_requires_pool_gas() {
        let raw = EVM2EVMOffRampV1_2_0::DynamicConfig {
            permissionLessExecutionThresholdSeconds: 60,
            router: Address::repeat_byte(1),
            priceRegistry: Address::repeat_byte(2),
            maxNumberOfTokensPerMsg: 5,
            maxDataBytes: 1_000,
            maxPoolReleaseOrMintGas: 0,
        };
        let err = decode_onchain_config::<EVM2EVMOffRampV1_2_0::DynamicConfig, ExecOnchainConfigV1_2_0>(
            &raw.abi_encode(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("must set MaxPoolReleaseOrMintGas"));

        let raw = EVM2EVMOffRampV1_2_0::DynamicConfig {
            maxPoolReleaseOrMintGas: 200_000,
            ..raw
        };
        let config = decode_onchain_config::<EVM2EVMOffRampV1_2_0::DynamicConfig, ExecOnchainConfigV1_2_0>(
            &raw.abi_encode(),
        )
        .unwrap();
        assert_eq!(config.0.price_registry, Address::repeat_byte(2));
    }

    #[test]
    fn test_onchain_v1_0_0() {
        let raw = EVM2EVMOffRampV1_0_0::DynamicConfig {
            permissionLessExecutionThresholdSeconds: 60,
            router: Address::repeat_byte(1),
            priceRegistry: Address::ZERO,
            maxTokensLength: 5,
            maxDataSize: 1_000,
        };
        let err = decode_onchain_config::<EVM2EVMOffRampV1_0_0::DynamicConfig, ExecOnchainConfig>(&raw.abi_encode())
            .unwrap_err();
        assert!(err.to_string().contains("must set PriceRegistry"));
    }
}
