//! Offchain (JSON) and onchain (ABI) plugin configs.
//!
//! Every decode path validates: a zero or empty required field fails with
//! `"must set <Field>"`, so a bad config update never replaces a good one.

mod commit;
pub(crate) mod duration;
mod exec;

use alloy_primitives::Bytes;
use alloy_sol_types::SolValue;
use serde::de::DeserializeOwned;
use serde::Serialize;

pub use commit::{
    CommitOffchainConfig, CommitOffchainConfigV1_0_0, CommitOffchainConfigV1_2_0, CommitOnchainConfig,
};
pub use exec::{ExecOffchainConfig, ExecOffchainConfigV1_0_0, ExecOffchainConfigV1_2_0, ExecOnchainConfig};
pub(crate) use exec::ExecOnchainConfigV1_2_0;

use crate::errors::{CcipDataError, Result};

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

/// Fails with `"must set <field>"` when `value` is its type's zero.
pub(crate) fn require_non_zero<T: Default + PartialEq>(value: &T, field: &str) -> Result<()> {
    if *value == T::default() {
        return Err(CcipDataError::invalid_config(field));
    }
    Ok(())
}

pub fn decode_offchain_config<T: DeserializeOwned + Validate>(bytes: &[u8]) -> Result<T> {
    let config: T = serde_json::from_slice(bytes)
        .map_err(|e| CcipDataError::InvalidConfig(format!("offchain config is not valid JSON: {}", e)))?;
    config.validate()?;
    Ok(config)
}

pub fn encode_offchain_config<T: Serialize>(config: &T) -> Result<Bytes> {
    serde_json::to_vec(config)
        .map(Bytes::from)
        .map_err(|e| CcipDataError::InvalidConfig(format!("encoding offchain config: {}", e)))
}

/// Decodes the ABI binding `B` and validates it as `T`.
pub fn decode_onchain_config<B, T>(bytes: &[u8]) -> Result<T>
where
    B: SolValue + From<<<B as SolValue>::SolType as alloy_sol_types::SolType>::RustType>,
    T: From<B> + Validate,
{
    let raw = B::abi_decode(bytes)
        .map_err(|e| CcipDataError::InvalidConfig(format!("onchain config is not valid ABI: {}", e)))?;
    let config = T::from(raw);
    config.validate()?;
    Ok(config)
}
