//! Gas price estimation.
//!
//! An estimator turns a raw fee quote from the source chain into the price
//! that commit reports carry, decides whether a new observation deviates
//! enough from the last committed one, and prices individual messages in USD.

mod da;
mod exec;

use std::sync::Arc;

use alloy::providers::Provider;
use alloy_primitives::U256;
use async_trait::async_trait;

pub use da::{DaCostParams, DaGasPriceEstimator, DA_MULTIPLIER_BASE, PRICE_ENCODING_LENGTH};
pub use exec::{ExecGasPriceEstimator, EXEC_GAS_PER_PAYLOAD_BYTE, EXEC_GAS_PER_TOKEN, FEE_BOOSTING_OVERHEAD_GAS};

use crate::errors::{CcipDataError, Result};
use crate::types::EVM2EVMMessage;

/// 1e18, the fixed point base of on-chain USD prices.
pub const USD_PRICE_BASE: u64 = 1_000_000_000_000_000_000;

/// Parts per billion
pub const PPB_BASE: u64 = 1_000_000_000;

#[async_trait]
pub trait GasPriceEstimator: Send + Sync + core::fmt::Debug {
    /// Current source chain gas price, capped at the configured maximum.
    async fn get_gas_price(&self) -> Result<U256>;

    /// Converts a native gas price into USD per unit gas.
    fn denote_in_usd(&self, price: U256, wrapped_native_price: U256) -> Result<U256>;

    fn median(&self, prices: &[U256]) -> Result<U256>;

    /// Whether `new` differs enough from the last reported `old` price.
    fn deviates(&self, old: U256, new: U256) -> Result<bool>;

    /// USD cost of executing `msg` at `price`.
    fn estimate_msg_cost_usd(&self, price: U256, wrapped_native_price: U256, msg: &EVM2EVMMessage) -> Result<U256>;
}

/// Source of raw gas price quotes.
#[async_trait]
pub trait FeeQuoter: Send + Sync + core::fmt::Debug {
    async fn quote(&self) -> Result<U256>;
}

/// Quotes `eth_gasPrice` from an alloy provider.
#[derive(Debug, Clone)]
pub struct ProviderFeeQuoter<P> {
    provider: P,
}

impl<P: Provider + Clone> ProviderFeeQuoter<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl<P: Provider + Clone + core::fmt::Debug> FeeQuoter for ProviderFeeQuoter<P> {
    async fn quote(&self) -> Result<U256> {
        let price = self
            .provider
            .get_gas_price()
            .await
            .map_err(|e| CcipDataError::Rpc(format!("Failed to get gas price: {}", e)))?;
        Ok(U256::from(price))
    }
}

/// Always quotes the same price.
#[derive(Debug, Clone, Copy)]
pub struct FixedFeeQuoter(pub U256);

#[async_trait]
impl FeeQuoter for FixedFeeQuoter {
    async fn quote(&self) -> Result<U256> {
        Ok(self.0)
    }
}

pub type SharedFeeQuoter = Arc<dyn FeeQuoter>;

/// `true` when `new` moved at least `deviation_ppb` parts per billion away
/// from `old`, or when there is no previous price.
pub fn deviates(old: U256, new: U256, deviation_ppb: u64) -> bool {
    if old.is_zero() {
        return true;
    }
    let diff = if new > old { new - old } else { old - new };
    let relative = diff.saturating_mul(U256::from(PPB_BASE)) / old;
    relative >= U256::from(deviation_ppb)
}

/// Middle element of the sorted prices. For an even count this is the
/// upper of the two middle values.
pub fn median(prices: &[U256]) -> Result<U256> {
    if prices.is_empty() {
        return Err(CcipDataError::EmptyInput("gas prices"));
    }
    let mut sorted = prices.to_vec();
    sorted.sort_unstable();
    Ok(sorted[sorted.len() / 2])
}

/// `price * usd_per_fee_coin / 1e18`
pub fn calculate_usd_per_unit_gas(price: U256, usd_per_fee_coin: U256) -> Result<U256> {
    price
        .checked_mul(usd_per_fee_coin)
        .map(|v| v / U256::from(USD_PRICE_BASE))
        .ok_or_else(|| CcipDataError::Overflow(format!("{} * {} USD", price, usd_per_fee_coin)))
}
