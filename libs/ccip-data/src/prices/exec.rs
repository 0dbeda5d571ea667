use alloy_primitives::U256;
use async_trait::async_trait;

use super::{calculate_usd_per_unit_gas, deviates, median, GasPriceEstimator, SharedFeeQuoter};
use crate::errors::{CcipDataError, Result};
use crate::types::EVM2EVMMessage;

/// Fixed gas added on top of the message gas limit
pub const FEE_BOOSTING_OVERHEAD_GAS: u64 = 200_000;
pub const EXEC_GAS_PER_PAYLOAD_BYTE: u64 = 16;
pub const EXEC_GAS_PER_TOKEN: u64 = 10_000;

/// Estimator for chains where execution gas is the only cost.
#[derive(Debug, Clone)]
pub struct ExecGasPriceEstimator {
    quoter: SharedFeeQuoter,
    max_gas_price: U256,
    deviation_ppb: u64,
}

impl ExecGasPriceEstimator {
    pub fn new(quoter: SharedFeeQuoter, max_gas_price: U256, deviation_ppb: u64) -> Self {
        Self {
            quoter,
            max_gas_price,
            deviation_ppb,
        }
    }

    pub fn max_gas_price(&self) -> U256 {
        self.max_gas_price
    }

    pub fn deviation_ppb(&self) -> u64 {
        self.deviation_ppb
    }

    pub(crate) fn exec_gas_amount(msg: &EVM2EVMMessage) -> Result<U256> {
        let overhead = FEE_BOOSTING_OVERHEAD_GAS
            + EXEC_GAS_PER_PAYLOAD_BYTE * msg.data.len() as u64
            + EXEC_GAS_PER_TOKEN * msg.token_amounts.len() as u64;
        msg.gas_limit
            .checked_add(U256::from(overhead))
            .ok_or_else(|| CcipDataError::Overflow(format!("gas limit {}", msg.gas_limit)))
    }
}

#[async_trait]
impl GasPriceEstimator for ExecGasPriceEstimator {
    async fn get_gas_price(&self) -> Result<U256> {
        let quote = self.quoter.quote().await?;
        if quote > self.max_gas_price {
            tracing::debug!(%quote, max = %self.max_gas_price, "Gas price above maximum, capping");
            return Ok(self.max_gas_price);
        }
        Ok(quote)
    }

    fn denote_in_usd(&self, price: U256, wrapped_native_price: U256) -> Result<U256> {
        calculate_usd_per_unit_gas(price, wrapped_native_price)
    }

    fn median(&self, prices: &[U256]) -> Result<U256> {
        median(prices)
    }

    fn deviates(&self, old: U256, new: U256) -> Result<bool> {
        Ok(deviates(old, new, self.deviation_ppb))
    }

    fn estimate_msg_cost_usd(&self, price: U256, wrapped_native_price: U256, msg: &EVM2EVMMessage) -> Result<U256> {
        let gas = Self::exec_gas_amount(msg)?;
        let cost = gas
            .checked_mul(price)
            .ok_or_else(|| CcipDataError::Overflow(format!("{} gas at {}", gas, price)))?;
        calculate_usd_per_unit_gas(cost, wrapped_native_price)
    }
}
