use alloy_primitives::U256;
use async_trait::async_trait;

use super::exec::ExecGasPriceEstimator;
use super::{calculate_usd_per_unit_gas, deviates, median, GasPriceEstimator, SharedFeeQuoter};
use crate::errors::{CcipDataError, Result};
use crate::types::EVM2EVMMessage;

/// Bits per half of a packed `(da, exec)` gas price
pub const PRICE_ENCODING_LENGTH: usize = 112;
pub const DA_MULTIPLIER_BASE: u64 = 10_000;

/// Fixed size of an ABI-encoded message without payload or tokens
const EVM_MESSAGE_FIXED_BYTES: u64 = 448;
const EVM_MESSAGE_BYTES_PER_TOKEN: u64 = 128;

/// Data availability pricing taken from the on-ramp dynamic config.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DaCostParams {
    pub overhead_gas: u64,
    pub gas_per_byte: u64,
    pub multiplier_bps: u64,
}

/// Estimator for rollups, where a message also pays for posting its data to
/// L1.
///
/// Prices are packed as `da << 112 | exec`. A chain without a data
/// availability component simply has a zero upper half.
#[derive(Debug, Clone)]
pub struct DaGasPriceEstimator {
    exec: ExecGasPriceEstimator,
    da_quoter: Option<SharedFeeQuoter>,
    da_deviation_ppb: u64,
    params: DaCostParams,
}

impl DaGasPriceEstimator {
    pub fn new(exec: ExecGasPriceEstimator, da_quoter: Option<SharedFeeQuoter>, da_deviation_ppb: u64) -> Self {
        Self {
            exec,
            da_quoter,
            da_deviation_ppb,
            params: DaCostParams::default(),
        }
    }

    pub fn with_cost_params(mut self, params: DaCostParams) -> Self {
        self.params = params;
        self
    }

    pub fn exec_estimator(&self) -> &ExecGasPriceEstimator {
        &self.exec
    }

    pub fn da_deviation_ppb(&self) -> u64 {
        self.da_deviation_ppb
    }

    pub fn encode(da_price: U256, exec_price: U256) -> Result<U256> {
        if exec_price.bit_len() > PRICE_ENCODING_LENGTH {
            return Err(CcipDataError::Overflow(format!(
                "exec gas price {} exceeds {} bits",
                exec_price, PRICE_ENCODING_LENGTH
            )));
        }
        if da_price.bit_len() > PRICE_ENCODING_LENGTH {
            return Err(CcipDataError::Overflow(format!(
                "data availability gas price {} exceeds {} bits",
                da_price, PRICE_ENCODING_LENGTH
            )));
        }
        Ok((da_price << PRICE_ENCODING_LENGTH) | exec_price)
    }

    /// Splits a packed price into `(da, exec)`.
    pub fn parse(price: U256) -> Result<(U256, U256)> {
        if price.bit_len() > 2 * PRICE_ENCODING_LENGTH {
            return Err(CcipDataError::Overflow(format!(
                "packed gas price {} exceeds {} bits",
                price,
                2 * PRICE_ENCODING_LENGTH
            )));
        }
        let mask = (U256::from(1) << PRICE_ENCODING_LENGTH) - U256::from(1);
        Ok((price >> PRICE_ENCODING_LENGTH, price & mask))
    }

    fn estimate_da_cost_usd(&self, da_price: U256, wrapped_native_price: U256, msg: &EVM2EVMMessage) -> Result<U256> {
        let source_token_data_len: u64 = msg.source_token_data.iter().map(|d| d.len() as u64).sum();
        let data_len = EVM_MESSAGE_FIXED_BYTES
            + msg.data.len() as u64
            + EVM_MESSAGE_BYTES_PER_TOKEN * msg.token_amounts.len() as u64
            + source_token_data_len;
        let data_gas = U256::from(data_len) * U256::from(self.params.gas_per_byte) + U256::from(self.params.overhead_gas);

        let estimate = data_gas
            .checked_mul(da_price)
            .and_then(|v| v.checked_mul(U256::from(self.params.multiplier_bps)))
            .ok_or_else(|| CcipDataError::Overflow(format!("{} data gas at {}", data_gas, da_price)))?
            / U256::from(DA_MULTIPLIER_BASE);
        calculate_usd_per_unit_gas(estimate, wrapped_native_price)
    }
}

#[async_trait]
impl GasPriceEstimator for DaGasPriceEstimator {
    async fn get_gas_price(&self) -> Result<U256> {
        let exec_price = self.exec.get_gas_price().await?;
        let da_price = match &self.da_quoter {
            Some(quoter) => quoter.quote().await?,
            None => U256::ZERO,
        };
        Self::encode(da_price, exec_price)
    }

    fn denote_in_usd(&self, price: U256, wrapped_native_price: U256) -> Result<U256> {
        let (da_price, exec_price) = Self::parse(price)?;
        let da_usd = calculate_usd_per_unit_gas(da_price, wrapped_native_price)?;
        let exec_usd = calculate_usd_per_unit_gas(exec_price, wrapped_native_price)?;
        Self::encode(da_usd, exec_usd)
    }

    /// Medians of each half, taken independently.
    fn median(&self, prices: &[U256]) -> Result<U256> {
        let mut da_prices = Vec::with_capacity(prices.len());
        let mut exec_prices = Vec::with_capacity(prices.len());
        for price in prices {
            let (da_price, exec_price) = Self::parse(*price)?;
            da_prices.push(da_price);
            exec_prices.push(exec_price);
        }
        Self::encode(median(&da_prices)?, median(&exec_prices)?)
    }

    fn deviates(&self, old: U256, new: U256) -> Result<bool> {
        let (old_da, old_exec) = Self::parse(old)?;
        let (new_da, new_exec) = Self::parse(new)?;

        if deviates(old_exec, new_exec, self.exec.deviation_ppb()) {
            return Ok(true);
        }
        // No data availability component on either side
        if old_da.is_zero() && new_da.is_zero() {
            return Ok(false);
        }
        Ok(deviates(old_da, new_da, self.da_deviation_ppb))
    }

    fn estimate_msg_cost_usd(&self, price: U256, wrapped_native_price: U256, msg: &EVM2EVMMessage) -> Result<U256> {
        let (da_price, exec_price) = Self::parse(price)?;
        let exec_cost = self.exec.estimate_msg_cost_usd(exec_price, wrapped_native_price, msg)?;
        if da_price.is_zero() {
            return Ok(exec_cost);
        }
        let da_cost = self.estimate_da_cost_usd(da_price, wrapped_native_price, msg)?;
        Ok(exec_cost.saturating_add(da_cost))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use alloy_primitives::Bytes;

    use super::*;
    use crate::prices::{FixedFeeQuoter, USD_PRICE_BASE};

    const PPB_1_PERCENT: u64 = 10_000_000;

    fn estimator(exec_quote: u64, da_quote: Option<u64>) -> DaGasPriceEstimator {
        let exec = ExecGasPriceEstimator::new(Arc::new(FixedFeeQuoter(U256::from(exec_quote))), U256::MAX, PPB_1_PERCENT);
        let da = da_quote.map(|q| Arc::new(FixedFeeQuoter(U256::from(q))) as SharedFeeQuoter);
        DaGasPriceEstimator::new(exec, da, 2 * PPB_1_PERCENT)
    }

    #[test]
    fn test_encode_and_parse() {
        let packed = DaGasPriceEstimator::encode(U256::from(7), U256::from(9)).unwrap();
        assert_eq!(packed, (U256::from(7) << 112) + U256::from(9));
        assert_eq!(DaGasPriceEstimator::parse(packed).unwrap(), (U256::from(7), U256::from(9)));

        let too_wide = U256::from(1) << 112;
        assert!(DaGasPriceEstimator::encode(U256::ZERO, too_wide).is_err());
        assert!(DaGasPriceEstimator::encode(too_wide, U256::ZERO).is_err());
        assert!(DaGasPriceEstimator::parse(U256::from(1) << 224).is_err());
    }

    #[tokio::test]
    async fn test_get_gas_price_packs_quotes() {
        assert_eq!(estimator(9, None).get_gas_price().await.unwrap(), U256::from(9));
        assert_eq!(
            estimator(9, Some(7)).get_gas_price().await.unwrap(),
            DaGasPriceEstimator::encode(U256::from(7), U256::from(9)).unwrap()
        );
    }

    #[test]
    fn test_deviation_per_half() {
        let estimator = estimator(0, None);
        let pack = |da: u64, exec: u64| DaGasPriceEstimator::encode(U256::from(da), U256::from(exec)).unwrap();

        // Exec moved 1%
        assert!(estimator.deviates(pack(1_000, 1_000), pack(1_000, 1_010)).unwrap());
        // DA moved 1%, under its 2% threshold
        assert!(!estimator.deviates(pack(1_000, 1_000), pack(1_010, 1_000)).unwrap());
        // DA moved 2%
        assert!(estimator.deviates(pack(1_000, 1_000), pack(1_020, 1_000)).unwrap());
        // No DA component at all
        assert!(!estimator.deviates(pack(0, 1_000), pack(0, 1_001)).unwrap());
    }

    #[test]
    fn test_median_per_half() {
        let estimator = estimator(0, None);
        let pack = |da: u64, exec: u64| DaGasPriceEstimator::encode(U256::from(da), U256::from(exec)).unwrap();
        let median = estimator.median(&[pack(1, 30), pack(3, 10), pack(2, 20)]).unwrap();
        assert_eq!(median, pack(2, 20));
    }

    #[test]
    fn test_denote_in_usd_per_half() {
        let estimator = estimator(0, None);
        let native = U256::from(2) * U256::from(USD_PRICE_BASE);
        let packed = DaGasPriceEstimator::encode(U256::from(5), U256::from(7)).unwrap();
        let usd = estimator.denote_in_usd(packed, native).unwrap();
        assert_eq!(DaGasPriceEstimator::parse(usd).unwrap(), (U256::from(10), U256::from(14)));
    }

    #[test]
    fn test_msg_cost_adds_data_availability() {
        let estimator = estimator(0, None).with_cost_params(DaCostParams {
            overhead_gas: 1_000,
            gas_per_byte: 16,
            multiplier_bps: 5_000,
        });
        let msg = EVM2EVMMessage {
            gas_limit: U256::from(100_000),
            data: Bytes::from(vec![0u8; 52]),
            source_token_data: vec![],
            ..Default::default()
        };
        let native = U256::from(USD_PRICE_BASE);

        let exec_only = estimator
            .estimate_msg_cost_usd(DaGasPriceEstimator::encode(U256::ZERO, U256::from(1)).unwrap(), native, &msg)
            .unwrap();
        assert_eq!(exec_only, U256::from(300_000 + 16 * 52));

        // (448 + 52) bytes * 16 + 1_000 = 9_000 gas, at price 2, halved
        let with_da = estimator
            .estimate_msg_cost_usd(DaGasPriceEstimator::encode(U256::from(2), U256::from(1)).unwrap(), native, &msg)
            .unwrap();
        assert_eq!(with_da, exec_only + U256::from(9_000));
    }
}
