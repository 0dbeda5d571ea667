use alloy_primitives::{Address, U256};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::event_cache::Confirmations;
use common::interfaces::price_registry_v1_2_0::PriceRegistryV1_2_0;

use super::PriceRegistryReaderV1_0_0;
use crate::caller::call_contract;
use crate::errors::{CcipDataError, Result};
use crate::factory::ChainContext;
use crate::readers::PriceRegistryReader;
use crate::types::{Event, GasPriceUpdate, TokenPrice, TokenPriceUpdate};
use crate::version::V1_2_0;

/// Price registry 1.2.0. Prices are packed as 224-bit values with 32-bit
/// timestamps; events are unchanged.
pub struct PriceRegistryReaderV1_2_0 {
    inner: PriceRegistryReaderV1_0_0,
}

impl PriceRegistryReaderV1_2_0 {
    pub async fn new(address: Address, ctx: ChainContext) -> Result<Self> {
        Ok(Self {
            inner: PriceRegistryReaderV1_0_0::new(address, ctx).await?,
        })
    }
}

#[async_trait]
impl PriceRegistryReader for PriceRegistryReaderV1_2_0 {
    fn address(&self) -> Address {
        self.inner.address()
    }

    fn version(&self) -> &'static str {
        V1_2_0
    }

    async fn get_fee_tokens(&self) -> Result<Vec<Address>> {
        self.inner.get_fee_tokens().await
    }

    async fn get_token_prices(&self, tokens: &[Address]) -> Result<Vec<TokenPriceUpdate>> {
        if tokens.is_empty() {
            return Ok(Vec::new());
        }
        let prices = call_contract(
            self.inner.context().caller.as_ref(),
            self.address(),
            &PriceRegistryV1_2_0::getTokenPricesCall {
                tokens: tokens.to_vec(),
            },
        )
        .await?;
        if prices.len() != tokens.len() {
            return Err(CcipDataError::Abi(format!(
                "{} prices returned for {} tokens",
                prices.len(),
                tokens.len()
            )));
        }

        Ok(tokens
            .iter()
            .zip(prices)
            .map(|(token, price)| TokenPriceUpdate {
                token_price: TokenPrice {
                    token: *token,
                    value: U256::from(price.value),
                },
                timestamp_unix_sec: U256::from(price.timestamp),
            })
            .collect())
    }

    async fn get_token_price_updates_created_after(
        &self,
        ts: DateTime<Utc>,
        confs: Confirmations,
    ) -> Result<Vec<Event<TokenPriceUpdate>>> {
        self.inner.get_token_price_updates_created_after(ts, confs).await
    }

    async fn get_gas_price_updates_created_after(
        &self,
        dest_chain_selector: u64,
        ts: DateTime<Utc>,
        confs: Confirmations,
    ) -> Result<Vec<Event<GasPriceUpdate>>> {
        self.inner
            .get_gas_price_updates_created_after(dest_chain_selector, ts, confs)
            .await
    }

    async fn get_all_gas_price_updates_created_after(
        &self,
        ts: DateTime<Utc>,
        confs: Confirmations,
    ) -> Result<Vec<Event<GasPriceUpdate>>> {
        self.inner.get_all_gas_price_updates_created_after(ts, confs).await
    }

    async fn get_tokens_decimals(&self, tokens: &[Address]) -> Result<Vec<u8>> {
        self.inner.get_tokens_decimals(tokens).await
    }

    async fn close(&self) -> Result<()> {
        self.inner.close().await
    }
}
