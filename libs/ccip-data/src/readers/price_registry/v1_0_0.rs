use std::sync::Arc;

use alloy_primitives::{Address, B256, U256};
use alloy_sol_types::SolEvent;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::event_cache::{filter_name, word_from_u64, AutoSyncCache, ChainHead, Confirmations, Log, LogFilter};
use common::interfaces::erc20::IERC20Metadata;
use common::interfaces::price_registry_v1_0_0::PriceRegistryV1_0_0;
use dashmap::DashMap;

use super::{COMMIT_PRICE_UPDATES, FEE_TOKEN_ADDED, FEE_TOKEN_REMOVED, GAS_UPDATE_DEST_CHAIN_TOPIC};
use crate::caller::{batch_call_contract, call_contract};
use crate::errors::{CcipDataError, Result};
use crate::factory::ChainContext;
use crate::logs::{decode_event, parse_logs};
use crate::readers::{at_or_after, finality, register_filters, release, PriceRegistryReader};
use crate::types::{Event, GasPrice, GasPriceUpdate, TokenPrice, TokenPriceUpdate};
use crate::version::V1_0_0;

pub fn filters(address: Address) -> Vec<LogFilter> {
    vec![
        LogFilter::new(
            filter_name(COMMIT_PRICE_UPDATES, address),
            vec![
                PriceRegistryV1_0_0::UsdPerTokenUpdated::SIGNATURE_HASH,
                PriceRegistryV1_0_0::UsdPerUnitGasUpdated::SIGNATURE_HASH,
            ],
            vec![address],
        ),
        LogFilter::new(
            filter_name(FEE_TOKEN_ADDED, address),
            vec![PriceRegistryV1_0_0::FeeTokenAdded::SIGNATURE_HASH],
            vec![address],
        ),
        LogFilter::new(
            filter_name(FEE_TOKEN_REMOVED, address),
            vec![PriceRegistryV1_0_0::FeeTokenRemoved::SIGNATURE_HASH],
            vec![address],
        ),
    ]
}

fn parse_token_update(log: &Log) -> Result<TokenPriceUpdate> {
    let event = decode_event::<PriceRegistryV1_0_0::UsdPerTokenUpdated>(log)?;
    Ok(TokenPriceUpdate {
        token_price: TokenPrice {
            token: event.token,
            value: event.value,
        },
        timestamp_unix_sec: event.timestamp,
    })
}

fn parse_gas_update(log: &Log) -> Result<GasPriceUpdate> {
    let event = decode_event::<PriceRegistryV1_0_0::UsdPerUnitGasUpdated>(log)?;
    Ok(GasPriceUpdate {
        gas_price: GasPrice {
            dest_chain_selector: event.destChain,
            value: event.value,
        },
        timestamp_unix_sec: event.timestamp,
    })
}

fn with_finality<T>(events: Vec<Event<T>>, head: &ChainHead) -> Vec<Event<T>> {
    events
        .into_iter()
        .map(|mut event| {
            event.meta.finality = finality(event.meta.block_number, head);
            event
        })
        .collect()
}

/// Price registry 1.0.0.
///
/// Fee tokens are cached until one is added or removed. Token decimals never
/// change and are cached for the reader's lifetime.
pub struct PriceRegistryReaderV1_0_0 {
    address: Address,
    ctx: ChainContext,
    filters: Vec<LogFilter>,
    fee_tokens: Arc<AutoSyncCache<Vec<Address>>>,
    decimals: DashMap<Address, u8>,
}

impl PriceRegistryReaderV1_0_0 {
    pub async fn new(address: Address, ctx: ChainContext) -> Result<Self> {
        let filters = filters(address);
        register_filters(ctx.store.as_ref(), &filters).await?;
        let fee_tokens = Arc::new(AutoSyncCache::new(
            address,
            vec![
                PriceRegistryV1_0_0::FeeTokenAdded::SIGNATURE_HASH,
                PriceRegistryV1_0_0::FeeTokenRemoved::SIGNATURE_HASH,
            ],
        ));
        ctx.registry.register(fee_tokens.clone());
        Ok(Self {
            address,
            ctx,
            filters,
            fee_tokens,
            decimals: DashMap::new(),
        })
    }

    pub(crate) fn context(&self) -> &ChainContext {
        &self.ctx
    }

    async fn price_updates_after<T>(
        &self,
        event_sig: B256,
        parse: fn(&Log) -> Result<T>,
        ts: DateTime<Utc>,
        confs: Confirmations,
    ) -> Result<Vec<Event<T>>> {
        let head = self.ctx.store.latest_block().await?;
        let logs = self
            .ctx
            .store
            .logs_created_after(event_sig, self.address, at_or_after(ts), confs)
            .await?;
        Ok(with_finality(parse_logs(&logs, parse)?, &head))
    }
}

#[async_trait]
impl PriceRegistryReader for PriceRegistryReaderV1_0_0 {
    fn address(&self) -> Address {
        self.address
    }

    fn version(&self) -> &'static str {
        V1_0_0
    }

    async fn get_fee_tokens(&self) -> Result<Vec<Address>> {
        self.fee_tokens
            .get(|| call_contract(self.ctx.caller.as_ref(), self.address, &PriceRegistryV1_0_0::getFeeTokensCall {}))
            .await
    }

    async fn get_token_prices(&self, tokens: &[Address]) -> Result<Vec<TokenPriceUpdate>> {
        if tokens.is_empty() {
            return Ok(Vec::new());
        }
        let prices = call_contract(
            self.ctx.caller.as_ref(),
            self.address,
            &PriceRegistryV1_0_0::getTokenPricesCall {
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
        self.price_updates_after(
            PriceRegistryV1_0_0::UsdPerTokenUpdated::SIGNATURE_HASH,
            parse_token_update,
            ts,
            confs,
        )
        .await
    }

    async fn get_gas_price_updates_created_after(
        &self,
        dest_chain_selector: u64,
        ts: DateTime<Utc>,
        confs: Confirmations,
    ) -> Result<Vec<Event<GasPriceUpdate>>> {
        let head = self.ctx.store.latest_block().await?;
        let logs = self
            .ctx
            .store
            .indexed_logs_created_after(
                PriceRegistryV1_0_0::UsdPerUnitGasUpdated::SIGNATURE_HASH,
                self.address,
                GAS_UPDATE_DEST_CHAIN_TOPIC,
                &[word_from_u64(dest_chain_selector)],
                at_or_after(ts),
                confs,
            )
            .await?;
        Ok(with_finality(parse_logs(&logs, parse_gas_update)?, &head))
    }

    async fn get_all_gas_price_updates_created_after(
        &self,
        ts: DateTime<Utc>,
        confs: Confirmations,
    ) -> Result<Vec<Event<GasPriceUpdate>>> {
        self.price_updates_after(
            PriceRegistryV1_0_0::UsdPerUnitGasUpdated::SIGNATURE_HASH,
            parse_gas_update,
            ts,
            confs,
        )
        .await
    }

    async fn get_tokens_decimals(&self, tokens: &[Address]) -> Result<Vec<u8>> {
        let mut missing: Vec<Address> = Vec::new();
        for token in tokens {
            if !self.decimals.contains_key(token) && !missing.contains(token) {
                missing.push(*token);
            }
        }

        if !missing.is_empty() {
            let calls = missing
                .iter()
                .map(|token| (*token, IERC20Metadata::decimalsCall {}))
                .collect();
            let fetched = batch_call_contract(self.ctx.caller.as_ref(), calls).await?;
            tracing::debug!(address = %self.address, tokens = missing.len(), "Fetched token decimals");
            for (token, decimals) in missing.into_iter().zip(fetched) {
                self.decimals.insert(token, decimals);
            }
        }

        tokens
            .iter()
            .map(|token| {
                self.decimals
                    .get(token)
                    .map(|d| *d)
                    .ok_or_else(|| CcipDataError::Abi(format!("no decimals for token {}", token)))
            })
            .collect()
    }

    async fn close(&self) -> Result<()> {
        release(self.ctx.store.as_ref(), &self.ctx.registry, self.address, &self.filters).await
    }
}
