//! Version dispatch: reads a contract's self-description and builds (or
//! releases) the matching reader.

use std::sync::Arc;

use alloy_primitives::{Address, U256};
use common::event_cache::{CacheRegistry, EventStore, LogFilter};
use semver::Version;

use crate::caller::ContractCaller;
use crate::errors::{CcipDataError, Result};
use crate::prices::{FixedFeeQuoter, SharedFeeQuoter};
use crate::readers::{
    commit_store, offramp, onramp, price_registry, release, CommitStoreReader, CommitStoreReaderV1_0_0,
    CommitStoreReaderV1_1_0, CommitStoreReaderV1_2_0, OffRampReader, OffRampReaderV1_0_0, OffRampReaderV1_1_0,
    OffRampReaderV1_2_0, OnRampReader, OnRampReaderV1_0_0, OnRampReaderV1_1_0, OnRampReaderV1_2_0, PriceRegistryReader,
    PriceRegistryReaderV1_0_0, PriceRegistryReaderV1_2_0,
};
use crate::version::{verify_type_and_version, ContractType, V1_0_0, V1_1_0, V1_2_0};

/// Everything a reader needs to reach one chain.
#[derive(Clone)]
pub struct ChainContext {
    pub caller: Arc<dyn ContractCaller>,
    pub store: Arc<dyn EventStore>,
    pub registry: Arc<CacheRegistry>,
    /// Source of execution gas price quotes for estimators built by
    /// `change_config`
    pub fee_quoter: SharedFeeQuoter,
    /// Data availability quotes; `None` on chains without a DA fee
    pub da_fee_quoter: Option<SharedFeeQuoter>,
    /// Treat a reverting `typeAndVersion()` on a price registry as 1.0.0,
    /// which predates the accessor
    pub price_registry_revert_fallback: bool,
}

impl ChainContext {
    pub fn new(caller: Arc<dyn ContractCaller>, store: Arc<dyn EventStore>, registry: Arc<CacheRegistry>) -> Self {
        Self {
            caller,
            store,
            registry,
            fee_quoter: Arc::new(FixedFeeQuoter(U256::ZERO)),
            da_fee_quoter: None,
            price_registry_revert_fallback: true,
        }
    }

    pub fn with_fee_quoter(mut self, quoter: SharedFeeQuoter) -> Self {
        self.fee_quoter = quoter;
        self
    }

    pub fn with_da_fee_quoter(mut self, quoter: SharedFeeQuoter) -> Self {
        self.da_fee_quoter = Some(quoter);
        self
    }

    pub fn with_price_registry_revert_fallback(mut self, enabled: bool) -> Self {
        self.price_registry_revert_fallback = enabled;
        self
    }
}

impl core::fmt::Debug for ChainContext {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ChainContext")
            .field("registry", &self.registry)
            .field("fee_quoter", &self.fee_quoter)
            .field("da_fee_quoter", &self.da_fee_quoter)
            .field("price_registry_revert_fallback", &self.price_registry_revert_fallback)
            .finish_non_exhaustive()
    }
}

fn unsupported(contract: ContractType, version: &Version) -> CcipDataError {
    CcipDataError::UnsupportedVersion {
        contract,
        version: version.to_string(),
    }
}

async fn detect(ctx: &ChainContext, address: Address, contract: ContractType) -> Result<Version> {
    verify_type_and_version(ctx.caller.as_ref(), address, contract).await
}

async fn detect_price_registry(ctx: &ChainContext, address: Address) -> Result<Version> {
    match detect(ctx, address, ContractType::PriceRegistry).await {
        Err(e) if e.is_revert() && ctx.price_registry_revert_fallback => {
            tracing::warn!(%address, error = %e, "typeAndVersion reverted, assuming price registry {}", V1_0_0);
            Ok(Version::new(1, 0, 0))
        }
        other => other,
    }
}

pub async fn get_onramp_reader(address: Address, ctx: ChainContext) -> Result<Arc<dyn OnRampReader>> {
    let version = detect(&ctx, address, ContractType::OnRamp).await?;
    let reader: Arc<dyn OnRampReader> = match version.to_string().as_str() {
        V1_0_0 => Arc::new(OnRampReaderV1_0_0::new(address, ctx).await?),
        V1_1_0 => Arc::new(OnRampReaderV1_1_0::new(address, ctx).await?),
        V1_2_0 => Arc::new(OnRampReaderV1_2_0::new(address, ctx).await?),
        _ => return Err(unsupported(ContractType::OnRamp, &version)),
    };
    tracing::info!(%address, %version, "Created on-ramp reader");
    Ok(reader)
}

pub async fn get_commit_store_reader(address: Address, ctx: ChainContext) -> Result<Arc<dyn CommitStoreReader>> {
    let version = detect(&ctx, address, ContractType::CommitStore).await?;
    let reader: Arc<dyn CommitStoreReader> = match version.to_string().as_str() {
        V1_0_0 => Arc::new(CommitStoreReaderV1_0_0::new(address, ctx).await?),
        V1_1_0 => Arc::new(CommitStoreReaderV1_1_0::new(address, ctx).await?),
        V1_2_0 => Arc::new(CommitStoreReaderV1_2_0::new(address, ctx).await?),
        _ => return Err(unsupported(ContractType::CommitStore, &version)),
    };
    tracing::info!(%address, %version, "Created commit store reader");
    Ok(reader)
}

pub async fn get_offramp_reader(address: Address, ctx: ChainContext) -> Result<Arc<dyn OffRampReader>> {
    let version = detect(&ctx, address, ContractType::OffRamp).await?;
    let reader: Arc<dyn OffRampReader> = match version.to_string().as_str() {
        V1_0_0 => Arc::new(OffRampReaderV1_0_0::new(address, ctx).await?),
        V1_1_0 => Arc::new(OffRampReaderV1_1_0::new(address, ctx).await?),
        V1_2_0 => Arc::new(OffRampReaderV1_2_0::new(address, ctx).await?),
        _ => return Err(unsupported(ContractType::OffRamp, &version)),
    };
    tracing::info!(%address, %version, "Created off-ramp reader");
    Ok(reader)
}

pub async fn get_price_registry_reader(address: Address, ctx: ChainContext) -> Result<Arc<dyn PriceRegistryReader>> {
    let version = detect_price_registry(&ctx, address).await?;
    let reader: Arc<dyn PriceRegistryReader> = match version.to_string().as_str() {
        V1_0_0 => Arc::new(PriceRegistryReaderV1_0_0::new(address, ctx).await?),
        V1_2_0 => Arc::new(PriceRegistryReaderV1_2_0::new(address, ctx).await?),
        _ => return Err(unsupported(ContractType::PriceRegistry, &version)),
    };
    tracing::info!(%address, %version, "Created price registry reader");
    Ok(reader)
}

/// Releases the filters and caches a reader for `address` would hold,
/// without constructing one.
pub async fn close_onramp_reader(address: Address, ctx: &ChainContext) -> Result<()> {
    let version = detect(ctx, address, ContractType::OnRamp).await?;
    let filters = match version.to_string().as_str() {
        V1_0_0 => onramp::filters_v1_0_0(address),
        V1_1_0 => onramp::filters_v1_1_0(address),
        V1_2_0 => onramp::filters_v1_2_0(address),
        _ => return Err(unsupported(ContractType::OnRamp, &version)),
    };
    close_filters(ctx, address, &filters).await
}

pub async fn close_commit_store_reader(address: Address, ctx: &ChainContext) -> Result<()> {
    let version = detect(ctx, address, ContractType::CommitStore).await?;
    let filters = match version.to_string().as_str() {
        V1_0_0 | V1_1_0 => commit_store::filters_v1_0_0(address),
        V1_2_0 => commit_store::filters_v1_2_0(address),
        _ => return Err(unsupported(ContractType::CommitStore, &version)),
    };
    close_filters(ctx, address, &filters).await
}

pub async fn close_offramp_reader(address: Address, ctx: &ChainContext) -> Result<()> {
    let version = detect(ctx, address, ContractType::OffRamp).await?;
    match version.to_string().as_str() {
        V1_0_0 | V1_1_0 | V1_2_0 => close_filters(ctx, address, &offramp::filters(address)).await,
        _ => Err(unsupported(ContractType::OffRamp, &version)),
    }
}

pub async fn close_price_registry_reader(address: Address, ctx: &ChainContext) -> Result<()> {
    let version = detect_price_registry(ctx, address).await?;
    match version.to_string().as_str() {
        V1_0_0 | V1_2_0 => close_filters(ctx, address, &price_registry::filters(address)).await,
        _ => Err(unsupported(ContractType::PriceRegistry, &version)),
    }
}

async fn close_filters(ctx: &ChainContext, address: Address, filters: &[LogFilter]) -> Result<()> {
    release(ctx.store.as_ref(), &ctx.registry, address, filters).await
}
