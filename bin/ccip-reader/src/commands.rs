use std::sync::Arc;

use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy_primitives::{Address, Bytes};
use ccip_data::caller::ProviderCaller;
use ccip_data::errors::with_cancellation;
use ccip_data::factory::{get_commit_store_reader, get_offramp_reader};
use ccip_data::rate_limiter::RateLimiterState;
use ccip_data::settings::ReaderSettings;
use ccip_data::version::read_type_and_version;
use ccip_data::ChainContext;
use common::event_cache::{
    CacheRegistry, Confirmations, InMemoryEventStore, IndexerConfig, LogIndexer, LogWatcher, SnapshotConfig,
    SnapshotManager, WatcherConfig,
};
use eyre::Result;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

/// One chain's reader stack: contract calls, the log store and its watcher.
pub struct Lane {
    ctx: ChainContext,
    watcher: LogWatcher<DynProvider>,
    confirmations: Confirmations,
}

#[derive(Debug, Serialize)]
struct RateLimiterView {
    state: RateLimiterState,
    now: u64,
    available: u128,
}

impl Lane {
    pub fn connect(settings: &ReaderSettings) -> Result<Self> {
        let provider = ProviderBuilder::new()
            .connect_http(settings.rpc_url.parse()?)
            .erased();

        let registry = Arc::new(CacheRegistry::new());
        let snapshots = SnapshotManager::new(SnapshotConfig::new(settings.snapshot_path.clone()));
        let store = Arc::new(InMemoryEventStore::from_snapshot(
            snapshots.load_or_default(),
            Some(registry.clone()),
        ));
        tracing::info!(logs = store.log_count(), "Event store restored");

        let caller = Arc::new(ProviderCaller::new(provider.clone()).with_multicall(settings.multicall_address));
        let ctx = ChainContext::new(caller, store.clone(), registry)
            .with_price_registry_revert_fallback(settings.price_registry_revert_fallback);

        let indexer = LogIndexer::new(provider, IndexerConfig::default().with_start_block(settings.start_block));
        let watcher = LogWatcher::new(
            WatcherConfig::default().with_poll_interval(settings.poll_interval_secs),
            indexer,
            store,
        )
        .with_snapshots(snapshots);

        Ok(Self {
            ctx,
            watcher,
            confirmations: settings.confirmations(),
        })
    }

    pub async fn type_and_version(&self, address: Address) -> Result<()> {
        let type_and_version = read_type_and_version(self.ctx.caller.as_ref(), address).await?;
        println!("{}", type_and_version);
        Ok(())
    }

    pub async fn commit_reports(&self, address: Address, seq_num: u64) -> Result<()> {
        let reader = get_commit_store_reader(address, self.ctx.clone()).await?;

        let sync = self.watcher.poll_once().await?;
        tracing::info!(%sync, "Initial log sync done");

        let cancel = CancellationToken::new();
        let watcher = self.watcher.spawn(cancel.clone());
        cancel_on_ctrl_c(cancel.clone());

        let reports = with_cancellation(
            &cancel,
            reader.get_commit_reports_matching_seq_num(seq_num, self.confirmations),
        )
        .await;

        cancel.cancel();
        watcher.await?;
        reader.close().await?;

        let reports = reports?;
        if reports.is_empty() {
            tracing::warn!(%address, seq_num, "No commit report covers sequence number");
        }
        println!("{}", serde_json::to_string_pretty(&reports)?);
        Ok(())
    }

    pub async fn rate_limiter(&self, address: Address) -> Result<()> {
        let reader = get_offramp_reader(address, self.ctx.clone()).await?;
        let state = reader.current_rate_limiter_state().await;
        reader.close().await?;
        let state = state?;

        let now = u64::try_from(chrono::Utc::now().timestamp())?;
        let view = RateLimiterView {
            state,
            now,
            available: state.tokens_at(now),
        };
        println!("{}", serde_json::to_string_pretty(&view)?);
        Ok(())
    }

    pub async fn decode_commit_report(&self, address: Address, encoded: &Bytes) -> Result<()> {
        let reader = get_commit_store_reader(address, self.ctx.clone()).await?;
        let report = reader.decode_commit_report(encoded);
        reader.close().await?;

        println!("{}", serde_json::to_string_pretty(&report?)?);
        Ok(())
    }
}

fn cancel_on_ctrl_c(cancel: CancellationToken) {
    tokio::spawn(async move {
        tokio::select! {
            _ = cancel.cancelled() => {}
            res = tokio::signal::ctrl_c() => {
                if res.is_ok() {
                    tracing::info!("Interrupted, stopping");
                    cancel.cancel();
                }
            }
        }
    });
}
