//! Reader process settings, loaded from JSON with environment overrides.

use std::path::Path;

use alloy_primitives::Address;
use common::event_cache::{Confirmations, DEFAULT_POLL_INTERVAL_SECS, DEFAULT_SNAPSHOT_PATH, SNAPSHOT_PATH_ENV_VAR};
use common::interfaces::multicall::MULTICALL3_ADDRESS;
use serde::{Deserialize, Serialize};

pub const RPC_URL_ENV_VAR: &str = "CCIP_RPC_URL";
pub const POLL_INTERVAL_ENV_VAR: &str = "CCIP_POLL_INTERVAL_SECS";
pub const CONFIRMATIONS_ENV_VAR: &str = "CCIP_CONFIRMATIONS";
pub const MULTICALL_ENV_VAR: &str = "CCIP_MULTICALL_ADDRESS";
pub const PRICE_REGISTRY_FALLBACK_ENV_VAR: &str = "CCIP_PRICE_REGISTRY_FALLBACK";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderSettings {
    pub rpc_url: String,
    pub poll_interval_secs: u64,
    /// Block confirmations for log queries; `None` waits for finality
    pub confirmations: Option<u64>,
    pub snapshot_path: String,
    pub multicall_address: Address,
    /// First block to index when no snapshot exists
    pub start_block: u64,
    pub price_registry_revert_fallback: bool,
}

impl Default for ReaderSettings {
    fn default() -> Self {
        Self {
            rpc_url: "http://localhost:8545".to_string(),
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            confirmations: None,
            snapshot_path: DEFAULT_SNAPSHOT_PATH.to_string(),
            multicall_address: MULTICALL3_ADDRESS,
            start_block: 0,
            price_registry_revert_fallback: true,
        }
    }
}

impl ReaderSettings {
    pub async fn load_from_file(path: &Path) -> eyre::Result<Self> {
        let contents = tokio::fs::read_to_string(path).await?;
        let settings: Self = serde_json::from_str(&contents)?;
        Ok(settings)
    }

    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Applies overrides from `lookup`. Values that fail to parse are
    /// ignored with a warning.
    pub fn with_overrides_from<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(RPC_URL_ENV_VAR) {
            self.rpc_url = url;
        }
        if let Some(path) = lookup(SNAPSHOT_PATH_ENV_VAR) {
            self.snapshot_path = path;
        }
        if let Some(value) = lookup(POLL_INTERVAL_ENV_VAR) {
            match value.parse() {
                Ok(secs) => self.poll_interval_secs = secs,
                Err(_) => tracing::warn!(%value, "Ignoring invalid {}", POLL_INTERVAL_ENV_VAR),
            }
        }
        if let Some(value) = lookup(CONFIRMATIONS_ENV_VAR) {
            if value.eq_ignore_ascii_case("finalized") {
                self.confirmations = None;
            } else {
                match value.parse() {
                    Ok(blocks) => self.confirmations = Some(blocks),
                    Err(_) => tracing::warn!(%value, "Ignoring invalid {}", CONFIRMATIONS_ENV_VAR),
                }
            }
        }
        if let Some(value) = lookup(MULTICALL_ENV_VAR) {
            match value.parse() {
                Ok(address) => self.multicall_address = address,
                Err(_) => tracing::warn!(%value, "Ignoring invalid {}", MULTICALL_ENV_VAR),
            }
        }
        if let Some(value) = lookup(PRICE_REGISTRY_FALLBACK_ENV_VAR) {
            match value.parse() {
                Ok(enabled) => self.price_registry_revert_fallback = enabled,
                Err(_) => tracing::warn!(%value, "Ignoring invalid {}", PRICE_REGISTRY_FALLBACK_ENV_VAR),
            }
        }
        self
    }

    pub fn confirmations(&self) -> Confirmations {
        match self.confirmations {
            Some(blocks) => Confirmations::Blocks(blocks),
            None => Confirmations::Finalized,
        }
    }
}
