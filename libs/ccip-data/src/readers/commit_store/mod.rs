//! Commit store readers.

mod v1_0_0;
mod v1_1_0;
mod v1_2_0;

use alloy_primitives::Address;

pub use v1_0_0::{filters as filters_v1_0_0, CommitStoreReaderV1_0_0};
pub use v1_1_0::CommitStoreReaderV1_1_0;
pub use v1_2_0::{filters as filters_v1_2_0, CommitStoreReaderV1_2_0};

use super::SharedGasPriceEstimator;
use crate::config::CommitOffchainConfig;

pub const EXEC_REPORT_ACCEPTS: &str = "Exec report accepts";

/// Data words of `ReportAccepted` holding the interval bounds.
pub(crate) const REPORT_INTERVAL_MIN_WORD: usize = 2;
pub(crate) const REPORT_INTERVAL_MAX_WORD: usize = 3;

/// Everything `change_config` swaps in at once.
#[derive(Debug, Clone)]
pub(crate) struct CommitConfigState {
    pub offchain: CommitOffchainConfig,
    pub estimator: SharedGasPriceEstimator,
    pub price_registry: Address,
}
