//! Off-ramp readers.

mod v1_0_0;
mod v1_1_0;
mod v1_2_0;

pub use v1_0_0::{filters, OffRampReaderV1_0_0};
pub use v1_1_0::OffRampReaderV1_1_0;
pub use v1_2_0::OffRampReaderV1_2_0;

use super::SharedGasPriceEstimator;
use crate::config::{ExecOffchainConfig, ExecOnchainConfig};

pub const EXEC_EXECUTION_STATE_CHANGES: &str = "Exec execution state changes";
pub const TOKEN_POOL_ADDED: &str = "Token pool added";
pub const TOKEN_POOL_REMOVED: &str = "Token pool removed";

/// Topic of `ExecutionStateChanged` holding the sequence number.
pub(crate) const EXECUTION_STATE_SEQ_NUM_TOPIC: usize = 1;

#[derive(Debug, Clone)]
pub(crate) struct ExecConfigState {
    pub offchain: ExecOffchainConfig,
    pub onchain: ExecOnchainConfig,
    pub estimator: SharedGasPriceEstimator,
}
