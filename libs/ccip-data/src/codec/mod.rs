//! Per-version commit and execution report codecs.

mod v1_0_0;
mod v1_1_0;
mod v1_2_0;

use alloy_primitives::Bytes;

pub use v1_0_0::{CommitReportCodecV1_0_0, ExecReportCodecV1_0_0};
pub use v1_1_0::{CommitReportCodecV1_1_0, ExecReportCodecV1_1_0};
pub use v1_2_0::{CommitReportCodecV1_2_0, ExecReportCodecV1_2_0};

use crate::errors::{CcipDataError, Result};
use crate::types::{CommitStoreReport, ExecReport};

/// `decode(encode(r)) == r` for every report the version can represent.
pub trait CommitReportCodec: Send + Sync {
    fn encode_commit_report(&self, report: &CommitStoreReport) -> Result<Bytes>;

    fn decode_commit_report(&self, encoded: &[u8]) -> Result<CommitStoreReport>;
}

pub trait ExecReportCodec: Send + Sync {
    fn encode_execution_report(&self, report: &ExecReport) -> Result<Bytes>;

    fn decode_execution_report(&self, encoded: &[u8]) -> Result<ExecReport>;
}

pub(crate) fn shape_error(what: &'static str, version: &'static str, reason: impl ToString) -> CcipDataError {
    CcipDataError::UnexpectedShape {
        what,
        version,
        reason: reason.to_string(),
    }
}

pub(crate) fn narrow<T>(value: alloy_primitives::U256, what: &str) -> Result<T>
where
    alloy_primitives::U256: alloy_primitives::ruint::UintTryTo<T>,
{
    use alloy_primitives::ruint::UintTryTo;
    value
        .uint_try_to()
        .map_err(|_| CcipDataError::Overflow(format!("{} {} does not fit its on-chain width", what, value)))
}
