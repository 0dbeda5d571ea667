use alloy_primitives::Bytes;

use super::{CommitReportCodec, CommitReportCodecV1_0_0, ExecReportCodec, ExecReportCodecV1_0_0};
use crate::errors::Result;
use crate::types::{CommitStoreReport, ExecReport};

/// 1.1.0 kept the 1.0.0 commit report layout.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommitReportCodecV1_1_0 {
    inner: CommitReportCodecV1_0_0,
}

impl CommitReportCodec for CommitReportCodecV1_1_0 {
    fn encode_commit_report(&self, report: &CommitStoreReport) -> Result<Bytes> {
        self.inner.encode_commit_report(report)
    }

    fn decode_commit_report(&self, encoded: &[u8]) -> Result<CommitStoreReport> {
        self.inner.decode_commit_report(encoded)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ExecReportCodecV1_1_0 {
    inner: ExecReportCodecV1_0_0,
}

impl ExecReportCodec for ExecReportCodecV1_1_0 {
    fn encode_execution_report(&self, report: &ExecReport) -> Result<Bytes> {
        self.inner.encode_execution_report(report)
    }

    fn decode_execution_report(&self, encoded: &[u8]) -> Result<ExecReport> {
        self.inner.decode_execution_report(encoded)
    }
}
