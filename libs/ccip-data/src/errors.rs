use std::future::Future;

use alloy_primitives::Address;
use common::event_cache::EventStoreError;
use tokio_util::sync::CancellationToken;

use crate::caller::CallError;
use crate::version::ContractType;

/// Errors returned by readers, codecs and the version dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CcipDataError {
    /// Transport failure talking to the chain
    Rpc(String),
    /// The contract call reverted
    Reverted { address: Address, reason: String },
    /// Self-description string has fewer than two tokens
    MalformedVersionString(String),
    UnexpectedContractType { expected: ContractType, got: String },
    InvalidVersion { version: String, reason: String },
    UnsupportedVersion { contract: ContractType, version: String },
    /// Bytes decoded into the wrong structure for this schema version
    UnexpectedShape {
        what: &'static str,
        version: &'static str,
        reason: String,
    },
    Abi(String),
    /// Config failed validation, e.g. "must set SourceFinalityDepth"
    InvalidConfig(String),
    /// Config accessor called before `change_config`
    ConfigNotSet,
    EventStore(EventStoreError),
    /// Some logs in a batch failed to decode
    LogParse { failed: usize, total: usize },
    TooManyGasPrices(usize),
    /// Value does not fit its on-chain width
    Overflow(String),
    EmptyInput(&'static str),
    Cancelled,
}

impl core::fmt::Display for CcipDataError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            CcipDataError::Rpc(msg) => write!(f, "RPC error: {}", msg),
            CcipDataError::Reverted { address, reason } => {
                write!(f, "Call to {} reverted: {}", address, reason)
            }
            CcipDataError::MalformedVersionString(s) => {
                write!(f, "Malformed type and version string '{}'", s)
            }
            CcipDataError::UnexpectedContractType { expected, got } => {
                write!(f, "Expected contract type {} got {}", expected, got)
            }
            CcipDataError::InvalidVersion { version, reason } => {
                write!(f, "Invalid version '{}': {}", version, reason)
            }
            CcipDataError::UnsupportedVersion { contract, version } => {
                write!(f, "Unsupported {} version {}", contract, version)
            }
            CcipDataError::UnexpectedShape {
                what,
                version,
                reason,
            } => write!(f, "Unexpected {} shape for version {}: {}", what, version, reason),
            CcipDataError::Abi(msg) => write!(f, "ABI error: {}", msg),
            CcipDataError::InvalidConfig(msg) => write!(f, "Invalid config: {}", msg),
            CcipDataError::ConfigNotSet => write!(f, "Config not set"),
            CcipDataError::EventStore(e) => write!(f, "Event store error: {}", e),
            CcipDataError::LogParse { failed, total } => {
                write!(f, "{} of {} logs were not parsed", failed, total)
            }
            CcipDataError::TooManyGasPrices(n) => {
                write!(f, "Report carries {} gas prices, at most one is supported", n)
            }
            CcipDataError::Overflow(msg) => write!(f, "Overflow: {}", msg),
            CcipDataError::EmptyInput(what) => write!(f, "Empty input: {}", what),
            CcipDataError::Cancelled => write!(f, "Operation cancelled"),
        }
    }
}

impl std::error::Error for CcipDataError {}

impl From<EventStoreError> for CcipDataError {
    fn from(e: EventStoreError) -> Self {
        CcipDataError::EventStore(e)
    }
}

impl From<alloy_sol_types::Error> for CcipDataError {
    fn from(e: alloy_sol_types::Error) -> Self {
        CcipDataError::Abi(e.to_string())
    }
}

impl CcipDataError {
    pub(crate) fn from_call(address: Address, e: CallError) -> Self {
        match e {
            CallError::Reverted(reason) => CcipDataError::Reverted { address, reason },
            CallError::Transport(msg) => CcipDataError::Rpc(msg),
        }
    }

    pub fn is_revert(&self) -> bool {
        matches!(self, CcipDataError::Reverted { .. })
    }

    pub(crate) fn invalid_config(field: &str) -> Self {
        CcipDataError::InvalidConfig(format!("must set {}", field))
    }
}

pub type Result<T> = std::result::Result<T, CcipDataError>;

/// Runs `fut` until it completes or `cancel` fires.
///
/// On cancellation the future is dropped before it finishes, so any state it
/// would have swapped in is never applied.
pub async fn with_cancellation<T, F>(cancel: &CancellationToken, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(CcipDataError::Cancelled),
        res = fut => res,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_names_both_types() {
        let err = CcipDataError::UnexpectedContractType {
            expected: ContractType::CommitStore,
            got: "EVM2EVMOffRamp".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("CommitStore"));
        assert!(msg.contains("EVM2EVMOffRamp"));
    }

    #[test]
    fn test_from_call_keeps_revert() {
        let err = CcipDataError::from_call(Address::ZERO, CallError::Reverted("execution reverted".into()));
        assert!(err.is_revert());

        let err = CcipDataError::from_call(Address::ZERO, CallError::Transport("timeout".into()));
        assert_eq!(err, CcipDataError::Rpc("timeout".into()));
    }

    #[tokio::test]
    async fn test_with_cancellation() {
        let cancel = CancellationToken::new();
        assert_eq!(with_cancellation(&cancel, async { Ok(1) }).await, Ok(1));

        cancel.cancel();
        let res: Result<u32> = with_cancellation(&cancel, std::future::pending()).await;
        assert_eq!(res, Err(CcipDataError::Cancelled));
    }
}
