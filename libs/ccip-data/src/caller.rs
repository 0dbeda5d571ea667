//! Read-only contract call collaborator.
//!
//! Readers never talk to a provider directly; they go through
//! [`ContractCaller`], which tests replace with a table-driven mock.

use alloy::providers::Provider;
use alloy::rpc::types::TransactionRequest;
use alloy_primitives::{Address, Bytes};
use alloy_sol_types::SolCall;
use async_trait::async_trait;
use common::interfaces::multicall::{IMulticall3, MULTICALL3_ADDRESS};
use futures_util::future::join_all;

use crate::errors::{CcipDataError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallError {
    /// The EVM reverted the call
    Reverted(String),
    /// The request never produced an EVM result
    Transport(String),
}

impl core::fmt::Display for CallError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            CallError::Reverted(reason) => write!(f, "reverted: {}", reason),
            CallError::Transport(msg) => write!(f, "transport error: {}", msg),
        }
    }
}

impl std::error::Error for CallError {}

#[async_trait]
pub trait ContractCaller: Send + Sync {
    async fn call(&self, to: Address, calldata: Bytes) -> std::result::Result<Bytes, CallError>;

    /// Executes several calls. The outer error means the batch itself
    /// failed; inner errors are per call.
    async fn batch_call(
        &self,
        calls: Vec<(Address, Bytes)>,
    ) -> std::result::Result<Vec<std::result::Result<Bytes, CallError>>, CallError> {
        Ok(join_all(calls.into_iter().map(|(to, data)| self.call(to, data))).await)
    }
}

/// Encodes `call`, executes it against `to` and decodes the return value.
pub async fn call_contract<C: SolCall>(caller: &dyn ContractCaller, to: Address, call: &C) -> Result<C::Return> {
    let output = caller
        .call(to, call.abi_encode().into())
        .await
        .map_err(|e| CcipDataError::from_call(to, e))?;
    C::abi_decode_returns(&output).map_err(|e| CcipDataError::Abi(format!("{} from {}: {}", C::SIGNATURE, to, e)))
}

/// Executes many calls of the same function as one batch. Fails if any
/// single call fails.
pub async fn batch_call_contract<C: SolCall>(
    caller: &dyn ContractCaller,
    calls: Vec<(Address, C)>,
) -> Result<Vec<C::Return>> {
    if calls.is_empty() {
        return Ok(Vec::new());
    }
    let targets: Vec<Address> = calls.iter().map(|(to, _)| *to).collect();
    let encoded = calls
        .iter()
        .map(|(to, call)| (*to, Bytes::from(call.abi_encode())))
        .collect();

    let results = caller
        .batch_call(encoded)
        .await
        .map_err(|e| CcipDataError::Rpc(format!("batch of {}: {}", C::SIGNATURE, e)))?;
    if results.len() != targets.len() {
        return Err(CcipDataError::Rpc(format!(
            "batch of {} returned {} results for {} calls",
            C::SIGNATURE,
            results.len(),
            targets.len()
        )));
    }

    results
        .into_iter()
        .zip(targets)
        .map(|(result, to)| {
            let output = result.map_err(|e| CcipDataError::from_call(to, e))?;
            C::abi_decode_returns(&output)
                .map_err(|e| CcipDataError::Abi(format!("{} from {}: {}", C::SIGNATURE, to, e)))
        })
        .collect()
}

/// [`ContractCaller`] over an alloy provider. Batches are sent as a single
/// Multicall3 `aggregate3` call.
#[derive(Debug, Clone)]
pub struct ProviderCaller<P> {
    provider: P,
    multicall: Address,
}

impl<P: Provider + Clone> ProviderCaller<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            multicall: MULTICALL3_ADDRESS,
        }
    }

    pub fn with_multicall(mut self, multicall: Address) -> Self {
        self.multicall = multicall;
        self
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }
}

fn classify_rpc_error(e: alloy::transports::TransportError) -> CallError {
    if let Some(payload) = e.as_error_resp() {
        // code 3 is the standard "execution reverted" error
        if payload.code == 3 || payload.message.to_lowercase().contains("revert") {
            return CallError::Reverted(payload.message.to_string());
        }
    }
    CallError::Transport(e.to_string())
}

#[async_trait]
impl<P: Provider + Clone> ContractCaller for ProviderCaller<P> {
    async fn call(&self, to: Address, calldata: Bytes) -> std::result::Result<Bytes, CallError> {
        let tx = TransactionRequest::default().to(to).input(calldata.into());
        self.provider.call(tx).await.map_err(classify_rpc_error)
    }

    async fn batch_call(
        &self,
        calls: Vec<(Address, Bytes)>,
    ) -> std::result::Result<Vec<std::result::Result<Bytes, CallError>>, CallError> {
        let count = calls.len();
        let aggregate = IMulticall3::aggregate3Call {
            calls: calls
                .into_iter()
                .map(|(target, call_data)| IMulticall3::Call3 {
                    target,
                    allowFailure: true,
                    callData: call_data,
                })
                .collect(),
        };

        let output = self.call(self.multicall, aggregate.abi_encode().into()).await?;
        let results = IMulticall3::aggregate3Call::abi_decode_returns(&output)
            .map_err(|e| CallError::Transport(format!("decoding aggregate3 result: {}", e)))?;

        tracing::trace!(calls = count, multicall = %self.multicall, "Executed multicall batch");

        Ok(results
            .into_iter()
            .map(|result| {
                if result.success {
                    Ok(result.returnData)
                } else {
                    Err(CallError::Reverted(format!("0x{}", alloy_primitives::hex::encode(&result.returnData))))
                }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutils::MockCaller;
    use common::interfaces::erc20::IERC20Metadata;

    #[tokio::test]
    async fn test_call_contract_decodes_return() {
        let token = Address::repeat_byte(1);
        let caller = MockCaller::new();
        caller.expect(token, IERC20Metadata::decimalsCall {}, 18u16);

        let decimals = call_contract(&caller, token, &IERC20Metadata::decimalsCall {}).await.unwrap();
        assert_eq!(decimals, 18);
    }

    #[tokio::test]
    async fn test_call_contract_maps_revert() {
        let token = Address::repeat_byte(1);
        let caller = MockCaller::new();
        caller.expect_revert(token, IERC20Metadata::decimalsCall {});

        let err = call_contract(&caller, token, &IERC20Metadata::decimalsCall {}).await.unwrap_err();
        assert!(err.is_revert());

        // Unknown call: transport failure, not a revert
        let err = call_contract(&caller, Address::ZERO, &IERC20Metadata::decimalsCall {}).await.unwrap_err();
        assert!(!err.is_revert());
    }

    #[tokio::test]
    async fn test_batch_fails_on_any_error() {
        let a = Address::repeat_byte(1);
        let b = Address::repeat_byte(2);
        let caller = MockCaller::new();
        caller.expect(a, IERC20Metadata::decimalsCall {}, 6u16);
        caller.expect(b, IERC20Metadata::decimalsCall {}, 18u16);

        let ok = batch_call_contract(
            &caller,
            vec![(a, IERC20Metadata::decimalsCall {}), (b, IERC20Metadata::decimalsCall {})],
        )
        .await
        .unwrap();
        assert_eq!(ok, vec![6, 18]);

        let err = batch_call_contract(
            &caller,
            vec![(a, IERC20Metadata::decimalsCall {}), (Address::ZERO, IERC20Metadata::decimalsCall {})],
        )
        .await;
        assert!(err.is_err());
    }
}
