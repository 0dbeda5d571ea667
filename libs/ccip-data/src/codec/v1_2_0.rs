use alloy_primitives::aliases::U224;
use alloy_primitives::{Bytes, U256};
use alloy_sol_types::SolValue;
use common::interfaces::commit_store_v1_2_0::CommitStoreV1_2_0;
use common::interfaces::offramp_v1_2_0::EVM2EVMOffRampV1_2_0;
use common::interfaces::onramp_v1_2_0::EVM2EVMOnRampV1_2_0;

use super::{narrow, shape_error, CommitReportCodec, ExecReportCodec};
use crate::errors::{CcipDataError, Result};
use crate::types::{CommitStoreReport, EVM2EVMMessage, ExecReport, GasPrice, Interval, TokenAmount, TokenPrice};
use crate::version::V1_2_0;

/// 1.2.0 commit reports: 224-bit prices and a list of gas prices.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommitReportCodecV1_2_0;

impl CommitReportCodecV1_2_0 {
    pub(crate) fn from_binding(report: CommitStoreV1_2_0::CommitReport) -> CommitStoreReport {
        CommitStoreReport {
            token_prices: report
                .priceUpdates
                .tokenPriceUpdates
                .into_iter()
                .map(|u| TokenPrice {
                    token: u.sourceToken,
                    value: U256::from(u.usdPerToken),
                })
                .collect(),
            gas_prices: report
                .priceUpdates
                .gasPriceUpdates
                .into_iter()
                .map(|u| GasPrice {
                    dest_chain_selector: u.destChainSelector,
                    value: U256::from(u.usdPerUnitGas),
                })
                .collect(),
            interval: Interval::new(report.interval.min, report.interval.max),
            merkle_root: report.merkleRoot,
        }
    }

    fn to_binding(report: &CommitStoreReport) -> Result<CommitStoreV1_2_0::CommitReport> {
        let token_price_updates = report
            .token_prices
            .iter()
            .map(|tp| {
                Ok(CommitStoreV1_2_0::TokenPriceUpdate {
                    sourceToken: tp.token,
                    usdPerToken: narrow::<U224>(tp.value, "usdPerToken")?,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        let gas_price_updates = report
            .gas_prices
            .iter()
            .map(|gp| {
                Ok(CommitStoreV1_2_0::GasPriceUpdate {
                    destChainSelector: gp.dest_chain_selector,
                    usdPerUnitGas: narrow::<U224>(gp.value, "usdPerUnitGas")?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(CommitStoreV1_2_0::CommitReport {
            priceUpdates: CommitStoreV1_2_0::PriceUpdates {
                tokenPriceUpdates: token_price_updates,
                gasPriceUpdates: gas_price_updates,
            },
            interval: CommitStoreV1_2_0::Interval {
                min: report.interval.min,
                max: report.interval.max,
            },
            merkleRoot: report.merkle_root,
        })
    }
}

impl CommitReportCodec for CommitReportCodecV1_2_0 {
    fn encode_commit_report(&self, report: &CommitStoreReport) -> Result<Bytes> {
        Ok(Self::to_binding(report)?.abi_encode().into())
    }

    fn decode_commit_report(&self, encoded: &[u8]) -> Result<CommitStoreReport> {
        let report = CommitStoreV1_2_0::CommitReport::abi_decode_validate(encoded)
            .map_err(|e| shape_error("commit report", V1_2_0, e))?;
        Ok(Self::from_binding(report))
    }
}

macro_rules! message_from_v1_2_0 {
    ($binding:path) => {
        impl From<$binding> for EVM2EVMMessage {
            fn from(m: $binding) -> Self {
                Self {
                    source_chain_selector: m.sourceChainSelector,
                    sequence_number: m.sequenceNumber,
                    fee_token_amount: m.feeTokenAmount,
                    sender: m.sender,
                    nonce: m.nonce,
                    gas_limit: m.gasLimit,
                    strict: m.strict,
                    receiver: m.receiver,
                    data: m.data,
                    token_amounts: m
                        .tokenAmounts
                        .into_iter()
                        .map(|ta| TokenAmount {
                            token: ta.token,
                            amount: ta.amount,
                        })
                        .collect(),
                    source_token_data: m.sourceTokenData,
                    fee_token: m.feeToken,
                    message_id: m.messageId,
                    hash: Default::default(),
                }
            }
        }
    };
}

message_from_v1_2_0!(EVM2EVMOnRampV1_2_0::EVM2EVMMessage);
message_from_v1_2_0!(EVM2EVMOffRampV1_2_0::EVM2EVMMessage);

fn message_to_binding(m: &EVM2EVMMessage) -> EVM2EVMOffRampV1_2_0::EVM2EVMMessage {
    EVM2EVMOffRampV1_2_0::EVM2EVMMessage {
        sourceChainSelector: m.source_chain_selector,
        sender: m.sender,
        receiver: m.receiver,
        sequenceNumber: m.sequence_number,
        gasLimit: m.gas_limit,
        strict: m.strict,
        nonce: m.nonce,
        feeToken: m.fee_token,
        feeTokenAmount: m.fee_token_amount,
        data: m.data.clone(),
        tokenAmounts: m
            .token_amounts
            .iter()
            .map(|ta| EVM2EVMOffRampV1_2_0::EVMTokenAmount {
                token: ta.token,
                amount: ta.amount,
            })
            .collect(),
        sourceTokenData: m.source_token_data.clone(),
        messageId: m.message_id,
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ExecReportCodecV1_2_0;

impl ExecReportCodec for ExecReportCodecV1_2_0 {
    fn encode_execution_report(&self, report: &ExecReport) -> Result<Bytes> {
        if report.messages.is_empty() {
            return Err(CcipDataError::EmptyInput("execution report"));
        }
        let binding = EVM2EVMOffRampV1_2_0::ExecutionReport {
            messages: report.messages.iter().map(message_to_binding).collect(),
            offchainTokenData: report.offchain_token_data.clone(),
            proofs: report.proofs.clone(),
            proofFlagBits: report.proof_flag_bits,
        };
        Ok(binding.abi_encode().into())
    }

    fn decode_execution_report(&self, encoded: &[u8]) -> Result<ExecReport> {
        let report = EVM2EVMOffRampV1_2_0::ExecutionReport::abi_decode_validate(encoded)
            .map_err(|e| shape_error("execution report", V1_2_0, e))?;
        if report.messages.is_empty() {
            return Err(shape_error("execution report", V1_2_0, "no messages"));
        }
        Ok(ExecReport {
            messages: report.messages.into_iter().map(EVM2EVMMessage::from).collect(),
            offchain_token_data: report.offchainTokenData,
            proofs: report.proofs,
            proof_flag_bits: report.proofFlagBits,
        })
    }
}

#[cfg(test)]
mod tests {
    use alloy_primitives::{Address, B256};

    use super::*;
    use crate::codec::CommitReportCodecV1_0_0;
    use crate::errors::CcipDataError;

    fn report() -> CommitStoreReport {
        CommitStoreReport {
            token_prices: vec![
                TokenPrice {
                    token: Address::repeat_byte(1),
                    value: U256::from(1) << 200,
                },
                TokenPrice {
                    token: Address::repeat_byte(2),
                    value: U256::from(42),
                },
            ],
            gas_prices: vec![
                GasPrice {
                    dest_chain_selector: 1,
                    value: U256::from(5),
                },
                GasPrice {
                    dest_chain_selector: 2,
                    value: U256::from(6),
                },
            ],
            interval: Interval::new(11, 20),
            merkle_root: B256::repeat_byte(0xcd),
        }
    }

    #[test]
    fn test_commit_round_trip() {
        let codec = CommitReportCodecV1_2_0;
        let encoded = codec.encode_commit_report(&report()).unwrap();
        assert_eq!(codec.decode_commit_report(&encoded).unwrap(), report());
    }

    #[test]
    fn test_commit_rejects_price_wider_than_224_bits() {
        let mut report = report();
        report.gas_prices[0].value = U256::from(1) << 224;
        assert!(matches!(
            CommitReportCodecV1_2_0.encode_commit_report(&report),
            Err(CcipDataError::Overflow(_))
        ));
    }

    #[test]
    fn test_v1_0_0_bytes_are_not_a_v1_2_0_report() {
        let report = CommitStoreReport {
            gas_prices: vec![GasPrice {
                dest_chain_selector: 9,
                value: U256::from(1),
            }],
            token_prices: vec![],
            ..report()
        };
        let encoded = CommitReportCodecV1_0_0.encode_commit_report(&report).unwrap();
        assert!(matches!(
            CommitReportCodecV1_2_0.decode_commit_report(&encoded),
            Err(CcipDataError::UnexpectedShape { version: "1.2.0", .. })
        ));
    }

    #[test]
    fn test_exec_round_trip_keeps_source_token_data() {
        let report = ExecReport {
            messages: vec![EVM2EVMMessage {
                source_chain_selector: 1,
                sequence_number: 12,
                sender: Address::repeat_byte(2),
                receiver: Address::repeat_byte(3),
                gas_limit: U256::from(1),
                data: Bytes::from_static(b"hi"),
                token_amounts: vec![TokenAmount {
                    token: Address::repeat_byte(4),
                    amount: U256::from(1),
                }],
                source_token_data: vec![Bytes::from_static(b"pool data")],
                message_id: B256::repeat_byte(9),
                ..Default::default()
            }],
            offchain_token_data: vec![vec![Bytes::new()]],
            proofs: vec![],
            proof_flag_bits: U256::ZERO,
        };
        let codec = ExecReportCodecV1_2_0;
        let encoded = codec.encode_execution_report(&report).unwrap();
        assert_eq!(codec.decode_execution_report(&encoded).unwrap(), report);
    }

    #[test]
    fn test_exec_rejects_empty() {
        assert_eq!(
            ExecReportCodecV1_2_0
                .encode_execution_report(&ExecReport::default())
                .unwrap_err(),
            CcipDataError::EmptyInput("execution report")
        );
    }
}
