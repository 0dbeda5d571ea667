use alloy_primitives::aliases::U192;
use alloy_primitives::{Bytes, U256};
use alloy_sol_types::SolValue;
use common::interfaces::commit_store_v1_0_0::CommitStoreV1_0_0;
use common::interfaces::offramp_v1_0_0::EVM2EVMOffRampV1_0_0;
use common::interfaces::onramp_v1_0_0::EVM2EVMOnRampV1_0_0;

use super::{narrow, shape_error, CommitReportCodec, ExecReportCodec};
use crate::errors::{CcipDataError, Result};
use crate::types::{CommitStoreReport, EVM2EVMMessage, ExecReport, GasPrice, Interval, TokenAmount, TokenPrice};
use crate::version::V1_0_0;

/// 1.0.0 commit reports carry at most one gas price, as two scalar fields.
/// A zero destination selector means the report has no gas price.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommitReportCodecV1_0_0;

impl CommitReportCodecV1_0_0 {
    pub(crate) fn from_binding(report: CommitStoreV1_0_0::CommitReport) -> CommitStoreReport {
        let price_updates = report.priceUpdates;
        let gas_prices = if price_updates.destChainSelector != 0 {
            vec![GasPrice {
                dest_chain_selector: price_updates.destChainSelector,
                value: U256::from(price_updates.usdPerUnitGas),
            }]
        } else {
            Vec::new()
        };

        CommitStoreReport {
            token_prices: price_updates
                .tokenPriceUpdates
                .into_iter()
                .map(|u| TokenPrice {
                    token: u.sourceToken,
                    value: U256::from(u.usdPerToken),
                })
                .collect(),
            gas_prices,
            interval: Interval::new(report.interval.min, report.interval.max),
            merkle_root: report.merkleRoot,
        }
    }

    fn to_binding(report: &CommitStoreReport) -> Result<CommitStoreV1_0_0::CommitReport> {
        let (dest_chain_selector, usd_per_unit_gas) = match report.gas_prices.as_slice() {
            [] => (0, U192::ZERO),
            [gas_price] if gas_price.dest_chain_selector == 0 => {
                return Err(shape_error(
                    "commit report",
                    V1_0_0,
                    "gas price needs a non-zero destination chain selector",
                ))
            }
            [gas_price] => (
                gas_price.dest_chain_selector,
                narrow::<U192>(gas_price.value, "usdPerUnitGas")?,
            ),
            many => return Err(CcipDataError::TooManyGasPrices(many.len())),
        };

        let token_price_updates = report
            .token_prices
            .iter()
            .map(|tp| {
                Ok(CommitStoreV1_0_0::TokenPriceUpdate {
                    sourceToken: tp.token,
                    usdPerToken: narrow::<U192>(tp.value, "usdPerToken")?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(CommitStoreV1_0_0::CommitReport {
            priceUpdates: CommitStoreV1_0_0::PriceUpdates {
                tokenPriceUpdates: token_price_updates,
                destChainSelector: dest_chain_selector,
                usdPerUnitGas: usd_per_unit_gas,
            },
            interval: CommitStoreV1_0_0::Interval {
                min: report.interval.min,
                max: report.interval.max,
            },
            merkleRoot: report.merkle_root,
        })
    }
}

impl CommitReportCodec for CommitReportCodecV1_0_0 {
    fn encode_commit_report(&self, report: &CommitStoreReport) -> Result<Bytes> {
        Ok(Self::to_binding(report)?.abi_encode().into())
    }

    fn decode_commit_report(&self, encoded: &[u8]) -> Result<CommitStoreReport> {
        let report = CommitStoreV1_0_0::CommitReport::abi_decode_validate(encoded)
            .map_err(|e| shape_error("commit report", V1_0_0, e))?;
        Ok(Self::from_binding(report))
    }
}

impl From<EVM2EVMOffRampV1_0_0::EVM2EVMMessage> for EVM2EVMMessage {
    fn from(m: EVM2EVMOffRampV1_0_0::EVM2EVMMessage) -> Self {
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
            source_token_data: Vec::new(),
            fee_token: m.feeToken,
            message_id: m.messageId,
            hash: Default::default(),
        }
    }
}

impl From<EVM2EVMOnRampV1_0_0::EVM2EVMMessage> for EVM2EVMMessage {
    fn from(m: EVM2EVMOnRampV1_0_0::EVM2EVMMessage) -> Self {
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
            source_token_data: Vec::new(),
            fee_token: m.feeToken,
            message_id: m.messageId,
            hash: Default::default(),
        }
    }
}

fn message_to_binding(m: &EVM2EVMMessage) -> EVM2EVMOffRampV1_0_0::EVM2EVMMessage {
    EVM2EVMOffRampV1_0_0::EVM2EVMMessage {
        sourceChainSelector: m.source_chain_selector,
        sequenceNumber: m.sequence_number,
        feeTokenAmount: m.fee_token_amount,
        sender: m.sender,
        nonce: m.nonce,
        gasLimit: m.gas_limit,
        strict: m.strict,
        receiver: m.receiver,
        data: m.data.clone(),
        tokenAmounts: m
            .token_amounts
            .iter()
            .map(|ta| EVM2EVMOffRampV1_0_0::EVMTokenAmount {
                token: ta.token,
                amount: ta.amount,
            })
            .collect(),
        feeToken: m.fee_token,
        messageId: m.message_id,
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ExecReportCodecV1_0_0;

impl ExecReportCodec for ExecReportCodecV1_0_0 {
    fn encode_execution_report(&self, report: &ExecReport) -> Result<Bytes> {
        if report.messages.is_empty() {
            return Err(CcipDataError::EmptyInput("execution report"));
        }
        let binding = EVM2EVMOffRampV1_0_0::ExecutionReport {
            messages: report.messages.iter().map(message_to_binding).collect(),
            offchainTokenData: report.offchain_token_data.clone(),
            proofs: report.proofs.clone(),
            proofFlagBits: report.proof_flag_bits,
        };
        Ok(binding.abi_encode().into())
    }

    fn decode_execution_report(&self, encoded: &[u8]) -> Result<ExecReport> {
        let report = EVM2EVMOffRampV1_0_0::ExecutionReport::abi_decode_validate(encoded)
            .map_err(|e| shape_error("execution report", V1_0_0, e))?;
        if report.messages.is_empty() {
            return Err(shape_error("execution report", V1_0_0, "no messages"));
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

    fn report() -> CommitStoreReport {
        CommitStoreReport {
            token_prices: vec![TokenPrice {
                token: Address::repeat_byte(1),
                value: U256::from(8_000_000_000_000_000_000u128),
            }],
            gas_prices: vec![GasPrice {
                dest_chain_selector: 5_009_297_550_715_157_269,
                value: U256::from(2_000_000_000_000u64),
            }],
            interval: Interval::new(1, 10),
            merkle_root: B256::repeat_byte(0xab),
        }
    }

    #[test]
    fn test_commit_round_trip() {
        let codec = CommitReportCodecV1_0_0;
        for report in [
            report(),
            CommitStoreReport {
                gas_prices: vec![],
                token_prices: vec![],
                ..report()
            },
        ] {
            let encoded = codec.encode_commit_report(&report).unwrap();
            assert_eq!(codec.decode_commit_report(&encoded).unwrap(), report);
        }
    }

    #[test]
    fn test_commit_rejects_two_gas_prices() {
        let mut report = report();
        report.gas_prices.push(report.gas_prices[0].clone());
        assert_eq!(
            CommitReportCodecV1_0_0.encode_commit_report(&report).unwrap_err(),
            CcipDataError::TooManyGasPrices(2)
        );
    }

    #[test]
    fn test_commit_rejects_price_wider_than_192_bits() {
        let mut report = report();
        report.token_prices[0].value = U256::from(1) << 200;
        assert!(matches!(
            CommitReportCodecV1_0_0.encode_commit_report(&report),
            Err(CcipDataError::Overflow(_))
        ));
    }

    #[test]
    fn test_commit_rejects_wrong_shape() {
        let err = CommitReportCodecV1_0_0.decode_commit_report(&[0u8; 31]).unwrap_err();
        assert!(matches!(err, CcipDataError::UnexpectedShape { version: "1.0.0", .. }));
    }

    #[test]
    fn test_exec_round_trip() {
        let report = ExecReport {
            messages: vec![EVM2EVMMessage {
                source_chain_selector: 1,
                sequence_number: 7,
                fee_token_amount: U256::from(3),
                sender: Address::repeat_byte(2),
                nonce: 4,
                gas_limit: U256::from(200_000),
                receiver: Address::repeat_byte(3),
                data: Bytes::from_static(b"payload"),
                token_amounts: vec![TokenAmount {
                    token: Address::repeat_byte(4),
                    amount: U256::from(100),
                }],
                fee_token: Address::repeat_byte(5),
                message_id: B256::repeat_byte(6),
                ..Default::default()
            }],
            offchain_token_data: vec![vec![Bytes::from_static(b"attestation")]],
            proofs: vec![B256::repeat_byte(7)],
            proof_flag_bits: U256::from(2),
        };
        let codec = ExecReportCodecV1_0_0;
        let encoded = codec.encode_execution_report(&report).unwrap();
        assert_eq!(codec.decode_execution_report(&encoded).unwrap(), report);
    }

    #[test]
    fn test_commit_rejects_gas_price_without_selector() {
        let mut report = report();
        report.gas_prices[0].dest_chain_selector = 0;
        assert!(matches!(
            CommitReportCodecV1_0_0.encode_commit_report(&report),
            Err(CcipDataError::UnexpectedShape { version: "1.0.0", .. })
        ));
    }

    #[test]
    fn test_exec_rejects_empty() {
        assert_eq!(
            ExecReportCodecV1_0_0
                .encode_execution_report(&ExecReport::default())
                .unwrap_err(),
            CcipDataError::EmptyInput("execution report")
        );

        let encoded = EVM2EVMOffRampV1_0_0::ExecutionReport {
            messages: vec![],
            offchainTokenData: vec![],
            proofs: vec![],
            proofFlagBits: U256::ZERO,
        }
        .abi_encode();
        assert!(matches!(
            ExecReportCodecV1_0_0.decode_execution_report(&encoded),
            Err(CcipDataError::UnexpectedShape { .. })
        ));
    }
}
