use alloy_sol_types::sol;

sol! {
    interface EVM2EVMOnRampV1_2_0 {
        struct EVMTokenAmount {
            address token;
            uint256 amount;
        }

        struct EVM2EVMMessage {
            uint64 sourceChainSelector;
            address sender;
            address receiver;
            uint64 sequenceNumber;
            uint256 gasLimit;
            bool strict;
            uint64 nonce;
            address feeToken;
            uint256 feeTokenAmount;
            bytes data;
            EVMTokenAmount[] tokenAmounts;
            bytes[] sourceTokenData;
            bytes32 messageId;
        }

        struct StaticConfig {
            address linkToken;
            uint64 chainSelector;
            uint64 destChainSelector;
            uint64 defaultTxGasLimit;
            uint96 maxNopFeesJuels;
            address prevOnRamp;
            address armProxy;
        }

        struct DynamicConfig {
            address router;
            uint16 maxNumberOfTokensPerMsg;
            uint32 destGasOverhead;
            uint16 destGasPerPayloadByte;
            uint32 destDataAvailabilityOverheadGas;
            uint16 destGasPerDataAvailabilityByte;
            uint16 destDataAvailabilityMultiplierBps;
            address priceRegistry;
            uint32 maxDataBytes;
            uint32 maxPerMsgGasLimit;
        }

        event CCIPSendRequested(EVM2EVMMessage message);
        event ConfigSet(StaticConfig staticConfig, DynamicConfig dynamicConfig);

        function getStaticConfig() external view returns (StaticConfig memory);
        function getDynamicConfig() external view returns (DynamicConfig memory);
        function getSenderNonce(address sender) external view returns (uint64);
        function paused() external view returns (bool);
    }
}
