use alloy_sol_types::sol;

sol! {
    interface EVM2EVMOnRampV1_0_0 {
        struct EVMTokenAmount {
            address token;
            uint256 amount;
        }

        struct EVM2EVMMessage {
            uint64 sourceChainSelector;
            uint64 sequenceNumber;
            uint256 feeTokenAmount;
            address sender;
            uint64 nonce;
            uint256 gasLimit;
            bool strict;
            address receiver;
            bytes data;
            EVMTokenAmount[] tokenAmounts;
            address feeToken;
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
            uint16 maxTokensLength;
            address priceRegistry;
            uint32 maxDataSize;
            uint64 maxGasLimit;
        }

        event CCIPSendRequested(EVM2EVMMessage message);
        event ConfigSet(StaticConfig staticConfig, DynamicConfig dynamicConfig);

        function getStaticConfig() external view returns (StaticConfig memory);
        function getDynamicConfig() external view returns (DynamicConfig memory);
        function getSenderNonce(address sender) external view returns (uint64);
    }
}
