use alloy_sol_types::sol;

sol! {
    interface EVM2EVMOffRampV1_0_0 {
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

        struct ExecutionReport {
            EVM2EVMMessage[] messages;
            bytes[][] offchainTokenData;
            bytes32[] proofs;
            uint256 proofFlagBits;
        }

        struct StaticConfig {
            address commitStore;
            uint64 chainSelector;
            uint64 sourceChainSelector;
            address onRamp;
            address prevOffRamp;
            address armProxy;
        }

        struct DynamicConfig {
            uint32 permissionLessExecutionThresholdSeconds;
            address router;
            address priceRegistry;
            uint16 maxTokensLength;
            uint32 maxDataSize;
        }

        struct TokenBucket {
            uint128 tokens;
            uint32 lastUpdated;
            bool isEnabled;
            uint128 capacity;
            uint128 rate;
        }

        event ExecutionStateChanged(uint64 indexed sequenceNumber, bytes32 indexed messageId, uint8 state, bytes returnData);
        event PoolAdded(address token, address pool);
        event PoolRemoved(address token, address pool);
        event ConfigSet(StaticConfig staticConfig, DynamicConfig dynamicConfig);

        function getStaticConfig() external view returns (StaticConfig memory);
        function getDynamicConfig() external view returns (DynamicConfig memory);
        function getExecutionState(uint64 sequenceNumber) external view returns (uint8);
        function getSenderNonce(address sender) external view returns (uint64);
        function currentRateLimiterState() external view returns (TokenBucket memory);
        function getSupportedTokens() external view returns (address[] memory);
        function getDestinationToken(address sourceToken) external view returns (address);
        function getDestinationTokens() external view returns (address[] memory);
        function getPoolByDestToken(address destToken) external view returns (address);
        function getPoolBySourceToken(address sourceToken) external view returns (address);
    }
}
