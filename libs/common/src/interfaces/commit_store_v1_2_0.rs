use alloy_sol_types::sol;

sol! {
    interface CommitStoreV1_2_0 {
        struct Interval {
            uint64 min;
            uint64 max;
        }

        struct TokenPriceUpdate {
            address sourceToken;
            uint224 usdPerToken;
        }

        struct GasPriceUpdate {
            uint64 destChainSelector;
            uint224 usdPerUnitGas;
        }

        struct PriceUpdates {
            TokenPriceUpdate[] tokenPriceUpdates;
            GasPriceUpdate[] gasPriceUpdates;
        }

        struct CommitReport {
            PriceUpdates priceUpdates;
            Interval interval;
            bytes32 merkleRoot;
        }

        struct StaticConfig {
            uint64 chainSelector;
            uint64 sourceChainSelector;
            address onRamp;
            address armProxy;
        }

        struct DynamicConfig {
            address priceRegistry;
        }

        event ReportAccepted(CommitReport report);
        event ConfigSet(StaticConfig staticConfig, DynamicConfig dynamicConfig);

        function getStaticConfig() external view returns (StaticConfig memory);
        function getDynamicConfig() external view returns (DynamicConfig memory);
        function getExpectedNextSequenceNumber() external view returns (uint64);
        function getLatestPriceEpochAndRound() external view returns (uint64);
        function isBlessed(bytes32 root) external view returns (bool);
        function isUnpausedAndNotCursed() external view returns (bool);
        function verify(bytes32[] calldata hashedLeaves, bytes32[] calldata proofs, uint256 proofFlagBits) external view returns (uint256);
    }
}
