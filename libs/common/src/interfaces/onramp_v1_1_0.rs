use alloy_sol_types::sol;

sol! {
    /// 1.1.0 shares the message layout of 1.0.0; only the dynamic config grew.
    interface EVM2EVMOnRampV1_1_0 {
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
            uint32 destGasOverhead;
            uint16 destGasPerPayloadByte;
            address priceRegistry;
            uint32 maxDataSize;
            uint64 maxGasLimit;
        }

        event ConfigSet(StaticConfig staticConfig, DynamicConfig dynamicConfig);

        function getDynamicConfig() external view returns (DynamicConfig memory);
    }
}
