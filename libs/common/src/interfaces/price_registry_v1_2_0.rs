use alloy_sol_types::sol;

sol! {
    interface PriceRegistryV1_2_0 {
        struct TimestampedPackedUint224 {
            uint224 value;
            uint32 timestamp;
        }

        event UsdPerTokenUpdated(address indexed token, uint256 value, uint256 timestamp);
        event UsdPerUnitGasUpdated(uint64 indexed destChain, uint256 value, uint256 timestamp);
        event FeeTokenAdded(address indexed feeToken);
        event FeeTokenRemoved(address indexed feeToken);

        function getFeeTokens() external view returns (address[] memory);
        function getTokenPrices(address[] calldata tokens) external view returns (TimestampedPackedUint224[] memory);
    }
}
