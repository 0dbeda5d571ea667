use alloy_sol_types::sol;

sol! {
    interface PriceRegistryV1_0_0 {
        struct TimestampedUint192Value {
            uint192 value;
            uint64 timestamp;
        }

        event UsdPerTokenUpdated(address indexed token, uint256 value, uint256 timestamp);
        event UsdPerUnitGasUpdated(uint64 indexed destChain, uint256 value, uint256 timestamp);
        event FeeTokenAdded(address indexed feeToken);
        event FeeTokenRemoved(address indexed feeToken);

        function getFeeTokens() external view returns (address[] memory);
        function getTokenPrices(address[] calldata tokens) external view returns (TimestampedUint192Value[] memory);
    }
}
