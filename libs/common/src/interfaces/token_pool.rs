use alloy_sol_types::sol;

sol! {
    /// Token pool as seen by a 1.2.0 off-ramp.
    interface ITokenPoolV1_2_0 {
        struct TokenBucket {
            uint128 tokens;
            uint32 lastUpdated;
            bool isEnabled;
            uint128 capacity;
            uint128 rate;
        }

        function currentOffRampRateLimiterState(address offRamp) external view returns (TokenBucket memory);
    }
}
