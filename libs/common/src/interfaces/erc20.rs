use alloy_sol_types::sol;

sol! {
    interface IERC20Metadata {
        function decimals() external view returns (uint8);
    }
}
