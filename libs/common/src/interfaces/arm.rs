use alloy_sol_types::sol;

sol! {
    /// Risk management (ARM) contract, read through its proxy.
    interface IARM {
        function isCursed() external view returns (bool);
    }
}
