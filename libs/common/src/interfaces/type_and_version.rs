use alloy_sol_types::sol;

sol! {
    /// Self-description accessor exposed by every versioned lane contract.
    interface ITypeAndVersion {
        function typeAndVersion() external pure returns (string memory);
    }
}
