//! Lending-market token bindings (Compound-style cToken)

use alloy::sol;

sol! {
    /// Market token holding a deposit of an underlying asset
    #[sol(rpc)]
    interface ICToken {
        /// Market-token balance of an account
        function balanceOf(address owner) external view returns (uint256);

        /// Redeem market tokens for an exact amount of the underlying asset
        function redeemUnderlying(uint256 redeemAmount) external returns (uint256);
    }
}
