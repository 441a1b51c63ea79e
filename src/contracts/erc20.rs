//! ERC20 token contract bindings

use alloy::sol;

sol! {
    /// Standard ERC20 interface
    #[sol(rpc)]
    interface IERC20 {
        /// Returns the decimals of the token
        function decimals() external view returns (uint8);

        /// Returns the balance of an account
        function balanceOf(address account) external view returns (uint256);

        /// Transfers tokens to a recipient
        function transfer(address to, uint256 amount) external returns (bool);
    }
}
