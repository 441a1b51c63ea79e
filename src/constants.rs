//! Constants and unit helpers for wallet-batch

use alloy::primitives::utils::{format_units, parse_units};
use alloy::primitives::U256;
use eyre::{Context, Result};
use std::time::Duration;

/// Native currency uses 18 decimals on every supported chain
pub const NATIVE_DECIMALS: u8 = 18;

/// Market tokens redeemed by the redeem variant use 6 decimals
pub const MARKET_TOKEN_DECIMALS: u8 = 6;

/// Default number of attempts for a retried network call
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Default fixed delay between retry attempts
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Default minimum native balance a wallet must hold to be used (0.0001 ether)
pub const DEFAULT_MIN_BALANCE_WEI: u64 = 100_000_000_000_000;

/// Gas limit of a plain native transfer
pub const TRANSFER_GAS_LIMIT: u64 = 21_000;

/// Receipt polling: 60 polls * 2 seconds = 2 minutes before giving up
pub const RECEIPT_POLL_ATTEMPTS: u32 = 60;
pub const RECEIPT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Scale a decimal string (e.g. "1.5") to an integer amount with `decimals` places
pub fn scale_to_decimals(amount: &str, decimals: u8) -> Result<U256> {
    let parsed = parse_units(amount.trim(), decimals)
        .with_context(|| format!("Invalid amount {:?} for {} decimals", amount, decimals))?;
    Ok(parsed.into())
}

/// Unscale an integer amount to its decimal string representation
pub fn unscale_from_decimals(value: U256, decimals: u8) -> String {
    format_units(value, decimals).unwrap_or_else(|_| value.to_string())
}

/// Parse a native-currency amount given in whole units (18 decimals)
pub fn parse_ether(amount: &str) -> Result<U256> {
    scale_to_decimals(amount, NATIVE_DECIMALS)
}

/// Format a wei amount in whole native units
pub fn format_ether(wei: U256) -> String {
    unscale_from_decimals(wei, NATIVE_DECIMALS)
}

/// Parse a gas price given in gwei (e.g. "0.001") to wei
pub fn gwei(amount: &str) -> Result<u128> {
    let wei = scale_to_decimals(amount, 9)?;
    u128::try_from(wei).map_err(|_| eyre::eyre!("Gas price {} gwei is out of range", amount))
}

/// The default minimum balance as a U256
pub fn default_min_balance() -> U256 {
    U256::from(DEFAULT_MIN_BALANCE_WEI)
}
