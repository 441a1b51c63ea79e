//! Input rows read from the sheet

use alloy::primitives::{Address, Bytes, U256};
use std::fmt;
use zeroize::Zeroizing;

/// A private key read from the sheet
///
/// Never printed: `Debug` and `Display` are redacted, and the memory is
/// zeroed on drop.
#[derive(Clone)]
pub struct SecretKey(Zeroizing<String>);

impl SecretKey {
    /// Wrap a private key string
    pub fn new(key: impl Into<String>) -> Self {
        Self(Zeroizing::new(key.into()))
    }

    /// Expose the key; only pass the result straight to signer derivation
    pub fn expose_secret(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretKey(<redacted>)")
    }
}

impl fmt::Display for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<redacted>")
    }
}

/// What a row asks its wallet to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Send raw calldata to a contract with zero value
    ContractCall { to: Address, data: Bytes },
    /// Send native currency (wei)
    NativeTransfer { to: Address, amount: U256 },
    /// ERC-20 transfer; `amount` is a decimal string scaled by the token's decimals
    TokenTransfer {
        token: Address,
        to: Address,
        amount: String,
    },
    /// Redeem a share of the wallet's market-token balance
    Redeem { market: Address },
}

impl Action {
    /// Address the transaction is sent to
    pub fn destination(&self) -> Address {
        match self {
            Action::ContractCall { to, .. } | Action::NativeTransfer { to, .. } => *to,
            Action::TokenTransfer { token, .. } => *token,
            Action::Redeem { market } => *market,
        }
    }

    /// Native value the transaction carries
    pub fn native_value(&self) -> U256 {
        match self {
            Action::NativeTransfer { amount, .. } => *amount,
            _ => U256::ZERO,
        }
    }
}

/// One parsed data row
#[derive(Debug, Clone)]
pub struct InputRow {
    /// 1-based line in the source sheet
    pub line: usize,
    /// Wallet private key (column A)
    pub signing_key: SecretKey,
    /// Destination and payload
    pub action: Action,
}

impl InputRow {
    pub fn new(line: usize, signing_key: SecretKey, action: Action) -> Self {
        Self {
            line,
            signing_key,
            action,
        }
    }
}

/// A data row the column layout could not map
///
/// Keeps the key cell when there was one, so the skip can still be
/// attributed to a wallet.
#[derive(Debug, Clone)]
pub struct RejectedRow {
    /// 1-based line in the source sheet
    pub line: usize,
    pub signing_key: Option<SecretKey>,
    pub reason: SkipReason,
}

/// Why a row was excluded without touching the network's submission path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// A required cell is empty
    MissingField(&'static str),
    /// A cell could not be parsed
    InvalidField { field: &'static str, value: String },
    /// Wallet balance is below the configured minimum
    BelowMinimum { balance: U256, minimum: U256 },
    /// Wallet balance cannot cover the transferred value
    InsufficientFunds { balance: U256, required: U256 },
    /// Redeemable amount rounds down to zero
    NothingToRedeem,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use crate::constants::format_ether;

        match self {
            SkipReason::MissingField(field) => write!(f, "missing {}", field),
            SkipReason::InvalidField { field, value } => write!(f, "invalid {}: {:?}", field, value),
            SkipReason::BelowMinimum { balance, minimum } => write!(
                f,
                "balance {} below minimum {}",
                format_ether(*balance),
                format_ether(*minimum)
            ),
            SkipReason::InsufficientFunds { balance, required } => write!(
                f,
                "balance {} cannot cover {}",
                format_ether(*balance),
                format_ether(*required)
            ),
            SkipReason::NothingToRedeem => f.write_str("nothing to redeem"),
        }
    }
}
