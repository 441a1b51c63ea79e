//! Native balance checks across many wallets

use crate::batch::run_in_batches;
use crate::client::ChainClient;
use crate::constants::format_ether;
use crate::retry::{retry, RetryPolicy};
use crate::signer::{LocalSigner, TransactionSigner};
use crate::types::SecretKey;
use alloy::primitives::{Address, U256};
use eyre::Result;
use std::fmt;
use tracing::{error, info, warn};

/// Balance of one wallet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceReport {
    /// `None` when the key could not be parsed
    pub address: Option<Address>,
    /// `None` when the balance could not be fetched
    pub balance: Option<U256>,
    pub below_minimum: bool,
}

impl fmt::Display for BalanceReport {
    /// Balance in ether units, `error` when unknown
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.balance {
            Some(balance) => f.write_str(&format_ether(balance)),
            None => f.write_str("error"),
        }
    }
}

/// Fetch the balance of every key's address, `batch_size` at a time
///
/// Reports follow key order. A failed fetch is recorded in the report,
/// it does not fail the whole check.
pub async fn check_balances<C: ChainClient>(
    client: &C,
    keys: &[SecretKey],
    policy: &RetryPolicy,
    minimum: U256,
    batch_size: usize,
) -> Result<Vec<BalanceReport>> {
    run_in_batches(keys.to_vec(), batch_size, None, |key, position, _| async move {
        let address = match LocalSigner::from_private_key(key.expose_secret()) {
            Ok(signer) => signer.address(),
            Err(err) => {
                error!(row = position + 1, "Invalid private key: {}", err);
                return BalanceReport {
                    address: None,
                    balance: None,
                    below_minimum: false,
                };
            }
        };

        match retry(policy, "get_balance", || client.get_balance(address)).await {
            Ok(balance) => {
                let below_minimum = balance < minimum;
                if below_minimum {
                    warn!(address = %address, balance = %format_ether(balance), "Balance below minimum");
                } else {
                    info!(address = %address, balance = %format_ether(balance), "Balance");
                }
                BalanceReport {
                    address: Some(address),
                    balance: Some(balance),
                    below_minimum,
                }
            }
            Err(err) => {
                error!(address = %address, "Failed to fetch balance: {:#}", err);
                BalanceReport {
                    address: Some(address),
                    balance: None,
                    below_minimum: false,
                }
            }
        }
    })
    .await
}
