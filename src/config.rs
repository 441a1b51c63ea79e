//! Network and run configuration for wallet-batch

use crate::constants::{default_min_balance, DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRY_DELAY};
use crate::retry::RetryPolicy;
use alloy::primitives::U256;
use eyre::{ensure, Result};
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable overriding the RPC endpoints (comma separated)
pub const RPC_URL_ENV: &str = "RPC_URL";
/// Environment variable overriding the input table path
pub const INPUT_FILE_ENV: &str = "INPUT_FILE";
/// Environment variable overriding the result table path
pub const OUTPUT_FILE_ENV: &str = "OUTPUT_FILE";

/// Input and output table locations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileConfig {
    pub input: PathBuf,
    pub output: PathBuf,
}

impl FileConfig {
    pub fn new(input: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
        }
    }

    /// Defaults, overridden by `INPUT_FILE` / `OUTPUT_FILE` when set
    pub fn from_env(default_input: &str, default_output: &str) -> Self {
        let var = |name: &str, default: &str| {
            std::env::var(name)
                .ok()
                .filter(|value| !value.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };
        Self::new(
            var(INPUT_FILE_ENV, default_input),
            var(OUTPUT_FILE_ENV, default_output),
        )
    }
}

/// Network configuration: chain identity and RPC endpoints
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    /// Human-readable network name
    pub name: String,
    /// Chain ID
    pub chain_id: u64,
    /// RPC endpoint URLs; batches rotate through them in order
    pub rpc_urls: Vec<String>,
    /// Native currency symbol
    pub symbol: String,
    /// Block explorer base URL (optional, for log links)
    pub explorer: Option<String>,
}

impl NetworkConfig {
    /// Create a configuration with a single RPC endpoint
    pub fn new(name: impl Into<String>, chain_id: u64, rpc_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            chain_id,
            rpc_urls: vec![rpc_url.into()],
            symbol: "ETH".to_string(),
            explorer: None,
        }
    }

    /// Base mainnet
    pub fn base() -> Self {
        Self::new("Base", 8453, "https://mainnet.base.org")
            .with_explorer("https://basescan.org")
    }

    /// Lisk mainnet
    pub fn lisk() -> Self {
        Self::new("Lisk", 1135, "https://lisk.drpc.org")
            .with_explorer("https://blockscout.lisk.com")
    }

    /// Open Campus Codex
    pub fn open_campus() -> Self {
        Self::new(
            "Open Campus",
            656476,
            "https://rpc.open-campus-codex.gelato.digital",
        )
        .with_symbol("EDU")
        .with_explorer("https://opencampus-codex.blockscout.com")
    }

    /// Replace the RPC endpoints with a single URL
    pub fn with_rpc_url(mut self, rpc_url: impl Into<String>) -> Self {
        self.rpc_urls = vec![rpc_url.into()];
        self
    }

    /// Replace the RPC endpoints; batches alternate between them
    pub fn with_rpc_urls<I, S>(mut self, rpc_urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rpc_urls = rpc_urls.into_iter().map(Into::into).collect();
        self
    }

    /// Set the native currency symbol
    pub fn with_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.symbol = symbol.into();
        self
    }

    /// Set the block explorer URL
    pub fn with_explorer(mut self, explorer: impl Into<String>) -> Self {
        self.explorer = Some(explorer.into());
        self
    }

    /// Apply the `RPC_URL` environment override, if set
    pub fn with_env_overrides(self) -> Self {
        match std::env::var(RPC_URL_ENV) {
            Ok(value) if !value.trim().is_empty() => {
                let urls: Vec<String> = value
                    .split(',')
                    .map(str::trim)
                    .filter(|url| !url.is_empty())
                    .map(str::to_string)
                    .collect();
                self.with_rpc_urls(urls)
            }
            _ => self,
        }
    }

    /// Explorer link for a transaction hash, if an explorer is configured
    pub fn tx_link(&self, hash: impl std::fmt::Display) -> Option<String> {
        self.explorer
            .as_ref()
            .map(|explorer| format!("{}/tx/{}", explorer.trim_end_matches('/'), hash))
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        ensure!(
            !self.rpc_urls.is_empty(),
            "{}: at least one RPC URL is required",
            self.name
        );
        ensure!(self.chain_id > 0, "{}: chain ID must be non-zero", self.name);
        Ok(())
    }
}

/// How fees are priced for a submitted transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeeModel {
    /// Legacy gas price; `None` queries the network's current price per row
    Legacy { gas_price: Option<u128> },
    /// EIP-1559 fees with caller-supplied caps (wei)
    Eip1559 {
        max_fee_per_gas: u128,
        max_priority_fee_per_gas: u128,
    },
}

/// Per-row submission parameters
#[derive(Debug, Clone)]
pub struct SubmitConfig {
    /// Gas ceiling for every transaction
    pub gas_limit: u64,
    /// Fee parameters
    pub fee: FeeModel,
    /// Wallets holding less than this (wei) are skipped
    pub min_balance: U256,
    /// Wait for inclusion before reporting an outcome
    pub confirm: bool,
}

impl SubmitConfig {
    /// EIP-1559 submission with the given caps
    pub fn eip1559(gas_limit: u64, max_fee_per_gas: u128, max_priority_fee_per_gas: u128) -> Self {
        Self {
            gas_limit,
            fee: FeeModel::Eip1559 {
                max_fee_per_gas,
                max_priority_fee_per_gas,
            },
            min_balance: U256::ZERO,
            confirm: false,
        }
    }

    /// Legacy submission priced at the network gas price
    pub fn legacy(gas_limit: u64) -> Self {
        Self {
            gas_limit,
            fee: FeeModel::Legacy { gas_price: None },
            min_balance: default_min_balance(),
            confirm: false,
        }
    }

    /// Set the minimum balance threshold
    pub fn with_min_balance(mut self, min_balance: U256) -> Self {
        self.min_balance = min_balance;
        self
    }

    /// Wait for confirmation of every transaction
    pub fn with_confirmation(mut self, confirm: bool) -> Self {
        self.confirm = confirm;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        ensure!(self.gas_limit > 0, "Gas limit must be positive");
        if let FeeModel::Eip1559 {
            max_fee_per_gas,
            max_priority_fee_per_gas,
        } = self.fee
        {
            ensure!(
                max_priority_fee_per_gas <= max_fee_per_gas,
                "Priority fee ({}) cannot exceed max fee ({})",
                max_priority_fee_per_gas,
                max_fee_per_gas
            );
        }
        Ok(())
    }
}

/// Configuration of one batched run
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Rows submitted concurrently per batch
    pub batch_size: usize,
    /// Pause between batches
    pub batch_pause: Option<Duration>,
    /// Retry policy for every network call
    pub retry: RetryPolicy,
    /// Per-row submission parameters
    pub submit: SubmitConfig,
}

impl RunConfig {
    /// Create a run configuration with default retry policy and no pause
    pub fn new(batch_size: usize, submit: SubmitConfig) -> Self {
        Self {
            batch_size,
            batch_pause: None,
            retry: RetryPolicy::fixed(DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRY_DELAY),
            submit,
        }
    }

    /// Set the pause between batches
    pub fn with_batch_pause(mut self, pause: Duration) -> Self {
        self.batch_pause = Some(pause);
        self
    }

    /// Set the retry policy
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        ensure!(self.batch_size >= 1, "Batch size must be at least 1");
        self.retry.validate()?;
        self.submit.validate()
    }
}
