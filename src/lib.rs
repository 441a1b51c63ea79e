//! wallet-batch
//!
//! Batched EVM transaction submission driven by a table of wallets: every
//! row names a signing key and a call (raw calldata, native transfer, ERC20
//! transfer or market-token redeem). Rows are processed in fixed-size
//! concurrent batches with retried network calls and per-signer nonce
//! tracking; every row ends with exactly one outcome in the result table.
//!
//! # Example
//!
//! ```rust,ignore
//! use wallet_batch::{
//!     column, ColumnLayout, FileConfig, NetworkConfig, RpcClient, RunConfig, Runner, SheetJob,
//!     SubmitConfig,
//! };
//!
//! #[tokio::main]
//! async fn main() -> eyre::Result<()> {
//!     let network = NetworkConfig::base().with_env_overrides();
//!     let clients = RpcClient::connect_all(&network.rpc_urls)?;
//!     let config = RunConfig::new(2, SubmitConfig::eip1559(400_000, 6_000_000, 1_000));
//!     let runner = Runner::new(clients, network, config)?;
//!
//!     let layout = ColumnLayout::contract_call(column(b'A'), column(b'C'), column(b'D'));
//!     let job = SheetJob::new(FileConfig::new("data.csv", "results.csv"), 0, layout);
//!     let summary = job.run(&runner).await?;
//!     println!("{}", summary);
//!
//!     Ok(())
//! }
//! ```

pub mod balances;
pub mod batch;
pub mod campaign;
pub mod client;
pub mod config;
pub mod constants;
pub mod contracts;
pub mod error;
pub mod job;
pub mod nonce;
pub mod report;
pub mod retry;
pub mod runner;
pub mod sheet;
pub mod signer;
pub mod submitter;
pub mod types;

#[cfg(test)]
mod testing;

// Re-export main types for convenience
pub use balances::{check_balances, BalanceReport};
pub use batch::run_in_batches;
pub use campaign::{pools_from_sheet, run_campaign, CallPool, CycleOutcomes, POOL_COLUMNS};
pub use client::{ChainClient, RpcClient};
pub use config::{FeeModel, FileConfig, NetworkConfig, RunConfig, SubmitConfig};
pub use error::{eyre, Context, Report, Result};
pub use job::{init_tracing, SheetJob};
pub use nonce::NonceTracker;
pub use report::{summarize, ResultTable, Summary};
pub use retry::{retry, Backoff, ErrorClass, RetryPolicy};
pub use runner::Runner;
pub use sheet::{column, collect_rows, signing_keys, ColumnLayout, CsvRowSource, RowSource, SheetRow};
pub use signer::{LocalSigner, TransactionSigner, TxRequest};
pub use submitter::{RedeemRule, Submitter};
pub use types::{
    Action, InputRow, OutcomeKind, RejectedRow, SecretKey, SkipReason, TransactionOutcome,
};
