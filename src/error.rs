//! Error types for wallet-batch
//!
//! Uses `eyre` for ergonomic error handling with context. Per-row problems
//! never surface as errors past the row boundary; they become
//! [`TransactionOutcome`](crate::types::TransactionOutcome) values instead.
//! An `Err` escaping a public entry point is a setup/configuration error.

pub use eyre::{bail, ensure, eyre, Context, Report, Result};
