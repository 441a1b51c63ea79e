//! Batched submission pipeline

use crate::batch::run_in_batches;
use crate::client::ChainClient;
use crate::config::{NetworkConfig, RunConfig};
use crate::nonce::NonceTracker;
use crate::report::summarize;
use crate::submitter::{ParsedRow, RedeemRule, Submitter};
use crate::types::TransactionOutcome;
use eyre::{ensure, Result};
use tracing::info;

/// Runs rows through the submitter in batches, rotating clients per batch
pub struct Runner<C: ChainClient> {
    clients: Vec<C>,
    network: NetworkConfig,
    config: RunConfig,
    nonces: NonceTracker,
    redeem: RedeemRule,
}

impl<C: ChainClient> Runner<C> {
    /// Validates the configuration; at least one client is required
    pub fn new(clients: Vec<C>, network: NetworkConfig, config: RunConfig) -> Result<Self> {
        ensure!(!clients.is_empty(), "{}: no RPC client configured", network.name);
        network.validate()?;
        config.validate()?;

        Ok(Self {
            clients,
            network,
            config,
            nonces: NonceTracker::new(),
            redeem: RedeemRule::default(),
        })
    }

    pub fn with_redeem_rule(mut self, redeem: RedeemRule) -> Self {
        self.redeem = redeem;
        self
    }

    pub fn network(&self) -> &NetworkConfig {
        &self.network
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Client used for the batch at `batch_index`
    pub fn client_for(&self, batch_index: usize) -> &C {
        &self.clients[batch_index % self.clients.len()]
    }

    /// Submit every row; outcomes come back in row order
    pub async fn run(&self, rows: Vec<ParsedRow>) -> Result<Vec<TransactionOutcome>> {
        info!(
            network = %self.network.name,
            rows = rows.len(),
            batch_size = self.config.batch_size,
            "Starting run"
        );

        let outcomes = run_in_batches(
            rows,
            self.config.batch_size,
            self.config.batch_pause,
            |row, _, batch_index| {
                let submitter = Submitter::new(
                    self.client_for(batch_index),
                    &self.network,
                    &self.config.submit,
                    &self.config.retry,
                    &self.nonces,
                )
                .with_redeem_rule(self.redeem);
                async move { submitter.submit(row).await }
            },
        )
        .await?;

        info!(summary = %summarize(&outcomes), "Run complete");
        Ok(outcomes)
    }
}
