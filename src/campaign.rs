//! Repeated random contract calls from a shared set of wallets
//!
//! The input sheet holds several call pools side by side: each pool is a
//! pair of columns (contract, calldata), and the pool's cycle count sits in
//! the second metadata row above its contract column. For every cycle each
//! wallet submits one call picked at random from the pool.

use crate::client::ChainClient;
use crate::report::summarize;
use crate::runner::Runner;
use crate::sheet::{address_cell, bytes_cell, column, column_name, KeyedRow, SheetRow};
use crate::submitter::ParsedRow;
use crate::types::{Action, InputRow, TransactionOutcome};
use alloy::primitives::{Address, Bytes};
use eyre::Result;
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{info, warn};

/// Contract columns of the shipped campaign sheet (B, D, F, J, L, N, T, V)
pub const POOL_COLUMNS: [usize; 8] = [
    column(b'B'),
    column(b'D'),
    column(b'F'),
    column(b'J'),
    column(b'L'),
    column(b'N'),
    column(b'T'),
    column(b'V'),
];

/// Metadata row holding the per-pool cycle counts
const CYCLES_ROW: usize = 1;

/// Calls one pool picks from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallPool {
    /// Contract column name
    pub label: String,
    pub cycles: usize,
    pub calls: Vec<(Address, Bytes)>,
}

impl CallPool {
    /// Read the pool whose contract column is `contract`; calldata is the next column
    ///
    /// Rows without a valid pair are left out. A missing cycle count means one
    /// cycle.
    pub fn from_sheet(metadata: &[Vec<String>], rows: &[SheetRow], contract: usize) -> Self {
        let label = column_name(contract);
        let cycles = metadata
            .get(CYCLES_ROW)
            .and_then(|row| row.get(contract))
            .map(|cell| cell.trim())
            .filter(|cell| !cell.is_empty())
            .map_or(1, |cell| {
                cell.parse().unwrap_or_else(|_| {
                    warn!(pool = %label, value = cell, "Invalid cycle count, using 1");
                    1
                })
            });

        let calls = rows
            .iter()
            .filter_map(|row| {
                let to = address_cell(row, contract, "contract").ok()?;
                let data = bytes_cell(row, contract + 1, "calldata").ok()?;
                Some((to, data))
            })
            .collect();

        Self {
            label,
            cycles,
            calls,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }
}

/// Read every pool of the sheet, in column order
pub fn pools_from_sheet(
    metadata: &[Vec<String>],
    rows: &[SheetRow],
    columns: &[usize],
) -> Vec<CallPool> {
    columns
        .iter()
        .map(|&contract| CallPool::from_sheet(metadata, rows, contract))
        .collect()
}

/// Outcomes of one cycle of one pool, in key order
#[derive(Debug, Clone)]
pub struct CycleOutcomes {
    pub pool: String,
    pub cycle: usize,
    pub outcomes: Vec<TransactionOutcome>,
}

/// One row per key, each with a call drawn from `pool`
fn draw_rows<R: Rng + ?Sized>(pool: &CallPool, keys: &[KeyedRow], rng: &mut R) -> Vec<ParsedRow> {
    keys.iter()
        .filter_map(|keyed| {
            let (to, data) = pool.calls.choose(rng)?.clone();
            Some(Ok(InputRow::new(
                keyed.line,
                keyed.key.clone(),
                Action::ContractCall { to, data },
            )))
        })
        .collect()
}

/// Run every cycle of every non-empty pool through `runner`
///
/// Calls of a cycle are drawn before the cycle starts, so a seeded `rng`
/// reproduces the same jobs.
pub async fn run_campaign<C: ChainClient, R: Rng + ?Sized>(
    runner: &Runner<C>,
    keys: &[KeyedRow],
    pools: &[CallPool],
    rng: &mut R,
) -> Result<Vec<CycleOutcomes>> {
    let mut results = Vec::new();

    for pool in pools {
        if pool.is_empty() {
            continue;
        }
        info!(
            pool = %pool.label,
            cycles = pool.cycles,
            calls = pool.calls.len(),
            "Starting pool"
        );

        for cycle in 0..pool.cycles {
            info!(pool = %pool.label, cycle = cycle + 1, cycles = pool.cycles, "Starting cycle");

            let rows = draw_rows(pool, keys, rng);
            let outcomes = runner.run(rows).await?;
            results.push(CycleOutcomes {
                pool: pool.label.clone(),
                cycle,
                outcomes,
            });
        }

        info!(pool = %pool.label, "Completed pool");
    }

    let all: Vec<TransactionOutcome> = results
        .iter()
        .flat_map(|cycle| cycle.outcomes.iter().cloned())
        .collect();
    info!(summary = %summarize(&all), "Campaign complete");

    Ok(results)
}
