//! Fixed-size batch driver
//!
//! Items are split into consecutive groups of `batch_size`. All operations of
//! a group are started together and the next group starts only once every
//! operation of the current group has finished. Results come back in item
//! order, never completion order.

use eyre::{ensure, Result};
use futures::future::join_all;
use std::future::Future;
use std::time::Duration;
use tracing::info;

/// Number of groups `total` items split into with `batch_size` per group
pub fn batch_count(total: usize, batch_size: usize) -> usize {
    if batch_size == 0 {
        return 0;
    }
    total.div_ceil(batch_size)
}

/// Run `op` over `items` in sequential batches of concurrent operations
///
/// `op` receives the item, its position in `items` and the batch index.
/// An operation's failure must be encoded in `R`; nothing here aborts
/// siblings or later batches. `pause` is slept between batches.
pub async fn run_in_batches<T, R, F, Fut>(
    items: Vec<T>,
    batch_size: usize,
    pause: Option<Duration>,
    mut op: F,
) -> Result<Vec<R>>
where
    F: FnMut(T, usize, usize) -> Fut,
    Fut: Future<Output = R>,
{
    ensure!(batch_size >= 1, "Batch size must be at least 1");

    let total = items.len();
    let batches = batch_count(total, batch_size);
    let mut results = Vec::with_capacity(total);
    let mut items = items.into_iter();

    for batch_index in 0..batches {
        let offset = batch_index * batch_size;
        let pending: Vec<Fut> = items
            .by_ref()
            .take(batch_size)
            .enumerate()
            .map(|(i, item)| op(item, offset + i, batch_index))
            .collect();

        info!(
            batch = batch_index + 1,
            batches,
            size = pending.len(),
            "Processing batch"
        );

        results.extend(join_all(pending).await);

        if let Some(pause) = pause {
            if batch_index + 1 < batches {
                tokio::time::sleep(pause).await;
            }
        }
    }

    Ok(results)
}
