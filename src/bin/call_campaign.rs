//! Random contract-call campaign on Open Campus
//!
//! Column A holds private keys from row 3. Pools of (contract, calldata)
//! pairs sit in columns B/C, D/E, F/G, J/K, L/M, N/O, T/U and V/W, with each
//! pool's cycle count in row 2 of its contract column.

use eyre::ensure;
use std::time::Duration;
use wallet_batch::{
    collect_rows, column, init_tracing, pools_from_sheet, run_campaign, signing_keys,
    CsvRowSource, FileConfig, NetworkConfig, RpcClient, RunConfig, Runner, SubmitConfig,
    POOL_COLUMNS,
};

const SKIP_ROWS: usize = 2;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let network = NetworkConfig::open_campus().with_env_overrides();
    let clients = RpcClient::connect_all(&network.rpc_urls)?;

    let files = FileConfig::from_env("data.csv", "results.csv");
    let mut source = CsvRowSource::open(&files.input, SKIP_ROWS)?;
    let rows = collect_rows(&mut source)?;
    let keys = signing_keys(&rows, column(b'A'));
    ensure!(!keys.is_empty(), "No private keys found in {}", files.input.display());

    let pools = pools_from_sheet(source.metadata(), &rows, &POOL_COLUMNS);

    let submit = SubmitConfig::legacy(50_000_000).with_confirmation(true);
    let config = RunConfig::new(5, submit).with_batch_pause(Duration::from_secs(1));
    let runner = Runner::new(clients, network, config)?;

    let results = run_campaign(&runner, &keys, &pools, &mut rand::thread_rng()).await?;
    tracing::info!(cycles = results.len(), "All transactions completed");

    Ok(())
}
