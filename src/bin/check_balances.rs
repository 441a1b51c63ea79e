//! Check the native balance of every wallet on Open Campus
//!
//! Keys are read from column A starting at row 3; the balance (EDU) is
//! written into column D of the output table.

use eyre::ensure;
use wallet_batch::constants::default_min_balance;
use wallet_batch::{
    check_balances, collect_rows, column, init_tracing, signing_keys, CsvRowSource, FileConfig,
    NetworkConfig, ResultTable, RetryPolicy, RpcClient,
};

const SKIP_ROWS: usize = 2;
const BALANCE_COLUMN: usize = column(b'D');

#[tokio::main]
async fn main() -> eyre::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let network = NetworkConfig::open_campus().with_env_overrides();
    network.validate()?;
    let client = RpcClient::connect(&network.rpc_urls[0])?;
    let files = FileConfig::from_env("data.csv", "sodu.csv");

    let mut source = CsvRowSource::open(&files.input, SKIP_ROWS)?;
    let rows = collect_rows(&mut source)?;
    let keyed = signing_keys(&rows, column(b'A'));
    ensure!(!keyed.is_empty(), "No private keys found in {}", files.input.display());

    let keys: Vec<_> = keyed.iter().map(|row| row.key.clone()).collect();
    let reports = check_balances(
        &client,
        &keys,
        &RetryPolicy::default(),
        default_min_balance(),
        keys.len(),
    )
    .await?;

    let mut table = ResultTable::new(source.metadata().to_vec());
    for row in &rows {
        table.push(row.cells.clone());
    }
    for (row, report) in keyed.iter().zip(&reports) {
        table.set_cell(row.index, BALANCE_COLUMN, report.to_string());
    }
    table.write_csv(&files.output)?;

    let below = reports.iter().filter(|report| report.below_minimum).count();
    tracing::info!(
        wallets = reports.len(),
        below_minimum = below,
        output = %files.output.display(),
        "Balances saved"
    );

    Ok(())
}
