//! Collect native EDU from many wallets into target wallets on Open Campus
//!
//! Columns: A private key, D amount in EDU, E target address. Rows run one
//! at a time with a short pause in between.

use alloy::primitives::U256;
use std::time::Duration;
use wallet_batch::constants::TRANSFER_GAS_LIMIT;
use wallet_batch::{
    column, init_tracing, ColumnLayout, FileConfig, NetworkConfig, RpcClient, RunConfig, Runner,
    SheetJob, SubmitConfig,
};

#[tokio::main]
async fn main() -> eyre::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let network = NetworkConfig::open_campus().with_env_overrides();
    let clients = RpcClient::connect_all(&network.rpc_urls)?;

    let submit = SubmitConfig::legacy(TRANSFER_GAS_LIMIT)
        .with_min_balance(U256::ZERO)
        .with_confirmation(true);
    let config = RunConfig::new(1, submit).with_batch_pause(Duration::from_millis(500));
    let runner = Runner::new(clients, network, config)?;

    let job = SheetJob::new(
        FileConfig::from_env("data.csv", "results.csv"),
        1,
        ColumnLayout::native_transfer(column(b'A'), column(b'D'), column(b'E')),
    );
    let summary = job.run(&runner).await?;
    tracing::info!(%summary, "Done");

    Ok(())
}
