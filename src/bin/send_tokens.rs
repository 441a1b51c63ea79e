//! Send ERC20 tokens from every wallet of the input table on Base
//!
//! Columns: A private key, B token contract, C recipient, D amount in whole
//! tokens (scaled by the token's own `decimals()`).

use wallet_batch::constants::gwei;
use wallet_batch::{
    column, init_tracing, ColumnLayout, FileConfig, NetworkConfig, RpcClient, RunConfig, Runner,
    SheetJob, SubmitConfig,
};

#[tokio::main]
async fn main() -> eyre::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let network = NetworkConfig::base()
        .with_rpc_url("https://developer-access-mainnet.base.org")
        .with_env_overrides();
    let clients = RpcClient::connect_all(&network.rpc_urls)?;

    let submit =
        SubmitConfig::eip1559(130_000, gwei("0.1")?, gwei("0.02")?).with_confirmation(true);
    let runner = Runner::new(clients, network, RunConfig::new(1, submit))?;

    let job = SheetJob::new(
        FileConfig::from_env("data.csv", "results.csv"),
        1,
        ColumnLayout::token_transfer(column(b'A'), column(b'B'), column(b'C'), column(b'D')),
    );
    let summary = job.run(&runner).await?;
    tracing::info!(%summary, "Done");

    Ok(())
}
