//! Redeem part of every wallet's market-token position on Lisk
//!
//! Column A holds the private key. Each wallet redeems 0.9 / 50 of its
//! market-token balance, rounded to 3 decimals.

use alloy::primitives::{address, Address};
use wallet_batch::constants::gwei;
use wallet_batch::{
    column, init_tracing, ColumnLayout, FileConfig, NetworkConfig, RpcClient, RunConfig, Runner,
    SheetJob, SubmitConfig,
};

/// Market token (6 decimals) the wallets redeem from
const MARKET: Address = address!("0x0D72f18BC4b4A2F0370Af6D799045595d806636F");

#[tokio::main]
async fn main() -> eyre::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let network = NetworkConfig::lisk().with_env_overrides();
    let clients = RpcClient::connect_all(&network.rpc_urls)?;

    let submit =
        SubmitConfig::eip1559(1_900_000, gwei("0.0007")?, gwei("0.0003")?).with_confirmation(true);
    let runner = Runner::new(clients, network, RunConfig::new(1, submit))?;

    let job = SheetJob::new(
        FileConfig::from_env("data.csv", "results.csv"),
        1,
        ColumnLayout::redeem(column(b'A'), MARKET),
    );
    let summary = job.run(&runner).await?;
    tracing::info!(%summary, "Done");

    Ok(())
}
