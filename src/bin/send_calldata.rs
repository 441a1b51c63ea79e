//! Send raw calldata from every wallet of the input table on Base
//!
//! Columns: A private key, C contract, D calldata (hex). Batches alternate
//! between two public RPC endpoints; `RPC_URL` replaces them.

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
        .with_rpc_urls(["https://base.llamarpc.com", "https://base.drpc.org"])
        .with_env_overrides();
    let clients = RpcClient::connect_all(&network.rpc_urls)?;

    let submit = SubmitConfig::eip1559(500_000, gwei("0.02")?, gwei("0.001")?);
    let runner = Runner::new(clients, network, RunConfig::new(2, submit))?;

    let job = SheetJob::new(
        FileConfig::from_env("data.csv", "results.csv"),
        1,
        ColumnLayout::contract_call(column(b'A'), column(b'C'), column(b'D')),
    );
    let summary = job.run(&runner).await?;
    tracing::info!(%summary, "Done");

    Ok(())
}
