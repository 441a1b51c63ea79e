//! Network client: the only component that talks to the RPC endpoint

use crate::constants::{RECEIPT_POLL_ATTEMPTS, RECEIPT_POLL_INTERVAL};
use crate::contracts::{ICToken, IERC20};
use crate::types::Confirmation;
use alloy::consensus::TxEnvelope;
use alloy::network::{Ethereum, TransactionBuilder};
use alloy::primitives::{Address, Bytes, TxHash, U256};
use alloy::providers::{Provider, ProviderBuilder, RootProvider};
use alloy::rpc::types::{TransactionReceipt, TransactionRequest};
use alloy::sol_types::SolCall;
use alloy::transports::http::reqwest::Url;
use eyre::{Context, Result};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Capabilities consumed from a blockchain RPC endpoint
///
/// Passed explicitly to every operation so tests can substitute a fake.
pub trait ChainClient: Send + Sync {
    /// Endpoint identifier, for logs
    fn endpoint(&self) -> &str;

    /// Native balance of an address (wei)
    fn get_balance(&self, address: Address) -> impl Future<Output = Result<U256>> + Send;

    /// Transaction count of an address including pending transactions
    fn get_pending_nonce(&self, address: Address) -> impl Future<Output = Result<u64>> + Send;

    /// Current legacy gas price (wei)
    fn get_gas_price(&self) -> impl Future<Output = Result<u128>> + Send;

    /// Read-only contract call
    fn call(&self, to: Address, data: Bytes) -> impl Future<Output = Result<Bytes>> + Send;

    /// Broadcast a signed transaction
    fn send_transaction(
        &self,
        envelope: TxEnvelope,
    ) -> impl Future<Output = Result<TxHash>> + Send;

    /// Wait until the transaction is included and report its execution
    fn wait_for_confirmation(
        &self,
        hash: TxHash,
    ) -> impl Future<Output = Result<Confirmation>> + Send;
}

/// JSON-RPC client over HTTP
#[derive(Clone)]
pub struct RpcClient {
    /// Provider without fillers: every request is fully specified before signing
    provider: Arc<RootProvider<Ethereum>>,
    endpoint: String,
    poll_interval: Duration,
    max_polls: u32,
}

impl RpcClient {
    /// Connect to an HTTP RPC endpoint
    pub fn connect(rpc_url: impl AsRef<str>) -> Result<Self> {
        let endpoint = rpc_url.as_ref().to_string();
        let url: Url = endpoint.parse().context("Invalid RPC URL")?;
        let provider = ProviderBuilder::new()
            .disable_recommended_fillers()
            .network::<Ethereum>()
            .connect_http(url);

        Ok(Self {
            provider: Arc::new(provider),
            endpoint,
            poll_interval: RECEIPT_POLL_INTERVAL,
            max_polls: RECEIPT_POLL_ATTEMPTS,
        })
    }

    /// Connect to every endpoint of a network, in order
    pub fn connect_all<I, S>(rpc_urls: I) -> Result<Vec<Self>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        rpc_urls.into_iter().map(|url| Self::connect(url)).collect()
    }

    /// Set the receipt polling schedule
    pub fn with_receipt_polling(mut self, interval: Duration, max_polls: u32) -> Self {
        self.poll_interval = interval;
        self.max_polls = max_polls;
        self
    }
}

impl ChainClient for RpcClient {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn get_balance(&self, address: Address) -> Result<U256> {
        let balance: U256 = self
            .provider
            .get_balance(address)
            .await
            .context("Failed to get balance")?;

        Ok(balance)
    }

    async fn get_pending_nonce(&self, address: Address) -> Result<u64> {
        let nonce: u64 = self
            .provider
            .get_transaction_count(address)
            .pending()
            .await
            .context("Failed to get transaction count")?;

        Ok(nonce)
    }

    async fn get_gas_price(&self) -> Result<u128> {
        let price: u128 = self
            .provider
            .get_gas_price()
            .await
            .context("Failed to get gas price")?;

        Ok(price)
    }

    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes> {
        let result: Bytes = self
            .provider
            .call(TransactionRequest::default().with_to(to).with_input(data))
            .await
            .context("Failed to call contract")?;

        Ok(result)
    }

    async fn send_transaction(&self, envelope: TxEnvelope) -> Result<TxHash> {
        let pending_tx = self
            .provider
            .send_tx_envelope(envelope)
            .await
            .context("Failed to send transaction")?;

        Ok(*pending_tx.tx_hash())
    }

    async fn wait_for_confirmation(&self, hash: TxHash) -> Result<Confirmation> {
        for _ in 0..self.max_polls {
            let receipt: Option<TransactionReceipt> = self
                .provider
                .get_transaction_receipt(hash)
                .await
                .context("Failed to get transaction receipt")?;

            if let Some(receipt) = receipt {
                return Ok(Confirmation {
                    hash: receipt.transaction_hash,
                    block_number: receipt.block_number.unwrap_or(0),
                    gas_used: receipt.gas_used,
                    success: receipt.status(),
                });
            }

            tokio::time::sleep(self.poll_interval).await;
        }

        eyre::bail!("Transaction receipt not found after timeout: {}", hash)
    }
}

// ========== Contract helpers ==========

/// ERC20 `decimals()`
pub async fn token_decimals<C: ChainClient>(client: &C, token: Address) -> Result<u8> {
    let data = IERC20::decimalsCall {}.abi_encode();
    let result = client
        .call(token, data.into())
        .await
        .context("Failed to call decimals")?;

    let decimals =
        IERC20::decimalsCall::abi_decode_returns(&result).context("Failed to decode decimals")?;

    Ok(decimals)
}

/// ERC20 `balanceOf(owner)`
pub async fn token_balance<C: ChainClient>(
    client: &C,
    token: Address,
    owner: Address,
) -> Result<U256> {
    let data = IERC20::balanceOfCall { account: owner }.abi_encode();
    let result = client
        .call(token, data.into())
        .await
        .context("Failed to call balanceOf")?;

    let balance =
        IERC20::balanceOfCall::abi_decode_returns(&result).context("Failed to decode balance")?;

    Ok(balance)
}

/// Market-token `balanceOf(owner)`
pub async fn market_balance<C: ChainClient>(
    client: &C,
    market: Address,
    owner: Address,
) -> Result<U256> {
    let data = ICToken::balanceOfCall { owner }.abi_encode();
    let result = client
        .call(market, data.into())
        .await
        .context("Failed to call market balanceOf")?;

    let balance = ICToken::balanceOfCall::abi_decode_returns(&result)
        .context("Failed to decode market balance")?;

    Ok(balance)
}
