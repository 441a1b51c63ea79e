//! Transaction signer abstraction
//!
//! A signer turns a fully specified [`TxRequest`] into a signed envelope.
//! Broadcasting is the [`ChainClient`](crate::client::ChainClient)'s job, so
//! signing never touches the network.

mod local;

pub use local::LocalSigner;

use alloy::consensus::TxEnvelope;
use alloy::network::TransactionBuilder;
use alloy::primitives::{Address, Bytes, U256};
use alloy::rpc::types::TransactionRequest;
use eyre::Result;

/// Resolved fee parameters of one transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeeParams {
    /// Pre-London gas price (wei)
    Legacy { gas_price: u128 },
    /// EIP-1559 caps (wei)
    Eip1559 {
        max_fee_per_gas: u128,
        max_priority_fee_per_gas: u128,
    },
}

/// Fully specified transaction request
#[derive(Debug, Clone)]
pub struct TxRequest {
    /// Target address
    pub to: Address,
    /// Transaction value in wei
    pub value: U256,
    /// Encoded calldata
    pub data: Bytes,
    /// Gas ceiling
    pub gas_limit: u64,
    /// Fee parameters
    pub fee: FeeParams,
    /// Sender sequence number
    pub nonce: u64,
    /// Chain ID
    pub chain_id: u64,
}

impl TxRequest {
    /// Convert into an alloy RPC request sent from `from`
    pub fn into_rpc(self, from: Address) -> TransactionRequest {
        let request = TransactionRequest::default()
            .with_from(from)
            .with_to(self.to)
            .with_value(self.value)
            .with_input(self.data)
            .with_gas_limit(self.gas_limit)
            .with_nonce(self.nonce)
            .with_chain_id(self.chain_id);

        match self.fee {
            FeeParams::Legacy { gas_price } => request.with_gas_price(gas_price),
            FeeParams::Eip1559 {
                max_fee_per_gas,
                max_priority_fee_per_gas,
            } => request
                .with_max_fee_per_gas(max_fee_per_gas)
                .with_max_priority_fee_per_gas(max_priority_fee_per_gas),
        }
    }
}

/// Trait for signing EVM transactions
pub trait TransactionSigner: Send + Sync {
    /// Returns the signer's EVM address
    fn address(&self) -> Address;

    /// Signs a transaction, returning the broadcast-ready envelope
    fn sign(&self, tx: TxRequest) -> impl std::future::Future<Output = Result<TxEnvelope>> + Send;
}
