//! Local private key signer

use super::{TransactionSigner, TxRequest};
use alloy::consensus::TxEnvelope;
use alloy::network::{EthereumWallet, TransactionBuilder};
use alloy::primitives::Address;
use alloy::signers::local::PrivateKeySigner;
use eyre::{eyre, Context, Result};

/// Local signer using a raw EVM private key
#[derive(Clone)]
pub struct LocalSigner {
    wallet: EthereumWallet,
    address: Address,
}

impl std::fmt::Debug for LocalSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalSigner")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

impl LocalSigner {
    /// Create a new LocalSigner from a private key hex string
    ///
    /// # Arguments
    ///
    /// * `private_key` - Hex-encoded private key (with or without 0x prefix)
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let signer = LocalSigner::from_private_key("0x...")?;
    /// println!("{}", signer.address());
    /// ```
    pub fn from_private_key(private_key: impl AsRef<str>) -> Result<Self> {
        let key = private_key.as_ref().trim();
        let key = key.strip_prefix("0x").unwrap_or(key);

        let signer: PrivateKeySigner = key.parse().context("Failed to parse private key")?;

        let address = signer.address();
        let wallet = EthereumWallet::from(signer);

        Ok(Self { wallet, address })
    }
}

impl TransactionSigner for LocalSigner {
    fn address(&self) -> Address {
        self.address
    }

    async fn sign(&self, tx: TxRequest) -> Result<TxEnvelope> {
        tx.into_rpc(self.address)
            .build(&self.wallet)
            .await
            .map_err(|e| eyre!("Failed to sign transaction: {}", e))
    }
}
