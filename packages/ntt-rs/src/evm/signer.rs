//! EVM Transaction Signing Module
//!
//! Wraps alloy's `PrivateKeySigner` and `EthereumWallet` to sign and submit
//! the calldata produced by the EVM adapters. Nonce, gas and chain id are
//! filled by the provider's recommended fillers.

use alloy::{
    network::EthereumWallet,
    primitives::Address,
    providers::{Provider, ProviderBuilder},
    rpc::types::{TransactionReceipt, TransactionRequest},
    signers::local::PrivateKeySigner,
};
use async_trait::async_trait;
use eyre::{eyre, Result, WrapErr};
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

use crate::redact::Redacted;
use crate::signer::{Signer, TxPayload, UnsignedTransaction};
use crate::types::Chain;

/// Default time to wait for a receipt
const RECEIPT_TIMEOUT: Duration = Duration::from_secs(180);

/// Configuration for the EVM signer
#[derive(Debug, Clone)]
pub struct EvmSignerConfig {
    pub chain: Chain,
    /// RPC URL for the chain
    pub rpc_url: String,
    /// Private key (hex string, with or without 0x prefix)
    pub private_key: Redacted<String>,
}

/// EVM private-key signer for one chain
pub struct EvmSigner {
    chain: Chain,
    wallet: EthereumWallet,
    rpc_url: Url,
    address: Address,
    receipt_timeout: Duration,
}

impl std::fmt::Debug for EvmSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvmSigner")
            .field("chain", &self.chain)
            .field("address", &self.address)
            .field("rpc_url", &self.rpc_url.as_str())
            .finish()
    }
}

impl EvmSigner {
    /// Create a new EVM signer from configuration
    pub fn new(config: EvmSignerConfig) -> Result<Self> {
        let signer: PrivateKeySigner = config
            .private_key
            .0
            .parse()
            .map_err(|e| eyre!("Invalid private key: {}", e))?;

        let address = signer.address();
        let wallet = EthereumWallet::from(signer);
        let rpc_url = config
            .rpc_url
            .parse()
            .map_err(|e| eyre!("Invalid RPC URL: {}", e))?;

        info!(
            address = %address,
            chain = %config.chain,
            "EVM signer initialized"
        );

        Ok(Self {
            chain: config.chain,
            wallet,
            rpc_url,
            address,
            receipt_timeout: RECEIPT_TIMEOUT,
        })
    }

    /// Create from private key string
    pub fn from_private_key(chain: Chain, rpc_url: &str, private_key: &str) -> Result<Self> {
        Self::new(EvmSignerConfig {
            chain,
            rpc_url: rpc_url.to_string(),
            private_key: Redacted(private_key.to_string()),
        })
    }

    pub fn with_receipt_timeout(mut self, timeout: Duration) -> Self {
        self.receipt_timeout = timeout;
        self
    }

    /// Get the signer's address
    pub fn evm_address(&self) -> Address {
        self.address
    }

    /// Send a transaction and wait for its receipt
    pub async fn send_transaction(&self, tx: TransactionRequest) -> Result<TransactionReceipt> {
        let provider = ProviderBuilder::new()
            .with_recommended_fillers()
            .wallet(self.wallet.clone())
            .on_http(self.rpc_url.clone());

        let pending = provider
            .send_transaction(tx)
            .await
            .wrap_err("Failed to send transaction")?;
        debug!(chain = %self.chain, tx = %pending.tx_hash(), "Transaction submitted");

        let receipt = tokio::time::timeout(self.receipt_timeout, pending.get_receipt())
            .await
            .map_err(|_| eyre!("Transaction timed out after {:?}", self.receipt_timeout))?
            .wrap_err("Failed to get transaction receipt")?;

        Ok(receipt)
    }
}

#[async_trait]
impl Signer for EvmSigner {
    fn address(&self) -> String {
        self.address.to_string()
    }

    async fn sign_and_send(&self, tx: UnsignedTransaction) -> Result<String> {
        if tx.chain != self.chain {
            return Err(eyre!(
                "Signer for {} cannot submit a {} transaction",
                self.chain,
                tx.chain
            ));
        }
        let request = match tx.payload {
            TxPayload::Evm(request) => request,
            TxPayload::Raw(_) => return Err(eyre!("{} expects an EVM transaction", self.chain)),
        };

        let receipt = self.send_transaction(request).await?;
        if !receipt.status() {
            return Err(eyre!(
                "{} reverted in {}",
                tx.description,
                receipt.transaction_hash
            ));
        }
        Ok(receipt.transaction_hash.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Anvil's first default account
    const TEST_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    #[test]
    fn test_address_derived_from_key() {
        let signer =
            EvmSigner::from_private_key(Chain::Sepolia, "http://localhost:8545", TEST_KEY).unwrap();
        assert_eq!(
            Signer::address(&signer).to_lowercase(),
            "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266"
        );
    }

    #[test]
    fn test_debug_never_shows_key() {
        let config = EvmSignerConfig {
            chain: Chain::Sepolia,
            rpc_url: "http://localhost:8545".into(),
            private_key: Redacted(TEST_KEY.to_string()),
        };
        let debug = format!("{:?}", config);
        assert!(!debug.contains("ac0974"));
        assert!(debug.contains("<redacted>"));

        let signer = EvmSigner::new(config).unwrap();
        assert!(!format!("{:?}", signer).contains("ac0974"));
    }

    #[test]
    fn test_invalid_key_rejected() {
        assert!(EvmSigner::from_private_key(Chain::Sepolia, "http://localhost:8545", "0x1234").is_err());
    }

    #[tokio::test]
    async fn test_wrong_chain_rejected() {
        let signer =
            EvmSigner::from_private_key(Chain::Sepolia, "http://localhost:8545", TEST_KEY).unwrap();
        let tx = UnsignedTransaction::evm(Chain::Base, "noop", TransactionRequest::default());
        let err = signer.sign_and_send(tx).await.unwrap_err();
        assert!(err.to_string().contains("cannot submit"));
    }
}
