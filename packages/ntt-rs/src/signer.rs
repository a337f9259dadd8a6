//! Unsigned transactions and the signing capability
//!
//! Adapters produce [`UnsignedTransaction`]s; a [`Signer`] signs and submits
//! them one at a time. Signers are obtained per chain from a
//! [`SignerProvider`].

use alloy::rpc::types::TransactionRequest;
use async_trait::async_trait;
use eyre::Result;
use std::fmt;
use std::sync::Arc;

use crate::types::Chain;

/// Platform-specific transaction body
#[derive(Clone)]
pub enum TxPayload {
    /// EVM call, filled and signed by an EVM wallet
    Evm(TransactionRequest),
    /// Opaque serialized message for platforms without a typed payload here
    Raw(Vec<u8>),
}

impl fmt::Debug for TxPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TxPayload::Evm(tx) => f
                .debug_struct("Evm")
                .field("to", &tx.to)
                .field("value", &tx.value)
                .finish(),
            TxPayload::Raw(bytes) => write!(f, "Raw({} bytes)", bytes.len()),
        }
    }
}

/// A transaction ready to be signed
#[derive(Debug, Clone)]
pub struct UnsignedTransaction {
    pub chain: Chain,
    /// Short human-readable label, used in logs
    pub description: String,
    pub payload: TxPayload,
}

impl UnsignedTransaction {
    pub fn evm(chain: Chain, description: impl Into<String>, tx: TransactionRequest) -> Self {
        Self {
            chain,
            description: description.into(),
            payload: TxPayload::Evm(tx),
        }
    }

    pub fn raw(chain: Chain, description: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            chain,
            description: description.into(),
            payload: TxPayload::Raw(bytes),
        }
    }
}

/// Signs and submits transactions for one chain
#[async_trait]
pub trait Signer: Send + Sync {
    /// Native address of the signing account
    fn address(&self) -> String;

    /// Sign, submit and wait for the transaction; returns its id/hash
    async fn sign_and_send(&self, tx: UnsignedTransaction) -> Result<String>;
}

/// Hands out a signer for each chain
pub trait SignerProvider: Send + Sync {
    fn signer_for(&self, chain: Chain) -> Result<Arc<dyn Signer>>;
}

/// Submit transactions in order, stopping at the first failure
pub async fn send_all(signer: &dyn Signer, txs: Vec<UnsignedTransaction>) -> Result<Vec<String>> {
    let mut hashes = Vec::with_capacity(txs.len());
    for tx in txs {
        let description = tx.description.clone();
        let chain = tx.chain;
        let hash = signer.sign_and_send(tx).await?;
        tracing::info!(chain = %chain, tx = %hash, "{}", description);
        hashes.push(hash);
    }
    Ok(hashes)
}
