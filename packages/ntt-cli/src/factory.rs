//! Live chain connections and signers
//!
//! Only EVM chains have a concrete adapter; other platforms fail with
//! `NttError::NoAdapter` when first touched.

use async_trait::async_trait;
use eyre::{eyre, Result};
use ntt_rs::evm::{EvmNtt, EvmSigner};
use ntt_rs::redact::Redacted;
use ntt_rs::{Chain, Ntt, NttError, NttFactory, Platform, Signer, SignerProvider};
use std::sync::Arc;
use tracing::debug;

use crate::rpc::RpcResolver;

/// Environment variable holding the EVM deployer/owner key
pub const PRIVATE_KEY_ENV: &str = "ETH_PRIVATE_KEY";

/// Connects to managers over the resolved RPC endpoints
#[derive(Debug, Clone)]
pub struct RpcNttFactory {
    rpcs: RpcResolver,
}

impl RpcNttFactory {
    pub fn new(rpcs: RpcResolver) -> Self {
        Self { rpcs }
    }
}

#[async_trait]
impl NttFactory for RpcNttFactory {
    async fn connect(&self, chain: Chain, manager: &str) -> Result<Arc<dyn Ntt>> {
        match chain.platform() {
            Platform::Evm => {
                let rpc_url = self.rpcs.rpc_url(chain)?;
                debug!(chain = %chain, rpc = %rpc_url, manager = %manager, "Connecting to manager");
                Ok(Arc::new(EvmNtt::new(chain, &rpc_url, manager)?))
            }
            platform => Err(NttError::NoAdapter { chain, platform }.into()),
        }
    }
}

/// Builds private-key signers on demand
#[derive(Debug, Clone)]
pub struct KeySignerProvider {
    rpcs: RpcResolver,
    private_key: Option<Redacted<String>>,
}

impl KeySignerProvider {
    pub fn new(rpcs: RpcResolver, private_key: Option<String>) -> Self {
        Self {
            rpcs,
            private_key: private_key.map(Redacted),
        }
    }

    /// Read the key from the environment (after `.env` has been loaded)
    pub fn from_env(rpcs: RpcResolver) -> Self {
        Self::new(rpcs, std::env::var(PRIVATE_KEY_ENV).ok())
    }

    pub fn private_key(&self) -> Result<&str> {
        self.private_key
            .as_ref()
            .map(|k| k.expose().as_str())
            .ok_or_else(|| eyre!("{} is not set", PRIVATE_KEY_ENV))
    }
}

impl SignerProvider for KeySignerProvider {
    fn signer_for(&self, chain: Chain) -> Result<Arc<dyn Signer>> {
        match chain.platform() {
            Platform::Evm => {
                let rpc_url = self.rpcs.rpc_url(chain)?;
                let signer = EvmSigner::from_private_key(chain, &rpc_url, self.private_key()?)?;
                Ok(Arc::new(signer))
            }
            platform => Err(NttError::NoAdapter { chain, platform }.into()),
        }
    }
}
