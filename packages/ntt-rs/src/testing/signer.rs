//! Mock signer, signer provider and deployer

use async_trait::async_trait;
use eyre::{eyre, Result};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crate::deployer::{DeployRequest, DeployedContracts, Deployer};
use crate::signer::{Signer, SignerProvider, TxPayload, UnsignedTransaction};
use crate::types::Chain;

use super::network::{MockCall, MockNetwork};

static TX_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Applies mock transactions to the network as `address`
pub struct MockSigner {
    chain: Chain,
    address: String,
    network: MockNetwork,
}

impl MockSigner {
    pub fn new(chain: Chain, address: impl Into<String>, network: MockNetwork) -> Self {
        Self {
            chain,
            address: address.into(),
            network,
        }
    }
}

#[async_trait]
impl Signer for MockSigner {
    fn address(&self) -> String {
        self.address.clone()
    }

    async fn sign_and_send(&self, tx: UnsignedTransaction) -> Result<String> {
        if tx.chain != self.chain {
            return Err(eyre!(
                "Signer for {} cannot submit a {} transaction",
                self.chain,
                tx.chain
            ));
        }
        let call: MockCall = match &tx.payload {
            TxPayload::Raw(bytes) => serde_json::from_slice(bytes)?,
            TxPayload::Evm(_) => return Err(eyre!("Mock signer only accepts raw transactions")),
        };
        self.network
            .apply(self.chain, &self.address, &tx.description, call)?;
        Ok(format!(
            "0xmock{:08x}",
            TX_COUNTER.fetch_add(1, Ordering::Relaxed)
        ))
    }
}

/// Hands out signers acting as each chain's owner, or as a fixed account
pub struct MockSignerProvider {
    network: MockNetwork,
    address: Option<String>,
}

impl MockSignerProvider {
    /// Signers that own every chain
    pub fn owner(network: MockNetwork) -> Self {
        Self {
            network,
            address: None,
        }
    }

    /// Signers acting as `address` on every chain
    pub fn as_account(network: MockNetwork, address: impl Into<String>) -> Self {
        Self {
            network,
            address: Some(address.into()),
        }
    }
}

impl SignerProvider for MockSignerProvider {
    fn signer_for(&self, chain: Chain) -> Result<Arc<dyn Signer>> {
        let address = match &self.address {
            Some(address) => address.clone(),
            None => self.network.owner(chain),
        };
        Ok(Arc::new(MockSigner::new(chain, address, self.network.clone())))
    }
}

/// Deploys into and upgrades the mock network, recording upgrades
pub struct MockDeployer {
    network: MockNetwork,
    upgrades: Mutex<Vec<(Chain, String)>>,
}

impl MockDeployer {
    pub fn new(network: MockNetwork) -> Self {
        Self {
            network,
            upgrades: Mutex::new(Vec::new()),
        }
    }

    pub fn upgrades(&self) -> Vec<(Chain, String)> {
        self.upgrades
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl Deployer for MockDeployer {
    async fn deploy(&self, request: &DeployRequest) -> Result<DeployedContracts> {
        if self.network.state(request.chain).is_some() {
            return Err(eyre!("{} already has a deployment", request.chain));
        }
        self.network.add_chain(request.chain, request.mode, 18);
        let outbound = request.outbound_limit;
        let token = request.token.clone();
        self.network.update(request.chain, |state| {
            state.outbound_limit = outbound;
            state.token = token;
        });
        let state = self
            .network
            .state(request.chain)
            .ok_or_else(|| eyre!("{} deployment vanished", request.chain))?;
        Ok(DeployedContracts {
            manager: state.manager,
            transceiver: state.transceiver,
        })
    }

    async fn upgrade(&self, chain: Chain, manager: &str, version: &str) -> Result<()> {
        self.network.set_version(chain, manager, version)?;
        self.upgrades
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((chain, version.to_string()));
        Ok(())
    }
}
