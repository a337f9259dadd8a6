//! Contract deployment and upgrade capability
//!
//! Compiling and broadcasting manager/transceiver contracts is done by
//! external tooling. The reconciliation engine only needs to ask for a
//! deployment (when a chain is added) or an upgrade (when the declared
//! version differs from the on-chain one).

use async_trait::async_trait;
use eyre::Result;

use crate::types::{Chain, Mode};

/// Parameters for deploying a manager and its Wormhole transceiver
#[derive(Debug, Clone)]
pub struct DeployRequest {
    pub chain: Chain,
    pub mode: Mode,
    pub token: String,
    /// Outbound limit in the token's raw units
    pub outbound_limit: alloy::primitives::U256,
}

/// Addresses produced by a deployment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployedContracts {
    pub manager: String,
    pub transceiver: String,
}

#[async_trait]
pub trait Deployer: Send + Sync {
    async fn deploy(&self, request: &DeployRequest) -> Result<DeployedContracts>;

    /// Upgrade the manager at `manager` to `version`
    async fn upgrade(&self, chain: Chain, manager: &str, version: &str) -> Result<()>;
}
