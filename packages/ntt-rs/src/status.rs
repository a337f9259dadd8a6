//! Read-only drift report
//!
//! Combines the per-chain diff with the peer checker's findings.

use eyre::Result;
use std::collections::BTreeMap;

use crate::diff::DiffTree;
use crate::peers::{check_deployment, MissingImplicitConfig};
use crate::pull::ChainDeployment;
use crate::retry::RetryConfig;
use crate::types::Chain;

#[derive(Debug, Clone)]
pub struct ChainStatus {
    pub chain: Chain,
    pub diff: DiffTree,
    pub missing: MissingImplicitConfig,
}

impl ChainStatus {
    pub fn is_clean(&self) -> bool {
        self.diff.is_empty() && self.missing.is_clean()
    }
}

#[derive(Debug, Clone, Default)]
pub struct StatusReport {
    pub chains: Vec<ChainStatus>,
}

impl StatusReport {
    /// No drift and no missing registrations on any chain
    pub fn is_clean(&self) -> bool {
        self.chains.iter().all(ChainStatus::is_clean)
    }

    pub fn missing(&self) -> BTreeMap<Chain, MissingImplicitConfig> {
        self.chains
            .iter()
            .map(|c| (c.chain, c.missing.clone()))
            .collect()
    }
}

/// Diff every chain and check its peers
pub async fn compute_status(deps: &[ChainDeployment], retry: &RetryConfig) -> Result<StatusReport> {
    let mut missing = check_deployment(deps, retry).await;

    let mut chains = Vec::with_capacity(deps.len());
    for dep in deps {
        chains.push(ChainStatus {
            chain: dep.chain,
            diff: dep.diff()?,
            missing: missing.remove(&dep.chain).unwrap_or_default(),
        });
    }
    Ok(StatusReport { chains })
}
