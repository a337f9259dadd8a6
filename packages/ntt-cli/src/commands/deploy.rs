//! `ntt init`, `ntt add-chain`, `ntt clone` and `ntt upgrade`

use alloy::primitives::U256;
use eyre::{eyre, Result};
use ntt_rs::pull::fill_inbound_limits;
use ntt_rs::{
    discover_deployment, parse_decimal_string, pull_chain, same_address, Chain, ChainConfig,
    DeployRequest, Deployment, DiscoveredDeployment, Mode, Network, NttError,
};
use std::path::Path;
use tracing::{info, warn};

use super::Services;
use crate::manifest;

/// `ntt init <network>`
pub fn init(path: &Path, network: Network) -> Result<Deployment> {
    let deployment = manifest::create(path, network)?;
    println!("Created {} for {}", path.display(), network);
    Ok(deployment)
}

/// Arguments of `ntt add-chain`
#[derive(Debug, Clone)]
pub struct AddChainArgs {
    pub chain: Chain,
    pub mode: Mode,
    pub token: String,
    /// Existing manager; deploy a new one when absent
    pub manager: Option<String>,
    /// Initial outbound limit for a new deployment, in raw token units
    pub outbound_limit: Option<String>,
}

/// `ntt add-chain`: register or deploy a manager and pull it into the manifest
pub async fn add_chain(path: &Path, args: &AddChainArgs, services: &Services<'_>) -> Result<ChainConfig> {
    let mut deployment = manifest::load(path)?;
    let chain = args.chain;

    if deployment.chains.contains_key(&chain) {
        return Err(eyre!("{} is already part of the deployment", chain));
    }
    if !chain.supports_network(deployment.network) {
        return Err(NttError::ChainNotOnNetwork {
            chain,
            network: deployment.network,
        }
        .into());
    }
    // Reject a second locking chain before anything is deployed
    deployment.clone().set_mode(chain, args.mode)?;

    let manager = match &args.manager {
        Some(manager) => manager.clone(),
        None => {
            let outbound_limit = match &args.outbound_limit {
                Some(limit) => parse_decimal_string(limit)?,
                None => U256::ZERO,
            };
            let request = DeployRequest {
                chain,
                mode: args.mode,
                token: args.token.clone(),
                outbound_limit,
            };
            info!(chain = %chain, mode = %args.mode, "Deploying manager");
            services.deployer.deploy(&request).await?.manager
        }
    };

    let local = ChainConfig {
        mode: Some(args.mode),
        manager,
        token: args.token.clone(),
        ..Default::default()
    };
    let mut dep = pull_chain(chain, deployment.network, &local, services.factory, &services.retry).await?;

    if dep.remote.mode != Some(args.mode) {
        return Err(eyre!(
            "{} manager is not in {} mode (found {:?})",
            chain,
            args.mode,
            dep.remote.mode
        ));
    }
    if !same_address(chain.platform(), &dep.remote.token, &args.token) {
        return Err(eyre!(
            "{} manager manages token {}, not {}",
            chain,
            dep.remote.token,
            args.token
        ));
    }

    let others: Vec<Chain> = deployment.chains.keys().copied().collect();
    fill_inbound_limits(&mut dep, &others, &services.retry).await?;

    deployment.insert_chain(chain, dep.remote.clone())?;
    manifest::save(path, &deployment)?;

    println!("Added {} ({}) to {}", chain, dep.remote.manager, path.display());
    Ok(dep.remote)
}

/// `ntt clone <network> <chain> <manager>`
pub async fn clone(
    path: &Path,
    network: Network,
    chain: Chain,
    manager: &str,
    services: &Services<'_>,
) -> Result<DiscoveredDeployment> {
    if path.exists() {
        return Err(eyre!("{} already exists", path.display()));
    }
    if !chain.supports_network(network) {
        return Err(NttError::ChainNotOnNetwork { chain, network }.into());
    }

    let mut discovered =
        discover_deployment(network, chain, manager, services.factory, &services.retry).await?;
    discovered.deployment.infer_missing_modes();
    manifest::save(path, &discovered.deployment)?;

    for (skipped, reason) in &discovered.skipped {
        warn!(chain = %skipped, reason = %reason, "Peer not cloned");
        eprintln!("Skipped {}: {}", skipped, reason);
    }
    println!(
        "Cloned {} chain(s) into {}",
        discovered.deployment.chains.len(),
        path.display()
    );
    Ok(discovered)
}

/// `ntt upgrade <chain> --ver <version>`
pub async fn upgrade(
    path: &Path,
    chain: Chain,
    version: &str,
    services: &Services<'_>,
) -> Result<ChainConfig> {
    let mut deployment = manifest::load(path)?;
    let local = deployment
        .chains
        .get(&chain)
        .cloned()
        .ok_or_else(|| eyre!("{} is not part of the deployment", chain))?;
    if local.manager.is_empty() {
        return Err(NttError::MissingManager(chain).into());
    }

    let before = pull_chain(chain, deployment.network, &local, services.factory, &services.retry).await?;
    if before.remote.version == version {
        println!("{} is already at {}", chain, version);
        return Ok(local);
    }

    services.deployer.upgrade(chain, &local.manager, version).await?;

    let after = pull_chain(chain, deployment.network, &local, services.factory, &services.retry).await?;
    if after.remote.version != version {
        warn!(
            chain = %chain,
            expected = %version,
            found = %after.remote.version,
            "Version after upgrade does not match"
        );
    }

    let mut updated = local;
    updated.version = after.remote.version.clone();
    deployment.chains.insert(chain, updated.clone());
    manifest::save(path, &deployment)?;

    println!("Upgraded {} to {}", chain, updated.version);
    Ok(updated)
}
