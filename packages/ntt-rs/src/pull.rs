//! Deployment puller
//!
//! Reads the live configuration of every declared chain into a
//! [`ChainDeployment`]: the adapter handles, the token decimals, and the
//! on-chain ("remote") config next to the declared ("local") one.
//! Runtime views are rebuilt on every invocation and never persisted.

use eyre::{eyre, Result, WrapErr};
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::address::{same_address, UniversalAddress};
use crate::diff::{diff_values, DiffTree};
use crate::error::NttError;
use crate::ntt::{Ntt, NttFactory, NttTransceiver};
use crate::numeric::format_number;
use crate::retry::{retry_with_exponential_backoff, RetryConfig};
use crate::types::{
    Chain, ChainConfig, Deployment, LimitsConfig, Network, Platform, TransceiversConfig,
    WormholeTransceiverConfig,
};

/// Live view of one chain of a deployment
pub struct ChainDeployment {
    pub chain: Chain,
    pub network: Network,
    pub ntt: Arc<dyn Ntt>,
    /// The primary (index 0) Wormhole transceiver
    pub transceiver: Arc<dyn NttTransceiver>,
    pub decimals: u8,
    /// Manager address in universal form, as peers register it
    pub manager: UniversalAddress,
    /// Transceiver address in universal form, as peers register it
    pub transceiver_address: UniversalAddress,
    /// Declared configuration
    pub local: ChainConfig,
    /// Configuration read from chain
    pub remote: ChainConfig,
}

impl std::fmt::Debug for ChainDeployment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainDeployment")
            .field("chain", &self.chain)
            .field("decimals", &self.decimals)
            .field("manager", &self.manager)
            .finish()
    }
}

impl ChainDeployment {
    /// Difference between the declared and on-chain config.
    ///
    /// Addresses that only differ in spelling (case, padding) are equal.
    pub fn diff(&self) -> Result<DiffTree> {
        let local = normalize_addresses(self.chain.platform(), &self.local, &self.remote);
        let local = serde_json::to_value(&local)?;
        let remote = serde_json::to_value(&self.remote)?;
        Ok(diff_values(&local, &remote))
    }
}

fn normalize_addresses(platform: Platform, local: &ChainConfig, remote: &ChainConfig) -> ChainConfig {
    fn align(platform: Platform, local: &mut String, remote: &str) {
        if same_address(platform, local, remote) {
            *local = remote.to_string();
        }
    }
    fn align_opt(platform: Platform, local: &mut Option<String>, remote: &Option<String>) {
        if let (Some(l), Some(r)) = (local.as_mut(), remote) {
            align(platform, l, r);
        }
    }

    let mut out = local.clone();
    align_opt(platform, &mut out.owner, &remote.owner);
    align(platform, &mut out.manager, &remote.manager);
    align(platform, &mut out.token, &remote.token);
    align(
        platform,
        &mut out.transceivers.wormhole.address,
        &remote.transceivers.wormhole.address,
    );
    align_opt(platform, &mut out.pauser, &remote.pauser);
    align_opt(
        platform,
        &mut out.transceivers.wormhole.pauser,
        &remote.transceivers.wormhole.pauser,
    );
    out
}

/// Result of reading one chain's configuration
pub struct PulledChain {
    pub config: ChainConfig,
    pub decimals: u8,
    pub transceiver: Arc<dyn NttTransceiver>,
}

/// Read a chain's configuration from its manager and primary transceiver.
///
/// `limits.inbound` is left empty; it is filled by [`pull_inbound_limits`]
/// once every chain has been read.
pub async fn pull_chain_config(ntt: &dyn Ntt, retry: &RetryConfig) -> Result<PulledChain> {
    let chain = ntt.chain();
    retry_with_exponential_backoff(retry, || read_chain_config(ntt))
        .await
        .wrap_err_with(|| format!("Failed to read {} configuration", chain))
}

async fn read_chain_config(ntt: &dyn Ntt) -> Result<PulledChain> {
    let chain = ntt.chain();

    let mode = ntt.get_mode().await?;
    let outbound = ntt.get_outbound_limit().await?;
    let threshold = ntt.get_threshold().await?;
    let decimals = ntt.get_token_decimals().await?;
    let paused = ntt.is_paused().await?;
    let owner = ntt.get_owner().await?;
    let pauser = ntt.get_pauser().await?;
    let version = ntt.get_version().await?;
    let token = ntt.get_token().await?;

    let transceiver = ntt
        .get_transceiver(0)
        .await?
        .ok_or_else(|| eyre!("{} manager has no transceiver registered", chain))?;
    let transceiver_pauser = transceiver.get_pauser().await?;

    let config = ChainConfig {
        version,
        mode: Some(mode),
        paused: Some(paused),
        owner: Some(owner),
        pauser,
        manager: ntt.manager_address(),
        token,
        transceivers: TransceiversConfig {
            threshold,
            wormhole: WormholeTransceiverConfig {
                address: transceiver.address(),
                pauser: transceiver_pauser,
                executor: None,
            },
        },
        limits: LimitsConfig {
            outbound: format_number(outbound, decimals),
            inbound: Default::default(),
        },
    };

    Ok(PulledChain {
        config,
        decimals,
        transceiver,
    })
}

/// Connect to a chain's manager and read its configuration
pub async fn pull_chain(
    chain: Chain,
    network: Network,
    local: &ChainConfig,
    factory: &dyn NttFactory,
    retry: &RetryConfig,
) -> Result<ChainDeployment> {
    if local.manager.is_empty() {
        return Err(NttError::MissingManager(chain).into());
    }

    let ntt = factory
        .connect(chain, &local.manager)
        .await
        .wrap_err_with(|| format!("Failed to connect to {} manager {}", chain, local.manager))?;

    let pulled = pull_chain_config(ntt.as_ref(), retry).await?;
    let mut remote = pulled.config;
    remote.carry_local_only(local);

    let platform = chain.platform();
    let manager = UniversalAddress::from_native(platform, &ntt.manager_address())?;
    let transceiver_address = UniversalAddress::from_native(platform, &pulled.transceiver.address())?;

    debug!(chain = %chain, decimals = pulled.decimals, "Pulled chain configuration");

    Ok(ChainDeployment {
        chain,
        network,
        ntt,
        transceiver: pulled.transceiver,
        decimals: pulled.decimals,
        manager,
        transceiver_address,
        local: local.clone(),
        remote,
    })
}

/// Pull every chain declared in the manifest.
///
/// Chains without a manager address are skipped while the rest are read,
/// then the whole pull fails listing every such chain.
pub async fn pull_deployments(
    deployment: &Deployment,
    factory: &dyn NttFactory,
    retry: &RetryConfig,
) -> Result<Vec<ChainDeployment>> {
    let mut deps = Vec::with_capacity(deployment.chains.len());
    let mut missing_managers = Vec::new();

    for (chain, local) in &deployment.chains {
        if local.manager.is_empty() {
            error!(chain = %chain, "Manager address is missing; skipping");
            missing_managers.push(NttError::MissingManager(*chain).to_string());
            continue;
        }
        info!(chain = %chain, "Pulling configuration");
        deps.push(pull_chain(*chain, deployment.network, local, factory, retry).await?);
    }

    if !missing_managers.is_empty() {
        return Err(NttError::InvalidConfig(missing_managers).into());
    }

    pull_inbound_limits(&mut deps, retry).await?;
    Ok(deps)
}

/// Fill `limits.inbound` of every chain from its peer registrations.
///
/// Chains with no peer registered for another configured chain get a zero
/// limit formatted with their own decimals.
pub async fn pull_inbound_limits(deps: &mut [ChainDeployment], retry: &RetryConfig) -> Result<()> {
    let chains: Vec<Chain> = deps.iter().map(|d| d.chain).collect();
    for dep in deps.iter_mut() {
        fill_inbound_limits(dep, &chains, retry).await?;
    }
    Ok(())
}

/// Fill one chain's `limits.inbound` for every chain in `chains`
pub async fn fill_inbound_limits(
    dep: &mut ChainDeployment,
    chains: &[Chain],
    retry: &RetryConfig,
) -> Result<()> {
    for &peer_chain in chains {
        if peer_chain == dep.chain {
            continue;
        }
        let ntt = dep.ntt.clone();
        let peer = retry_with_exponential_backoff(retry, || ntt.get_peer(peer_chain))
            .await
            .wrap_err_with(|| format!("Failed to read {} peer on {}", peer_chain, dep.chain))?;

        let limit = peer
            .map(|p| format_number(p.inbound_limit, dep.decimals))
            .unwrap_or_else(|| format_number(Default::default(), dep.decimals));
        dep.remote.limits.inbound.insert(peer_chain, limit);
    }
    Ok(())
}

/// Re-read one chain after transactions changed its state
pub async fn refresh_chain(
    deps: &mut [ChainDeployment],
    index: usize,
    retry: &RetryConfig,
) -> Result<()> {
    let chains: Vec<Chain> = deps.iter().map(|d| d.chain).collect();
    let dep = &mut deps[index];

    let pulled = pull_chain_config(dep.ntt.as_ref(), retry).await?;
    let mut remote = pulled.config;
    remote.carry_local_only(&dep.local);

    dep.decimals = pulled.decimals;
    dep.transceiver = pulled.transceiver;
    dep.remote = remote;
    fill_inbound_limits(dep, &chains, retry).await
}

/// Write the pulled configs back into the manifest, keeping local-only fields
pub fn apply_remote(deployment: &mut Deployment, deps: &[ChainDeployment]) {
    for dep in deps {
        deployment.chains.insert(dep.chain, dep.remote.clone());
    }
}
