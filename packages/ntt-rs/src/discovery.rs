//! Peer Discovery
//!
//! Builds a deployment from a single live manager. The seed manager is
//! asked for its peer on every chain of the network; each registered peer
//! is then pulled like a declared chain.
//!
//! ## Usage
//!
//! ```ignore
//! use ntt_rs::discovery::discover_deployment;
//!
//! let discovered = discover_deployment(
//!     Network::Mainnet,
//!     Chain::Ethereum,
//!     "0x...",
//!     &factory,
//!     &RetryConfig::default(),
//! )
//! .await?;
//! ```

use eyre::{Result, WrapErr};
use tracing::{info, warn};

use crate::ntt::NttFactory;
use crate::pull::{pull_chain, pull_inbound_limits, ChainDeployment};
use crate::retry::{retry_with_exponential_backoff, RetryConfig};
use crate::types::{Chain, ChainConfig, Deployment, Network};

/// A chain the seed manager has a peer registered for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredPeer {
    pub chain: Chain,
    /// Native address of the peer manager
    pub manager: String,
}

/// Result of [`discover_deployment`]
#[derive(Debug)]
pub struct DiscoveredDeployment {
    pub deployment: Deployment,
    pub chains: Vec<ChainDeployment>,
    /// Peers that were found but could not be pulled, with the reason
    pub skipped: Vec<(Chain, String)>,
}

/// Query the seed manager for a peer on every other chain of the network.
///
/// Chains whose lookup fails are skipped with a warning.
pub async fn discover_peers(
    network: Network,
    seed_chain: Chain,
    seed_manager: &str,
    factory: &dyn NttFactory,
    retry: &RetryConfig,
) -> Result<(Vec<DiscoveredPeer>, Vec<(Chain, String)>)> {
    let seed = factory
        .connect(seed_chain, seed_manager)
        .await
        .wrap_err_with(|| format!("Failed to connect to {} manager {}", seed_chain, seed_manager))?;

    let mut peers = Vec::new();
    let mut skipped = Vec::new();

    for chain in Chain::all_on(network) {
        if chain == seed_chain {
            continue;
        }
        let seed = &seed;
        match retry_with_exponential_backoff(retry, || seed.get_peer(chain)).await {
            Ok(Some(peer)) => match peer.address.to_native(chain.platform()) {
                Some(manager) => {
                    info!(chain = %chain, manager = %manager, "Discovered peer");
                    peers.push(DiscoveredPeer { chain, manager });
                }
                None => {
                    warn!(chain = %chain, "Peer address cannot be converted to a native address");
                    skipped.push((chain, format!("peer address {} is not reversible", peer.address)));
                }
            },
            Ok(None) => {}
            Err(e) => {
                warn!(chain = %chain, error = %e, "Peer lookup failed, skipping");
                skipped.push((chain, e.to_string()));
            }
        }
    }

    Ok((peers, skipped))
}

/// Pull the seed chain and every discovered peer into a new deployment
pub async fn discover_deployment(
    network: Network,
    seed_chain: Chain,
    seed_manager: &str,
    factory: &dyn NttFactory,
    retry: &RetryConfig,
) -> Result<DiscoveredDeployment> {
    let seed_local = ChainConfig {
        manager: seed_manager.to_string(),
        ..Default::default()
    };
    let seed = pull_chain(seed_chain, network, &seed_local, factory, retry).await?;

    let (peers, mut skipped) =
        discover_peers(network, seed_chain, seed_manager, factory, retry).await?;

    let mut chains = vec![seed];
    for peer in peers {
        let local = ChainConfig {
            manager: peer.manager.clone(),
            ..Default::default()
        };
        match pull_chain(peer.chain, network, &local, factory, retry).await {
            Ok(dep) => chains.push(dep),
            Err(e) => {
                warn!(chain = %peer.chain, error = %e, "Could not pull peer, skipping");
                skipped.push((peer.chain, format!("{:#}", e)));
            }
        }
    }

    pull_inbound_limits(&mut chains, retry).await?;

    let mut deployment = Deployment::new(network);
    for dep in &chains {
        deployment.insert_chain(dep.chain, dep.remote.clone())?;
    }

    Ok(DiscoveredDeployment {
        deployment,
        chains,
        skipped,
    })
}
