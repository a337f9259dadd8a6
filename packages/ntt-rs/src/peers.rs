//! Peer consistency checker
//!
//! Every chain must register every other chain's manager and transceiver.
//! Registrations are directional: `A` knowing `B` says nothing about `B`
//! knowing `A`, so each ordered pair is checked on its own.
//!
//! The checker only reports. Mismatching registrations are logged as
//! warnings; missing ones are collected into a [`MissingImplicitConfig`]
//! that the push driver turns into transactions.

use alloy::primitives::U256;
use std::collections::BTreeMap;
use tracing::{debug, error, warn};

use crate::address::UniversalAddress;
use crate::error::PlatformError;
use crate::numeric::parse_decimal_string;
use crate::pull::ChainDeployment;
use crate::retry::{retry_with_exponential_backoff, RetryConfig};
use crate::types::{Chain, Platform};

/// Manager peer that must be registered on the `from` chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingManagerPeer {
    pub chain: Chain,
    pub address: UniversalAddress,
    pub token_decimals: u8,
    pub inbound_limit: U256,
}

/// Transceiver peer that must be registered on the `from` chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingTransceiverPeer {
    pub chain: Chain,
    pub address: UniversalAddress,
}

/// An EVM transceiver flag that differs from its desired value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlagFix {
    pub chain: Chain,
    pub desired: bool,
}

/// Registrations a chain is missing, as found by [`check_deployment`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MissingImplicitConfig {
    pub manager_peers: Vec<MissingManagerPeer>,
    pub transceiver_peers: Vec<MissingTransceiverPeer>,
    pub evm_chains: Vec<FlagFix>,
    pub standard_relaying: Vec<FlagFix>,
    pub special_relaying: Vec<FlagFix>,
    /// Solana: the manager has not registered its own Wormhole transceiver
    pub solana_wormhole_transceiver: bool,
    /// Solana: the address lookup table needs creating or updating
    pub solana_update_lut: bool,
    /// Pairs whose checks failed after retries; the rest still ran
    pub failed_checks: Vec<String>,
    /// Registrations that exist but disagree with the expected peer
    pub mismatches: Vec<String>,
}

impl MissingImplicitConfig {
    /// Nothing needs to be submitted
    pub fn is_empty(&self) -> bool {
        self.manager_peers.is_empty()
            && self.transceiver_peers.is_empty()
            && self.evm_chains.is_empty()
            && self.standard_relaying.is_empty()
            && self.special_relaying.is_empty()
            && !self.solana_wormhole_transceiver
            && !self.solana_update_lut
    }

    /// Nothing to submit and nothing went wrong while checking
    pub fn is_clean(&self) -> bool {
        self.is_empty() && self.failed_checks.is_empty()
    }

    /// One line per missing registration, for display
    pub fn describe(&self) -> Vec<String> {
        let mut lines = Vec::new();
        for p in &self.manager_peers {
            lines.push(format!("Manager peer for {}", p.chain));
        }
        for p in &self.transceiver_peers {
            lines.push(format!("Transceiver peer for {}", p.chain));
        }
        for f in &self.evm_chains {
            lines.push(format!("EVM chain flag for {} (should be {})", f.chain, f.desired));
        }
        for f in &self.standard_relaying {
            lines.push(format!(
                "Standard relaying for {} (should be {})",
                f.chain, f.desired
            ));
        }
        for f in &self.special_relaying {
            lines.push(format!(
                "Special relaying for {} (should be {})",
                f.chain, f.desired
            ));
        }
        if self.solana_wormhole_transceiver {
            lines.push("Wormhole transceiver registration".to_string());
        }
        if self.solana_update_lut {
            lines.push("Address lookup table update".to_string());
        }
        for f in &self.failed_checks {
            lines.push(format!("Check failed: {}", f));
        }
        lines
    }
}

/// Desired EVM transceiver flags on `from` for messages to `to`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DesiredRelayFlags {
    pub is_evm_chain: bool,
    pub standard_relaying: bool,
    pub special_relaying: bool,
}

impl DesiredRelayFlags {
    pub fn for_pair(from: &ChainDeployment, to: &ChainDeployment) -> Self {
        let to_evm = to.chain.platform() == Platform::Evm;
        Self {
            is_evm_chain: to_evm,
            standard_relaying: to_evm && !from.local.uses_executor(),
            special_relaying: false,
        }
    }
}

/// Check every chain against every other chain
pub async fn check_deployment(
    deps: &[ChainDeployment],
    retry: &RetryConfig,
) -> BTreeMap<Chain, MissingImplicitConfig> {
    let mut result = BTreeMap::new();
    for from in deps {
        result.insert(from.chain, check_chain(from, deps, retry).await);
    }
    result
}

/// Check one chain's registrations of every other chain
pub async fn check_chain(
    from: &ChainDeployment,
    deps: &[ChainDeployment],
    retry: &RetryConfig,
) -> MissingImplicitConfig {
    let mut missing = MissingImplicitConfig::default();

    for to in deps {
        if to.chain == from.chain {
            continue;
        }
        if let Err(e) = check_pair(from, to, retry, &mut missing).await {
            error!(from = %from.chain, to = %to.chain, error = %e, "Peer check failed");
            missing
                .failed_checks
                .push(format!("{} -> {}: {}", from.chain, to.chain, e));
        }
    }

    if from.chain.platform() == Platform::Solana {
        if let Err(e) = check_solana(from, retry, &mut missing).await {
            error!(chain = %from.chain, error = %e, "Solana check failed");
            missing
                .failed_checks
                .push(format!("{}: {}", from.chain, e));
        }
    }

    debug!(
        chain = %from.chain,
        missing = !missing.is_empty(),
        failed = missing.failed_checks.len(),
        "Checked peers"
    );
    missing
}

async fn check_pair(
    from: &ChainDeployment,
    to: &ChainDeployment,
    retry: &RetryConfig,
    missing: &mut MissingImplicitConfig,
) -> eyre::Result<()> {
    let ntt = &from.ntt;
    let peer = retry_with_exponential_backoff(retry, || ntt.get_peer(to.chain)).await?;

    match peer {
        None => {
            missing.manager_peers.push(MissingManagerPeer {
                chain: to.chain,
                address: to.manager,
                token_decimals: to.decimals,
                inbound_limit: declared_inbound_limit(from, to.chain),
            });
        }
        Some(peer) => {
            if peer.address != to.manager {
                let msg = format!(
                    "{} manager peer for {} is {}, expected {}",
                    from.chain, to.chain, peer.address, to.manager
                );
                warn!("{}", msg);
                missing.mismatches.push(msg);
            }
            if peer.token_decimals != to.decimals {
                let msg = format!(
                    "{} manager peer for {} has {} decimals, expected {}",
                    from.chain, to.chain, peer.token_decimals, to.decimals
                );
                warn!("{}", msg);
                missing.mismatches.push(msg);
            }
        }
    }

    let transceiver = &from.transceiver;
    let transceiver_peer =
        retry_with_exponential_backoff(retry, || transceiver.get_peer(to.chain)).await?;

    match transceiver_peer {
        None => missing.transceiver_peers.push(MissingTransceiverPeer {
            chain: to.chain,
            address: to.transceiver_address,
        }),
        Some(address) if address != to.transceiver_address => {
            let msg = format!(
                "{} transceiver peer for {} is {}, expected {}",
                from.chain, to.chain, address, to.transceiver_address
            );
            warn!("{}", msg);
            missing.mismatches.push(msg);
        }
        Some(_) => {}
    }

    if from.chain.platform() == Platform::Evm {
        check_evm_flags(from, to, retry, missing).await?;
    }

    Ok(())
}

async fn check_evm_flags(
    from: &ChainDeployment,
    to: &ChainDeployment,
    retry: &RetryConfig,
    missing: &mut MissingImplicitConfig,
) -> eyre::Result<()> {
    let desired = DesiredRelayFlags::for_pair(from, to);
    let transceiver = &from.transceiver;
    let chain = to.chain;

    let is_evm = retry_with_exponential_backoff(retry, || async move {
        platform_read(transceiver.is_evm_chain(chain).await)
    })
    .await?;
    if let Some(actual) = is_evm {
        if actual != desired.is_evm_chain {
            missing.evm_chains.push(FlagFix {
                chain: to.chain,
                desired: desired.is_evm_chain,
            });
        }
    }

    let standard = retry_with_exponential_backoff(retry, || async move {
        platform_read(transceiver.is_wormhole_relaying_enabled(chain).await)
    })
    .await?;
    if let Some(actual) = standard {
        if actual != desired.standard_relaying {
            missing.standard_relaying.push(FlagFix {
                chain: to.chain,
                desired: desired.standard_relaying,
            });
        }
    }

    let special = retry_with_exponential_backoff(retry, || async move {
        platform_read(transceiver.is_special_relaying_enabled(chain).await)
    })
    .await?;
    if let Some(actual) = special {
        if actual != desired.special_relaying {
            missing.special_relaying.push(FlagFix {
                chain: to.chain,
                desired: desired.special_relaying,
            });
        }
    }

    Ok(())
}

async fn check_solana(
    from: &ChainDeployment,
    retry: &RetryConfig,
    missing: &mut MissingImplicitConfig,
) -> eyre::Result<()> {
    let ntt = &from.ntt;

    let registered = retry_with_exponential_backoff(retry, || async move {
        platform_read(ntt.is_wormhole_transceiver_registered().await)
    })
    .await?;
    if registered == Some(false) {
        missing.solana_wormhole_transceiver = true;
    }

    let lut = retry_with_exponential_backoff(retry, || async move {
        platform_read(ntt.would_update_lookup_table().await)
    })
    .await?;
    if lut == Some(true) {
        missing.solana_update_lut = true;
    }

    Ok(())
}

/// `NotSupported` becomes `None`; other failures stay errors so they are retried
fn platform_read<T>(result: Result<T, PlatformError>) -> eyre::Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(PlatformError::NotSupported {
            platform,
            operation,
        }) => {
            debug!(%platform, operation, "Capability not available");
            Ok(None)
        }
        Err(PlatformError::Failed(e)) => Err(e),
    }
}

/// Inbound limit `from` declares for `to`, in raw units, or zero
fn declared_inbound_limit(from: &ChainDeployment, to: Chain) -> U256 {
    from.local
        .limits
        .inbound
        .get(&to)
        .and_then(|s| parse_decimal_string(s).ok())
        .unwrap_or(U256::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockNetwork;
    use crate::types::{Mode, Network};

    async fn two_chain_world() -> (MockNetwork, Vec<ChainDeployment>) {
        let network = MockNetwork::new(Network::Testnet);
        network.add_chain(Chain::Sepolia, Mode::Locking, 18);
        network.add_chain(Chain::BaseSepolia, Mode::Burning, 18);
        let deps = network.pull_all().await.unwrap();
        (network, deps)
    }

    #[tokio::test]
    async fn test_peer_asymmetry_only_reports_missing_direction() {
        let (network, _) = two_chain_world().await;
        network.register_peer(Chain::Sepolia, Chain::BaseSepolia);
        let deps = network.pull_all().await.unwrap();

        let report = check_deployment(&deps, &RetryConfig::new(0, Default::default())).await;

        let sepolia = &report[&Chain::Sepolia];
        assert!(sepolia.manager_peers.is_empty());
        assert!(sepolia.transceiver_peers.is_empty());

        let base = &report[&Chain::BaseSepolia];
        assert_eq!(base.manager_peers.len(), 1);
        assert_eq!(base.manager_peers[0].chain, Chain::Sepolia);
        assert_eq!(base.transceiver_peers.len(), 1);
    }

    #[tokio::test]
    async fn test_missing_peer_uses_declared_inbound_limit() {
        let (_, mut deps) = two_chain_world().await;
        let peer_chain = deps[1].chain;
        deps[0]
            .local
            .limits
            .inbound
            .insert(peer_chain, "2.000000000000000000".to_string());

        let missing = check_chain(&deps[0], &deps, &RetryConfig::new(0, Default::default())).await;

        assert_eq!(missing.manager_peers.len(), 1);
        assert_eq!(
            missing.manager_peers[0].inbound_limit,
            U256::from(2_000_000_000_000_000_000u128)
        );
        assert_eq!(missing.manager_peers[0].address, deps[1].manager);
    }

    #[tokio::test]
    async fn test_evm_flags_reported_with_desired_value() {
        let (_, deps) = two_chain_world().await;
        let missing = check_chain(&deps[0], &deps, &RetryConfig::new(0, Default::default())).await;

        assert_eq!(
            missing.evm_chains,
            vec![FlagFix {
                chain: Chain::BaseSepolia,
                desired: true
            }]
        );
        assert_eq!(
            missing.standard_relaying,
            vec![FlagFix {
                chain: Chain::BaseSepolia,
                desired: true
            }]
        );
        // Special relaying is off in a fresh deployment and should stay off
        assert!(missing.special_relaying.is_empty());
    }

    #[tokio::test]
    async fn test_executor_chain_wants_standard_relaying_disabled() {
        let (network, _) = two_chain_world().await;
        network.set_relay_flags(Chain::Sepolia, Chain::BaseSepolia, true, true, false);
        let mut deps = network.pull_all().await.unwrap();
        deps[0].local.transceivers.wormhole.executor = Some(true);

        let missing = check_chain(&deps[0], &deps, &RetryConfig::new(0, Default::default())).await;

        assert!(missing.evm_chains.is_empty());
        assert_eq!(
            missing.standard_relaying,
            vec![FlagFix {
                chain: Chain::BaseSepolia,
                desired: false
            }]
        );
    }

    #[tokio::test]
    async fn test_mismatched_peer_is_warning_only() {
        let (network, _) = two_chain_world().await;
        network.register_peer(Chain::Sepolia, Chain::BaseSepolia);
        network.corrupt_peer_decimals(Chain::Sepolia, Chain::BaseSepolia, 6);
        let deps = network.pull_all().await.unwrap();

        let missing = check_chain(&deps[0], &deps, &RetryConfig::new(0, Default::default())).await;

        assert!(missing.manager_peers.is_empty());
        assert_eq!(missing.mismatches.len(), 1);
        assert!(missing.mismatches[0].contains("6 decimals"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failing_pair_does_not_block_other_pairs() {
        let network = MockNetwork::new(Network::Testnet);
        network.add_chain(Chain::Sepolia, Mode::Locking, 18);
        network.add_chain(Chain::BaseSepolia, Mode::Burning, 18);
        network.add_chain(Chain::ArbitrumSepolia, Mode::Burning, 18);
        let deps = network.pull_all().await.unwrap();
        network.fail_peer_reads(Chain::Sepolia, Chain::BaseSepolia);

        let missing = check_chain(&deps[0], &deps, &RetryConfig::new(1, Default::default())).await;

        assert_eq!(missing.failed_checks.len(), 1);
        assert!(missing.failed_checks[0].starts_with("Sepolia -> BaseSepolia"));
        assert_eq!(missing.manager_peers.len(), 1);
        assert_eq!(missing.manager_peers[0].chain, Chain::ArbitrumSepolia);
    }

    #[tokio::test]
    async fn test_solana_fixups_checked_once_per_chain() {
        let network = MockNetwork::new(Network::Testnet);
        network.add_chain(Chain::Solana, Mode::Locking, 9);
        network.add_chain(Chain::Sepolia, Mode::Burning, 18);
        network.add_chain(Chain::BaseSepolia, Mode::Burning, 18);
        network.set_solana_state(Chain::Solana, false, true);
        let deps = network.pull_all().await.unwrap();

        let missing = check_chain(&deps[0], &deps, &RetryConfig::new(0, Default::default())).await;

        assert_eq!(deps[0].chain, Chain::Solana);
        assert!(missing.solana_wormhole_transceiver);
        assert!(missing.solana_update_lut);
        // Solana has no EVM relay flags
        assert!(missing.evm_chains.is_empty());
        assert_eq!(missing.manager_peers.len(), 2);
    }
}
