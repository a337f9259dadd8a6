//! Reconciliation driver
//!
//! Brings each chain's on-chain state in line with the manifest. Per chain:
//!
//! 1. Plan field updates from the diff. An unsupported field stops the
//!    chain before anything is sent.
//! 2. Check that the signer owns the manager.
//! 3. Submit missing registrations (manager peers, transceiver peers, EVM
//!    relay flags, Solana fixups), then re-pull the chain and re-plan.
//! 4. Apply field updates in a fixed order with the owner change last,
//!    since it can revoke the signer's authority.
//!
//! Chains are processed one after another and transactions are submitted
//! strictly in sequence.

use alloy::primitives::U256;
use eyre::Result;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{error, info, warn};

use crate::address::same_address;
use crate::deployer::Deployer;
use crate::diff::DiffTree;
use crate::error::{NttError, PlatformError, PlatformResult};
use crate::ntt::PeerRegistration;
use crate::numeric::parse_decimal_string;
use crate::peers::MissingImplicitConfig;
use crate::pull::{refresh_chain, ChainDeployment};
use crate::retry::RetryConfig;
use crate::signer::{send_all, Signer, SignerProvider, UnsignedTransaction};
use crate::types::Chain;

/// A single declared change to apply to a chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldUpdate {
    /// Upgrade the manager implementation
    Upgrade(String),
    Pauser(String),
    Paused(bool),
    OutboundLimit(U256),
    InboundLimit { chain: Chain, limit: U256 },
    TransceiverPauser(String),
    Owner(String),
}

impl FieldUpdate {
    fn rank(&self) -> u8 {
        match self {
            FieldUpdate::Upgrade(_) => 0,
            FieldUpdate::Pauser(_) => 1,
            FieldUpdate::Paused(_) => 2,
            FieldUpdate::OutboundLimit(_) => 3,
            FieldUpdate::InboundLimit { .. } => 4,
            FieldUpdate::TransceiverPauser(_) => 5,
            FieldUpdate::Owner(_) => 6,
        }
    }

    pub fn describe(&self) -> String {
        match self {
            FieldUpdate::Upgrade(v) => format!("upgrade manager to {}", v),
            FieldUpdate::Pauser(p) => format!("set pauser to {}", p),
            FieldUpdate::Paused(true) => "pause".to_string(),
            FieldUpdate::Paused(false) => "unpause".to_string(),
            FieldUpdate::OutboundLimit(l) => format!("set outbound limit to {}", l),
            FieldUpdate::InboundLimit { chain, limit } => {
                format!("set inbound limit from {} to {}", chain, limit)
            }
            FieldUpdate::TransceiverPauser(p) => format!("set transceiver pauser to {}", p),
            FieldUpdate::Owner(o) => format!("transfer ownership to {}", o),
        }
    }
}

/// Turn a chain's diff into ordered updates.
///
/// Leaves that only exist on chain carry nothing to push and are skipped.
/// Any other path outside the supported set fails the whole plan.
pub fn plan_field_updates(chain: Chain, diff: &DiffTree) -> Result<Vec<FieldUpdate>, NttError> {
    let mut leaves = Vec::new();
    for (path, push, _pull) in diff.leaves() {
        if let Some(value) = push {
            flatten(path, value, &mut leaves);
        }
    }

    let mut updates = Vec::with_capacity(leaves.len());
    for (path, value) in leaves {
        let segments: Vec<&str> = path.split('.').collect();
        let update = match segments.as_slice() {
            ["version"] => FieldUpdate::Upgrade(expect_str(chain, &path, &value)?),
            ["pauser"] => FieldUpdate::Pauser(expect_str(chain, &path, &value)?),
            ["paused"] => FieldUpdate::Paused(value.as_bool().ok_or_else(|| {
                NttError::InvalidConfig(vec![format!("{}: {} must be a boolean", chain, path)])
            })?),
            ["owner"] => FieldUpdate::Owner(expect_str(chain, &path, &value)?),
            ["limits", "outbound"] => {
                FieldUpdate::OutboundLimit(parse_decimal_string(&expect_str(chain, &path, &value)?)?)
            }
            ["limits", "inbound", peer] => {
                let peer_chain = peer.parse::<Chain>()?;
                FieldUpdate::InboundLimit {
                    chain: peer_chain,
                    limit: parse_decimal_string(&expect_str(chain, &path, &value)?)?,
                }
            }
            ["transceivers", "wormhole", "pauser"] => {
                FieldUpdate::TransceiverPauser(expect_str(chain, &path, &value)?)
            }
            _ => return Err(NttError::UnsupportedField { chain, path }),
        };
        updates.push(update);
    }

    updates.sort_by_key(FieldUpdate::rank);
    Ok(updates)
}

fn flatten(path: String, value: &Value, out: &mut Vec<(String, Value)>) {
    match value {
        Value::Object(map) if !map.is_empty() => {
            for (key, v) in map {
                flatten(format!("{}.{}", path, key), v, out);
            }
        }
        Value::Object(_) => {}
        _ => out.push((path, value.clone())),
    }
}

fn expect_str(chain: Chain, path: &str, value: &Value) -> Result<String, NttError> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| NttError::InvalidConfig(vec![format!("{}: {} must be a string", chain, path)]))
}

/// Outcome of pushing one chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushReport {
    pub chain: Chain,
    /// Submitted transaction hashes (or upgrade labels)
    pub submitted: Vec<String>,
    /// Steps that failed without stopping the chain
    pub errors: Vec<String>,
    /// Error that stopped the chain, if any
    pub fatal: Option<String>,
}

impl PushReport {
    fn new(chain: Chain) -> Self {
        Self {
            chain,
            submitted: Vec::new(),
            errors: Vec::new(),
            fatal: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.fatal.is_none() && self.errors.is_empty()
    }

    fn fail(mut self, err: impl std::fmt::Display) -> Self {
        error!(chain = %self.chain, error = %err, "Push stopped");
        self.fatal = Some(err.to_string());
        self
    }
}

/// Capabilities the driver needs besides the chains themselves
pub struct PushContext<'a> {
    pub signers: &'a dyn SignerProvider,
    pub deployer: &'a dyn Deployer,
    pub retry: &'a RetryConfig,
}

/// Push every chain in turn
pub async fn push_deployment(
    deps: &mut [ChainDeployment],
    missing: &BTreeMap<Chain, MissingImplicitConfig>,
    ctx: &PushContext<'_>,
) -> Vec<PushReport> {
    let empty = MissingImplicitConfig::default();
    let mut reports = Vec::with_capacity(deps.len());
    for index in 0..deps.len() {
        let chain = deps[index].chain;
        let chain_missing = missing.get(&chain).unwrap_or(&empty);
        reports.push(push_chain(deps, index, chain_missing, ctx).await);
    }
    reports
}

/// Push a single chain, identified by its index in `deps`
pub async fn push_chain(
    deps: &mut [ChainDeployment],
    index: usize,
    missing: &MissingImplicitConfig,
    ctx: &PushContext<'_>,
) -> PushReport {
    let chain = deps[index].chain;
    let report = PushReport::new(chain);

    let updates = match plan_chain(&deps[index]) {
        Ok(updates) => updates,
        Err(e) => return report.fail(e),
    };
    if updates.is_empty() && missing.is_empty() {
        info!(chain = %chain, "Already up to date");
        return report;
    }

    let signer = match ctx.signers.signer_for(chain) {
        Ok(signer) => signer,
        Err(e) => return report.fail(e),
    };
    let owner = deps[index].remote.owner.clone().unwrap_or_default();
    if !same_address(chain.platform(), &signer.address(), &owner) {
        return report.fail(NttError::SignerNotOwner {
            chain,
            signer: signer.address(),
            owner,
        });
    }

    let mut report = report;
    let before = report.submitted.len();
    apply_registrations(&deps[index], missing, signer.as_ref(), &mut report).await;

    let updates = if report.submitted.len() > before {
        info!(chain = %chain, "Registrations submitted, re-reading chain");
        if let Err(e) = refresh_chain(deps, index, ctx.retry).await {
            return report.fail(e);
        }
        match plan_chain(&deps[index]) {
            Ok(updates) => updates,
            Err(e) => return report.fail(e),
        }
    } else {
        updates
    };

    for update in &updates {
        let dep = &deps[index];
        info!(chain = %chain, "{}", update.describe());
        match apply_update(dep, update, signer.as_ref(), ctx.deployer).await {
            Ok(hashes) => report.submitted.extend(hashes),
            Err(e) => {
                error!(chain = %chain, error = %e, "Failed to {}", update.describe());
                report
                    .errors
                    .push(format!("{}: {}", update.describe(), e));
            }
        }
    }

    report
}

fn plan_chain(dep: &ChainDeployment) -> Result<Vec<FieldUpdate>> {
    let diff = dep.diff()?;
    Ok(plan_field_updates(dep.chain, &diff)?)
}

async fn apply_update(
    dep: &ChainDeployment,
    update: &FieldUpdate,
    signer: &dyn Signer,
    deployer: &dyn Deployer,
) -> Result<Vec<String>> {
    let txs = match update {
        FieldUpdate::Upgrade(version) => {
            deployer
                .upgrade(dep.chain, &dep.remote.manager, version)
                .await?;
            return Ok(vec![format!("upgrade:{}", version)]);
        }
        FieldUpdate::Pauser(pauser) => dep.ntt.set_pauser(pauser).await?,
        FieldUpdate::Paused(true) => dep.ntt.pause().await?,
        FieldUpdate::Paused(false) => dep.ntt.unpause().await?,
        FieldUpdate::OutboundLimit(limit) => dep.ntt.set_outbound_limit(*limit).await?,
        FieldUpdate::InboundLimit { chain, limit } => {
            dep.ntt.set_inbound_limit(*chain, *limit).await?
        }
        FieldUpdate::TransceiverPauser(pauser) => dep.transceiver.set_pauser(pauser).await?,
        FieldUpdate::Owner(owner) => dep.ntt.set_owner(owner).await?,
    };
    send_all(signer, txs).await
}

async fn apply_registrations(
    dep: &ChainDeployment,
    missing: &MissingImplicitConfig,
    signer: &dyn Signer,
    report: &mut PushReport,
) {
    for peer in &missing.manager_peers {
        let registration = PeerRegistration {
            chain: peer.chain,
            address: peer.address,
            token_decimals: peer.token_decimals,
            inbound_limit: peer.inbound_limit,
        };
        let label = format!("register manager peer {}", peer.chain);
        let txs = dep.ntt.set_peer(&registration).await;
        submit(signer, &label, txs, report).await;
    }

    for peer in &missing.transceiver_peers {
        let label = format!("register transceiver peer {}", peer.chain);
        let txs = dep.transceiver.set_peer(peer.chain, peer.address).await;
        submit(signer, &label, txs, report).await;
    }

    for fix in &missing.evm_chains {
        let label = format!("set EVM chain flag for {} to {}", fix.chain, fix.desired);
        let txs = dep.transceiver.set_is_evm_chain(fix.chain, fix.desired).await;
        submit_platform(signer, &label, txs, report).await;
    }

    for fix in &missing.standard_relaying {
        let label = format!("set standard relaying for {} to {}", fix.chain, fix.desired);
        let txs = dep
            .transceiver
            .set_is_wormhole_relaying_enabled(fix.chain, fix.desired)
            .await;
        submit_platform(signer, &label, txs, report).await;
    }

    for fix in &missing.special_relaying {
        let label = format!("set special relaying for {} to {}", fix.chain, fix.desired);
        let txs = dep
            .transceiver
            .set_is_special_relaying_enabled(fix.chain, fix.desired)
            .await;
        submit_platform(signer, &label, txs, report).await;
    }

    if missing.solana_wormhole_transceiver {
        let txs = dep.ntt.register_wormhole_transceiver().await;
        submit_platform(signer, "register wormhole transceiver", txs, report).await;
    }

    if missing.solana_update_lut {
        let txs = dep.ntt.initialize_or_update_lookup_table().await;
        submit_platform(signer, "update lookup table", txs, report).await;
    }
}

async fn submit(
    signer: &dyn Signer,
    label: &str,
    txs: Result<Vec<UnsignedTransaction>>,
    report: &mut PushReport,
) {
    let result = match txs {
        Ok(txs) => send_all(signer, txs).await,
        Err(e) => Err(e),
    };
    match result {
        Ok(hashes) => report.submitted.extend(hashes),
        Err(e) => {
            error!(chain = %report.chain, error = %e, "Failed to {}", label);
            report.errors.push(format!("{}: {}", label, e));
        }
    }
}

async fn submit_platform(
    signer: &dyn Signer,
    label: &str,
    txs: PlatformResult<Vec<UnsignedTransaction>>,
    report: &mut PushReport,
) {
    match txs {
        Ok(txs) => submit(signer, label, Ok(txs), report).await,
        Err(e @ PlatformError::NotSupported { .. }) => {
            warn!(chain = %report.chain, "Skipping {}: {}", label, e);
            report.errors.push(format!("{}: {}", label, e));
        }
        Err(PlatformError::Failed(e)) => submit(signer, label, Err(e), report).await,
    }
}
