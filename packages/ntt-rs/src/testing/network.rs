//! Shared mock chain state

use alloy::primitives::U256;
use async_trait::async_trait;
use eyre::{eyre, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::address::{same_address, UniversalAddress};
use crate::ntt::{Ntt, NttFactory};
use crate::numeric::format_number;
use crate::pull::{pull_deployments, ChainDeployment};
use crate::retry::RetryConfig;
use crate::types::{
    Chain, ChainConfig, Deployment, LimitsConfig, Mode, Network, Platform, TransceiversConfig,
    WormholeTransceiverConfig,
};

use super::adapter::MockNtt;

const TAG_MANAGER: u8 = 1;
const TAG_TRANSCEIVER: u8 = 2;
const TAG_TOKEN: u8 = 3;
const TAG_OWNER: u8 = 4;

/// Deterministic native address for a mock contract or account
pub fn mock_address(chain: Chain, tag: u8) -> String {
    let id = chain.wormhole_id();
    let mut bytes = [0u8; 32];
    bytes[12] = 0x11;
    bytes[29..31].copy_from_slice(&id.to_be_bytes());
    bytes[31] = tag;

    match UniversalAddress(bytes).to_native(chain.platform()) {
        Some(native) => native,
        None => format!("ST1PQHQKV0RJXZFY1DGX8MNSNYVE3VGZJSRTPGZGM.ntt-{}-{}", id, tag),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockPeer {
    pub address: UniversalAddress,
    pub decimals: u8,
    pub inbound_limit: U256,
}

/// On-chain state of one mock chain
#[derive(Debug, Clone)]
pub struct MockChainState {
    pub chain: Chain,
    pub mode: Mode,
    pub decimals: u8,
    pub version: String,
    pub paused: bool,
    pub owner: String,
    pub pauser: Option<String>,
    pub token: String,
    pub manager: String,
    pub transceiver: String,
    pub transceiver_pauser: Option<String>,
    pub threshold: u8,
    pub outbound_limit: U256,
    pub peers: BTreeMap<Chain, MockPeer>,
    pub transceiver_peers: BTreeMap<Chain, UniversalAddress>,
    pub evm_chain: BTreeMap<Chain, bool>,
    pub standard_relaying: BTreeMap<Chain, bool>,
    pub special_relaying: BTreeMap<Chain, bool>,
    /// Solana: the manager registered its own Wormhole transceiver
    pub transceiver_registered: bool,
    /// Solana: the lookup table is stale
    pub lut_needs_update: bool,
    /// Peer lookups for these chains fail
    pub failing_peer_reads: BTreeSet<Chain>,
    pub connected: bool,
}

impl MockChainState {
    fn new(chain: Chain, mode: Mode, decimals: u8) -> Self {
        let owner = mock_address(chain, TAG_OWNER);
        Self {
            chain,
            mode,
            decimals,
            version: "1.1.0".to_string(),
            paused: false,
            owner: owner.clone(),
            pauser: Some(owner.clone()),
            token: mock_address(chain, TAG_TOKEN),
            manager: mock_address(chain, TAG_MANAGER),
            transceiver: mock_address(chain, TAG_TRANSCEIVER),
            transceiver_pauser: Some(owner),
            threshold: 1,
            outbound_limit: U256::ZERO,
            peers: BTreeMap::new(),
            transceiver_peers: BTreeMap::new(),
            evm_chain: BTreeMap::new(),
            standard_relaying: BTreeMap::new(),
            special_relaying: BTreeMap::new(),
            transceiver_registered: true,
            lut_needs_update: false,
            failing_peer_reads: BTreeSet::new(),
            connected: true,
        }
    }

    fn universal(&self, native: &str) -> UniversalAddress {
        UniversalAddress::from_native(self.chain.platform(), native).unwrap_or_default()
    }
}

/// State change carried by a mock transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MockCall {
    SetPeer {
        chain: Chain,
        address: UniversalAddress,
        decimals: u8,
        inbound_limit: String,
    },
    SetTransceiverPeer {
        chain: Chain,
        address: UniversalAddress,
    },
    SetOwner(String),
    SetPauser(String),
    Pause,
    Unpause,
    SetOutboundLimit(String),
    SetInboundLimit {
        chain: Chain,
        limit: String,
    },
    SetTransceiverPauser(String),
    SetIsEvmChain {
        chain: Chain,
        value: bool,
    },
    SetWormholeRelaying {
        chain: Chain,
        value: bool,
    },
    SetSpecialRelaying {
        chain: Chain,
        value: bool,
    },
    RegisterWormholeTransceiver,
    UpdateLookupTable,
}

struct World {
    network: Network,
    chains: BTreeMap<Chain, MockChainState>,
    submitted: Vec<(Chain, String)>,
}

/// Handle to the shared mock world; clones see the same state
#[derive(Clone)]
pub struct MockNetwork {
    world: Arc<Mutex<World>>,
}

impl MockNetwork {
    pub fn new(network: Network) -> Self {
        Self {
            world: Arc::new(Mutex::new(World {
                network,
                chains: BTreeMap::new(),
                submitted: Vec::new(),
            })),
        }
    }

    fn world(&self) -> MutexGuard<'_, World> {
        self.world.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn network(&self) -> Network {
        self.world().network
    }

    /// Deploy a fresh manager with no peers and a zero outbound limit
    pub fn add_chain(&self, chain: Chain, mode: Mode, decimals: u8) {
        self.world()
            .chains
            .insert(chain, MockChainState::new(chain, mode, decimals));
    }

    pub fn state(&self, chain: Chain) -> Option<MockChainState> {
        self.world().chains.get(&chain).cloned()
    }

    /// Mutate a chain's state directly, bypassing transactions
    pub fn update(&self, chain: Chain, f: impl FnOnce(&mut MockChainState)) {
        if let Some(state) = self.world().chains.get_mut(&chain) {
            f(state);
        }
    }

    pub fn manager_address(&self, chain: Chain) -> String {
        mock_address(chain, TAG_MANAGER)
    }

    pub fn owner(&self, chain: Chain) -> String {
        mock_address(chain, TAG_OWNER)
    }

    /// Register `to` as a manager and transceiver peer on `from`
    pub fn register_peer(&self, from: Chain, to: Chain) {
        let mut world = self.world();
        let Some(target) = world.chains.get(&to).cloned() else {
            return;
        };
        if let Some(state) = world.chains.get_mut(&from) {
            state.peers.insert(
                to,
                MockPeer {
                    address: target.universal(&target.manager),
                    decimals: target.decimals,
                    inbound_limit: U256::ZERO,
                },
            );
            state
                .transceiver_peers
                .insert(to, target.universal(&target.transceiver));
        }
    }

    /// Register every pair and set EVM relay flags to their defaults
    pub fn register_all_peers(&self) {
        let chains: Vec<Chain> = self.world().chains.keys().copied().collect();
        for &from in &chains {
            for &to in &chains {
                if from == to {
                    continue;
                }
                self.register_peer(from, to);
                if from.platform() == Platform::Evm {
                    let to_evm = to.platform() == Platform::Evm;
                    self.set_relay_flags(from, to, to_evm, to_evm, false);
                }
            }
        }
    }

    pub fn set_relay_flags(&self, from: Chain, to: Chain, evm: bool, standard: bool, special: bool) {
        self.update(from, |state| {
            state.evm_chain.insert(to, evm);
            state.standard_relaying.insert(to, standard);
            state.special_relaying.insert(to, special);
        });
    }

    pub fn corrupt_peer_decimals(&self, from: Chain, to: Chain, decimals: u8) {
        self.update(from, |state| {
            if let Some(peer) = state.peers.get_mut(&to) {
                peer.decimals = decimals;
            }
        });
    }

    pub fn fail_peer_reads(&self, from: Chain, to: Chain) {
        self.update(from, |state| {
            state.failing_peer_reads.insert(to);
        });
    }

    pub fn set_solana_state(&self, chain: Chain, transceiver_registered: bool, lut_needs_update: bool) {
        self.update(chain, |state| {
            state.transceiver_registered = transceiver_registered;
            state.lut_needs_update = lut_needs_update;
        });
    }

    /// Make the chain unreachable
    pub fn disconnect(&self, chain: Chain) {
        self.update(chain, |state| state.connected = false);
    }

    /// Transactions applied so far, as (chain, description)
    pub fn submitted(&self) -> Vec<(Chain, String)> {
        self.world().submitted.clone()
    }

    /// Manifest matching the current on-chain state
    pub fn deployment(&self) -> Deployment {
        let world = self.world();
        let mut deployment = Deployment::new(world.network);
        for (chain, state) in &world.chains {
            let inbound = world
                .chains
                .keys()
                .filter(|c| *c != chain)
                .map(|peer| {
                    let limit = state
                        .peers
                        .get(peer)
                        .map(|p| p.inbound_limit)
                        .unwrap_or(U256::ZERO);
                    (*peer, format_number(limit, state.decimals))
                })
                .collect();
            deployment.chains.insert(
                *chain,
                ChainConfig {
                    version: state.version.clone(),
                    mode: Some(state.mode),
                    paused: Some(state.paused),
                    owner: Some(state.owner.clone()),
                    pauser: state.pauser.clone(),
                    manager: state.manager.clone(),
                    token: state.token.clone(),
                    transceivers: TransceiversConfig {
                        threshold: state.threshold,
                        wormhole: WormholeTransceiverConfig {
                            address: state.transceiver.clone(),
                            pauser: state.transceiver_pauser.clone(),
                            executor: None,
                        },
                    },
                    limits: LimitsConfig {
                        outbound: format_number(state.outbound_limit, state.decimals),
                        inbound,
                    },
                },
            );
        }
        deployment
    }

    /// Pull every chain using the mock as the factory, without retries
    pub async fn pull_all(&self) -> Result<Vec<ChainDeployment>> {
        pull_deployments(&self.deployment(), self, &RetryConfig::new(0, Duration::ZERO)).await
    }

    /// Read a chain's state for an adapter call
    pub(crate) fn read<T>(&self, chain: Chain, f: impl FnOnce(&MockChainState) -> Result<T>) -> Result<T> {
        let world = self.world();
        let state = world
            .chains
            .get(&chain)
            .ok_or_else(|| eyre!("{} is not deployed", chain))?;
        if !state.connected {
            return Err(eyre!("{} RPC unreachable", chain));
        }
        f(state)
    }

    /// Apply a submitted call on behalf of `sender`
    pub(crate) fn apply(&self, chain: Chain, sender: &str, description: &str, call: MockCall) -> Result<()> {
        let mut world = self.world();
        let state = world
            .chains
            .get_mut(&chain)
            .ok_or_else(|| eyre!("{} is not deployed", chain))?;
        if !same_address(chain.platform(), sender, &state.owner) {
            return Err(eyre!("{}: caller {} is not the owner", chain, sender));
        }

        match call {
            MockCall::SetPeer {
                chain: peer,
                address,
                decimals,
                inbound_limit,
            } => {
                state.peers.insert(
                    peer,
                    MockPeer {
                        address,
                        decimals,
                        inbound_limit: parse_u256(&inbound_limit)?,
                    },
                );
            }
            MockCall::SetTransceiverPeer {
                chain: peer,
                address,
            } => {
                state.transceiver_peers.insert(peer, address);
            }
            MockCall::SetOwner(owner) => state.owner = owner,
            MockCall::SetPauser(pauser) => state.pauser = Some(pauser),
            MockCall::Pause => state.paused = true,
            MockCall::Unpause => state.paused = false,
            MockCall::SetOutboundLimit(limit) => state.outbound_limit = parse_u256(&limit)?,
            MockCall::SetInboundLimit { chain: peer, limit } => {
                let limit = parse_u256(&limit)?;
                let entry = state
                    .peers
                    .get_mut(&peer)
                    .ok_or_else(|| eyre!("{}: no peer registered for {}", chain, peer))?;
                entry.inbound_limit = limit;
            }
            MockCall::SetTransceiverPauser(pauser) => state.transceiver_pauser = Some(pauser),
            MockCall::SetIsEvmChain { chain: peer, value } => {
                state.evm_chain.insert(peer, value);
            }
            MockCall::SetWormholeRelaying { chain: peer, value } => {
                state.standard_relaying.insert(peer, value);
            }
            MockCall::SetSpecialRelaying { chain: peer, value } => {
                state.special_relaying.insert(peer, value);
            }
            MockCall::RegisterWormholeTransceiver => state.transceiver_registered = true,
            MockCall::UpdateLookupTable => state.lut_needs_update = false,
        }

        world.submitted.push((chain, description.to_string()));
        Ok(())
    }

    pub(crate) fn set_version(&self, chain: Chain, manager: &str, version: &str) -> Result<()> {
        let mut world = self.world();
        let state = world
            .chains
            .get_mut(&chain)
            .ok_or_else(|| eyre!("{} is not deployed", chain))?;
        if !same_address(chain.platform(), manager, &state.manager) {
            return Err(eyre!("{}: no manager at {}", chain, manager));
        }
        state.version = version.to_string();
        world
            .submitted
            .push((chain, format!("upgrade to {}", version)));
        Ok(())
    }
}

fn parse_u256(s: &str) -> Result<U256> {
    U256::from_str_radix(s, 10).map_err(|e| eyre!("bad amount {}: {}", s, e))
}

#[async_trait]
impl NttFactory for MockNetwork {
    async fn connect(&self, chain: Chain, manager: &str) -> Result<Arc<dyn Ntt>> {
        self.read(chain, |state| {
            if same_address(chain.platform(), manager, &state.manager) {
                Ok(())
            } else {
                Err(eyre!("{}: no manager at {}", chain, manager))
            }
        })?;
        Ok(Arc::new(MockNtt::new(chain, self.clone())))
    }
}
