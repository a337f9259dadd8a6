//! Deployment data model
//!
//! Shared types for the declarative deployment manifest: chains, platforms,
//! networks, per-chain configuration and the deployment itself.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::NttError;

// ============================================================================
// Platforms and Networks
// ============================================================================

/// Execution platform a chain belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Platform {
    Evm,
    Solana,
    Sui,
    Stacks,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Evm => "Evm",
            Platform::Solana => "Solana",
            Platform::Sui => "Sui",
            Platform::Stacks => "Stacks",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Wormhole network a deployment lives on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Network {
    Mainnet,
    Testnet,
    Devnet,
}

impl FromStr for Network {
    type Err = NttError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mainnet" => Ok(Network::Mainnet),
            "testnet" => Ok(Network::Testnet),
            "devnet" => Ok(Network::Devnet),
            _ => Err(NttError::UnknownNetwork(s.to_string())),
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Network::Mainnet => "Mainnet",
            Network::Testnet => "Testnet",
            Network::Devnet => "Devnet",
        };
        f.write_str(s)
    }
}

// ============================================================================
// Chains
// ============================================================================

macro_rules! chains {
    ($($name:ident => ($id:expr, $platform:ident)),* $(,)?) => {
        /// Supported chain, identified by its Wormhole name
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub enum Chain {
            $($name),*
        }

        impl Chain {
            /// Every supported chain, in declaration order
            pub const ALL: &'static [Chain] = &[$(Chain::$name),*];

            /// Wormhole chain id
            pub fn wormhole_id(&self) -> u16 {
                match self {
                    $(Chain::$name => $id),*
                }
            }

            pub fn platform(&self) -> Platform {
                match self {
                    $(Chain::$name => Platform::$platform),*
                }
            }

            pub fn name(&self) -> &'static str {
                match self {
                    $(Chain::$name => stringify!($name)),*
                }
            }
        }
    };
}

chains! {
    Solana => (1, Solana),
    Ethereum => (2, Evm),
    Bsc => (4, Evm),
    Polygon => (5, Evm),
    Avalanche => (6, Evm),
    Fantom => (10, Evm),
    Celo => (14, Evm),
    Moonbeam => (16, Evm),
    Sui => (21, Sui),
    Arbitrum => (23, Evm),
    Optimism => (24, Evm),
    Base => (30, Evm),
    Scroll => (34, Evm),
    Mantle => (35, Evm),
    Blast => (36, Evm),
    Linea => (38, Evm),
    Berachain => (39, Evm),
    Unichain => (44, Evm),
    Worldchain => (45, Evm),
    Ink => (46, Evm),
    Monad => (48, Evm),
    Sonic => (52, Evm),
    Stacks => (60, Stacks),
    Sepolia => (10002, Evm),
    ArbitrumSepolia => (10003, Evm),
    BaseSepolia => (10004, Evm),
    OptimismSepolia => (10005, Evm),
    Holesky => (10006, Evm),
    PolygonSepolia => (10007, Evm),
}

impl Chain {
    /// Look a chain up by its Wormhole chain id
    pub fn from_wormhole_id(id: u16) -> Option<Chain> {
        Chain::ALL.iter().copied().find(|c| c.wormhole_id() == id)
    }

    /// Testnet-only chains (the Sepolia family and Holesky)
    pub fn is_testnet_only(&self) -> bool {
        self.wormhole_id() >= 10000
    }

    /// Whether this chain can take part in a deployment on `network`
    pub fn supports_network(&self, network: Network) -> bool {
        match network {
            Network::Mainnet => !self.is_testnet_only(),
            Network::Testnet | Network::Devnet => true,
        }
    }

    /// All chains usable on a network
    pub fn all_on(network: Network) -> impl Iterator<Item = Chain> {
        Chain::ALL
            .iter()
            .copied()
            .filter(move |c| c.supports_network(network))
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Chain {
    type Err = NttError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Chain::ALL
            .iter()
            .copied()
            .find(|c| c.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| NttError::UnknownChain(s.to_string()))
    }
}

impl TryFrom<String> for Chain {
    type Error = NttError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Chain> for String {
    fn from(chain: Chain) -> Self {
        chain.name().to_string()
    }
}

// ============================================================================
// Per-chain configuration
// ============================================================================

/// Custody mode of a chain's manager
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Locking,
    Burning,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Locking => "locking",
            Mode::Burning => "burning",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = NttError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "locking" => Ok(Mode::Locking),
            "burning" => Ok(Mode::Burning),
            _ => Err(NttError::UnknownMode(s.to_string())),
        }
    }
}

/// Wormhole transceiver entry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WormholeTransceiverConfig {
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pauser: Option<String>,
    /// Relaying is done by an executor instead of the Wormhole relayers.
    /// Local-only preference, never read from chain.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub executor: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransceiversConfig {
    pub threshold: u8,
    pub wormhole: WormholeTransceiverConfig,
}

/// Rate limits as decimal strings scaled by the chain's token decimals
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitsConfig {
    pub outbound: String,
    #[serde(default)]
    pub inbound: BTreeMap<Chain, String>,
}

/// Declarative configuration of one chain
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainConfig {
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<Mode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paused: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pauser: Option<String>,
    #[serde(default)]
    pub manager: String,
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub transceivers: TransceiversConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
}

impl ChainConfig {
    /// Whether the chain opted into executor relaying
    pub fn uses_executor(&self) -> bool {
        self.transceivers.wormhole.executor.unwrap_or(false)
    }

    /// Copy fields that only exist in the manifest onto a config read from chain
    pub fn carry_local_only(&mut self, local: &ChainConfig) {
        self.transceivers.wormhole.executor = local.transceivers.wormhole.executor;
    }
}

// ============================================================================
// Deployment manifest
// ============================================================================

/// The whole declared deployment, as stored in `deployment.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deployment {
    pub network: Network,
    #[serde(default)]
    pub chains: BTreeMap<Chain, ChainConfig>,
}

impl Deployment {
    pub fn new(network: Network) -> Self {
        Self {
            network,
            chains: BTreeMap::new(),
        }
    }

    /// The chain configured in locking mode, if any
    pub fn locking_chain(&self) -> Option<Chain> {
        self.chains
            .iter()
            .find(|(_, c)| c.mode == Some(Mode::Locking))
            .map(|(chain, _)| *chain)
    }

    /// Set a chain's mode, rejecting a second locking chain
    pub fn set_mode(&mut self, chain: Chain, mode: Mode) -> Result<(), NttError> {
        if mode == Mode::Locking {
            if let Some(existing) = self.locking_chain() {
                if existing != chain {
                    return Err(NttError::MultipleLockingChains {
                        existing,
                        requested: chain,
                    });
                }
            }
        }
        self.chains.entry(chain).or_default().mode = Some(mode);
        Ok(())
    }

    /// Insert a chain's config, enforcing the single-locking-chain invariant
    pub fn insert_chain(&mut self, chain: Chain, config: ChainConfig) -> Result<(), NttError> {
        if !chain.supports_network(self.network) {
            return Err(NttError::ChainNotOnNetwork {
                chain,
                network: self.network,
            });
        }
        if config.mode == Some(Mode::Locking) {
            if let Some(existing) = self.locking_chain() {
                if existing != chain {
                    return Err(NttError::MultipleLockingChains {
                        existing,
                        requested: chain,
                    });
                }
            }
        }
        self.chains.insert(chain, config);
        Ok(())
    }

    /// Fill in chains without a declared mode.
    ///
    /// Once a locking chain exists every undeclared chain must be burning.
    /// Without a locking chain the modes stay undeclared and validation
    /// reports them. Returns the chains that were assigned.
    pub fn infer_missing_modes(&mut self) -> Vec<Chain> {
        if self.locking_chain().is_none() {
            return Vec::new();
        }
        let mut assigned = Vec::new();
        for (chain, config) in self.chains.iter_mut() {
            if config.mode.is_none() {
                config.mode = Some(Mode::Burning);
                assigned.push(*chain);
            }
        }
        assigned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain_with_mode(mode: Option<Mode>) -> ChainConfig {
        ChainConfig {
            mode,
            manager: "0x1".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_chain_ids_and_platforms() {
        assert_eq!(Chain::Solana.wormhole_id(), 1);
        assert_eq!(Chain::Ethereum.wormhole_id(), 2);
        assert_eq!(Chain::Sepolia.platform(), Platform::Evm);
        assert_eq!(Chain::Sui.platform(), Platform::Sui);
        assert_eq!(Chain::from_wormhole_id(10004), Some(Chain::BaseSepolia));
        assert_eq!(Chain::from_wormhole_id(9999), None);
    }

    #[test]
    fn test_chain_parse_is_case_insensitive() {
        assert_eq!("ethereum".parse::<Chain>().unwrap(), Chain::Ethereum);
        assert_eq!("ArbitrumSepolia".parse::<Chain>().unwrap(), Chain::ArbitrumSepolia);
        assert!(matches!(
            "Narnia".parse::<Chain>(),
            Err(NttError::UnknownChain(_))
        ));
    }

    #[test]
    fn test_testnet_only_chains_rejected_on_mainnet() {
        let mut deployment = Deployment::new(Network::Mainnet);
        let err = deployment
            .insert_chain(Chain::Sepolia, ChainConfig::default())
            .unwrap_err();
        assert!(matches!(err, NttError::ChainNotOnNetwork { .. }));
    }

    #[test]
    fn test_second_locking_chain_rejected() {
        let mut deployment = Deployment::new(Network::Mainnet);
        deployment.set_mode(Chain::Ethereum, Mode::Locking).unwrap();
        deployment.set_mode(Chain::Solana, Mode::Burning).unwrap();

        let err = deployment.set_mode(Chain::Solana, Mode::Locking).unwrap_err();
        assert!(matches!(
            err,
            NttError::MultipleLockingChains {
                existing: Chain::Ethereum,
                requested: Chain::Solana
            }
        ));
        assert_eq!(deployment.chains[&Chain::Solana].mode, Some(Mode::Burning));

        // Re-declaring the same chain as locking is fine
        deployment.set_mode(Chain::Ethereum, Mode::Locking).unwrap();
    }

    #[test]
    fn test_insert_second_locking_chain_rejected() {
        let mut deployment = Deployment::new(Network::Mainnet);
        deployment
            .insert_chain(Chain::Ethereum, chain_with_mode(Some(Mode::Locking)))
            .unwrap();
        assert!(deployment
            .insert_chain(Chain::Base, chain_with_mode(Some(Mode::Locking)))
            .is_err());
    }

    #[test]
    fn test_infer_missing_modes_with_locking_chain() {
        let mut deployment = Deployment::new(Network::Mainnet);
        deployment
            .chains
            .insert(Chain::Ethereum, chain_with_mode(Some(Mode::Locking)));
        deployment
            .chains
            .insert(Chain::Solana, chain_with_mode(Some(Mode::Burning)));
        deployment.chains.insert(Chain::Avalanche, chain_with_mode(None));

        let assigned = deployment.infer_missing_modes();

        assert_eq!(assigned, vec![Chain::Avalanche]);
        assert_eq!(
            deployment.chains[&Chain::Avalanche].mode,
            Some(Mode::Burning)
        );
    }

    #[test]
    fn test_infer_missing_modes_without_locking_chain() {
        let mut deployment = Deployment::new(Network::Testnet);
        deployment.chains.insert(Chain::Sepolia, chain_with_mode(None));
        assert!(deployment.infer_missing_modes().is_empty());
        assert_eq!(deployment.chains[&Chain::Sepolia].mode, None);
    }

    #[test]
    fn test_manifest_json_shape() {
        let json = r#"{
            "network": "Testnet",
            "chains": {
                "Sepolia": {
                    "version": "1.1.0",
                    "mode": "locking",
                    "paused": false,
                    "owner": "0xabc",
                    "manager": "0xdef",
                    "token": "0x123",
                    "transceivers": { "threshold": 1, "wormhole": { "address": "0x456" } },
                    "limits": { "outbound": "10.000000", "inbound": { "Solana": "5.000000" } }
                }
            }
        }"#;
        let deployment: Deployment = serde_json::from_str(json).unwrap();
        let sepolia = &deployment.chains[&Chain::Sepolia];
        assert_eq!(sepolia.mode, Some(Mode::Locking));
        assert_eq!(sepolia.limits.inbound[&Chain::Solana], "5.000000");
        assert_eq!(sepolia.pauser, None);

        let back = serde_json::to_value(&deployment).unwrap();
        assert_eq!(back["chains"]["Sepolia"]["limits"]["inbound"]["Solana"], "5.000000");
        assert!(back["chains"]["Sepolia"].get("pauser").is_none());
    }

    #[test]
    fn test_undeclared_paused_and_owner_stay_out_of_manifest() {
        let json = r#"{
            "version": "1.1.0",
            "manager": "0xdef",
            "token": "0x123",
            "transceivers": { "threshold": 1, "wormhole": { "address": "0x456" } },
            "limits": { "outbound": "10.000000" }
        }"#;
        let config: ChainConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.paused, None);
        assert_eq!(config.owner, None);

        let back = serde_json::to_value(&config).unwrap();
        assert!(back.get("paused").is_none());
        assert!(back.get("owner").is_none());
    }
}
