//! RPC endpoint selection
//!
//! Operator override first, then a public default for the chain on the
//! deployment's network.

use eyre::{eyre, Result};
use ntt_rs::{Chain, Network};

use crate::config::OperatorConfig;

/// Public endpoint for a chain, if one is known
pub fn default_rpc(chain: Chain, network: Network) -> Option<&'static str> {
    match network {
        Network::Mainnet => mainnet_rpc(chain),
        Network::Testnet => testnet_rpc(chain),
        Network::Devnet => devnet_rpc(chain),
    }
}

fn mainnet_rpc(chain: Chain) -> Option<&'static str> {
    let url = match chain {
        Chain::Solana => "https://api.mainnet-beta.solana.com",
        Chain::Ethereum => "https://ethereum-rpc.publicnode.com",
        Chain::Bsc => "https://bsc-rpc.publicnode.com",
        Chain::Polygon => "https://polygon-bor-rpc.publicnode.com",
        Chain::Avalanche => "https://api.avax.network/ext/bc/C/rpc",
        Chain::Fantom => "https://rpc.ftm.tools",
        Chain::Celo => "https://forno.celo.org",
        Chain::Moonbeam => "https://rpc.api.moonbeam.network",
        Chain::Sui => "https://fullnode.mainnet.sui.io:443",
        Chain::Arbitrum => "https://arb1.arbitrum.io/rpc",
        Chain::Optimism => "https://mainnet.optimism.io",
        Chain::Base => "https://mainnet.base.org",
        Chain::Scroll => "https://rpc.scroll.io",
        Chain::Mantle => "https://rpc.mantle.xyz",
        Chain::Blast => "https://rpc.blast.io",
        Chain::Linea => "https://rpc.linea.build",
        Chain::Berachain => "https://rpc.berachain.com",
        Chain::Unichain => "https://mainnet.unichain.org",
        Chain::Worldchain => "https://worldchain-mainnet.g.alchemy.com/public",
        Chain::Ink => "https://rpc-gel.inkonchain.com",
        Chain::Sonic => "https://rpc.soniclabs.com",
        Chain::Stacks => "https://api.mainnet.hiro.so",
        _ => return None,
    };
    Some(url)
}

fn testnet_rpc(chain: Chain) -> Option<&'static str> {
    let url = match chain {
        Chain::Solana => "https://api.devnet.solana.com",
        Chain::Bsc => "https://bsc-testnet-rpc.publicnode.com",
        Chain::Avalanche => "https://api.avax-test.network/ext/bc/C/rpc",
        Chain::Celo => "https://alfajores-forno.celo-testnet.org",
        Chain::Sui => "https://fullnode.testnet.sui.io:443",
        Chain::Monad => "https://testnet-rpc.monad.xyz",
        Chain::Stacks => "https://api.testnet.hiro.so",
        Chain::Sepolia => "https://ethereum-sepolia-rpc.publicnode.com",
        Chain::ArbitrumSepolia => "https://sepolia-rollup.arbitrum.io/rpc",
        Chain::BaseSepolia => "https://sepolia.base.org",
        Chain::OptimismSepolia => "https://sepolia.optimism.io",
        Chain::Holesky => "https://ethereum-holesky-rpc.publicnode.com",
        Chain::PolygonSepolia => "https://rpc-amoy.polygon.technology",
        _ => return None,
    };
    Some(url)
}

fn devnet_rpc(chain: Chain) -> Option<&'static str> {
    match chain.platform() {
        ntt_rs::Platform::Evm => Some("http://localhost:8545"),
        ntt_rs::Platform::Solana => Some("http://localhost:8899"),
        _ => None,
    }
}

/// Resolves the RPC endpoint for each chain of one deployment
#[derive(Debug, Clone)]
pub struct RpcResolver {
    network: Network,
    overrides: OperatorConfig,
}

impl RpcResolver {
    pub fn new(network: Network, overrides: OperatorConfig) -> Self {
        Self { network, overrides }
    }

    pub fn network(&self) -> Network {
        self.network
    }

    pub fn rpc_url(&self, chain: Chain) -> Result<String> {
        if let Some(url) = self.overrides.rpc_for(chain) {
            return Ok(url.to_string());
        }
        default_rpc(chain, self.network)
            .map(str::to_string)
            .ok_or_else(|| {
                eyre!(
                    "No RPC endpoint known for {} on {}; set one with `ntt config set-chain {} rpc <url>`",
                    chain,
                    self.network,
                    chain
                )
            })
    }
}
