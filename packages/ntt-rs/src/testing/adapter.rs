//! Mock manager and transceiver adapters

use alloy::primitives::U256;
use async_trait::async_trait;
use eyre::{eyre, Result};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::address::UniversalAddress;
use crate::error::{PlatformError, PlatformResult};
use crate::ntt::{Ntt, NttTransceiver, Peer, PeerRegistration};
use crate::signer::UnsignedTransaction;
use crate::types::{Chain, Mode, Platform};

use super::network::{MockCall, MockChainState, MockNetwork};

fn mock_tx(chain: Chain, description: String, call: MockCall) -> Result<Vec<UnsignedTransaction>> {
    let bytes = serde_json::to_vec(&call)?;
    Ok(vec![UnsignedTransaction::raw(chain, description, bytes)])
}

pub struct MockNtt {
    chain: Chain,
    network: MockNetwork,
}

impl MockNtt {
    pub fn new(chain: Chain, network: MockNetwork) -> Self {
        Self { chain, network }
    }

    fn require(&self, platform: Platform, operation: &'static str) -> PlatformResult<()> {
        if self.chain.platform() == platform {
            Ok(())
        } else {
            Err(PlatformError::not_supported(self.chain.platform(), operation))
        }
    }
}

#[async_trait]
impl Ntt for MockNtt {
    fn chain(&self) -> Chain {
        self.chain
    }

    fn manager_address(&self) -> String {
        self.network.manager_address(self.chain)
    }

    async fn get_mode(&self) -> Result<Mode> {
        self.network.read(self.chain, |s| Ok(s.mode))
    }

    async fn is_paused(&self) -> Result<bool> {
        self.network.read(self.chain, |s| Ok(s.paused))
    }

    async fn get_owner(&self) -> Result<String> {
        self.network.read(self.chain, |s| Ok(s.owner.clone()))
    }

    async fn get_pauser(&self) -> Result<Option<String>> {
        self.network.read(self.chain, |s| Ok(s.pauser.clone()))
    }

    async fn get_threshold(&self) -> Result<u8> {
        self.network.read(self.chain, |s| Ok(s.threshold))
    }

    async fn get_outbound_limit(&self) -> Result<U256> {
        self.network.read(self.chain, |s| Ok(s.outbound_limit))
    }

    async fn get_token_decimals(&self) -> Result<u8> {
        self.network.read(self.chain, |s| Ok(s.decimals))
    }

    async fn get_token(&self) -> Result<String> {
        self.network.read(self.chain, |s| Ok(s.token.clone()))
    }

    async fn get_version(&self) -> Result<String> {
        self.network.read(self.chain, |s| Ok(s.version.clone()))
    }

    async fn get_peer(&self, chain: Chain) -> Result<Option<Peer>> {
        self.network.read(self.chain, |s| {
            if s.failing_peer_reads.contains(&chain) {
                return Err(eyre!("{}: peer lookup for {} timed out", s.chain, chain));
            }
            Ok(s.peers.get(&chain).map(|p| Peer {
                chain,
                address: p.address,
                token_decimals: p.decimals,
                inbound_limit: p.inbound_limit,
            }))
        })
    }

    async fn get_transceiver(&self, index: usize) -> Result<Option<Arc<dyn NttTransceiver>>> {
        if index != 0 {
            return Ok(None);
        }
        let address = self.network.read(self.chain, |s| Ok(s.transceiver.clone()))?;
        Ok(Some(Arc::new(MockTransceiver {
            chain: self.chain,
            address,
            network: self.network.clone(),
        })))
    }

    async fn set_peer(&self, peer: &PeerRegistration) -> Result<Vec<UnsignedTransaction>> {
        mock_tx(
            self.chain,
            format!("setPeer({})", peer.chain),
            MockCall::SetPeer {
                chain: peer.chain,
                address: peer.address,
                decimals: peer.token_decimals,
                inbound_limit: peer.inbound_limit.to_string(),
            },
        )
    }

    async fn set_owner(&self, owner: &str) -> Result<Vec<UnsignedTransaction>> {
        mock_tx(
            self.chain,
            "transferOwnership".to_string(),
            MockCall::SetOwner(owner.to_string()),
        )
    }

    async fn set_pauser(&self, pauser: &str) -> Result<Vec<UnsignedTransaction>> {
        mock_tx(
            self.chain,
            "transferPauserCapability".to_string(),
            MockCall::SetPauser(pauser.to_string()),
        )
    }

    async fn pause(&self) -> Result<Vec<UnsignedTransaction>> {
        mock_tx(self.chain, "pause".to_string(), MockCall::Pause)
    }

    async fn unpause(&self) -> Result<Vec<UnsignedTransaction>> {
        mock_tx(self.chain, "unpause".to_string(), MockCall::Unpause)
    }

    async fn set_outbound_limit(&self, limit: U256) -> Result<Vec<UnsignedTransaction>> {
        mock_tx(
            self.chain,
            "setOutboundLimit".to_string(),
            MockCall::SetOutboundLimit(limit.to_string()),
        )
    }

    async fn set_inbound_limit(&self, chain: Chain, limit: U256) -> Result<Vec<UnsignedTransaction>> {
        mock_tx(
            self.chain,
            format!("setInboundLimit({})", chain),
            MockCall::SetInboundLimit {
                chain,
                limit: limit.to_string(),
            },
        )
    }

    async fn is_wormhole_transceiver_registered(&self) -> PlatformResult<bool> {
        self.require(Platform::Solana, "is_wormhole_transceiver_registered")?;
        Ok(self
            .network
            .read(self.chain, |s| Ok(s.transceiver_registered))?)
    }

    async fn register_wormhole_transceiver(&self) -> PlatformResult<Vec<UnsignedTransaction>> {
        self.require(Platform::Solana, "register_wormhole_transceiver")?;
        Ok(mock_tx(
            self.chain,
            "registerWormholeTransceiver".to_string(),
            MockCall::RegisterWormholeTransceiver,
        )?)
    }

    async fn would_update_lookup_table(&self) -> PlatformResult<bool> {
        self.require(Platform::Solana, "would_update_lookup_table")?;
        Ok(self.network.read(self.chain, |s| Ok(s.lut_needs_update))?)
    }

    async fn initialize_or_update_lookup_table(&self) -> PlatformResult<Vec<UnsignedTransaction>> {
        self.require(Platform::Solana, "initialize_or_update_lookup_table")?;
        Ok(mock_tx(
            self.chain,
            "updateLookupTable".to_string(),
            MockCall::UpdateLookupTable,
        )?)
    }
}

pub struct MockTransceiver {
    chain: Chain,
    address: String,
    network: MockNetwork,
}

impl MockTransceiver {
    fn require_evm(&self, operation: &'static str) -> PlatformResult<()> {
        if self.chain.platform() == Platform::Evm {
            Ok(())
        } else {
            Err(PlatformError::not_supported(self.chain.platform(), operation))
        }
    }

    fn flag(&self, chain: Chain, pick: fn(&MockChainState) -> &BTreeMap<Chain, bool>) -> Result<bool> {
        self.network
            .read(self.chain, |s| Ok(pick(s).get(&chain).copied().unwrap_or(false)))
    }
}

#[async_trait]
impl NttTransceiver for MockTransceiver {
    fn chain(&self) -> Chain {
        self.chain
    }

    fn address(&self) -> String {
        self.address.clone()
    }

    async fn get_peer(&self, chain: Chain) -> Result<Option<UniversalAddress>> {
        self.network
            .read(self.chain, |s| Ok(s.transceiver_peers.get(&chain).copied()))
    }

    async fn get_pauser(&self) -> Result<Option<String>> {
        self.network
            .read(self.chain, |s| Ok(s.transceiver_pauser.clone()))
    }

    async fn set_peer(&self, chain: Chain, address: UniversalAddress) -> Result<Vec<UnsignedTransaction>> {
        mock_tx(
            self.chain,
            format!("setWormholePeer({})", chain),
            MockCall::SetTransceiverPeer { chain, address },
        )
    }

    async fn set_pauser(&self, pauser: &str) -> Result<Vec<UnsignedTransaction>> {
        mock_tx(
            self.chain,
            "transceiver.transferPauserCapability".to_string(),
            MockCall::SetTransceiverPauser(pauser.to_string()),
        )
    }

    async fn is_evm_chain(&self, chain: Chain) -> PlatformResult<bool> {
        self.require_evm("is_evm_chain")?;
        Ok(self.flag(chain, |s| &s.evm_chain)?)
    }

    async fn set_is_evm_chain(&self, chain: Chain, value: bool) -> PlatformResult<Vec<UnsignedTransaction>> {
        self.require_evm("set_is_evm_chain")?;
        Ok(mock_tx(
            self.chain,
            format!("setIsWormholeEvmChain({}, {})", chain, value),
            MockCall::SetIsEvmChain { chain, value },
        )?)
    }

    async fn is_wormhole_relaying_enabled(&self, chain: Chain) -> PlatformResult<bool> {
        self.require_evm("is_wormhole_relaying_enabled")?;
        Ok(self.flag(chain, |s| &s.standard_relaying)?)
    }

    async fn set_is_wormhole_relaying_enabled(
        &self,
        chain: Chain,
        value: bool,
    ) -> PlatformResult<Vec<UnsignedTransaction>> {
        self.require_evm("set_is_wormhole_relaying_enabled")?;
        Ok(mock_tx(
            self.chain,
            format!("setIsWormholeRelayingEnabled({}, {})", chain, value),
            MockCall::SetWormholeRelaying { chain, value },
        )?)
    }

    async fn is_special_relaying_enabled(&self, chain: Chain) -> PlatformResult<bool> {
        self.require_evm("is_special_relaying_enabled")?;
        Ok(self.flag(chain, |s| &s.special_relaying)?)
    }

    async fn set_is_special_relaying_enabled(
        &self,
        chain: Chain,
        value: bool,
    ) -> PlatformResult<Vec<UnsignedTransaction>> {
        self.require_evm("set_is_special_relaying_enabled")?;
        Ok(mock_tx(
            self.chain,
            format!("setIsSpecialRelayingEnabled({}, {})", chain, value),
            MockCall::SetSpecialRelaying { chain, value },
        )?)
    }
}
