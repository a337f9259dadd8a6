//! Chain protocol adapter interface
//!
//! Every platform exposes the same capability set over a deployed manager
//! and its transceivers. Reads return plain values; writes return the
//! unsigned transactions that would perform the change, to be signed and
//! submitted through a [`Signer`](crate::signer::Signer).
//!
//! Platform-specific capabilities have default implementations returning
//! [`PlatformError::NotSupported`], so callers dispatch through the trait
//! and never downcast to a concrete adapter.

use alloy::primitives::U256;
use async_trait::async_trait;
use eyre::Result;
use std::sync::Arc;

use crate::address::UniversalAddress;
use crate::error::{PlatformError, PlatformResult};
use crate::signer::UnsignedTransaction;
use crate::types::{Chain, Mode, Platform};

/// Manager peer registration as read from chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Peer {
    pub chain: Chain,
    pub address: UniversalAddress,
    pub token_decimals: u8,
    /// Inbound limit in the local token's raw units
    pub inbound_limit: U256,
}

/// Arguments of a manager `setPeer`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerRegistration {
    pub chain: Chain,
    pub address: UniversalAddress,
    pub token_decimals: u8,
    pub inbound_limit: U256,
}

/// Bridge manager deployed on one chain
#[async_trait]
pub trait Ntt: Send + Sync {
    fn chain(&self) -> Chain;

    fn platform(&self) -> Platform {
        self.chain().platform()
    }

    /// Native address of the manager
    fn manager_address(&self) -> String;

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    async fn get_mode(&self) -> Result<Mode>;
    async fn is_paused(&self) -> Result<bool>;
    async fn get_owner(&self) -> Result<String>;
    async fn get_pauser(&self) -> Result<Option<String>>;
    async fn get_threshold(&self) -> Result<u8>;
    async fn get_outbound_limit(&self) -> Result<U256>;
    async fn get_token_decimals(&self) -> Result<u8>;
    async fn get_token(&self) -> Result<String>;
    async fn get_version(&self) -> Result<String>;
    async fn get_peer(&self, chain: Chain) -> Result<Option<Peer>>;
    async fn get_transceiver(&self, index: usize) -> Result<Option<Arc<dyn NttTransceiver>>>;

    // ------------------------------------------------------------------
    // Writes
    // ------------------------------------------------------------------

    async fn set_peer(&self, peer: &PeerRegistration) -> Result<Vec<UnsignedTransaction>>;
    async fn set_owner(&self, owner: &str) -> Result<Vec<UnsignedTransaction>>;
    async fn set_pauser(&self, pauser: &str) -> Result<Vec<UnsignedTransaction>>;
    async fn pause(&self) -> Result<Vec<UnsignedTransaction>>;
    async fn unpause(&self) -> Result<Vec<UnsignedTransaction>>;
    async fn set_outbound_limit(&self, limit: U256) -> Result<Vec<UnsignedTransaction>>;
    async fn set_inbound_limit(&self, chain: Chain, limit: U256)
        -> Result<Vec<UnsignedTransaction>>;

    // ------------------------------------------------------------------
    // Solana-only
    // ------------------------------------------------------------------

    /// Whether the manager has registered its own Wormhole transceiver
    async fn is_wormhole_transceiver_registered(&self) -> PlatformResult<bool> {
        Err(PlatformError::not_supported(
            self.platform(),
            "is_wormhole_transceiver_registered",
        ))
    }

    async fn register_wormhole_transceiver(&self) -> PlatformResult<Vec<UnsignedTransaction>> {
        Err(PlatformError::not_supported(
            self.platform(),
            "register_wormhole_transceiver",
        ))
    }

    /// Dry run of the lookup-table update: true if it would emit an instruction
    async fn would_update_lookup_table(&self) -> PlatformResult<bool> {
        Err(PlatformError::not_supported(
            self.platform(),
            "would_update_lookup_table",
        ))
    }

    async fn initialize_or_update_lookup_table(
        &self,
    ) -> PlatformResult<Vec<UnsignedTransaction>> {
        Err(PlatformError::not_supported(
            self.platform(),
            "initialize_or_update_lookup_table",
        ))
    }
}

/// Wormhole transceiver attached to a manager
#[async_trait]
pub trait NttTransceiver: Send + Sync {
    fn chain(&self) -> Chain;

    fn platform(&self) -> Platform {
        self.chain().platform()
    }

    /// Native address of the transceiver
    fn address(&self) -> String;

    async fn get_peer(&self, chain: Chain) -> Result<Option<UniversalAddress>>;
    async fn get_pauser(&self) -> Result<Option<String>>;
    async fn set_peer(
        &self,
        chain: Chain,
        address: UniversalAddress,
    ) -> Result<Vec<UnsignedTransaction>>;
    async fn set_pauser(&self, pauser: &str) -> Result<Vec<UnsignedTransaction>>;

    // ------------------------------------------------------------------
    // EVM-only relaying flags
    // ------------------------------------------------------------------

    async fn is_evm_chain(&self, _chain: Chain) -> PlatformResult<bool> {
        Err(PlatformError::not_supported(self.platform(), "is_evm_chain"))
    }

    async fn set_is_evm_chain(
        &self,
        _chain: Chain,
        _value: bool,
    ) -> PlatformResult<Vec<UnsignedTransaction>> {
        Err(PlatformError::not_supported(self.platform(), "set_is_evm_chain"))
    }

    async fn is_wormhole_relaying_enabled(&self, _chain: Chain) -> PlatformResult<bool> {
        Err(PlatformError::not_supported(
            self.platform(),
            "is_wormhole_relaying_enabled",
        ))
    }

    async fn set_is_wormhole_relaying_enabled(
        &self,
        _chain: Chain,
        _value: bool,
    ) -> PlatformResult<Vec<UnsignedTransaction>> {
        Err(PlatformError::not_supported(
            self.platform(),
            "set_is_wormhole_relaying_enabled",
        ))
    }

    async fn is_special_relaying_enabled(&self, _chain: Chain) -> PlatformResult<bool> {
        Err(PlatformError::not_supported(
            self.platform(),
            "is_special_relaying_enabled",
        ))
    }

    async fn set_is_special_relaying_enabled(
        &self,
        _chain: Chain,
        _value: bool,
    ) -> PlatformResult<Vec<UnsignedTransaction>> {
        Err(PlatformError::not_supported(
            self.platform(),
            "set_is_special_relaying_enabled",
        ))
    }
}

/// Resolves a live adapter for a chain from its manager address
#[async_trait]
pub trait NttFactory: Send + Sync {
    async fn connect(&self, chain: Chain, manager: &str) -> Result<Arc<dyn Ntt>>;
}
