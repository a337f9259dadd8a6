//! EVM manager and transceiver adapters
//!
//! Reads go through a read-only provider; writes return calldata wrapped
//! in [`UnsignedTransaction`]s for an [`EvmSigner`](super::signer::EvmSigner).

use alloy::{
    primitives::{Address, Bytes, FixedBytes, U256},
    providers::{ProviderBuilder, RootProvider},
    rpc::types::TransactionRequest,
    sol_types::SolCall,
    transports::http::{Client, Http},
};
use async_trait::async_trait;
use eyre::{eyre, Result, WrapErr};
use std::sync::Arc;
use tracing::debug;

use crate::address::UniversalAddress;
use crate::error::PlatformResult;
use crate::evm::contracts::{
    untrim, IWormhole, NttManager, WormholeTransceiver, MODE_BURNING, MODE_LOCKING,
};
use crate::ntt::{Ntt, NttTransceiver, Peer, PeerRegistration};
use crate::signer::UnsignedTransaction;
use crate::types::{Chain, Mode, Platform};

fn parse_address(address: &str) -> Result<Address> {
    address
        .parse()
        .map_err(|e| eyre!("Invalid EVM address {}: {}", address, e))
}

fn call_tx<C: SolCall>(
    chain: Chain,
    description: impl Into<String>,
    to: Address,
    call: C,
) -> UnsignedTransaction {
    let tx = TransactionRequest::default()
        .to(to)
        .input(Bytes::from(call.abi_encode()).into());
    UnsignedTransaction::evm(chain, description, tx)
}

/// NttManager on an EVM chain
pub struct EvmNtt {
    chain: Chain,
    provider: RootProvider<Http<Client>>,
    manager: Address,
}

impl EvmNtt {
    /// Connect to the manager at `manager` through `rpc_url`
    pub fn new(chain: Chain, rpc_url: &str, manager: &str) -> Result<Self> {
        if chain.platform() != Platform::Evm {
            return Err(eyre!("{} is not an EVM chain", chain));
        }
        let provider = ProviderBuilder::new().on_http(
            rpc_url
                .parse()
                .map_err(|e| eyre!("Invalid RPC URL: {}", e))?,
        );
        Ok(Self {
            chain,
            provider,
            manager: parse_address(manager)?,
        })
    }

    async fn token_decimals(&self) -> Result<u8> {
        Ok(NttManager::new(self.manager, &self.provider)
            .tokenDecimals()
            .call()
            .await
            .wrap_err("Failed to get token decimals")?
            ._0)
    }
}

#[async_trait]
impl Ntt for EvmNtt {
    fn chain(&self) -> Chain {
        self.chain
    }

    fn manager_address(&self) -> String {
        self.manager.to_string()
    }

    async fn get_mode(&self) -> Result<Mode> {
        let mode = NttManager::new(self.manager, &self.provider)
            .getMode()
            .call()
            .await
            .wrap_err("Failed to get mode")?
            ._0;
        match mode {
            MODE_LOCKING => Ok(Mode::Locking),
            MODE_BURNING => Ok(Mode::Burning),
            other => Err(eyre!("{}: unknown manager mode {}", self.chain, other)),
        }
    }

    async fn is_paused(&self) -> Result<bool> {
        Ok(NttManager::new(self.manager, &self.provider)
            .isPaused()
            .call()
            .await
            .wrap_err("Failed to get paused state")?
            ._0)
    }

    async fn get_owner(&self) -> Result<String> {
        let owner = NttManager::new(self.manager, &self.provider)
            .owner()
            .call()
            .await
            .wrap_err("Failed to get owner")?
            ._0;
        Ok(owner.to_string())
    }

    async fn get_pauser(&self) -> Result<Option<String>> {
        let pauser = NttManager::new(self.manager, &self.provider)
            .pauser()
            .call()
            .await
            .wrap_err("Failed to get pauser")?
            ._0;
        Ok(Some(pauser.to_string()))
    }

    async fn get_threshold(&self) -> Result<u8> {
        Ok(NttManager::new(self.manager, &self.provider)
            .getThreshold()
            .call()
            .await
            .wrap_err("Failed to get threshold")?
            ._0)
    }

    async fn get_outbound_limit(&self) -> Result<U256> {
        let params = NttManager::new(self.manager, &self.provider)
            .getOutboundLimitParams()
            .call()
            .await
            .wrap_err("Failed to get outbound limit")?
            ._0;
        Ok(untrim(params.limit, self.token_decimals().await?))
    }

    async fn get_token_decimals(&self) -> Result<u8> {
        self.token_decimals().await
    }

    async fn get_token(&self) -> Result<String> {
        let token = NttManager::new(self.manager, &self.provider)
            .token()
            .call()
            .await
            .wrap_err("Failed to get token")?
            ._0;
        Ok(token.to_string())
    }

    async fn get_version(&self) -> Result<String> {
        Ok(NttManager::new(self.manager, &self.provider)
            .NTT_MANAGER_VERSION()
            .call()
            .await
            .wrap_err("Failed to get manager version")?
            ._0)
    }

    async fn get_peer(&self, chain: Chain) -> Result<Option<Peer>> {
        let id = chain.wormhole_id();
        let peer = NttManager::new(self.manager, &self.provider)
            .getPeer(id)
            .call()
            .await
            .wrap_err_with(|| format!("Failed to get {} peer", chain))?
            ._0;

        if peer.peerAddress == FixedBytes::<32>::ZERO {
            return Ok(None);
        }

        let inbound = NttManager::new(self.manager, &self.provider)
            .getInboundLimitParams(id)
            .call()
            .await
            .wrap_err_with(|| format!("Failed to get {} inbound limit", chain))?
            ._0;

        Ok(Some(Peer {
            chain,
            address: UniversalAddress(peer.peerAddress.0),
            token_decimals: peer.tokenDecimals,
            inbound_limit: untrim(inbound.limit, self.token_decimals().await?),
        }))
    }

    async fn get_transceiver(&self, index: usize) -> Result<Option<Arc<dyn NttTransceiver>>> {
        let transceivers = NttManager::new(self.manager, &self.provider)
            .getTransceivers()
            .call()
            .await
            .wrap_err("Failed to get transceivers")?
            .result;

        Ok(transceivers.get(index).map(|address| {
            Arc::new(EvmTransceiver {
                chain: self.chain,
                provider: self.provider.clone(),
                address: *address,
            }) as Arc<dyn NttTransceiver>
        }))
    }

    async fn set_peer(&self, peer: &PeerRegistration) -> Result<Vec<UnsignedTransaction>> {
        let call = NttManager::setPeerCall {
            peerChainId: peer.chain.wormhole_id(),
            peerContract: FixedBytes(peer.address.0),
            decimals: peer.token_decimals,
            inboundLimit: peer.inbound_limit,
        };
        Ok(vec![call_tx(
            self.chain,
            format!("setPeer({})", peer.chain),
            self.manager,
            call,
        )])
    }

    async fn set_owner(&self, owner: &str) -> Result<Vec<UnsignedTransaction>> {
        let call = NttManager::transferOwnershipCall {
            newOwner: parse_address(owner)?,
        };
        Ok(vec![call_tx(self.chain, "transferOwnership", self.manager, call)])
    }

    async fn set_pauser(&self, pauser: &str) -> Result<Vec<UnsignedTransaction>> {
        let call = NttManager::transferPauserCapabilityCall {
            newPauser: parse_address(pauser)?,
        };
        Ok(vec![call_tx(
            self.chain,
            "transferPauserCapability",
            self.manager,
            call,
        )])
    }

    async fn pause(&self) -> Result<Vec<UnsignedTransaction>> {
        Ok(vec![call_tx(
            self.chain,
            "pause",
            self.manager,
            NttManager::pauseCall {},
        )])
    }

    async fn unpause(&self) -> Result<Vec<UnsignedTransaction>> {
        Ok(vec![call_tx(
            self.chain,
            "unpause",
            self.manager,
            NttManager::unpauseCall {},
        )])
    }

    async fn set_outbound_limit(&self, limit: U256) -> Result<Vec<UnsignedTransaction>> {
        let call = NttManager::setOutboundLimitCall { limit };
        Ok(vec![call_tx(self.chain, "setOutboundLimit", self.manager, call)])
    }

    async fn set_inbound_limit(&self, chain: Chain, limit: U256) -> Result<Vec<UnsignedTransaction>> {
        let call = NttManager::setInboundLimitCall {
            limit,
            chainId: chain.wormhole_id(),
        };
        Ok(vec![call_tx(
            self.chain,
            format!("setInboundLimit({})", chain),
            self.manager,
            call,
        )])
    }
}

/// WormholeTransceiver on an EVM chain
pub struct EvmTransceiver {
    chain: Chain,
    provider: RootProvider<Http<Client>>,
    address: Address,
}

impl EvmTransceiver {
    async fn message_fee(&self) -> Result<U256> {
        let wormhole = WormholeTransceiver::new(self.address, &self.provider)
            .wormhole()
            .call()
            .await
            .wrap_err("Failed to get wormhole address")?
            ._0;
        let fee = IWormhole::new(wormhole, &self.provider)
            .messageFee()
            .call()
            .await
            .wrap_err("Failed to get message fee")?
            ._0;
        Ok(fee)
    }
}

#[async_trait]
impl NttTransceiver for EvmTransceiver {
    fn chain(&self) -> Chain {
        self.chain
    }

    fn address(&self) -> String {
        self.address.to_string()
    }

    async fn get_peer(&self, chain: Chain) -> Result<Option<UniversalAddress>> {
        let peer = WormholeTransceiver::new(self.address, &self.provider)
            .getWormholePeer(chain.wormhole_id())
            .call()
            .await
            .wrap_err_with(|| format!("Failed to get {} transceiver peer", chain))?
            ._0;
        if peer == FixedBytes::<32>::ZERO {
            Ok(None)
        } else {
            Ok(Some(UniversalAddress(peer.0)))
        }
    }

    async fn get_pauser(&self) -> Result<Option<String>> {
        let pauser = WormholeTransceiver::new(self.address, &self.provider)
            .pauser()
            .call()
            .await
            .wrap_err("Failed to get transceiver pauser")?
            ._0;
        Ok(Some(pauser.to_string()))
    }

    async fn set_peer(&self, chain: Chain, address: UniversalAddress) -> Result<Vec<UnsignedTransaction>> {
        let fee = self.message_fee().await?;
        debug!(chain = %self.chain, fee = %fee, "Wormhole message fee");
        let call = WormholeTransceiver::setWormholePeerCall {
            chainId: chain.wormhole_id(),
            peerContract: FixedBytes(address.0),
        };
        let mut tx = call_tx(
            self.chain,
            format!("setWormholePeer({})", chain),
            self.address,
            call,
        );
        if let crate::signer::TxPayload::Evm(request) = &mut tx.payload {
            request.value = Some(fee);
        }
        Ok(vec![tx])
    }

    async fn set_pauser(&self, pauser: &str) -> Result<Vec<UnsignedTransaction>> {
        let call = WormholeTransceiver::transferPauserCapabilityCall {
            newPauser: parse_address(pauser)?,
        };
        Ok(vec![call_tx(
            self.chain,
            "transceiver.transferPauserCapability",
            self.address,
            call,
        )])
    }

    async fn is_evm_chain(&self, chain: Chain) -> PlatformResult<bool> {
        Ok(WormholeTransceiver::new(self.address, &self.provider)
            .isWormholeEvmChain(chain.wormhole_id())
            .call()
            .await
            .wrap_err("Failed to get EVM chain flag")?
            ._0)
    }

    async fn set_is_evm_chain(&self, chain: Chain, value: bool) -> PlatformResult<Vec<UnsignedTransaction>> {
        let call = WormholeTransceiver::setIsWormholeEvmChainCall {
            chainId: chain.wormhole_id(),
            isEvm: value,
        };
        Ok(vec![call_tx(
            self.chain,
            format!("setIsWormholeEvmChain({}, {})", chain, value),
            self.address,
            call,
        )])
    }

    async fn is_wormhole_relaying_enabled(&self, chain: Chain) -> PlatformResult<bool> {
        Ok(WormholeTransceiver::new(self.address, &self.provider)
            .isWormholeRelayingEnabled(chain.wormhole_id())
            .call()
            .await
            .wrap_err("Failed to get relaying flag")?
            ._0)
    }

    async fn set_is_wormhole_relaying_enabled(
        &self,
        chain: Chain,
        value: bool,
    ) -> PlatformResult<Vec<UnsignedTransaction>> {
        let call = WormholeTransceiver::setIsWormholeRelayingEnabledCall {
            chainId: chain.wormhole_id(),
            isRelayingEnabled: value,
        };
        Ok(vec![call_tx(
            self.chain,
            format!("setIsWormholeRelayingEnabled({}, {})", chain, value),
            self.address,
            call,
        )])
    }

    async fn is_special_relaying_enabled(&self, chain: Chain) -> PlatformResult<bool> {
        Ok(WormholeTransceiver::new(self.address, &self.provider)
            .isSpecialRelayingEnabled(chain.wormhole_id())
            .call()
            .await
            .wrap_err("Failed to get special relaying flag")?
            ._0)
    }

    async fn set_is_special_relaying_enabled(
        &self,
        chain: Chain,
        value: bool,
    ) -> PlatformResult<Vec<UnsignedTransaction>> {
        let call = WormholeTransceiver::setIsSpecialRelayingEnabledCall {
            chainId: chain.wormhole_id(),
            isRelayingEnabled: value,
        };
        Ok(vec![call_tx(
            self.chain,
            format!("setIsSpecialRelayingEnabled({}, {})", chain, value),
            self.address,
            call,
        )])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::rpc::types::TransactionInput;

    fn calldata(tx: &UnsignedTransaction) -> Vec<u8> {
        match &tx.payload {
            crate::signer::TxPayload::Evm(request) => {
                let input: &TransactionInput = &request.input;
                input.input().map(|b| b.to_vec()).unwrap_or_default()
            }
            _ => panic!("expected an EVM transaction"),
        }
    }

    #[tokio::test]
    async fn test_set_peer_encodes_wormhole_id_and_address() {
        let ntt = EvmNtt::new(
            Chain::Sepolia,
            "http://localhost:8545",
            "0x70997970C51812dc3A010C7d01b50e0d17dc79C8",
        )
        .unwrap();
        let peer = UniversalAddress::from_native(
            Platform::Evm,
            "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266",
        )
        .unwrap();

        let txs = ntt
            .set_peer(&PeerRegistration {
                chain: Chain::BaseSepolia,
                address: peer,
                token_decimals: 18,
                inbound_limit: U256::from(1000),
            })
            .await
            .unwrap();

        assert_eq!(txs.len(), 1);
        let data = calldata(&txs[0]);
        let decoded = NttManager::setPeerCall::abi_decode(&data, true).unwrap();
        assert_eq!(decoded.peerChainId, 10004);
        assert_eq!(decoded.peerContract.0, peer.0);
        assert_eq!(decoded.decimals, 18);
        assert_eq!(decoded.inboundLimit, U256::from(1000));
    }

    #[tokio::test]
    async fn test_set_inbound_limit_targets_manager() {
        let manager = "0x70997970C51812dc3A010C7d01b50e0d17dc79C8";
        let ntt = EvmNtt::new(Chain::Sepolia, "http://localhost:8545", manager).unwrap();

        let txs = ntt
            .set_inbound_limit(Chain::Solana, U256::from(5))
            .await
            .unwrap();

        let data = calldata(&txs[0]);
        let decoded = NttManager::setInboundLimitCall::abi_decode(&data, true).unwrap();
        assert_eq!(decoded.chainId, 1);
        assert_eq!(decoded.limit, U256::from(5));
        match &txs[0].payload {
            crate::signer::TxPayload::Evm(request) => {
                assert_eq!(request.to, Some(parse_address(manager).unwrap().into()));
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_non_evm_chain_rejected() {
        assert!(EvmNtt::new(Chain::Solana, "http://localhost:8545", "0x00").is_err());
    }
}
