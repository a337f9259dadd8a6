//! EVM NTT contract ABI definitions
//!
//! Uses alloy's sol! macro to generate type-safe bindings for the manager,
//! its Wormhole transceiver and the Wormhole core contract.
//!
//! Rate limits are stored on chain as `TrimmedAmount` (`uint72`): the
//! amount in the upper 64 bits and its decimals in the lowest 8 bits.

#![allow(clippy::too_many_arguments)]

use alloy::primitives::{aliases::U72, U256};
use alloy::sol;

use crate::numeric::scale_amount;

sol! {
    /// NttManager interface (admin and read surface only)
    #[sol(rpc)]
    contract NttManager {
        struct NttManagerPeer {
            bytes32 peerAddress;
            uint8 tokenDecimals;
        }

        struct RateLimitParams {
            uint72 limit;
            uint72 currentCapacity;
            uint64 lastTxTimestamp;
        }

        // ========================================================================
        // Queries
        // ========================================================================

        function NTT_MANAGER_VERSION() external view returns (string memory);
        function getMode() external view returns (uint8);
        function isPaused() external view returns (bool);
        function owner() external view returns (address);
        function pauser() external view returns (address);
        function token() external view returns (address);
        function tokenDecimals() external view returns (uint8);
        function getThreshold() external view returns (uint8);
        function getTransceivers() external view returns (address[] memory result);
        function getPeer(uint16 chainId_) external view returns (NttManagerPeer memory);
        function getOutboundLimitParams() external view returns (RateLimitParams memory);
        function getInboundLimitParams(uint16 chainId_) external view returns (RateLimitParams memory);

        // ========================================================================
        // Admin
        // ========================================================================

        function setPeer(uint16 peerChainId, bytes32 peerContract, uint8 decimals, uint256 inboundLimit) external;
        function setOutboundLimit(uint256 limit) external;
        function setInboundLimit(uint256 limit, uint16 chainId) external;
        function transferOwnership(address newOwner) external;
        function transferPauserCapability(address newPauser) external;
        function pause() external;
        function unpause() external;
    }
}

sol! {
    /// WormholeTransceiver interface
    #[sol(rpc)]
    contract WormholeTransceiver {
        function wormhole() external view returns (address);
        function pauser() external view returns (address);
        function getWormholePeer(uint16 chainId) external view returns (bytes32);
        function isWormholeEvmChain(uint16 chainId) external view returns (bool);
        function isWormholeRelayingEnabled(uint16 chainId) external view returns (bool);
        function isSpecialRelayingEnabled(uint16 chainId) external view returns (bool);

        function setWormholePeer(uint16 chainId, bytes32 peerContract) external payable;
        function setIsWormholeEvmChain(uint16 chainId, bool isEvm) external;
        function setIsWormholeRelayingEnabled(uint16 chainId, bool isRelayingEnabled) external;
        function setIsSpecialRelayingEnabled(uint16 chainId, bool isRelayingEnabled) external;
        function transferPauserCapability(address newPauser) external;
    }
}

sol! {
    /// Wormhole core contract (fee lookup only)
    #[sol(rpc)]
    contract IWormhole {
        function messageFee() external view returns (uint256);
    }
}

/// On-chain mode encoding
pub const MODE_LOCKING: u8 = 0;
pub const MODE_BURNING: u8 = 1;

/// Split a `TrimmedAmount` into (amount, decimals)
pub fn decode_trimmed(trimmed: U72) -> (U256, u8) {
    let raw: u128 = trimmed.to();
    let decimals = (raw & 0xff) as u8;
    let amount = raw >> 8;
    (U256::from(amount), decimals)
}

/// Convert a `TrimmedAmount` back to the token's full precision
pub fn untrim(trimmed: U72, token_decimals: u8) -> U256 {
    let (amount, decimals) = decode_trimmed(trimmed);
    scale_amount(amount, decimals, token_decimals)
}
