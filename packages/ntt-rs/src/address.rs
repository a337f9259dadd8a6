//! Universal Cross-Chain Addresses
//!
//! Peer registrations store the remote manager/transceiver as 32 bytes. This
//! module converts native address strings into that form so peers read from
//! chain can be compared with the addresses declared in the manifest.
//!
//! ## Encoding per platform
//!
//! - EVM: 20-byte address, left-padded with 12 zero bytes
//! - Solana: base58 public key (32 bytes)
//! - Sui: 32-byte hex object id
//! - Stacks: keccak-256 of the contract principal string

use serde::{Deserialize, Serialize};
use std::fmt;
use tiny_keccak::{Hasher, Keccak};

use crate::error::NttError;
use crate::types::Platform;

/// 32-byte address understood by every platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct UniversalAddress(pub [u8; 32]);

impl UniversalAddress {
    pub const ZERO: UniversalAddress = UniversalAddress([0u8; 32]);

    /// Parse a native address string for the given platform
    pub fn from_native(platform: Platform, address: &str) -> Result<Self, NttError> {
        let invalid = || NttError::InvalidAddress {
            platform,
            address: address.to_string(),
        };

        match platform {
            Platform::Evm => {
                let bytes = decode_hex(address).ok_or_else(invalid)?;
                match bytes.len() {
                    20 => {
                        let mut out = [0u8; 32];
                        out[12..].copy_from_slice(&bytes);
                        Ok(UniversalAddress(out))
                    }
                    32 if bytes[..12].iter().all(|b| *b == 0) => {
                        Ok(UniversalAddress(to_array(&bytes)))
                    }
                    _ => Err(invalid()),
                }
            }
            Platform::Solana => {
                let bytes = bs58::decode(address).into_vec().map_err(|_| invalid())?;
                if bytes.len() != 32 {
                    return Err(invalid());
                }
                Ok(UniversalAddress(to_array(&bytes)))
            }
            Platform::Sui => {
                let bytes = decode_hex(address).ok_or_else(invalid)?;
                if bytes.len() != 32 {
                    return Err(invalid());
                }
                Ok(UniversalAddress(to_array(&bytes)))
            }
            Platform::Stacks => {
                if address.is_empty() {
                    return Err(invalid());
                }
                Ok(UniversalAddress(keccak256(address.as_bytes())))
            }
        }
    }

    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        UniversalAddress(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }

    /// Hex with 0x prefix
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    /// Native string form where the encoding is reversible
    pub fn to_native(&self, platform: Platform) -> Option<String> {
        match platform {
            Platform::Evm => Some(format!("0x{}", hex::encode(&self.0[12..]))),
            Platform::Solana => Some(bs58::encode(self.0).into_string()),
            Platform::Sui => Some(self.to_hex()),
            Platform::Stacks => None,
        }
    }
}

impl fmt::Display for UniversalAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// Compare two native addresses on the same platform, ignoring case and encoding details
pub fn same_address(platform: Platform, a: &str, b: &str) -> bool {
    match (
        UniversalAddress::from_native(platform, a),
        UniversalAddress::from_native(platform, b),
    ) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

fn decode_hex(s: &str) -> Option<Vec<u8>> {
    let s = s.strip_prefix("0x").unwrap_or(s);
    hex::decode(s).ok()
}

fn to_array(bytes: &[u8]) -> [u8; 32] {
    let mut out = [0u8; 32];
    out.copy_from_slice(bytes);
    out
}

fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak::v256();
    let mut output = [0u8; 32];
    hasher.update(data);
    hasher.finalize(&mut output);
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evm_address_is_left_padded() {
        let addr = UniversalAddress::from_native(
            Platform::Evm,
            "0x70997970C51812dc3A010C7d01b50e0d17dc79C8",
        )
        .unwrap();
        assert_eq!(&addr.0[..12], &[0u8; 12]);
        assert_eq!(
            addr.to_native(Platform::Evm).unwrap(),
            "0x70997970c51812dc3a010c7d01b50e0d17dc79c8"
        );
    }

    #[test]
    fn test_evm_padded_address_accepted() {
        let padded = format!("0x{}{}", "0".repeat(24), "70997970c51812dc3a010c7d01b50e0d17dc79c8");
        let a = UniversalAddress::from_native(Platform::Evm, &padded).unwrap();
        let b = UniversalAddress::from_native(
            Platform::Evm,
            "0x70997970c51812dc3a010c7d01b50e0d17dc79c8",
        )
        .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_evm_bad_padding_rejected() {
        let bad = format!("0x01{}", "0".repeat(62));
        assert!(UniversalAddress::from_native(Platform::Evm, &bad).is_err());
        assert!(UniversalAddress::from_native(Platform::Evm, "0x1234").is_err());
    }

    #[test]
    fn test_solana_roundtrip() {
        let key = "11111111111111111111111111111111";
        let addr = UniversalAddress::from_native(Platform::Solana, key).unwrap();
        assert!(addr.is_zero());
        assert_eq!(addr.to_native(Platform::Solana).unwrap(), key);
    }

    #[test]
    fn test_stacks_is_hashed() {
        let a = UniversalAddress::from_native(Platform::Stacks, "SP000.ntt-manager").unwrap();
        let b = UniversalAddress::from_native(Platform::Stacks, "SP000.ntt-manager").unwrap();
        assert_eq!(a, b);
        assert!(a.to_native(Platform::Stacks).is_none());
    }

    #[test]
    fn test_same_address_ignores_case() {
        assert!(same_address(
            Platform::Evm,
            "0x70997970C51812dc3A010C7d01b50e0d17dc79C8",
            "0x70997970c51812dc3a010c7d01b50e0d17dc79c8"
        ));
        assert!(!same_address(
            Platform::Evm,
            "0x70997970c51812dc3a010c7d01b50e0d17dc79c8",
            "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266"
        ));
    }
}
