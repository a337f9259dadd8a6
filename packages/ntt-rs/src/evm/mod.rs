//! EVM Chain Support Module
//!
//! Adapters for NTT managers deployed on EVM-compatible chains.
//!
//! ## Submodules
//!
//! - `contracts` - NttManager / WormholeTransceiver bindings using alloy sol! macro
//! - `ntt` - `Ntt` and `NttTransceiver` implementations
//! - `signer` - Private-key signer implementing `Signer`

pub mod contracts;
pub mod ntt;
pub mod signer;

// Re-export commonly used items
pub use contracts::{NttManager, WormholeTransceiver};
pub use ntt::{EvmNtt, EvmTransceiver};
pub use signer::{EvmSigner, EvmSignerConfig};
