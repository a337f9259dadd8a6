//! Testing Utilities Module
//!
//! An in-memory multi-chain world for exercising the reconciliation engine
//! without RPC endpoints.
//!
//! ## Submodules
//!
//! - `network` - `MockNetwork`: shared per-chain state, also the adapter factory
//! - `adapter` - `MockNtt` and `MockTransceiver` reading and writing that state
//! - `signer` - `MockSigner`, `MockSignerProvider` and `MockDeployer`
//!
//! Adapter writes produce [`MockCall`]s serialized into raw transactions.
//! Nothing changes until a `MockSigner` submits them, so a chain re-pulled
//! after a push observes exactly what was sent.

pub mod adapter;
pub mod network;
pub mod signer;

pub use adapter::*;
pub use network::*;
pub use signer::*;
