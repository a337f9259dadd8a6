//! NTT-RS: Reconciliation Engine for Native Token Transfer Deployments
//!
//! A deployment is one token bridged across many chains, each with its own
//! manager and Wormhole transceiver. This crate compares the declared
//! configuration (`deployment.json`) with what is actually on chain and
//! produces the transactions that close the gap:
//!
//! - **Types** - `Chain`, `Platform`, `Network`, `ChainConfig`, `Deployment`
//! - **Numeric** - decimal-string formatting of token amounts
//! - **Retry** - exponential backoff with jitter for flaky RPC reads
//! - **Diff** - structural diff between declared and on-chain config
//! - **Peers** - O(n²) check that every chain registers every other chain
//! - **Pull** - reading live configuration into runtime views
//! - **Push** - ordered reconciliation of declared changes
//! - **Validate** - manifest validation with every problem reported at once
//! - **EVM Module** - NttManager/WormholeTransceiver adapters and signer
//! - **Testing Module** - in-memory multi-chain world for tests
//!
//! ## Feature Flags
//!
//! - `evm` - Enable the EVM adapter (default)
//! - `testing` - Enable the mock world for downstream tests
//! - `full` - Enable all features

// Core modules (always available)
pub mod address;
pub mod deployer;
pub mod diff;
pub mod discovery;
pub mod error;
pub mod ntt;
pub mod numeric;
pub mod peers;
pub mod pull;
pub mod push;
pub mod redact;
pub mod retry;
pub mod signer;
pub mod status;
pub mod types;
pub mod validate;

// Chain-specific modules (feature-gated)
#[cfg(feature = "evm")]
pub mod evm;

// Testing utilities (feature-gated)
#[cfg(any(test, feature = "testing"))]
pub mod testing;

// Re-export commonly used items at the crate root
pub use address::{same_address, UniversalAddress};
pub use deployer::{DeployRequest, DeployedContracts, Deployer};
pub use diff::{diff_objects, diff_values, DiffNode, DiffTree};
pub use discovery::{discover_deployment, discover_peers, DiscoveredDeployment, DiscoveredPeer};
pub use error::{NttError, PlatformError, PlatformResult};
pub use ntt::{Ntt, NttFactory, NttTransceiver, Peer, PeerRegistration};
pub use numeric::{check_number_formatting, format_number, parse_decimal_string};
pub use peers::{check_deployment, MissingImplicitConfig};
pub use pull::{pull_chain, pull_deployments, ChainDeployment};
pub use push::{plan_field_updates, push_deployment, FieldUpdate, PushContext, PushReport};
pub use retry::{retry_with_exponential_backoff, RetryConfig};
pub use signer::{Signer, SignerProvider, UnsignedTransaction};
pub use status::{compute_status, StatusReport};
pub use types::{Chain, ChainConfig, Deployment, Mode, Network, Platform};
pub use validate::{validate_config, validate_manifest, ValidationReport};
