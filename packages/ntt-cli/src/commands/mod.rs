//! Command implementations
//!
//! Each command takes the manifest path and the capabilities it needs, so
//! the same code runs against live chains and the in-memory test world.

pub mod config;
pub mod deploy;
pub mod sync;

use ntt_rs::{Deployer, NttFactory, RetryConfig, SignerProvider};

use crate::display::Confirm;

pub use self::config::{get_chain, set_chain, unset_chain};
pub use deploy::{add_chain, clone, init, upgrade, AddChainArgs};
pub use sync::{pull, push, status, PullOutcome};

/// Capabilities shared by the commands
pub struct Services<'a> {
    pub factory: &'a dyn NttFactory,
    pub signers: &'a dyn SignerProvider,
    pub deployer: &'a dyn Deployer,
    pub confirm: &'a dyn Confirm,
    pub retry: RetryConfig,
}
