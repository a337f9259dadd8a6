//! NTT operator CLI
//!
//! Thin I/O around the `ntt_rs` reconciliation engine: argument parsing,
//! the deployment manifest, per-operator RPC overrides, live adapters,
//! forge-based deployment, colorized output and prompts.

pub mod cli;
pub mod commands;
pub mod config;
pub mod display;
pub mod factory;
pub mod forge;
pub mod manifest;
pub mod rpc;

pub use crate::cli::{Cli, Commands, ConfigCommands};
pub use crate::commands::Services;
pub use crate::config::{ConfigFile, OperatorConfig};
pub use crate::display::{AssumeYes, Confirm, StdinConfirm};
pub use crate::factory::{KeySignerProvider, RpcNttFactory};
pub use crate::forge::{ForgeDeployer, NoDeployer};
pub use crate::rpc::RpcResolver;
