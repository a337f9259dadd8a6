//! Command-line arguments

use clap::{Parser, Subcommand};
use ntt_rs::{Chain, Mode, Network};
use std::path::PathBuf;

use crate::manifest::DEFAULT_MANIFEST;

#[derive(Parser, Debug)]
#[command(name = "ntt")]
#[command(about = "Deploy and reconcile Native Token Transfer deployments", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to the deployment manifest
    #[arg(long, global = true, default_value = DEFAULT_MANIFEST)]
    pub path: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create an empty deployment manifest
    Init {
        network: Network,
    },

    /// Add a chain, deploying a new manager unless --manager is given
    AddChain {
        chain: Chain,

        #[arg(long)]
        mode: Mode,

        /// Token address on the chain
        #[arg(long)]
        token: String,

        /// Existing manager to register instead of deploying
        #[arg(long)]
        manager: Option<String>,

        /// native-token-transfers checkout used for deployment
        #[arg(long)]
        ntt_dir: Option<PathBuf>,

        /// Initial outbound limit in raw token units
        #[arg(long)]
        outbound_limit: Option<String>,
    },

    /// Build a manifest from a live manager and its peers
    Clone {
        network: Network,
        chain: Chain,
        manager: String,
    },

    /// Upgrade a chain's manager
    Upgrade {
        chain: Chain,

        /// Version to upgrade to
        #[arg(long = "ver")]
        version: String,

        /// native-token-transfers checkout of that version
        #[arg(long)]
        ntt_dir: Option<PathBuf>,
    },

    /// Update the manifest from on-chain state
    Pull {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },

    /// Update on-chain state from the manifest
    Push {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },

    /// Show drift between the manifest and the chains (exit code 1 if any)
    Status,

    /// Edit per-operator settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Set a chain setting, e.g. `set-chain Sepolia rpc <url>`
    SetChain {
        chain: Chain,
        key: String,
        value: String,
    },

    /// Remove a chain setting
    UnsetChain {
        chain: Chain,
        key: String,
    },

    /// Print a chain setting
    GetChain {
        chain: Chain,
        key: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_add_chain() {
        let cli = Cli::try_parse_from([
            "ntt",
            "add-chain",
            "sepolia",
            "--mode",
            "locking",
            "--token",
            "0x1",
            "--path",
            "other.json",
        ])
        .unwrap();
        assert_eq!(cli.path, PathBuf::from("other.json"));
        match cli.command {
            Commands::AddChain {
                chain,
                mode,
                manager,
                ..
            } => {
                assert_eq!(chain, Chain::Sepolia);
                assert_eq!(mode, Mode::Locking);
                assert!(manager.is_none());
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_global_flags_and_defaults() {
        let cli = Cli::try_parse_from(["ntt", "push", "--yes", "--verbose"]).unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.path, PathBuf::from(DEFAULT_MANIFEST));
        assert!(matches!(cli.command, Commands::Push { yes: true }));
    }

    #[test]
    fn test_parse_upgrade_version_flag() {
        let cli = Cli::try_parse_from(["ntt", "upgrade", "Base", "--ver", "2.0.0"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Upgrade { chain: Chain::Base, ref version, .. } if version == "2.0.0"
        ));
    }

    #[test]
    fn test_unknown_chain_rejected() {
        assert!(Cli::try_parse_from(["ntt", "clone", "Mainnet", "Narnia", "0x1"]).is_err());
    }

    #[test]
    fn test_parse_config_commands() {
        let cli = Cli::try_parse_from(["ntt", "config", "set-chain", "Sepolia", "rpc", "http://x"])
            .unwrap();
        assert!(matches!(
            cli.command,
            Commands::Config {
                command: ConfigCommands::SetChain { chain: Chain::Sepolia, .. }
            }
        ));
    }
}
