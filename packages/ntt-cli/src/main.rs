//! `ntt`: deploy and reconcile NTT deployments
//!
//! - ntt init / add-chain / clone / upgrade  -> build the manifest
//! - ntt pull / push / status               -> reconcile it with the chains
//! - ntt config                             -> per-operator RPC overrides

use clap::Parser;
use color_eyre::eyre::Result;
use ntt_cli::commands::{self, AddChainArgs, Services};
use ntt_cli::{
    AssumeYes, Cli, Commands, ConfigCommands, ConfigFile, Confirm, ForgeDeployer,
    KeySignerProvider, NoDeployer, OperatorConfig, RpcNttFactory, RpcResolver, StdinConfirm,
};
use ntt_rs::{Deployer, Network, RetryConfig};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Contracts checkout used when a command has no --ntt-dir
const NTT_DIR_ENV: &str = "NTT_DIR";

fn main() -> Result<()> {
    // Install color-eyre for better error reporting
    color_eyre::install()?;
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_logging(cli.verbose);

    let code = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?
        .block_on(run(cli))?;
    std::process::exit(code)
}

/// Initialize tracing: RUST_LOG wins, else debug with --verbose
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Live capabilities for one network
struct Runtime {
    factory: RpcNttFactory,
    signers: KeySignerProvider,
    deployer: Box<dyn Deployer>,
    confirm: Box<dyn Confirm>,
}

impl Runtime {
    fn new(network: Network, operator: &OperatorConfig, ntt_dir: Option<PathBuf>, yes: bool) -> Self {
        let rpcs = RpcResolver::new(network, operator.clone());
        let signers = KeySignerProvider::from_env(rpcs.clone());
        let ntt_dir = ntt_dir.or_else(|| std::env::var(NTT_DIR_ENV).ok().map(PathBuf::from));
        let deployer: Box<dyn Deployer> = match ntt_dir {
            Some(dir) => Box::new(ForgeDeployer::new(dir, rpcs.clone(), signers.clone())),
            None => Box::new(NoDeployer),
        };
        let confirm: Box<dyn Confirm> = if yes {
            Box::new(AssumeYes)
        } else {
            Box::new(StdinConfirm)
        };

        Self {
            factory: RpcNttFactory::new(rpcs),
            signers,
            deployer,
            confirm,
        }
    }

    fn services(&self) -> Services<'_> {
        Services {
            factory: &self.factory,
            signers: &self.signers,
            deployer: self.deployer.as_ref(),
            confirm: self.confirm.as_ref(),
            retry: RetryConfig::default(),
        }
    }
}

fn manifest_network(path: &Path) -> Result<Network> {
    Ok(ntt_cli::manifest::load(path)?.network)
}

async fn run(cli: Cli) -> Result<i32> {
    let operator = OperatorConfig::load()?;
    let path = cli.path;

    match cli.command {
        Commands::Init { network } => {
            commands::init(&path, network)?;
        }

        Commands::AddChain {
            chain,
            mode,
            token,
            manager,
            ntt_dir,
            outbound_limit,
        } => {
            let runtime = Runtime::new(manifest_network(&path)?, &operator, ntt_dir, true);
            let args = AddChainArgs {
                chain,
                mode,
                token,
                manager,
                outbound_limit,
            };
            commands::add_chain(&path, &args, &runtime.services()).await?;
        }

        Commands::Clone {
            network,
            chain,
            manager,
        } => {
            let runtime = Runtime::new(network, &operator, None, true);
            commands::clone(&path, network, chain, &manager, &runtime.services()).await?;
        }

        Commands::Upgrade {
            chain,
            version,
            ntt_dir,
        } => {
            let runtime = Runtime::new(manifest_network(&path)?, &operator, ntt_dir, true);
            commands::upgrade(&path, chain, &version, &runtime.services()).await?;
        }

        Commands::Pull { yes } => {
            let runtime = Runtime::new(manifest_network(&path)?, &operator, None, yes);
            commands::pull(&path, &runtime.services()).await?;
        }

        Commands::Push { yes } => {
            let runtime = Runtime::new(manifest_network(&path)?, &operator, None, yes);
            let reports = commands::push(&path, &runtime.services()).await?;
            if reports.iter().any(|r| !r.is_success()) {
                return Ok(1);
            }
        }

        Commands::Status => {
            let runtime = Runtime::new(manifest_network(&path)?, &operator, None, true);
            let report = commands::status(&path, &runtime.services()).await?;
            if !report.is_clean() {
                return Ok(1);
            }
        }

        Commands::Config { command } => {
            let file = ConfigFile::new(OperatorConfig::default_path());
            match command {
                ConfigCommands::SetChain { chain, key, value } => {
                    commands::set_chain(&file, chain, &key, &value)?;
                }
                ConfigCommands::UnsetChain { chain, key } => {
                    commands::unset_chain(&file, chain, &key)?;
                }
                ConfigCommands::GetChain { chain, key } => {
                    if commands::get_chain(&file, chain, &key)?.is_none() {
                        return Ok(1);
                    }
                }
            }
        }
    }

    Ok(0)
}
