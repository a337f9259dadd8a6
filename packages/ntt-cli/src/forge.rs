//! Contract deployment through `forge script`
//!
//! Runs the deployment scripts of a checked-out native-token-transfers
//! EVM project. The scripts log the deployed addresses as
//! `NttManager: 0x...` and `WormholeTransceiver: 0x...` lines.

use alloy::primitives::Address;
use async_trait::async_trait;
use eyre::{eyre, Result, WrapErr};
use ntt_rs::{Chain, DeployRequest, DeployedContracts, Deployer, Mode};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::factory::KeySignerProvider;
use crate::rpc::RpcResolver;

const DEPLOY_SCRIPT: &str = "script/DeployWormholeNtt.s.sol";
const UPGRADE_SCRIPT: &str = "script/UpgradeNttManager.s.sol";

/// Output of a forge run
#[derive(Debug)]
pub struct ForgeScriptResult {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

/// Run a forge script with `env` and capture its output
pub fn run_forge_script(
    project_dir: &Path,
    script_path: &str,
    rpc_url: &str,
    private_key: &str,
    env: &[(&str, String)],
) -> Result<ForgeScriptResult> {
    info!(script = %script_path, dir = %project_dir.display(), "Running forge script");

    let output = std::process::Command::new("forge")
        .env("FOUNDRY_DISABLE_NIGHTLY_WARNING", "1")
        .envs(env.iter().map(|(k, v)| (*k, v.as_str())))
        .current_dir(project_dir)
        .arg("script")
        .arg(script_path)
        .arg("--rpc-url")
        .arg(rpc_url)
        .arg("--private-key")
        .arg(private_key)
        .arg("--broadcast")
        .arg("--slow")
        .output()
        .wrap_err("Failed to run forge (is foundry installed?)")?;

    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
    let success = output.status.success();

    if !success {
        warn!(stderr = %stderr, "Forge script failed");
    }

    Ok(ForgeScriptResult {
        success,
        stdout,
        stderr,
    })
}

/// Find `<label>: 0x...` in script output
pub fn find_logged_address(stdout: &str, label: &str) -> Result<Address> {
    let prefix = format!("{}:", label);
    stdout
        .lines()
        .map(str::trim)
        .find_map(|line| line.strip_prefix(prefix.as_str()))
        .ok_or_else(|| eyre!("Could not find {} address in forge output", label))?
        .trim()
        .parse::<Address>()
        .map_err(|e| eyre!("Invalid {} address in forge output: {}", label, e))
}

fn mode_arg(mode: Mode) -> &'static str {
    match mode {
        Mode::Locking => "0",
        Mode::Burning => "1",
    }
}

/// Deployer backed by a local checkout of the EVM contracts
#[derive(Debug, Clone)]
pub struct ForgeDeployer {
    project_dir: PathBuf,
    rpcs: RpcResolver,
    signers: KeySignerProvider,
}

impl ForgeDeployer {
    /// `ntt_dir` is the repository root; scripts live under `evm/`
    pub fn new(ntt_dir: impl AsRef<Path>, rpcs: RpcResolver, signers: KeySignerProvider) -> Self {
        Self {
            project_dir: ntt_dir.as_ref().join("evm"),
            rpcs,
            signers,
        }
    }

    fn check_project(&self) -> Result<()> {
        if self.project_dir.join("foundry.toml").exists() {
            Ok(())
        } else {
            Err(eyre!(
                "No foundry project at {} (pass --ntt-dir pointing to a native-token-transfers checkout)",
                self.project_dir.display()
            ))
        }
    }
}

#[async_trait]
impl Deployer for ForgeDeployer {
    async fn deploy(&self, request: &DeployRequest) -> Result<DeployedContracts> {
        self.check_project()?;
        let rpc_url = self.rpcs.rpc_url(request.chain)?;
        let env = [
            ("RELEASE_TOKEN_ADDRESS", request.token.clone()),
            ("RELEASE_MODE", mode_arg(request.mode).to_string()),
            ("RELEASE_OUTBOUND_LIMIT", request.outbound_limit.to_string()),
            ("RELEASE_WORMHOLE_CHAIN_ID", request.chain.wormhole_id().to_string()),
        ];

        let result = run_forge_script(
            &self.project_dir,
            DEPLOY_SCRIPT,
            &rpc_url,
            self.signers.private_key()?,
            &env,
        )?;
        if !result.success {
            return Err(eyre!(
                "Deployment to {} failed: {}",
                request.chain,
                result.stderr.trim()
            ));
        }

        let manager = find_logged_address(&result.stdout, "NttManager")?;
        let transceiver = find_logged_address(&result.stdout, "WormholeTransceiver")?;
        info!(chain = %request.chain, manager = %manager, transceiver = %transceiver, "Deployed");

        Ok(DeployedContracts {
            manager: manager.to_string(),
            transceiver: transceiver.to_string(),
        })
    }

    async fn upgrade(&self, chain: Chain, manager: &str, version: &str) -> Result<()> {
        self.check_project()?;
        let rpc_url = self.rpcs.rpc_url(chain)?;
        let env = [("MANAGER_ADDRESS", manager.to_string())];

        info!(chain = %chain, manager = %manager, version = %version, "Upgrading manager");
        let result = run_forge_script(
            &self.project_dir,
            UPGRADE_SCRIPT,
            &rpc_url,
            self.signers.private_key()?,
            &env,
        )?;
        if !result.success {
            return Err(eyre!(
                "Upgrade of {} to {} failed: {}",
                chain,
                version,
                result.stderr.trim()
            ));
        }
        Ok(())
    }
}

/// Deployer used when no contracts checkout was given
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDeployer;

#[async_trait]
impl Deployer for NoDeployer {
    async fn deploy(&self, request: &DeployRequest) -> Result<DeployedContracts> {
        Err(eyre!(
            "Deploying to {} needs --ntt-dir (or pass --manager for an existing deployment)",
            request.chain
        ))
    }

    async fn upgrade(&self, chain: Chain, _manager: &str, version: &str) -> Result<()> {
        Err(eyre!(
            "Upgrading {} to {} needs --ntt-dir pointing to that release",
            chain,
            version
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCRIPT_OUTPUT: &str = "\
Script ran successfully.
== Logs ==
  NttManager: 0x5FbDB2315678afecb367f032d93F642f64180aa3
  WormholeTransceiver: 0xe7f1725E7734CE288F8367e1Bb143E90bb3F0512
";

    #[test]
    fn test_find_logged_addresses() {
        assert_eq!(
            find_logged_address(SCRIPT_OUTPUT, "NttManager").unwrap(),
            "0x5FbDB2315678afecb367f032d93F642f64180aa3"
                .parse::<Address>()
                .unwrap()
        );
        assert!(find_logged_address(SCRIPT_OUTPUT, "WormholeTransceiver").is_ok());
        assert!(find_logged_address(SCRIPT_OUTPUT, "Token").is_err());
    }

    #[test]
    fn test_no_deployer_explains_flag() {
        let request = DeployRequest {
            chain: Chain::Sepolia,
            mode: Mode::Burning,
            token: "0x1".into(),
            outbound_limit: Default::default(),
        };
        let err = tokio_test::block_on(NoDeployer.deploy(&request)).unwrap_err();
        assert!(err.to_string().contains("--ntt-dir"));
    }
}
