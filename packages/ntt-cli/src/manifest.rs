//! Deployment manifest file (`deployment.json`)

use eyre::{eyre, Result, WrapErr};
use ntt_rs::{Deployment, Network};
use std::io::Write;
use std::path::Path;
use tracing::debug;

/// Default manifest location
pub const DEFAULT_MANIFEST: &str = "deployment.json";

/// Read and parse the manifest
pub fn load(path: &Path) -> Result<Deployment> {
    let content = std::fs::read_to_string(path).wrap_err_with(|| {
        format!(
            "Failed to read {} (run `ntt init <network>` to create one)",
            path.display()
        )
    })?;
    let deployment: Deployment = serde_json::from_str(&content)
        .wrap_err_with(|| format!("Failed to parse {}", path.display()))?;
    debug!(path = %path.display(), chains = deployment.chains.len(), "Manifest loaded");
    Ok(deployment)
}

/// Serialize and atomically replace the manifest
pub fn save(path: &Path, deployment: &Deployment) -> Result<()> {
    let mut content = serde_json::to_string_pretty(deployment)?;
    content.push('\n');
    write_atomic(path, content.as_bytes())?;
    debug!(path = %path.display(), "Manifest saved");
    Ok(())
}

/// Create a new empty manifest, refusing to overwrite an existing one
pub fn create(path: &Path, network: Network) -> Result<Deployment> {
    if path.exists() {
        return Err(eyre!("{} already exists", path.display()));
    }
    let deployment = Deployment::new(network);
    save(path, &deployment)?;
    Ok(deployment)
}

/// Write to a sibling temp file then rename over `path`
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let file_name = path
        .file_name()
        .ok_or_else(|| eyre!("Invalid path: {}", path.display()))?
        .to_string_lossy();
    let tmp = path.with_file_name(format!(".{}.tmp", file_name));

    {
        let mut file = std::fs::File::create(&tmp)
            .wrap_err_with(|| format!("Failed to create {}", tmp.display()))?;
        file.write_all(bytes)?;
        file.sync_all()?;
    }
    std::fs::rename(&tmp, path)
        .wrap_err_with(|| format!("Failed to replace {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ntt_rs::{Chain, ChainConfig, Mode};
    use std::path::PathBuf;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("ntt-manifest-{}-{}", name, std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_create_refuses_overwrite() {
        let path = temp_dir("create").join("deployment.json");
        std::fs::remove_file(&path).ok();

        create(&path, Network::Testnet).unwrap();
        let err = create(&path, Network::Mainnet).unwrap_err();
        assert!(err.to_string().contains("already exists"));
        assert_eq!(load(&path).unwrap().network, Network::Testnet);
    }

    #[test]
    fn test_save_leaves_no_temp_file() {
        let dir = temp_dir("atomic");
        let path = dir.join("deployment.json");

        let mut deployment = Deployment::new(Network::Testnet);
        deployment
            .insert_chain(
                Chain::Sepolia,
                ChainConfig {
                    mode: Some(Mode::Locking),
                    manager: "0x1".into(),
                    ..Default::default()
                },
            )
            .unwrap();
        save(&path, &deployment).unwrap();

        assert_eq!(load(&path).unwrap(), deployment);
        assert!(!dir.join(".deployment.json.tmp").exists());
    }

    #[test]
    fn test_load_missing_file_suggests_init() {
        let err = load(Path::new("/nonexistent/deployment.json")).unwrap_err();
        assert!(format!("{:#}", err).contains("ntt init"));
    }
}
