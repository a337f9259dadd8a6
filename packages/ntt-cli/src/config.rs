//! Operator override file
//!
//! Per-operator settings that do not belong in the shared deployment
//! manifest, currently only RPC endpoints. Loaded once at startup from
//! `$NTT_CONFIG` (or `~/.ntt.json`) layered with `NTT_CHAINS__<Chain>__RPC`
//! environment variables.

use eyre::{eyre, Result, WrapErr};
use ntt_rs::Chain;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::manifest::write_atomic;

/// Keys that can be set per chain
pub const CHAIN_KEYS: &[&str] = &["rpc"];

/// Overrides for a single chain
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rpc: Option<String>,
}

/// Operator configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatorConfig {
    /// Keyed by chain name. Lookups are case-insensitive since environment
    /// variable keys arrive lowercased.
    #[serde(default)]
    pub chains: BTreeMap<String, ChainOverrides>,
}

impl OperatorConfig {
    /// Location of the override file
    pub fn default_path() -> PathBuf {
        if let Ok(path) = env::var("NTT_CONFIG") {
            return PathBuf::from(path);
        }
        let home = env::var("HOME").unwrap_or_else(|_| ".".to_string());
        Path::new(&home).join(".ntt.json")
    }

    /// Load from the default path and the environment
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::default_path())
    }

    /// Load from `path` (optional) layered with the environment
    pub fn load_from(path: &Path) -> Result<Self> {
        let settings = ::config::Config::builder()
            .add_source(
                ::config::File::from(path)
                    .format(::config::FileFormat::Json)
                    .required(false),
            )
            .add_source(
                ::config::Environment::with_prefix("NTT")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .wrap_err_with(|| format!("Failed to load operator config from {}", path.display()))?;

        let config: OperatorConfig = settings
            .try_deserialize()
            .wrap_err("Invalid operator config")?;

        debug!(path = %path.display(), chains = config.chains.len(), "Operator config loaded");
        Ok(config)
    }

    pub fn chain(&self, chain: Chain) -> Option<&ChainOverrides> {
        self.chains
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(chain.name()))
            .map(|(_, overrides)| overrides)
    }

    /// RPC override for a chain
    pub fn rpc_for(&self, chain: Chain) -> Option<&str> {
        self.chain(chain).and_then(|c| c.rpc.as_deref())
    }
}

/// Editable view of the override file, without environment layering
#[derive(Debug, Clone)]
pub struct ConfigFile {
    path: PathBuf,
}

impl ConfigFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<OperatorConfig> {
        if !self.path.exists() {
            return Ok(OperatorConfig::default());
        }
        let content = std::fs::read_to_string(&self.path)
            .wrap_err_with(|| format!("Failed to read {}", self.path.display()))?;
        serde_json::from_str(&content)
            .wrap_err_with(|| format!("Failed to parse {}", self.path.display()))
    }

    fn write(&self, config: &OperatorConfig) -> Result<()> {
        let mut content = serde_json::to_string_pretty(config)?;
        content.push('\n');
        write_atomic(&self.path, content.as_bytes())
    }

    /// `ntt config set-chain <chain> <key> <value>`
    pub fn set_chain(&self, chain: Chain, key: &str, value: &str) -> Result<()> {
        check_key(key)?;
        let mut config = self.read()?;
        config.chains.retain(|name, _| !name.eq_ignore_ascii_case(chain.name()));
        let entry = config.chains.entry(chain.name().to_string()).or_default();
        entry.rpc = Some(value.to_string());
        self.write(&config)
    }

    /// `ntt config unset-chain <chain> <key>`. Returns whether anything was removed.
    pub fn unset_chain(&self, chain: Chain, key: &str) -> Result<bool> {
        check_key(key)?;
        let mut config = self.read()?;
        let Some(name) = config
            .chains
            .keys()
            .find(|name| name.eq_ignore_ascii_case(chain.name()))
            .cloned()
        else {
            return Ok(false);
        };

        let removed = config
            .chains
            .get_mut(&name)
            .and_then(|c| c.rpc.take())
            .is_some();
        if config.chains.get(&name) == Some(&ChainOverrides::default()) {
            config.chains.remove(&name);
        }
        if removed {
            self.write(&config)?;
        }
        Ok(removed)
    }

    /// `ntt config get-chain <chain> <key>`
    pub fn get_chain(&self, chain: Chain, key: &str) -> Result<Option<String>> {
        check_key(key)?;
        Ok(self.read()?.rpc_for(chain).map(str::to_string))
    }
}

fn check_key(key: &str) -> Result<()> {
    if CHAIN_KEYS.contains(&key) {
        Ok(())
    } else {
        Err(eyre!(
            "Unknown chain setting '{}' (expected one of: {})",
            key,
            CHAIN_KEYS.join(", ")
        ))
    }
}
