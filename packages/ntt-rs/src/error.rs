//! Classified errors
//!
//! Most operations return `eyre::Result`. The variants here are the ones a
//! caller needs to branch on; they travel inside `eyre::Report` and are
//! recovered with `downcast_ref`.

use thiserror::Error;

use crate::types::{Chain, Network, Platform};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NttError {
    #[error("Unknown chain: {0}")]
    UnknownChain(String),

    #[error("Unknown network: {0}")]
    UnknownNetwork(String),

    #[error("Unknown mode: {0} (expected locking or burning)")]
    UnknownMode(String),

    #[error("{chain} is not available on {network}")]
    ChainNotOnNetwork { chain: Chain, network: Network },

    #[error("Only one chain can be locking: {existing} is already locking, cannot make {requested} locking")]
    MultipleLockingChains { existing: Chain, requested: Chain },

    #[error("Manager address is missing for {0}")]
    MissingManager(Chain),

    #[error("Configuration has {} error(s):\n  - {}", .0.len(), .0.join("\n  - "))]
    InvalidConfig(Vec<String>),

    #[error("Unsupported field in diff for {chain}: {path}")]
    UnsupportedField { chain: Chain, path: String },

    #[error("Signer {signer} is not the owner ({owner}) of the {chain} manager")]
    SignerNotOwner {
        chain: Chain,
        signer: String,
        owner: String,
    },

    #[error("No adapter available for {platform} chain {chain}")]
    NoAdapter { chain: Chain, platform: Platform },

    #[error("Invalid decimal amount: {0}")]
    InvalidAmount(String),

    #[error("Invalid {platform} address: {address}")]
    InvalidAddress { platform: Platform, address: String },
}

/// Failure of a platform-specific capability
#[derive(Error, Debug)]
pub enum PlatformError {
    /// The operation does not apply to this platform
    #[error("{operation} is not supported on {platform}")]
    NotSupported {
        platform: Platform,
        operation: &'static str,
    },

    /// The operation applies but failed
    #[error("{0}")]
    Failed(eyre::Report),
}

impl PlatformError {
    pub fn not_supported(platform: Platform, operation: &'static str) -> Self {
        PlatformError::NotSupported {
            platform,
            operation,
        }
    }

    pub fn is_not_supported(&self) -> bool {
        matches!(self, PlatformError::NotSupported { .. })
    }
}

impl From<eyre::Report> for PlatformError {
    fn from(report: eyre::Report) -> Self {
        PlatformError::Failed(report)
    }
}

pub type PlatformResult<T> = Result<T, PlatformError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_config_lists_every_problem() {
        let err = NttError::InvalidConfig(vec!["first".into(), "second".into()]);
        let msg = err.to_string();
        assert!(msg.contains("2 error(s)"));
        assert!(msg.contains("  - first"));
        assert!(msg.contains("  - second"));
    }

    #[test]
    fn test_report_downcast_roundtrip() {
        let report = eyre::Report::new(NttError::MissingManager(Chain::Base));
        assert_eq!(
            report.downcast_ref::<NttError>(),
            Some(&NttError::MissingManager(Chain::Base))
        );
    }

    #[test]
    fn test_platform_error_from_report() {
        let err: PlatformError = eyre::eyre!("rpc down").into();
        assert!(!err.is_not_supported());
        assert_eq!(err.to_string(), "rpc down");
        assert!(PlatformError::not_supported(Platform::Sui, "pause").is_not_supported());
    }
}
