//! Configuration validation
//!
//! Collects every problem in the manifest instead of stopping at the first
//! one. Zero limits are legal but suspicious and reported as warnings.

use std::collections::BTreeMap;

use crate::error::NttError;
use crate::numeric::{check_number_formatting, is_zero_amount};
use crate::types::{Chain, Deployment};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationReport {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn merge(&mut self, other: ValidationReport) {
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }

    /// Fail with every error if there is at least one
    pub fn into_result(self) -> Result<Vec<String>, NttError> {
        if self.errors.is_empty() {
            Ok(self.warnings)
        } else {
            Err(NttError::InvalidConfig(self.errors))
        }
    }
}

/// Checks that need no chain I/O
pub fn validate_manifest(deployment: &Deployment) -> ValidationReport {
    let mut report = ValidationReport::default();

    let locking: Vec<Chain> = deployment
        .chains
        .iter()
        .filter(|(_, c)| c.mode == Some(crate::types::Mode::Locking))
        .map(|(chain, _)| *chain)
        .collect();
    if locking.len() > 1 {
        let names: Vec<&str> = locking.iter().map(|c| c.name()).collect();
        report.errors.push(format!(
            "Only one chain can be locking, found {}",
            names.join(", ")
        ));
    }

    for (chain, config) in &deployment.chains {
        if !chain.supports_network(deployment.network) {
            report.errors.push(
                NttError::ChainNotOnNetwork {
                    chain: *chain,
                    network: deployment.network,
                }
                .to_string(),
            );
        }
        if config.manager.is_empty() {
            report
                .errors
                .push(NttError::MissingManager(*chain).to_string());
        }
        if config.mode.is_none() {
            report.errors.push(format!(
                "{}: mode is not set and no locking chain exists to infer it from",
                chain
            ));
        }
        for peer in config.limits.inbound.keys() {
            if peer == chain {
                report
                    .errors
                    .push(format!("{}: inbound limit declared for itself", chain));
            } else if !deployment.chains.contains_key(peer) {
                report.errors.push(format!(
                    "{}: inbound limit declared for {} which is not part of the deployment",
                    chain, peer
                ));
            }
        }
    }

    report
}

/// Check limit strings against each chain's token decimals
pub fn validate_limits(deployment: &Deployment, decimals: &BTreeMap<Chain, u8>) -> ValidationReport {
    let mut report = ValidationReport::default();

    for (chain, config) in &deployment.chains {
        let Some(&d) = decimals.get(chain) else {
            continue;
        };

        let outbound = &config.limits.outbound;
        if !check_number_formatting(outbound, d) {
            report.errors.push(format!(
                "{}: outbound limit \"{}\" must have exactly {} decimal places",
                chain, outbound, d
            ));
        } else if is_zero_amount(outbound) {
            report
                .warnings
                .push(format!("{}: outbound limit is zero", chain));
        }

        for (peer, limit) in &config.limits.inbound {
            if !check_number_formatting(limit, d) {
                report.errors.push(format!(
                    "{}: inbound limit from {} \"{}\" must have exactly {} decimal places",
                    chain, peer, limit, d
                ));
            } else if is_zero_amount(limit) {
                report
                    .warnings
                    .push(format!("{}: inbound limit from {} is zero", chain, peer));
            }
        }
    }

    report
}

/// Full validation: manifest checks plus limit formatting
pub fn validate_config(deployment: &Deployment, decimals: &BTreeMap<Chain, u8>) -> ValidationReport {
    let mut report = validate_manifest(deployment);
    report.merge(validate_limits(deployment, decimals));
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ChainConfig, LimitsConfig, Mode, Network};

    fn chain(mode: Mode, outbound: &str) -> ChainConfig {
        ChainConfig {
            version: "1.1.0".into(),
            mode: Some(mode),
            manager: "0x0000000000000000000000000000000000000001".into(),
            limits: LimitsConfig {
                outbound: outbound.into(),
                inbound: Default::default(),
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_wrong_decimal_count_names_chain_and_decimals() {
        let mut deployment = Deployment::new(Network::Testnet);
        deployment
            .chains
            .insert(Chain::Sepolia, chain(Mode::Locking, "100.0"));
        let decimals = BTreeMap::from([(Chain::Sepolia, 6u8)]);

        let report = validate_config(&deployment, &decimals);

        assert!(!check_number_formatting("100.0", 6));
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].contains("Sepolia"));
        assert!(report.errors[0].contains("6 decimal places"));
    }

    #[test]
    fn test_zero_limits_are_warnings() {
        let mut deployment = Deployment::new(Network::Testnet);
        let mut sepolia = chain(Mode::Locking, "0.000000");
        sepolia
            .limits
            .inbound
            .insert(Chain::BaseSepolia, "0.000000".into());
        deployment.chains.insert(Chain::Sepolia, sepolia);
        let mut base = chain(Mode::Burning, "5.000000");
        base.limits.inbound.insert(Chain::Sepolia, "1.000000".into());
        deployment.chains.insert(Chain::BaseSepolia, base);
        let decimals = BTreeMap::from([(Chain::Sepolia, 6u8), (Chain::BaseSepolia, 6u8)]);

        let report = validate_config(&deployment, &decimals);

        assert!(report.is_ok(), "{:?}", report.errors);
        assert_eq!(report.warnings.len(), 2);
    }

    #[test]
    fn test_all_problems_reported_together() {
        let mut deployment = Deployment::new(Network::Mainnet);
        let mut eth = chain(Mode::Locking, "1.0");
        eth.manager.clear();
        deployment.chains.insert(Chain::Ethereum, eth);
        deployment
            .chains
            .insert(Chain::Base, chain(Mode::Locking, "1.000000"));
        let mut arb = chain(Mode::Burning, "1.000000");
        arb.mode = None;
        arb.limits.inbound.insert(Chain::Solana, "1.000000".into());
        deployment.chains.insert(Chain::Arbitrum, arb);
        let decimals = BTreeMap::from([(Chain::Ethereum, 6u8)]);

        let report = validate_config(&deployment, &decimals);
        let err = report.into_result().unwrap_err();
        let msg = err.to_string();

        assert!(msg.contains("5 error(s)"), "{}", msg);
        assert!(msg.contains("Only one chain can be locking"));
        assert!(msg.contains("Manager address is missing for Ethereum"));
        assert!(msg.contains("Arbitrum: mode is not set"));
        assert!(msg.contains("Solana which is not part of the deployment"));
        assert!(msg.contains("Ethereum: outbound limit \"1.0\""));
    }

    #[test]
    fn test_testnet_chain_on_mainnet_is_error() {
        let mut deployment = Deployment::new(Network::Mainnet);
        deployment
            .chains
            .insert(Chain::Sepolia, chain(Mode::Locking, "1.000000"));
        let report = validate_manifest(&deployment);
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].contains("not available on Mainnet"));
    }
}
