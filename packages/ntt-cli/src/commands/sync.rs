//! `ntt pull`, `ntt push` and `ntt status`

use eyre::Result;
use ntt_rs::pull::apply_remote;
use ntt_rs::validate::validate_limits;
use ntt_rs::{
    check_deployment, compute_status, pull_deployments, push_deployment, validate_manifest,
    Chain, ChainDeployment, Deployment, PushContext, PushReport, StatusReport,
};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;

use super::Services;
use crate::display::{print_warnings, render_diff, render_missing, render_push_report};
use crate::manifest;

/// What `ntt pull` did to the manifest
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PullOutcome {
    UpToDate,
    Updated,
    Declined,
}

fn load_with_modes(path: &Path) -> Result<Deployment> {
    let mut deployment = manifest::load(path)?;
    let assigned = deployment.infer_missing_modes();
    if !assigned.is_empty() {
        info!(chains = ?assigned, "Inferred burning mode");
    }
    Ok(deployment)
}

fn print_diffs(deps: &[ChainDeployment]) -> Result<bool> {
    let mut any = false;
    for dep in deps {
        let diff = dep.diff()?;
        if !diff.is_empty() {
            any = true;
            print!("{}", render_diff(dep.chain, &diff));
        }
    }
    Ok(any)
}

/// Like [`print_diffs`], limited to chains with declared values to send
fn print_push_diffs(deps: &[ChainDeployment]) -> Result<bool> {
    let mut any = false;
    for dep in deps {
        let diff = dep.diff()?;
        if diff.has_push() {
            any = true;
            print!("{}", render_diff(dep.chain, &diff));
        }
    }
    Ok(any)
}

/// `ntt pull`: overwrite the manifest with on-chain state
pub async fn pull(path: &Path, services: &Services<'_>) -> Result<PullOutcome> {
    let mut deployment = load_with_modes(path)?;
    let deps = pull_deployments(&deployment, services.factory, &services.retry).await?;

    if !print_diffs(&deps)? {
        println!("Local configuration is up to date");
        return Ok(PullOutcome::UpToDate);
    }
    if !services.confirm.confirm("Update local configuration?")? {
        println!("Aborted");
        return Ok(PullOutcome::Declined);
    }

    apply_remote(&mut deployment, &deps);
    manifest::save(path, &deployment)?;
    println!("Updated {}", path.display());
    Ok(PullOutcome::Updated)
}

/// `ntt push`: reconcile every chain with the manifest
pub async fn push(path: &Path, services: &Services<'_>) -> Result<Vec<PushReport>> {
    let deployment = load_with_modes(path)?;
    print_warnings(&validate_manifest(&deployment).into_result()?);

    let mut deps = pull_deployments(&deployment, services.factory, &services.retry).await?;
    let decimals: BTreeMap<Chain, u8> = deps.iter().map(|d| (d.chain, d.decimals)).collect();
    print_warnings(&validate_limits(&deployment, &decimals).into_result()?);

    let missing = check_deployment(&deps, &services.retry).await;
    let has_diff = print_push_diffs(&deps)?;
    let mut has_missing = false;
    for (chain, chain_missing) in &missing {
        eprint!("{}", render_missing(*chain, chain_missing));
        has_missing |= !chain_missing.is_empty();
    }

    if !has_diff && !has_missing {
        println!("Nothing to push");
        manifest::save(path, &deployment)?;
        return Ok(Vec::new());
    }
    if !services.confirm.confirm("Push these changes?")? {
        println!("Aborted");
        return Ok(Vec::new());
    }

    let ctx = PushContext {
        signers: services.signers,
        deployer: services.deployer,
        retry: &services.retry,
    };
    let reports = push_deployment(&mut deps, &missing, &ctx).await;
    for report in &reports {
        print!("{}", render_push_report(report));
    }
    manifest::save(path, &deployment)?;
    Ok(reports)
}

/// `ntt status`: report drift and missing registrations without changing anything
pub async fn status(path: &Path, services: &Services<'_>) -> Result<StatusReport> {
    let deployment = load_with_modes(path)?;
    let deps = pull_deployments(&deployment, services.factory, &services.retry).await?;
    let report = compute_status(&deps, &services.retry).await?;

    for chain in &report.chains {
        if !chain.diff.is_empty() {
            print!("{}", render_diff(chain.chain, &chain.diff));
        }
        eprint!("{}", render_missing(chain.chain, &chain.missing));
    }
    if report.is_clean() {
        println!("Deployment is in sync");
    }
    Ok(report)
}
