//! Command flows against the in-memory chain world

use eyre::Result;
use ntt_cli::commands::{self, AddChainArgs, PullOutcome, Services};
use ntt_cli::{manifest, AssumeYes, Confirm};
use ntt_rs::testing::{MockDeployer, MockNetwork, MockSignerProvider};
use ntt_rs::{Chain, Mode, Network, NttError, RetryConfig};
use std::path::PathBuf;
use std::time::Duration;

/// Answers no to every prompt
struct Decline;

impl Confirm for Decline {
    fn confirm(&self, _question: &str) -> Result<bool> {
        Ok(false)
    }
}

struct World {
    network: MockNetwork,
    signers: MockSignerProvider,
    deployer: MockDeployer,
}

impl World {
    fn new(chains: &[(Chain, Mode, u8)]) -> Self {
        let network = MockNetwork::new(Network::Testnet);
        for (chain, mode, decimals) in chains {
            network.add_chain(*chain, *mode, *decimals);
        }
        Self {
            signers: MockSignerProvider::owner(network.clone()),
            deployer: MockDeployer::new(network.clone()),
            network,
        }
    }

    fn services<'a>(&'a self, confirm: &'a dyn Confirm) -> Services<'a> {
        Services {
            factory: &self.network,
            signers: &self.signers,
            deployer: &self.deployer,
            confirm,
            retry: RetryConfig::new(0, Duration::ZERO),
        }
    }
}

fn manifest_path(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("ntt-cli-{}-{}", name, std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("deployment.json");
    std::fs::remove_file(&path).ok();
    path
}

#[tokio::test]
async fn test_add_chain_registers_existing_manager() {
    let world = World::new(&[(Chain::Sepolia, Mode::Locking, 18)]);
    let path = manifest_path("add-existing");
    commands::init(&path, Network::Testnet).unwrap();

    let state = world.network.state(Chain::Sepolia).unwrap();
    let args = AddChainArgs {
        chain: Chain::Sepolia,
        mode: Mode::Locking,
        token: state.token.clone(),
        manager: Some(state.manager.clone()),
        outbound_limit: None,
    };
    commands::add_chain(&path, &args, &world.services(&AssumeYes))
        .await
        .unwrap();

    let deployment = manifest::load(&path).unwrap();
    let config = &deployment.chains[&Chain::Sepolia];
    assert_eq!(config.mode, Some(Mode::Locking));
    assert_eq!(config.limits.outbound, "0.000000000000000000");
    assert_eq!(config.owner, Some(state.owner));
}

#[tokio::test]
async fn test_add_chain_deploys_new_manager() {
    let world = World::new(&[(Chain::Sepolia, Mode::Locking, 18)]);
    let path = manifest_path("add-deploy");
    manifest::save(&path, &world.network.deployment()).unwrap();

    let args = AddChainArgs {
        chain: Chain::BaseSepolia,
        mode: Mode::Burning,
        token: ntt_rs::testing::mock_address(Chain::BaseSepolia, 3),
        manager: None,
        outbound_limit: Some("1000000".into()),
    };
    commands::add_chain(&path, &args, &world.services(&AssumeYes))
        .await
        .unwrap();

    let deployment = manifest::load(&path).unwrap();
    let base = &deployment.chains[&Chain::BaseSepolia];
    assert_eq!(base.mode, Some(Mode::Burning));
    assert_eq!(base.limits.outbound, "0.000000000001000000");
    assert_eq!(
        base.limits.inbound.get(&Chain::Sepolia).map(String::as_str),
        Some("0.000000000000000000")
    );
}

#[tokio::test]
async fn test_add_chain_rejects_second_locking_chain_before_deploying() {
    let world = World::new(&[(Chain::Sepolia, Mode::Locking, 18)]);
    let path = manifest_path("add-locking");
    manifest::save(&path, &world.network.deployment()).unwrap();

    let args = AddChainArgs {
        chain: Chain::BaseSepolia,
        mode: Mode::Locking,
        token: "0x0000000000000000000000000000000000000001".into(),
        manager: None,
        outbound_limit: None,
    };
    let err = commands::add_chain(&path, &args, &world.services(&AssumeYes))
        .await
        .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<NttError>(),
        Some(NttError::MultipleLockingChains {
            existing: Chain::Sepolia,
            requested: Chain::BaseSepolia
        })
    ));
    assert!(world.network.state(Chain::BaseSepolia).is_none());
}

#[tokio::test]
async fn test_clone_builds_manifest_from_peers() {
    let world = World::new(&[
        (Chain::Sepolia, Mode::Locking, 18),
        (Chain::BaseSepolia, Mode::Burning, 6),
    ]);
    world.network.register_all_peers();
    let path = manifest_path("clone");

    let manager = world.network.manager_address(Chain::Sepolia);
    commands::clone(
        &path,
        Network::Testnet,
        Chain::Sepolia,
        &manager,
        &world.services(&AssumeYes),
    )
    .await
    .unwrap();

    let deployment = manifest::load(&path).unwrap();
    assert_eq!(deployment, world.network.deployment());

    let err = commands::clone(
        &path,
        Network::Testnet,
        Chain::Sepolia,
        &manager,
        &world.services(&AssumeYes),
    )
    .await
    .unwrap_err();
    assert!(err.to_string().contains("already exists"));
}

#[tokio::test]
async fn test_pull_overwrites_manifest_only_when_confirmed() {
    let world = World::new(&[
        (Chain::Sepolia, Mode::Locking, 18),
        (Chain::BaseSepolia, Mode::Burning, 6),
    ]);
    world.network.register_all_peers();
    let path = manifest_path("pull");
    manifest::save(&path, &world.network.deployment()).unwrap();

    let outcome = commands::pull(&path, &world.services(&AssumeYes)).await.unwrap();
    assert_eq!(outcome, PullOutcome::UpToDate);

    world.network.update(Chain::Sepolia, |state| state.paused = true);

    let outcome = commands::pull(&path, &world.services(&Decline)).await.unwrap();
    assert_eq!(outcome, PullOutcome::Declined);
    assert_eq!(manifest::load(&path).unwrap().chains[&Chain::Sepolia].paused, Some(false));

    let outcome = commands::pull(&path, &world.services(&AssumeYes)).await.unwrap();
    assert_eq!(outcome, PullOutcome::Updated);
    assert_eq!(manifest::load(&path).unwrap().chains[&Chain::Sepolia].paused, Some(true));
}

#[tokio::test]
async fn test_status_reports_missing_peers_until_registered() {
    let world = World::new(&[
        (Chain::Sepolia, Mode::Locking, 18),
        (Chain::BaseSepolia, Mode::Burning, 6),
    ]);
    let path = manifest_path("status");
    manifest::save(&path, &world.network.deployment()).unwrap();

    let report = commands::status(&path, &world.services(&AssumeYes)).await.unwrap();
    assert!(!report.is_clean());
    let missing = report.missing();
    assert_eq!(missing[&Chain::Sepolia].manager_peers.len(), 1);
    assert_eq!(missing[&Chain::BaseSepolia].manager_peers.len(), 1);

    world.network.register_all_peers();
    let report = commands::status(&path, &world.services(&AssumeYes)).await.unwrap();
    assert!(report.is_clean(), "{:?}", report);
    assert!(world.network.submitted().is_empty());
}

#[tokio::test]
async fn test_push_fills_gaps_and_converges() {
    let world = World::new(&[
        (Chain::Sepolia, Mode::Locking, 18),
        (Chain::BaseSepolia, Mode::Burning, 6),
    ]);
    let path = manifest_path("push");
    let mut deployment = world.network.deployment();
    // Undeclared modes are inferred once a locking chain exists
    deployment.chains.get_mut(&Chain::BaseSepolia).unwrap().mode = None;
    deployment.chains.get_mut(&Chain::BaseSepolia).unwrap().limits.outbound = "25.000000".into();
    manifest::save(&path, &deployment).unwrap();

    let reports = commands::push(&path, &world.services(&AssumeYes)).await.unwrap();
    assert_eq!(reports.len(), 2);
    assert!(reports.iter().all(|r| r.is_success()), "{:?}", reports);

    let saved = manifest::load(&path).unwrap();
    assert_eq!(saved.chains[&Chain::BaseSepolia].mode, Some(Mode::Burning));
    assert_eq!(saved.chains[&Chain::BaseSepolia].limits.outbound, "25.000000");
    assert!(std::fs::read_to_string(&path)
        .unwrap()
        .contains(r#""mode": "burning""#));

    let report = commands::status(&path, &world.services(&AssumeYes)).await.unwrap();
    assert!(report.is_clean(), "{:?}", report);

    let reports = commands::push(&path, &world.services(&AssumeYes)).await.unwrap();
    assert!(reports.is_empty());
}

#[tokio::test]
async fn test_declined_push_leaves_manifest_untouched() {
    let world = World::new(&[
        (Chain::Sepolia, Mode::Locking, 18),
        (Chain::BaseSepolia, Mode::Burning, 6),
    ]);
    let path = manifest_path("push-declined");
    let mut deployment = world.network.deployment();
    deployment.chains.get_mut(&Chain::BaseSepolia).unwrap().mode = None;
    manifest::save(&path, &deployment).unwrap();
    let before = std::fs::read_to_string(&path).unwrap();

    let reports = commands::push(&path, &world.services(&Decline)).await.unwrap();
    assert!(reports.is_empty());
    assert!(world.network.submitted().is_empty());
    assert_eq!(std::fs::read_to_string(&path).unwrap(), before);
}

#[tokio::test]
async fn test_push_minimal_manifest_sends_only_declared_changes() {
    let world = World::new(&[
        (Chain::Sepolia, Mode::Locking, 18),
        (Chain::BaseSepolia, Mode::Burning, 6),
    ]);
    world.network.register_all_peers();
    world.network.update(Chain::Sepolia, |state| state.paused = true);
    let sepolia = world.network.state(Chain::Sepolia).unwrap();
    let base = world.network.state(Chain::BaseSepolia).unwrap();

    let path = manifest_path("push-minimal");
    let manifest = format!(
        r#"{{
  "network": "Testnet",
  "chains": {{
    "Sepolia": {{
      "version": "1.1.0",
      "mode": "locking",
      "manager": "{}",
      "token": "{}",
      "transceivers": {{ "threshold": 1, "wormhole": {{ "address": "{}" }} }},
      "limits": {{ "outbound": "0.000000000000000000" }}
    }},
    "BaseSepolia": {{
      "version": "1.1.0",
      "manager": "{}",
      "token": "{}",
      "transceivers": {{ "threshold": 1, "wormhole": {{ "address": "{}" }} }},
      "limits": {{ "outbound": "40.000000" }}
    }}
  }}
}}
"#,
        sepolia.manager,
        sepolia.token,
        sepolia.transceiver,
        base.manager,
        base.token,
        base.transceiver
    );
    std::fs::write(&path, manifest).unwrap();

    let reports = commands::push(&path, &world.services(&AssumeYes)).await.unwrap();
    assert!(reports.iter().all(|r| r.is_success()), "{:?}", reports);
    assert_eq!(
        world.network.submitted(),
        vec![(Chain::BaseSepolia, "setOutboundLimit".to_string())]
    );
    assert!(world.network.state(Chain::Sepolia).unwrap().paused);

    // Undeclared fields stay undeclared; only the inferred mode is added
    let saved: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    for chain in ["Sepolia", "BaseSepolia"] {
        let config = &saved["chains"][chain];
        assert!(config.get("paused").is_none(), "{}", chain);
        assert!(config.get("owner").is_none(), "{}", chain);
        assert!(config.get("pauser").is_none(), "{}", chain);
        assert!(config["transceivers"]["wormhole"].get("pauser").is_none(), "{}", chain);
    }
    assert_eq!(saved["chains"]["BaseSepolia"]["mode"], "burning");

    // Status still lists what pull would fill in, but nothing to push
    let report = commands::status(&path, &world.services(&AssumeYes)).await.unwrap();
    for chain in &report.chains {
        assert!(chain.missing.is_clean(), "{}", chain.chain);
        for (leaf, push, _) in chain.diff.leaves() {
            assert!(push.is_none(), "{} {} would be pushed", chain.chain, leaf);
        }
    }

    let reports = commands::push(&path, &world.services(&AssumeYes)).await.unwrap();
    assert!(reports.is_empty());
    assert_eq!(world.network.submitted().len(), 1);
}

#[tokio::test]
async fn test_push_rejects_invalid_manifest_without_transactions() {
    let world = World::new(&[
        (Chain::Sepolia, Mode::Locking, 18),
        (Chain::BaseSepolia, Mode::Burning, 6),
    ]);
    let path = manifest_path("push-invalid");
    let mut deployment = world.network.deployment();
    deployment.chains.get_mut(&Chain::BaseSepolia).unwrap().mode = Some(Mode::Locking);
    manifest::save(&path, &deployment).unwrap();

    let err = commands::push(&path, &world.services(&AssumeYes)).await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<NttError>(),
        Some(NttError::InvalidConfig(_))
    ));
    assert!(world.network.submitted().is_empty());
}

#[tokio::test]
async fn test_upgrade_records_new_version() {
    let world = World::new(&[(Chain::Sepolia, Mode::Locking, 18)]);
    let path = manifest_path("upgrade");
    manifest::save(&path, &world.network.deployment()).unwrap();

    let updated = commands::upgrade(&path, Chain::Sepolia, "2.0.0", &world.services(&AssumeYes))
        .await
        .unwrap();
    assert_eq!(updated.version, "2.0.0");
    assert_eq!(
        manifest::load(&path).unwrap().chains[&Chain::Sepolia].version,
        "2.0.0"
    );
    assert_eq!(
        world.deployer.upgrades(),
        vec![(Chain::Sepolia, "2.0.0".to_string())]
    );

    // Already at the requested version
    commands::upgrade(&path, Chain::Sepolia, "2.0.0", &world.services(&AssumeYes))
        .await
        .unwrap();
    assert_eq!(world.deployer.upgrades().len(), 1);
}
