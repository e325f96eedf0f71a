//! End-to-end runner behavior over an in-memory backend.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Mutex;

use alloy_core::primitives::{Address, U256};
use emoswap_deploy::args::ArgValue;
use emoswap_deploy::backend::{DeployBackend, DeployRequest, Deployed, VerifyBackend};
use emoswap_deploy::error::DeployError;
use emoswap_deploy::ledger::Ledger;
use emoswap_deploy::network::NetworkDescriptor;
use emoswap_deploy::runner::{DeployRunner, RunOptions, StepStatus};
use emoswap_deploy::step::{CallArg, ConfigCall, DeployStep};
use tempdir::TempDir;

#[derive(Debug, Clone)]
struct RecordedDeploy {
    contract: String,
    args: Vec<ArgValue>,
    libraries: BTreeMap<String, Address>,
}

#[derive(Debug, Clone)]
struct RecordedCall {
    to: Address,
    method: String,
    args: Vec<ArgValue>,
}

/// Backend that hands out sequential addresses and records every request.
#[derive(Default)]
struct MockBackend {
    deploys: Mutex<Vec<RecordedDeploy>>,
    calls: Mutex<Vec<RecordedCall>>,
    fail_on: Option<String>,
}

impl MockBackend {
    fn failing_on(contract: &str) -> Self {
        Self {
            fail_on: Some(contract.to_owned()),
            ..Self::default()
        }
    }

    fn deployed_contracts(&self) -> Vec<String> {
        self.deploys
            .lock()
            .unwrap()
            .iter()
            .map(|d| d.contract.clone())
            .collect()
    }

    fn address_of(&self, contract: &str) -> Address {
        let deploys = self.deploys.lock().unwrap();
        let index = deploys
            .iter()
            .position(|d| d.contract == contract)
            .expect("contract was deployed");
        mock_address(index)
    }
}

fn mock_address(index: usize) -> Address {
    let mut bytes = [0u8; 20];
    bytes[19] = (index + 1) as u8;
    Address::from(bytes)
}

impl DeployBackend for MockBackend {
    fn deploy(
        &self,
        req: DeployRequest<'_>,
    ) -> impl Future<Output = Result<Deployed, DeployError>> + Send {
        let result = {
            let mut deploys = self.deploys.lock().unwrap();
            if self.fail_on.as_deref() == Some(req.contract) {
                Err(DeployError::TransactionReverted {
                    hash: "0xbad".to_owned(),
                })
            } else {
                let address = mock_address(deploys.len());
                deploys.push(RecordedDeploy {
                    contract: req.contract.to_owned(),
                    args: req.args.to_vec(),
                    libraries: req.libraries.clone(),
                });
                Ok(Deployed {
                    address,
                    transaction_hash: Some(format!("0x{:040x}", deploys.len())),
                    block_number: Some(deploys.len() as u64),
                })
            }
        };
        async move { result }
    }

    fn call(
        &self,
        to: Address,
        method: &str,
        args: &[ArgValue],
        _from: Address,
    ) -> impl Future<Output = Result<(), DeployError>> + Send {
        self.calls.lock().unwrap().push(RecordedCall {
            to,
            method: method.to_owned(),
            args: args.to_vec(),
        });
        async { Ok(()) }
    }
}

/// Verifier that rejects everything.
struct RejectingVerifier;

impl VerifyBackend for RejectingVerifier {
    fn verify(
        &self,
        address: Address,
        _contract: &str,
        _args: &[ArgValue],
    ) -> impl Future<Output = Result<(), DeployError>> + Send {
        async move {
            Err(DeployError::VerificationFailed {
                address,
                reason: "source mismatch".to_owned(),
            })
        }
    }
}

fn network(name: &str, live: bool) -> NetworkDescriptor {
    NetworkDescriptor {
        name: name.to_owned(),
        chain_id: 9000,
        live,
        rpc_url: "http://localhost:8545".to_owned(),
        gas_price: None,
    }
}

fn deployer() -> Address {
    "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266".parse().unwrap()
}

fn token_and_registry() -> Vec<DeployStep> {
    vec![
        DeployStep::new(0, "Token"),
        DeployStep::new(1, "Registry")
            .depends_on(["Token"])
            .args(|ctx| Ok(vec![ArgValue::Address(ctx.dep("Token")?)])),
    ]
}

#[tokio::test]
async fn deploys_dependencies_first_and_injects_their_addresses() {
    let root = TempDir::new("run").unwrap();
    let net = network("testnet", false);
    let backend = MockBackend::default();
    let mut ledger = Ledger::open(root.path(), "testnet").unwrap();

    let report = DeployRunner::new(&net, deployer(), &mut ledger, &backend)
        .run(&token_and_registry(), &RunOptions::default())
        .await
        .unwrap();

    assert!(report.is_success());
    assert_eq!(backend.deployed_contracts(), vec!["Token", "Registry"]);

    let token_address = backend.address_of("Token");
    let registry_args = backend.deploys.lock().unwrap()[1].args.clone();
    assert_eq!(registry_args, vec![ArgValue::Address(token_address)]);

    assert_eq!(ledger.get("Token").unwrap().address, token_address);
    assert!(ledger.contains("Registry"));
}

#[tokio::test]
async fn second_run_skips_recorded_steps() {
    let root = TempDir::new("run").unwrap();
    let net = network("testnet", false);
    let backend = MockBackend::default();
    let steps = token_and_registry();

    let mut ledger = Ledger::open(root.path(), "testnet").unwrap();
    DeployRunner::new(&net, deployer(), &mut ledger, &backend)
        .run(&steps, &RunOptions::default())
        .await
        .unwrap();
    drop(ledger);

    // Fresh ledger handle, as a re-invocation of the CLI would open.
    let mut ledger = Ledger::open(root.path(), "testnet").unwrap();
    let report = DeployRunner::new(&net, deployer(), &mut ledger, &backend)
        .run(&steps, &RunOptions::default())
        .await
        .unwrap();

    assert!(report.is_success());
    assert_eq!(backend.deploys.lock().unwrap().len(), 2);
    assert!(
        report
            .entries
            .iter()
            .all(|e| e.status == StepStatus::AlreadyDeployed)
    );
}

#[tokio::test]
async fn force_redeploys_and_overwrites_records() {
    let root = TempDir::new("run").unwrap();
    let net = network("testnet", false);
    let backend = MockBackend::default();
    let steps = vec![DeployStep::new(0, "Token")];
    let mut ledger = Ledger::open(root.path(), "testnet").unwrap();

    let mut runner = DeployRunner::new(&net, deployer(), &mut ledger, &backend);
    runner.run(&steps, &RunOptions::default()).await.unwrap();
    let first = ledger.get("Token").unwrap().address;

    let mut runner = DeployRunner::new(&net, deployer(), &mut ledger, &backend);
    let report = runner
        .run(
            &steps,
            &RunOptions {
                force: true,
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert!(report.is_success());
    assert_eq!(backend.deploys.lock().unwrap().len(), 2);
    assert_ne!(ledger.get("Token").unwrap().address, first);
}

#[tokio::test]
async fn cycle_is_rejected_before_any_transaction() {
    let root = TempDir::new("run").unwrap();
    let net = network("testnet", false);
    let backend = MockBackend::default();
    let steps = vec![
        DeployStep::new(0, "A").depends_on(["B"]),
        DeployStep::new(1, "B").depends_on(["A"]),
    ];
    let mut ledger = Ledger::open(root.path(), "testnet").unwrap();

    let err = DeployRunner::new(&net, deployer(), &mut ledger, &backend)
        .run(&steps, &RunOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(err, DeployError::CyclicDependency { .. }));
    assert!(backend.deploys.lock().unwrap().is_empty());
}

#[tokio::test]
async fn duplicate_step_names_are_rejected() {
    let root = TempDir::new("run").unwrap();
    let net = network("testnet", false);
    let backend = MockBackend::default();
    let steps = vec![DeployStep::new(0, "Token"), DeployStep::new(1, "Token")];
    let mut ledger = Ledger::open(root.path(), "testnet").unwrap();

    let err = DeployRunner::new(&net, deployer(), &mut ledger, &backend)
        .run(&steps, &RunOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, DeployError::DuplicateStep { .. }));
}

#[tokio::test]
async fn steps_for_other_networks_are_skipped_without_records() {
    let root = TempDir::new("run").unwrap();
    let net = network("mainnet", false);
    let backend = MockBackend::default();
    let steps = vec![
        DeployStep::new(0, "Token"),
        DeployStep::new(1, "Faucet").only_on(["testnet", "bsctest"]),
    ];
    let mut ledger = Ledger::open(root.path(), "mainnet").unwrap();

    let report = DeployRunner::new(&net, deployer(), &mut ledger, &backend)
        .run(&steps, &RunOptions::default())
        .await
        .unwrap();

    assert!(report.is_success());
    assert_eq!(backend.deployed_contracts(), vec!["Token"]);
    assert_eq!(report.entries[1].status, StepStatus::Inapplicable);
    assert!(!ledger.contains("Faucet"));
}

#[tokio::test]
async fn failure_halts_the_run_and_rerun_resumes() {
    let root = TempDir::new("run").unwrap();
    let net = network("testnet", false);
    let steps = vec![
        DeployStep::new(0, "A"),
        DeployStep::new(1, "B"),
        DeployStep::new(2, "C"),
    ];

    let backend = MockBackend::failing_on("B");
    let mut ledger = Ledger::open(root.path(), "testnet").unwrap();
    let report = DeployRunner::new(&net, deployer(), &mut ledger, &backend)
        .run(&steps, &RunOptions::default())
        .await
        .unwrap();

    assert!(!report.is_success());
    assert_eq!(report.failure.as_deref(), Some("B"));
    // C was never attempted.
    assert_eq!(report.entries.len(), 2);
    assert_eq!(backend.deployed_contracts(), vec!["A"]);
    assert!(matches!(report.entries[1].status, StepStatus::Failed { .. }));
    drop(ledger);

    // Once the failure is fixed, a re-run picks up where it stopped.
    let backend = MockBackend::default();
    let mut ledger = Ledger::open(root.path(), "testnet").unwrap();
    let report = DeployRunner::new(&net, deployer(), &mut ledger, &backend)
        .run(&steps, &RunOptions::default())
        .await
        .unwrap();

    assert!(report.is_success());
    assert_eq!(report.entries[0].status, StepStatus::AlreadyDeployed);
    assert_eq!(backend.deployed_contracts(), vec!["B", "C"]);
}

#[tokio::test]
async fn missing_dependency_record_fails_the_step() {
    let root = TempDir::new("run").unwrap();
    let net = network("mainnet", false);
    let backend = MockBackend::default();
    // The dependency only applies to testnet, so on mainnet it leaves no
    // record behind and the dependent step cannot resolve it.
    let steps = vec![
        DeployStep::new(0, "Token").only_on(["testnet"]),
        DeployStep::new(1, "Registry")
            .depends_on(["Token"])
            .args(|ctx| Ok(vec![ArgValue::Address(ctx.dep("Token")?)])),
    ];
    let mut ledger = Ledger::open(root.path(), "mainnet").unwrap();

    let report = DeployRunner::new(&net, deployer(), &mut ledger, &backend)
        .run(&steps, &RunOptions::default())
        .await
        .unwrap();

    assert!(!report.is_success());
    assert!(backend.deploys.lock().unwrap().is_empty());
    assert!(matches!(report.entries[1].status, StepStatus::Failed { .. }));
}

#[tokio::test]
async fn tags_run_only_the_selected_closure() {
    let root = TempDir::new("run").unwrap();
    let net = network("testnet", false);
    let backend = MockBackend::default();
    let steps = vec![
        DeployStep::new(0, "Token"),
        DeployStep::new(1, "Pool").tag("amm").depends_on(["Token"]),
        DeployStep::new(2, "Dashboard"),
    ];
    let mut ledger = Ledger::open(root.path(), "testnet").unwrap();

    let report = DeployRunner::new(&net, deployer(), &mut ledger, &backend)
        .run(
            &steps,
            &RunOptions {
                tags: vec!["amm".to_owned()],
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert!(report.is_success());
    assert_eq!(backend.deployed_contracts(), vec!["Token", "Pool"]);
    assert!(!ledger.contains("Dashboard"));
}

#[tokio::test]
async fn configuration_call_targets_dependency_with_deployed_address() {
    let root = TempDir::new("run").unwrap();
    let net = network("testnet", false);
    let backend = MockBackend::default();
    let steps = vec![
        DeployStep::new(0, "VotingEscrow"),
        DeployStep::new(1, "RewardPool")
            .depends_on(["VotingEscrow"])
            .configure(ConfigCall::on_dependency(
                "VotingEscrow",
                "setRewardPool",
                [CallArg::DeployedAddress],
            )),
    ];
    let mut ledger = Ledger::open(root.path(), "testnet").unwrap();

    let report = DeployRunner::new(&net, deployer(), &mut ledger, &backend)
        .run(&steps, &RunOptions::default())
        .await
        .unwrap();

    assert!(report.is_success());
    let calls = backend.calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].to, backend.address_of("VotingEscrow"));
    assert_eq!(calls[0].method, "setRewardPool");
    assert_eq!(
        calls[0].args,
        vec![ArgValue::Address(backend.address_of("RewardPool"))]
    );
    match &report.entries[1].status {
        StepStatus::Deployed { configured, .. } => assert_eq!(*configured, Some(true)),
        other => panic!("unexpected status: {other:?}"),
    }
}

#[tokio::test]
async fn linked_libraries_are_passed_to_the_backend() {
    let root = TempDir::new("run").unwrap();
    let net = network("testnet", false);
    let backend = MockBackend::default();
    let steps = vec![
        DeployStep::new(0, "MathUtils"),
        DeployStep::new(1, "SwapUtils").link("MathUtils"),
    ];
    let mut ledger = Ledger::open(root.path(), "testnet").unwrap();

    DeployRunner::new(&net, deployer(), &mut ledger, &backend)
        .run(&steps, &RunOptions::default())
        .await
        .unwrap();

    let deploys = backend.deploys.lock().unwrap();
    assert_eq!(
        deploys[1].libraries.get("MathUtils"),
        Some(&mock_address(0))
    );
}

#[tokio::test]
async fn verification_failure_is_reported_but_not_fatal() {
    let root = TempDir::new("run").unwrap();
    let net = network("bsctest", true);
    let backend = MockBackend::default();
    let verifier = RejectingVerifier;
    let steps = vec![DeployStep::new(0, "Token")];
    let mut ledger = Ledger::open(root.path(), "bsctest").unwrap();

    let report = DeployRunner::new(&net, deployer(), &mut ledger, &backend)
        .with_verifier(&verifier)
        .run(&steps, &RunOptions::default())
        .await
        .unwrap();

    assert!(report.is_success());
    assert!(ledger.contains("Token"));
    match &report.entries[0].status {
        StepStatus::Deployed { verified, .. } => assert_eq!(*verified, Some(false)),
        other => panic!("unexpected status: {other:?}"),
    }
}

#[tokio::test]
async fn verification_is_skipped_on_non_live_networks() {
    let root = TempDir::new("run").unwrap();
    let net = network("testnet", false);
    let backend = MockBackend::default();
    let verifier = RejectingVerifier;
    let steps = vec![DeployStep::new(0, "Token")];
    let mut ledger = Ledger::open(root.path(), "testnet").unwrap();

    let report = DeployRunner::new(&net, deployer(), &mut ledger, &backend)
        .with_verifier(&verifier)
        .run(&steps, &RunOptions::default())
        .await
        .unwrap();

    match &report.entries[0].status {
        StepStatus::Deployed { verified, .. } => assert_eq!(*verified, None),
        other => panic!("unexpected status: {other:?}"),
    }
}

#[tokio::test]
async fn ledger_lock_excludes_concurrent_runs() {
    let root = TempDir::new("run").unwrap();
    let _first = Ledger::open(root.path(), "testnet").unwrap();
    let err = Ledger::open(root.path(), "testnet").unwrap_err();
    assert!(matches!(err, DeployError::LedgerLocked { .. }));
}

#[tokio::test]
async fn run_report_table_lists_every_step() {
    let root = TempDir::new("run").unwrap();
    let net = network("testnet", false);
    let backend = MockBackend::default();
    let mut ledger = Ledger::open(root.path(), "testnet").unwrap();

    let report = DeployRunner::new(&net, deployer(), &mut ledger, &backend)
        .run(&token_and_registry(), &RunOptions::default())
        .await
        .unwrap();

    let rendered = report.table().to_string();
    assert!(rendered.contains("Token"));
    assert!(rendered.contains("Registry"));
    assert!(rendered.contains("deployed"));
}

#[tokio::test]
async fn catalog_deploys_cleanly_on_each_network() {
    use emoswap_deploy::steps::{ProtocolParams, protocol_steps};

    for (name, live) in [("mainnet", false), ("testnet", false), ("bsctest", true)] {
        let root = TempDir::new("catalog").unwrap();
        let net = network(name, live);
        let backend = MockBackend::default();
        let steps = protocol_steps(&ProtocolParams::default());
        let mut ledger = Ledger::open(root.path(), name).unwrap();

        let report = DeployRunner::new(&net, deployer(), &mut ledger, &backend)
            .run(&steps, &RunOptions::default())
            .await
            .unwrap();

        assert!(report.is_success(), "run failed on {name}: {report:?}");
        // Everything applicable got a record, nothing else did.
        for step in &steps {
            assert_eq!(
                ledger.contains(&step.name),
                step.networks.matches(name),
                "unexpected ledger state for {} on {name}",
                step.name
            );
        }
    }

    // Spot-check one argument wiring end to end: the 3pool amplification.
    let root = TempDir::new("catalog").unwrap();
    let net = network("testnet", false);
    let backend = MockBackend::default();
    let steps = protocol_steps(&ProtocolParams::default());
    let mut ledger = Ledger::open(root.path(), "testnet").unwrap();
    DeployRunner::new(&net, deployer(), &mut ledger, &backend)
        .run(&steps, &RunOptions::default())
        .await
        .unwrap();

    let pool_args = ledger.get("EvmoSwap3Pool").unwrap().constructor_args.clone();
    assert!(pool_args.contains(&ArgValue::Uint(U256::from(800u64))));
}
