//! Step selection, ordering and execution.
//!
//! Selection and ordering are pure and fully validated before the first
//! network call, so configuration mistakes (cycles, duplicate names, unknown
//! dependencies) never leave a half-deployed network behind.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use alloy_core::primitives::Address;
use chrono::Utc;
use comfy_table::{Cell, Table, presets::UTF8_FULL};
use tracing::{info, warn};

use crate::args::ArgValue;
use crate::backend::{DeployBackend, DeployRequest, NoVerify, VerifyBackend};
use crate::error::DeployError;
use crate::ledger::{DeployedContract, Ledger};
use crate::network::NetworkDescriptor;
use crate::step::{CallArg, CallTarget, DeployStep, StepContext};

/// Selects the steps to run. With no tags every step is selected; with tags,
/// the tagged steps plus their transitive dependencies.
///
/// Validates the whole step set first: duplicate names and dependencies on
/// unknown steps are configuration errors regardless of selection.
pub fn select_steps<'s>(
    steps: &'s [DeployStep],
    tags: &[String],
) -> Result<Vec<&'s DeployStep>, DeployError> {
    let mut by_name: BTreeMap<&str, &DeployStep> = BTreeMap::new();
    for step in steps {
        if by_name.insert(step.name.as_str(), step).is_some() {
            return Err(DeployError::DuplicateStep {
                name: step.name.clone(),
            });
        }
    }
    for step in steps {
        for dep in &step.dependencies {
            if !by_name.contains_key(dep.as_str()) {
                return Err(DeployError::UnknownDependency {
                    step: step.name.clone(),
                    dependency: dep.clone(),
                });
            }
        }
    }

    if tags.is_empty() {
        return Ok(steps.iter().collect());
    }

    let mut selected: BTreeSet<&str> = BTreeSet::new();
    let mut queue: VecDeque<&DeployStep> = steps
        .iter()
        .filter(|s| tags.iter().any(|t| s.tags.contains(t)))
        .collect();
    while let Some(step) = queue.pop_front() {
        if !selected.insert(step.name.as_str()) {
            continue;
        }
        for dep in &step.dependencies {
            queue.push_back(by_name[dep.as_str()]);
        }
    }

    Ok(steps
        .iter()
        .filter(|s| selected.contains(s.name.as_str()))
        .collect())
}

/// Topologically orders the selected steps. Ready steps are taken in
/// `(seq, name)` order, so the result is deterministic for a given set.
pub fn execution_order<'s>(
    selected: &[&'s DeployStep],
) -> Result<Vec<&'s DeployStep>, DeployError> {
    let names: BTreeSet<&str> = selected.iter().map(|s| s.name.as_str()).collect();
    let mut pending: BTreeMap<&str, BTreeSet<&str>> = selected
        .iter()
        .map(|s| {
            // Dependencies outside the selection are satisfied from the
            // ledger at run time, not ordered here.
            let deps = s
                .dependencies
                .iter()
                .map(String::as_str)
                .filter(|d| names.contains(d))
                .collect();
            (s.name.as_str(), deps)
        })
        .collect();

    let mut ordered = Vec::with_capacity(selected.len());
    while !pending.is_empty() {
        let mut ready: Vec<&&DeployStep> = selected
            .iter()
            .filter(|s| pending.get(s.name.as_str()).is_some_and(BTreeSet::is_empty))
            .collect();
        if ready.is_empty() {
            return Err(DeployError::CyclicDependency {
                steps: pending.keys().map(|n| (*n).to_owned()).collect(),
            });
        }
        ready.sort_by(|a, b| (a.seq, &a.name).cmp(&(b.seq, &b.name)));

        for step in ready {
            pending.remove(step.name.as_str());
            for deps in pending.values_mut() {
                deps.remove(step.name.as_str());
            }
            ordered.push(*step);
        }
    }
    Ok(ordered)
}

/// Outcome of one step within a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepStatus {
    /// The step does not apply to the target network.
    Inapplicable,
    /// A record already existed and `force` was not set.
    AlreadyDeployed,
    Deployed {
        address: Address,
        /// `None` when verification was not attempted (non-live network or
        /// no verifier configured).
        verified: Option<bool>,
        /// `None` when the step has no configuration calls.
        configured: Option<bool>,
    },
    Failed {
        reason: String,
    },
}

#[derive(Debug, Clone)]
pub struct StepReport {
    pub name: String,
    pub status: StepStatus,
}

/// Per-step outcomes for one run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub network: String,
    pub entries: Vec<StepReport>,
    /// Name of the step that halted the run, if any.
    pub failure: Option<String>,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }

    /// Renders the run as a terminal table.
    pub fn table(&self) -> Table {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_header(vec!["Step", "Status", "Address"]);
        for entry in &self.entries {
            let (status, address) = match &entry.status {
                StepStatus::Inapplicable => ("skipped (network)".to_owned(), String::new()),
                StepStatus::AlreadyDeployed => ("already deployed".to_owned(), String::new()),
                StepStatus::Deployed {
                    address,
                    verified,
                    configured,
                } => {
                    let mut status = "deployed".to_owned();
                    match verified {
                        Some(true) => status.push_str(", verified"),
                        Some(false) => status.push_str(", verify failed"),
                        None => {}
                    }
                    match configured {
                        Some(true) => status.push_str(", configured"),
                        Some(false) => status.push_str(", configure failed"),
                        None => {}
                    }
                    (status, address.to_string())
                }
                StepStatus::Failed { reason } => (format!("FAILED: {reason}"), String::new()),
            };
            table.add_row(vec![Cell::new(&entry.name), Cell::new(status), Cell::new(address)]);
        }
        table
    }
}

/// Options for one run.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Restrict selection to these tags (plus dependencies).
    pub tags: Vec<String>,
    /// Redeploy and overwrite records that already exist.
    pub force: bool,
}

/// Executes deploy steps sequentially against a backend, recording results
/// in the ledger. Fail-fast: the first fatal step error ends the run; a
/// re-run resumes from the persisted records.
pub struct DeployRunner<'a, B, V = NoVerify> {
    network: &'a NetworkDescriptor,
    deployer: Address,
    ledger: &'a mut Ledger,
    backend: &'a B,
    verifier: Option<&'a V>,
}

impl<'a, B: DeployBackend> DeployRunner<'a, B, NoVerify> {
    pub fn new(
        network: &'a NetworkDescriptor,
        deployer: Address,
        ledger: &'a mut Ledger,
        backend: &'a B,
    ) -> Self {
        Self {
            network,
            deployer,
            ledger,
            backend,
            verifier: None,
        }
    }
}

impl<'a, B: DeployBackend, V: VerifyBackend> DeployRunner<'a, B, V> {
    /// Enables explorer verification for deployed contracts. Only applied on
    /// live networks.
    pub fn with_verifier<W: VerifyBackend>(self, verifier: &'a W) -> DeployRunner<'a, B, W> {
        DeployRunner {
            network: self.network,
            deployer: self.deployer,
            ledger: self.ledger,
            backend: self.backend,
            verifier: Some(verifier),
        }
    }

    pub async fn run(
        &mut self,
        steps: &[DeployStep],
        opts: &RunOptions,
    ) -> Result<RunReport, DeployError> {
        let selected = select_steps(steps, &opts.tags)?;
        let ordered = execution_order(&selected)?;
        info!(
            network = %self.network.name,
            steps = ordered.len(),
            "starting deployment run"
        );

        let mut entries = Vec::with_capacity(ordered.len());
        let mut failure = None;
        for step in ordered {
            let status = self.run_step(step, opts.force).await;
            let failed = matches!(status, StepStatus::Failed { .. });
            entries.push(StepReport {
                name: step.name.clone(),
                status,
            });
            if failed {
                failure = Some(step.name.clone());
                break;
            }
        }

        Ok(RunReport {
            network: self.network.name.clone(),
            entries,
            failure,
        })
    }

    async fn run_step(&mut self, step: &DeployStep, force: bool) -> StepStatus {
        if !step.networks.matches(&self.network.name) {
            return StepStatus::Inapplicable;
        }
        if !force && self.ledger.contains(&step.name) {
            info!(step = %step.name, "already deployed, skipping");
            return StepStatus::AlreadyDeployed;
        }

        match self.execute_step(step, force).await {
            Ok(status) => status,
            Err(e) => {
                warn!(step = %step.name, error = %e, "step failed");
                StepStatus::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }

    async fn execute_step(
        &mut self,
        step: &DeployStep,
        force: bool,
    ) -> Result<StepStatus, DeployError> {
        // Dependency addresses come from the ledger; a missing record means
        // the dependency never ran on this network (filtered out or failed).
        let mut deps: BTreeMap<String, Address> = BTreeMap::new();
        for dep in &step.dependencies {
            let record =
                self.ledger
                    .get(dep)
                    .ok_or_else(|| DeployError::UnknownContract {
                        network: self.network.name.clone(),
                        name: dep.clone(),
                    })?;
            deps.insert(dep.clone(), record.address);
        }

        let ctx = StepContext {
            network: self.network,
            deployer: self.deployer,
            deps: &deps,
        };
        let args = match &step.args {
            Some(f) => f(&ctx)?,
            None => Vec::new(),
        };
        let libraries: BTreeMap<String, Address> = step
            .libraries
            .iter()
            .map(|l| (l.clone(), deps[l]))
            .collect();

        info!(step = %step.name, contract = %step.contract, "deploying");
        let deployed = self
            .backend
            .deploy(DeployRequest {
                contract: &step.contract,
                args: &args,
                libraries: &libraries,
                from: self.deployer,
            })
            .await
            .map_err(|e| DeployError::DeployTransactionFailed {
                step: step.name.clone(),
                reason: e.to_string(),
            })?;

        self.ledger.put(
            DeployedContract {
                name: step.name.clone(),
                contract: step.contract.clone(),
                network: self.network.name.clone(),
                address: deployed.address,
                constructor_args: args.clone(),
                transaction_hash: deployed.transaction_hash,
                block_number: deployed.block_number,
                deployed_at: Utc::now(),
            },
            force,
        )?;

        let verified = self.verify_step(step, deployed.address, &args).await;
        let configured = self.configure_step(step, deployed.address, &deps).await;

        Ok(StepStatus::Deployed {
            address: deployed.address,
            verified,
            configured,
        })
    }

    /// Best effort: verification failures are reported, never fatal.
    async fn verify_step(
        &self,
        step: &DeployStep,
        address: Address,
        args: &[ArgValue],
    ) -> Option<bool> {
        if !self.network.live {
            return None;
        }
        let verifier = self.verifier?;
        match verifier.verify(address, &step.contract, args).await {
            Ok(()) => Some(true),
            Err(e) => {
                warn!(step = %step.name, %address, error = %e, "verification failed");
                Some(false)
            }
        }
    }

    /// Best effort: a failed setter leaves the deployment record in place
    /// and the run continues.
    async fn configure_step(
        &self,
        step: &DeployStep,
        deployed: Address,
        deps: &BTreeMap<String, Address>,
    ) -> Option<bool> {
        if step.config_calls.is_empty() {
            return None;
        }

        for call in &step.config_calls {
            let target = match &call.target {
                CallTarget::Deployed => deployed,
                CallTarget::Dependency(name) => match deps.get(name) {
                    Some(address) => *address,
                    None => {
                        warn!(step = %step.name, dependency = %name, "configuration target not deployed");
                        return Some(false);
                    }
                },
            };
            let mut args = Vec::with_capacity(call.args.len());
            for arg in &call.args {
                match arg {
                    CallArg::Value(v) => args.push(v.clone()),
                    CallArg::DeployedAddress => {
                        args.push(ArgValue::Address(deployed))
                    }
                    CallArg::Dependency(name) => match deps.get(name) {
                        Some(d) => args.push(ArgValue::Address(*d)),
                        None => {
                            warn!(step = %step.name, dependency = %name, "configuration argument not deployed");
                            return Some(false);
                        }
                    },
                }
            }

            if let Err(e) = self
                .backend
                .call(target, &call.method, &args, self.deployer)
                .await
            {
                warn!(step = %step.name, method = %call.method, error = %e, "configuration call failed");
                return Some(false);
            }
            info!(step = %step.name, method = %call.method, %target, "configuration call applied");
        }
        Some(true)
    }
}
