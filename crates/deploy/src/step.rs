//! Deploy step descriptors.
//!
//! A step is pure data plus an argument closure. The closure receives the
//! target network, the deployer address and the resolved addresses of the
//! step's declared dependencies; it cannot reach into the ledger on its own,
//! so a step's inputs are always visible in its declaration.

use std::collections::{BTreeMap, BTreeSet};

use alloy_core::primitives::Address;

use crate::args::ArgValue;
use crate::error::DeployError;
use crate::network::NetworkDescriptor;

/// What the argument closure sees at execution time.
pub struct StepContext<'a> {
    pub network: &'a NetworkDescriptor,
    pub deployer: Address,
    /// Addresses of the step's declared dependencies, keyed by step name.
    pub deps: &'a BTreeMap<String, Address>,
}

impl StepContext<'_> {
    /// Address of a declared dependency.
    pub fn dep(&self, name: &str) -> Result<Address, DeployError> {
        self.deps
            .get(name)
            .copied()
            .ok_or_else(|| DeployError::UnknownContract {
                network: self.network.name.clone(),
                name: name.to_owned(),
            })
    }
}

pub type ArgsFn =
    Box<dyn Fn(&StepContext<'_>) -> Result<Vec<ArgValue>, DeployError> + Send + Sync>;

/// Which networks a step applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Applicability {
    /// Runs on every network.
    Any,
    /// Runs only on the named networks.
    Only(BTreeSet<String>),
}

impl Applicability {
    pub fn matches(&self, network: &str) -> bool {
        match self {
            Applicability::Any => true,
            Applicability::Only(networks) => networks.contains(network),
        }
    }
}

/// Target of a post-deploy configuration call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallTarget {
    /// The contract this step just deployed.
    Deployed,
    /// A declared dependency, by step name.
    Dependency(String),
}

/// One argument to a configuration call, resolved at execution time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallArg {
    Value(ArgValue),
    /// The address this step just deployed.
    DeployedAddress,
    /// The address of a declared dependency.
    Dependency(String),
}

/// A setter invocation to make right after the step's deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigCall {
    pub target: CallTarget,
    pub method: String,
    pub args: Vec<CallArg>,
}

impl ConfigCall {
    /// A call against a dependency contract, e.g. wiring the new deployment
    /// into an already-deployed registry.
    pub fn on_dependency(
        dependency: impl Into<String>,
        method: impl Into<String>,
        args: impl IntoIterator<Item = CallArg>,
    ) -> Self {
        Self {
            target: CallTarget::Dependency(dependency.into()),
            method: method.into(),
            args: args.into_iter().collect(),
        }
    }

    /// A call against the freshly deployed contract itself.
    pub fn on_deployed(
        method: impl Into<String>,
        args: impl IntoIterator<Item = CallArg>,
    ) -> Self {
        Self {
            target: CallTarget::Deployed,
            method: method.into(),
            args: args.into_iter().collect(),
        }
    }
}

/// One deployable unit.
pub struct DeployStep {
    /// Ledger alias the resulting record is keyed by.
    pub name: String,
    /// Artifact/contract type. Defaults to `name`.
    pub contract: String,
    /// Stable ordering number, used to break topological ties.
    pub seq: u32,
    pub tags: BTreeSet<String>,
    /// Names of steps whose addresses this step needs.
    pub dependencies: Vec<String>,
    pub networks: Applicability,
    pub args: Option<ArgsFn>,
    /// Dependencies whose addresses are spliced into the bytecode as linked
    /// libraries rather than passed as constructor arguments.
    pub libraries: Vec<String>,
    pub config_calls: Vec<ConfigCall>,
}

impl DeployStep {
    pub fn new(seq: u32, name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            contract: name.clone(),
            name,
            seq,
            tags: BTreeSet::new(),
            dependencies: Vec::new(),
            networks: Applicability::Any,
            args: None,
            libraries: Vec::new(),
            config_calls: Vec::new(),
        }
    }

    /// Overrides the artifact type for aliased instances.
    pub fn contract(mut self, contract: impl Into<String>) -> Self {
        self.contract = contract.into();
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    pub fn depends_on<S: Into<String>>(mut self, deps: impl IntoIterator<Item = S>) -> Self {
        self.dependencies.extend(deps.into_iter().map(Into::into));
        self
    }

    pub fn only_on<S: Into<String>>(mut self, networks: impl IntoIterator<Item = S>) -> Self {
        self.networks = Applicability::Only(networks.into_iter().map(Into::into).collect());
        self
    }

    pub fn args(
        mut self,
        f: impl Fn(&StepContext<'_>) -> Result<Vec<ArgValue>, DeployError> + Send + Sync + 'static,
    ) -> Self {
        self.args = Some(Box::new(f));
        self
    }

    /// Links the named dependency as a library. Implies a dependency edge.
    pub fn link(mut self, dependency: impl Into<String>) -> Self {
        let dependency = dependency.into();
        if !self.dependencies.contains(&dependency) {
            self.dependencies.push(dependency.clone());
        }
        self.libraries.push(dependency);
        self
    }

    pub fn configure(mut self, call: ConfigCall) -> Self {
        self.config_calls.push(call);
        self
    }
}

impl std::fmt::Debug for DeployStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeployStep")
            .field("name", &self.name)
            .field("contract", &self.contract)
            .field("seq", &self.seq)
            .field("tags", &self.tags)
            .field("dependencies", &self.dependencies)
            .field("networks", &self.networks)
            .field("libraries", &self.libraries)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults_contract_to_name() {
        let step = DeployStep::new(2, "EMOToken");
        assert_eq!(step.contract, "EMOToken");
        assert!(step.networks.matches("mainnet"));
        assert!(step.networks.matches("testnet"));
    }

    #[test]
    fn only_on_restricts_networks() {
        let step = DeployStep::new(1, "TimeLock").only_on(["mainnet"]);
        assert!(step.networks.matches("mainnet"));
        assert!(!step.networks.matches("testnet"));
    }

    #[test]
    fn link_implies_dependency() {
        let step = DeployStep::new(106, "EvmoSwapUtils").link("MathUtils");
        assert_eq!(step.dependencies, vec!["MathUtils"]);
        assert_eq!(step.libraries, vec!["MathUtils"]);
    }
}
