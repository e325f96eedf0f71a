//! Error kinds for the deployment library.
//!
//! Resolution and graph errors are detected before any state-mutating call.
//! Transaction errors are fatal for the step that produced them; verification
//! and configuration-call errors are surfaced but do not roll anything back.

use std::path::PathBuf;

use alloy_core::primitives::Address;
use thiserror::Error;

/// All error kinds produced by the deployment library.
#[derive(Debug, Error)]
pub enum DeployError {
    /// No record set has ever been persisted for this network.
    #[error("no deployment records found for network `{network}`")]
    MissingDeploymentSet { network: String },

    /// The record set exists but the requested contract name is not in it.
    #[error("contract `{name}` has no deployment record on network `{network}`")]
    UnknownContract { network: String, name: String },

    /// The step graph cannot be ordered. Contains the steps on the cycle.
    #[error("deploy step graph contains a cycle among: {}", steps.join(", "))]
    CyclicDependency { steps: Vec<String> },

    /// Two steps share the same name within one step set.
    #[error("duplicate deploy step name `{name}`")]
    DuplicateStep { name: String },

    /// A step declares a dependency on a name that is not part of the step set.
    #[error("step `{step}` depends on unknown step `{dependency}`")]
    UnknownDependency { step: String, dependency: String },

    /// A ledger record already exists and no overwrite was requested.
    #[error("record for `{name}` already exists on network `{network}`")]
    RecordExists { network: String, name: String },

    /// Another process holds the ledger lock for this network.
    #[error("deployment ledger for network `{network}` is locked by another process")]
    LedgerLocked { network: String },

    /// The creation transaction was rejected or reverted.
    #[error("deploy transaction for step `{step}` failed: {reason}")]
    DeployTransactionFailed { step: String, reason: String },

    /// The chain reverted a submitted transaction.
    #[error("transaction {hash} reverted")]
    TransactionReverted { hash: String },

    /// The transaction has been submitted but no receipt is available yet.
    #[error("transaction {0} is still pending")]
    TransactionPending(String),

    /// Explorer verification did not succeed. Non-fatal to the deployment.
    #[error("verification of {address} failed: {reason}")]
    VerificationFailed { address: Address, reason: String },

    /// A post-deploy setter call reverted. Non-fatal to the deployment record.
    #[error("configuration call `{method}` on {address} failed: {reason}")]
    ConfigurationCallFailed {
        address: Address,
        method: String,
        reason: String,
    },

    /// No compiled artifact could be located for a contract type.
    #[error("artifact for contract `{contract}` not found under {}", root.display())]
    MissingArtifact { contract: String, root: PathBuf },

    /// The artifact references a library the step did not link.
    #[error("library `{library}` required by `{contract}` is not linked")]
    MissingLibrary { contract: String, library: String },

    /// The artifact's bytecode or link references are not usable as-is.
    #[error("artifact for contract `{contract}` is malformed: {reason}")]
    InvalidArtifact { contract: String, reason: String },

    /// A constructor or call argument could not be produced or parsed.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The deployer private key could not be parsed.
    #[error("invalid deployer key: {0}")]
    InvalidKey(String),

    /// A JSON-RPC method returned an error response.
    #[error("rpc method `{method}` failed: {message}")]
    Rpc { method: String, message: String },

    #[error("http transport: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),

    #[error("ledger io: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization: {0}")]
    Serde(#[from] serde_json::Error),
}
