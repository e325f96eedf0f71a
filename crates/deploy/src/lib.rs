//! Deployment orchestration for the EvmoSwap protocol.
//!
//! The library is split into a generic orchestration layer and the protocol
//! catalog built on top of it:
//!
//! - [`ledger`] / [`resolver`]: persisted per-network deployment records and
//!   read-only address lookups over them.
//! - [`step`]: deploy step descriptors with explicit dependencies, network
//!   applicability and argument closures.
//! - [`runner`]: validation, deterministic ordering and sequential
//!   execution with idempotent resume.
//! - [`eth`] / [`verify`]: the JSON-RPC execution backend and the explorer
//!   verifier, behind the [`backend`] traits.
//! - [`steps`]: the EvmoSwap step catalog itself.

pub mod args;
pub mod backend;
pub mod error;
pub mod eth;
pub mod ledger;
pub mod network;
pub mod resolver;
pub mod rpc;
pub mod runner;
pub mod step;
pub mod steps;
pub mod verify;

pub use args::ArgValue;
pub use backend::{DeployBackend, DeployRequest, Deployed, NoVerify, VerifyBackend};
pub use error::DeployError;
pub use eth::{EthBackend, deployer_address};
pub use ledger::{DeployedContract, Ledger};
pub use network::NetworkDescriptor;
pub use resolver::AddressBook;
pub use runner::{DeployRunner, RunOptions, RunReport, StepStatus};
pub use step::{DeployStep, StepContext};
pub use verify::ExplorerVerifier;
