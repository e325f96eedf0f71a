//! Backend traits the runner executes against.
//!
//! The runner never talks to a chain or an explorer directly; everything
//! goes through these traits so runs can be exercised against mocks.

use std::collections::BTreeMap;
use std::future::Future;

use alloy_core::primitives::Address;

use crate::args::ArgValue;
use crate::error::DeployError;

/// Everything needed to create one contract instance.
pub struct DeployRequest<'a> {
    /// Artifact/contract type to deploy.
    pub contract: &'a str,
    /// Constructor arguments in declaration order.
    pub args: &'a [ArgValue],
    /// Library addresses to splice into the bytecode, keyed by library name.
    pub libraries: &'a BTreeMap<String, Address>,
    /// Sending account.
    pub from: Address,
}

/// Result of a successful creation.
#[derive(Debug, Clone)]
pub struct Deployed {
    pub address: Address,
    pub transaction_hash: Option<String>,
    pub block_number: Option<u64>,
}

/// Submits creation and setter transactions.
pub trait DeployBackend {
    /// Deploys a contract and waits until its address is known.
    fn deploy(
        &self,
        req: DeployRequest<'_>,
    ) -> impl Future<Output = Result<Deployed, DeployError>> + Send;

    /// Invokes a state-mutating method on an existing contract.
    fn call(
        &self,
        to: Address,
        method: &str,
        args: &[ArgValue],
        from: Address,
    ) -> impl Future<Output = Result<(), DeployError>> + Send;
}

/// Submits source verification for a deployed contract.
pub trait VerifyBackend {
    fn verify(
        &self,
        address: Address,
        contract: &str,
        args: &[ArgValue],
    ) -> impl Future<Output = Result<(), DeployError>> + Send;
}

/// Verifier used when no explorer is configured. Accepts everything.
pub struct NoVerify;

impl VerifyBackend for NoVerify {
    fn verify(
        &self,
        _address: Address,
        _contract: &str,
        _args: &[ArgValue],
    ) -> impl Future<Output = Result<(), DeployError>> + Send {
        async { Ok(()) }
    }
}
