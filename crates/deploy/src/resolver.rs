//! Read-only lookups over a persisted record set.

use std::collections::BTreeMap;
use std::path::Path;

use alloy_core::primitives::Address;

use crate::error::DeployError;
use crate::ledger::{DeployedContract, load_records};

/// Snapshot view over one network's deployment records.
///
/// Unlike [`crate::ledger::Ledger`] this takes no lock and never writes, so
/// it is safe to use while a deployment is in flight elsewhere.
pub struct AddressBook {
    network: String,
    records: BTreeMap<String, DeployedContract>,
}

impl AddressBook {
    /// Loads the record set for `network`. A network that has never been
    /// deployed to is [`DeployError::MissingDeploymentSet`].
    pub fn load(root: impl AsRef<Path>, network: &str) -> Result<Self, DeployError> {
        let dir = root.as_ref().join(network);
        if !dir.is_dir() {
            return Err(DeployError::MissingDeploymentSet {
                network: network.to_owned(),
            });
        }
        Ok(Self {
            network: network.to_owned(),
            records: load_records(&dir)?,
        })
    }

    pub fn network(&self) -> &str {
        &self.network
    }

    /// The deployed address of `name`.
    pub fn resolve(&self, name: &str) -> Result<Address, DeployError> {
        self.get(name).map(|r| r.address)
    }

    /// The full record for `name`.
    pub fn get(&self, name: &str) -> Result<&DeployedContract, DeployError> {
        self.records
            .get(name)
            .ok_or_else(|| DeployError::UnknownContract {
                network: self.network.clone(),
                name: name.to_owned(),
            })
    }

    /// Records in name order.
    pub fn list(&self) -> impl Iterator<Item = &DeployedContract> {
        self.records.values()
    }
}
