//! Persistent record of deployed contract instances.
//!
//! One JSON file per record under `<root>/<network>/<name>.json`. An
//! exclusive advisory lock on `<root>/<network>/.lock` serializes runs
//! against the same record set, which also serializes nonce usage for the
//! deployer account.

use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::path::PathBuf;

use alloy_core::primitives::Address;
use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::args::ArgValue;
use crate::error::DeployError;

/// A single persisted deployment record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeployedContract {
    /// Logical name the record is keyed by. Usually the contract type, but
    /// aliased instances (e.g. per-beneficiary vesting contracts) differ.
    pub name: String,
    /// On-chain contract type, i.e. the artifact that was deployed.
    pub contract: String,
    /// Network the instance lives on.
    pub network: String,
    /// Deployed address.
    pub address: Address,
    /// Constructor arguments in declaration order, kept for re-verification.
    pub constructor_args: Vec<ArgValue>,
    /// Creation transaction hash, when the backend reports one.
    pub transaction_hash: Option<String>,
    /// Block the creation transaction was mined in.
    pub block_number: Option<u64>,
    /// When the record was written.
    pub deployed_at: DateTime<Utc>,
}

/// Writable handle over one network's record set.
///
/// Holds the lock file open for its whole lifetime; dropping the ledger
/// releases the lock.
#[derive(Debug)]
pub struct Ledger {
    network: String,
    dir: PathBuf,
    records: BTreeMap<String, DeployedContract>,
    _lock: File,
}

impl Ledger {
    /// Opens (creating on first use) the record set for `network` and takes
    /// the exclusive lock. Fails with [`DeployError::LedgerLocked`] if
    /// another process already holds it.
    pub fn open(root: impl Into<PathBuf>, network: &str) -> Result<Self, DeployError> {
        let dir = root.into().join(network);
        fs::create_dir_all(&dir)?;

        let lock = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(dir.join(".lock"))?;
        lock.try_lock_exclusive()
            .map_err(|_| DeployError::LedgerLocked {
                network: network.to_owned(),
            })?;

        let records = load_records(&dir)?;
        debug!(network, count = records.len(), "opened deployment ledger");

        Ok(Self {
            network: network.to_owned(),
            dir,
            records,
            _lock: lock,
        })
    }

    pub fn network(&self) -> &str {
        &self.network
    }

    pub fn contains(&self, name: &str) -> bool {
        self.records.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&DeployedContract> {
        self.records.get(name)
    }

    /// Records in name order.
    pub fn list(&self) -> impl Iterator<Item = &DeployedContract> {
        self.records.values()
    }

    /// Persists a record. Existing records are preserved unless `overwrite`.
    pub fn put(&mut self, record: DeployedContract, overwrite: bool) -> Result<(), DeployError> {
        if !overwrite && self.records.contains_key(&record.name) {
            return Err(DeployError::RecordExists {
                network: self.network.clone(),
                name: record.name.clone(),
            });
        }

        let path = self.dir.join(format!("{}.json", record.name));
        fs::write(&path, serde_json::to_vec_pretty(&record)?)?;
        debug!(name = %record.name, address = %record.address, "persisted deployment record");

        self.records.insert(record.name.clone(), record);
        Ok(())
    }
}

pub(crate) fn load_records(
    dir: &std::path::Path,
) -> Result<BTreeMap<String, DeployedContract>, DeployError> {
    let mut records = BTreeMap::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let is_record = path.extension().is_some_and(|e| e == "json")
            && path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| !n.starts_with('.'));
        if !is_record {
            continue;
        }
        let record: DeployedContract = serde_json::from_slice(&fs::read(&path)?)?;
        records.insert(record.name.clone(), record);
    }
    Ok(records)
}
