//! JSON-RPC execution backend.
//!
//! Deploys hardhat-style artifacts through an unlocked account on the node
//! (`eth_sendTransaction`), the same signing model the original deployment
//! setup used. Receipt polling retries with exponential backoff until the
//! transaction is mined.

use std::collections::BTreeMap;
use std::fs;
use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use alloy_core::primitives::{Address, keccak256};
use backon::{ExponentialBuilder, Retryable};
use k256::ecdsa::SigningKey;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, info};

use crate::args::{ArgValue, encode_call, encode_constructor};
use crate::backend::{DeployBackend, DeployRequest, Deployed};
use crate::error::DeployError;
use crate::rpc::RpcClient;

/// One byte range in the bytecode where a library address belongs.
#[derive(Debug, Clone, Deserialize)]
pub struct LinkRef {
    pub start: usize,
    pub length: usize,
}

/// The subset of a hardhat compilation artifact the deployer needs.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    pub contract_name: String,
    pub abi: Value,
    /// `0x`-prefixed creation bytecode, possibly with link placeholders.
    pub bytecode: String,
    /// `{ source file -> { library name -> offsets } }`.
    #[serde(default)]
    pub link_references: BTreeMap<String, BTreeMap<String, Vec<LinkRef>>>,
}

impl Artifact {
    /// Decodes the creation bytecode and splices in library addresses at
    /// every link-reference offset. Fails if a referenced library has no
    /// address in `libraries`.
    pub fn linked_bytecode(
        &self,
        libraries: &BTreeMap<String, Address>,
    ) -> Result<Vec<u8>, DeployError> {
        let hex_body = self.bytecode.trim_start_matches("0x");
        if hex_body.len() % 2 != 0 {
            return Err(self.malformed("bytecode hex has odd length".to_owned()));
        }
        let code_len = hex_body.len() / 2;

        // Resolve and bounds-check every link reference before touching the
        // bytecode. The creation code goes on-chain as-is, so anything that
        // does not line up exactly is an error, not a best effort.
        let mut links: Vec<(usize, Address)> = Vec::new();
        for refs in self.link_references.values() {
            for (library, offsets) in refs {
                let address = *libraries
                    .get(library)
                    .ok_or_else(|| DeployError::MissingLibrary {
                        contract: self.contract_name.clone(),
                        library: library.clone(),
                    })?;
                for link in offsets {
                    let end = link.start.checked_add(link.length);
                    if link.length != Address::len_bytes() || end.is_none_or(|e| e > code_len) {
                        return Err(self.malformed(format!(
                            "link reference for `{library}` at offset {} (length {}) \
                             does not fit the {code_len}-byte bytecode",
                            link.start, link.length,
                        )));
                    }
                    links.push((link.start, address));
                }
            }
        }

        // Placeholder pairs (`__$…$__`) are not valid hex; they may only
        // appear inside a declared link range, where the library address
        // overwrites them below.
        let in_link = |i: usize| {
            links
                .iter()
                .any(|&(start, _)| i >= start && i < start + Address::len_bytes())
        };
        let mut code = Vec::with_capacity(code_len);
        for (i, pair) in hex_body.as_bytes().chunks_exact(2).enumerate() {
            match hex::decode(pair) {
                Ok(b) => code.push(b[0]),
                Err(_) if in_link(i) => code.push(0),
                Err(_) => {
                    return Err(self.malformed(format!(
                        "link placeholder at byte {i} has no linkReferences entry"
                    )));
                }
            }
        }

        for (start, address) in links {
            code[start..start + Address::len_bytes()].copy_from_slice(address.as_slice());
        }
        Ok(code)
    }

    fn malformed(&self, reason: String) -> DeployError {
        DeployError::InvalidArtifact {
            contract: self.contract_name.clone(),
            reason,
        }
    }
}

/// Locates and parses compilation artifacts under a root directory.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Loads the artifact for `contract`. Tries `<root>/<contract>.json`
    /// first, then searches subdirectories for a matching file name.
    pub fn load(&self, contract: &str) -> Result<Artifact, DeployError> {
        let flat = self.root.join(format!("{contract}.json"));
        let path = if flat.is_file() {
            flat
        } else {
            find_artifact(&self.root, contract).ok_or_else(|| DeployError::MissingArtifact {
                contract: contract.to_owned(),
                root: self.root.clone(),
            })?
        };
        Ok(serde_json::from_slice(&fs::read(path)?)?)
    }
}

fn find_artifact(dir: &std::path::Path, contract: &str) -> Option<PathBuf> {
    let wanted = format!("{contract}.json");
    let entries = fs::read_dir(dir).ok()?;
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            // Skip hardhat debug output directories.
            if let Some(found) = find_artifact(&path, contract) {
                return Some(found);
            }
        } else if path.file_name().is_some_and(|n| n == wanted.as_str()) {
            return Some(path);
        }
    }
    None
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TxReceipt {
    status: Option<String>,
    contract_address: Option<Address>,
    block_number: Option<String>,
}

/// Deploy backend talking to an Ethereum JSON-RPC node.
pub struct EthBackend {
    rpc: RpcClient,
    gas_price: Option<u64>,
    artifacts: ArtifactStore,
}

impl EthBackend {
    pub fn new(
        rpc_url: &str,
        artifacts_root: impl Into<PathBuf>,
        gas_price: Option<u64>,
    ) -> Result<Self, DeployError> {
        Ok(Self {
            rpc: RpcClient::new(rpc_url)?,
            gas_price,
            artifacts: ArtifactStore::new(artifacts_root),
        })
    }

    async fn send_transaction(&self, mut tx: Value) -> Result<String, DeployError> {
        if let Some(price) = self.gas_price {
            tx["gasPrice"] = json!(format!("{price:#x}"));
        }
        self.rpc.call("eth_sendTransaction", vec![tx]).await
    }

    /// Polls for the receipt until the transaction is mined, backing off
    /// exponentially. A receipt with status 0 is a revert.
    async fn wait_for_receipt(&self, hash: &str) -> Result<TxReceipt, DeployError> {
        let fetch = || async {
            let receipt: Option<TxReceipt> = self
                .rpc
                .call("eth_getTransactionReceipt", vec![json!(hash)])
                .await?;
            receipt.ok_or_else(|| DeployError::TransactionPending(hash.to_owned()))
        };

        let receipt = fetch
            .retry(
                ExponentialBuilder::default()
                    .with_min_delay(Duration::from_millis(500))
                    .with_max_delay(Duration::from_secs(10))
                    .with_max_times(30),
            )
            .when(|e| matches!(e, DeployError::TransactionPending(_)))
            .await?;

        if receipt.status.as_deref() == Some("0x0") {
            return Err(DeployError::TransactionReverted {
                hash: hash.to_owned(),
            });
        }
        Ok(receipt)
    }
}

impl DeployBackend for EthBackend {
    fn deploy(
        &self,
        req: DeployRequest<'_>,
    ) -> impl Future<Output = Result<Deployed, DeployError>> + Send {
        async move {
            let artifact = self.artifacts.load(req.contract)?;
            let mut data = artifact.linked_bytecode(req.libraries)?;
            data.extend(encode_constructor(req.args));

            debug!(
                contract = req.contract,
                code_len = data.len(),
                "submitting creation transaction"
            );
            let hash = self
                .send_transaction(json!({
                    "from": req.from,
                    "data": format!("0x{}", hex::encode(&data)),
                }))
                .await?;

            let receipt = self.wait_for_receipt(&hash).await?;
            let address = receipt.contract_address.ok_or_else(|| DeployError::Rpc {
                method: "eth_getTransactionReceipt".to_owned(),
                message: format!("no contract address in receipt for {hash}"),
            })?;
            let block_number = receipt
                .block_number
                .as_deref()
                .and_then(|b| u64::from_str_radix(b.trim_start_matches("0x"), 16).ok());

            info!(contract = req.contract, %address, tx = %hash, "contract deployed");
            Ok(Deployed {
                address,
                transaction_hash: Some(hash),
                block_number,
            })
        }
    }

    fn call(
        &self,
        to: Address,
        method: &str,
        args: &[ArgValue],
        from: Address,
    ) -> impl Future<Output = Result<(), DeployError>> + Send {
        async move {
            let data = encode_call(method, args);
            let hash = self
                .send_transaction(json!({
                    "from": from,
                    "to": to,
                    "data": format!("0x{}", hex::encode(&data)),
                }))
                .await?;
            self.wait_for_receipt(&hash).await?;
            debug!(%to, method, tx = %hash, "configuration call mined");
            Ok(())
        }
    }
}

/// Derives the account address from a secp256k1 private key, matching the
/// account the node has unlocked for that key.
pub fn deployer_address(private_key: &str) -> Result<Address, DeployError> {
    let raw = hex::decode(private_key.trim_start_matches("0x"))
        .map_err(|e| DeployError::InvalidKey(e.to_string()))?;
    let key = SigningKey::from_slice(&raw).map_err(|e| DeployError::InvalidKey(e.to_string()))?;

    let point = key.verifying_key().to_encoded_point(false);
    let hash = keccak256(&point.as_bytes()[1..]);
    Ok(Address::from_slice(&hash[12..]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_known_deployer_address() {
        let address = deployer_address(
            "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80",
        )
        .unwrap();
        assert_eq!(
            address,
            "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"
                .parse::<Address>()
                .unwrap()
        );
    }

    #[test]
    fn rejects_malformed_keys() {
        assert!(matches!(
            deployer_address("0xzz"),
            Err(DeployError::InvalidKey(_))
        ));
        assert!(matches!(
            deployer_address("0x0011"),
            Err(DeployError::InvalidKey(_))
        ));
    }

    #[test]
    fn parses_artifact_and_links_library() {
        let artifact: Artifact = serde_json::from_value(json!({
            "contractName": "EvmoSwapUtils",
            "abi": [],
            "bytecode": "0x6001__$1234567890123456789012345678901234$__6002",
            "linkReferences": {
                "contracts/MathUtils.sol": {
                    "MathUtils": [{ "start": 2, "length": 20 }]
                }
            }
        }))
        .unwrap();

        let math: Address = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266".parse().unwrap();
        let mut libraries = BTreeMap::new();
        libraries.insert("MathUtils".to_owned(), math);

        let code = artifact.linked_bytecode(&libraries).unwrap();
        assert_eq!(&code[..2], &[0x60, 0x01]);
        assert_eq!(&code[2..22], math.as_slice());
        assert_eq!(&code[22..], &[0x60, 0x02]);
    }

    #[test]
    fn rejects_link_offsets_outside_the_bytecode() {
        let artifact: Artifact = serde_json::from_value(json!({
            "contractName": "EvmoSwapUtils",
            "abi": [],
            "bytecode": "0x6001",
            "linkReferences": {
                "contracts/MathUtils.sol": {
                    "MathUtils": [{ "start": 40, "length": 20 }]
                }
            }
        }))
        .unwrap();

        let mut libraries = BTreeMap::new();
        libraries.insert(
            "MathUtils".to_owned(),
            "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266".parse::<Address>().unwrap(),
        );
        assert!(matches!(
            artifact.linked_bytecode(&libraries),
            Err(DeployError::InvalidArtifact { .. })
        ));
    }

    #[test]
    fn rejects_placeholders_without_link_entries() {
        // A placeholder left over from compilation but absent from
        // linkReferences must never reach the chain as garbage bytes.
        let artifact: Artifact = serde_json::from_value(json!({
            "contractName": "EvmoSwapUtils",
            "abi": [],
            "bytecode": "0x6001__$1234567890123456789012345678901234$__6002",
            "linkReferences": {}
        }))
        .unwrap();

        assert!(matches!(
            artifact.linked_bytecode(&BTreeMap::new()),
            Err(DeployError::InvalidArtifact { .. })
        ));
    }

    #[test]
    fn missing_library_is_an_error() {
        let artifact: Artifact = serde_json::from_value(json!({
            "contractName": "EvmoSwapUtils",
            "abi": [],
            "bytecode": "0x6001__$1234567890123456789012345678901234$__6002",
            "linkReferences": {
                "contracts/MathUtils.sol": {
                    "MathUtils": [{ "start": 2, "length": 20 }]
                }
            }
        }))
        .unwrap();

        assert!(matches!(
            artifact.linked_bytecode(&BTreeMap::new()),
            Err(DeployError::MissingLibrary { .. })
        ));
    }

    #[test]
    fn artifact_store_finds_nested_files() {
        use std::fs;
        let root = tempdir::TempDir::new("artifacts").unwrap();
        let nested = root.path().join("contracts").join("EMOToken.sol");
        fs::create_dir_all(&nested).unwrap();
        fs::write(
            nested.join("EMOToken.json"),
            serde_json::to_vec(&json!({
                "contractName": "EMOToken",
                "abi": [],
                "bytecode": "0x6001"
            }))
            .unwrap(),
        )
        .unwrap();

        let store = ArtifactStore::new(root.path());
        assert_eq!(store.load("EMOToken").unwrap().contract_name, "EMOToken");
        assert!(matches!(
            store.load("Unknown"),
            Err(DeployError::MissingArtifact { .. })
        ));
    }
}
