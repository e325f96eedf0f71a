//! Configuration loading.
//!
//! Layered: built-in network defaults, then `Emoswap.toml`, then
//! `EMOSWAP_`-prefixed environment variables (`__`-separated nesting, so
//! `EMOSWAP_NETWORKS__MAINNET__PRIVATE_KEY` overrides
//! `networks.mainnet.private_key`).

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Context;
use emoswap_deploy::NetworkDescriptor;
use emoswap_deploy::steps::ProtocolParams;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub chain_id: u64,
    /// Live networks get explorer verification after each deployment.
    pub live: bool,
    pub rpc_url: String,
    /// Deployer key, normally supplied through the environment.
    pub private_key: Option<String>,
    /// Fixed gas price in wei.
    pub gas_price: Option<u64>,
    pub explorer_api_url: Option<String>,
    pub explorer_api_key: Option<String>,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            chain_id: 0,
            live: false,
            rpc_url: "http://localhost:8545".to_owned(),
            private_key: None,
            gas_price: None,
            explorer_api_url: None,
            explorer_api_key: None,
        }
    }
}

impl NetworkConfig {
    pub fn descriptor(&self, name: &str) -> NetworkDescriptor {
        NetworkDescriptor {
            name: name.to_owned(),
            chain_id: self.chain_id,
            live: self.live,
            rpc_url: self.rpc_url.clone(),
            gas_price: self.gas_price,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Root of the per-network deployment record directories.
    pub deployments_dir: PathBuf,
    /// Root of the compiled contract artifacts.
    pub artifacts_dir: PathBuf,
    pub networks: BTreeMap<String, NetworkConfig>,
    pub protocol: ProtocolParams,
}

impl Default for AppConfig {
    fn default() -> Self {
        let mut networks = BTreeMap::new();
        networks.insert(
            "mainnet".to_owned(),
            NetworkConfig {
                chain_id: 9001,
                rpc_url: "https://eth.bd.evmos.org:8545".to_owned(),
                gas_price: Some(5_000_000_000),
                ..NetworkConfig::default()
            },
        );
        networks.insert(
            "testnet".to_owned(),
            NetworkConfig {
                chain_id: 9000,
                rpc_url: "https://eth.bd.evmos.dev:8545".to_owned(),
                ..NetworkConfig::default()
            },
        );
        networks.insert(
            "bsctest".to_owned(),
            NetworkConfig {
                chain_id: 97,
                live: true,
                rpc_url: "https://data-seed-prebsc-1-s1.binance.org:8545".to_owned(),
                ..NetworkConfig::default()
            },
        );

        Self {
            deployments_dir: PathBuf::from("build/deployments"),
            artifacts_dir: PathBuf::from("build/artifacts"),
            networks,
            protocol: ProtocolParams::default(),
        }
    }
}

impl AppConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed("EMOSWAP_").split("__"))
            .extract()
            .with_context(|| format!("Failed to load configuration from {}", path.display()))
    }

    /// The configuration block for a network, which must be declared.
    pub fn network(&self, name: &str) -> anyhow::Result<&NetworkConfig> {
        self.networks
            .get(name)
            .with_context(|| format!("Network `{name}` is not declared in the configuration"))
    }
}
