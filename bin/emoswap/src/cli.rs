use std::path::PathBuf;

use clap::{Parser, Subcommand};
use emoswap_deploy::ArgValue;
use tracing::level_filters::LevelFilter;

/// A named target network. The well-known networks map to the configuration
/// defaults; anything else must be declared in the configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[strum(serialize_all = "kebab-case")]
pub enum Network {
    Mainnet,
    Testnet,
    Bsctest,
    #[strum(default)]
    Custom(String),
}

#[derive(Parser)]
#[command(name = "emoswap")]
#[command(author, version, about = "Deploy and manage the EvmoSwap protocol contracts")]
pub struct Cli {
    /// The verbosity level.
    #[arg(short, long, env = "EMOSWAP_VERBOSITY", default_value_t = LevelFilter::INFO, global = true)]
    pub verbosity: LevelFilter,

    /// Path to the configuration file.
    #[arg(short, long, alias = "conf", env = "EMOSWAP_CONFIG", default_value = "Emoswap.toml", global = true)]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the deployment steps against a network.
    Run {
        /// The target network.
        #[arg(short, long, env = "EMOSWAP_NETWORK")]
        network: Network,

        /// Restrict the run to steps with these tags (dependencies are
        /// pulled in automatically).
        #[arg(short, long)]
        tags: Vec<String>,

        /// Redeploy steps that already have a record, overwriting it.
        #[arg(long, default_value_t = false)]
        force: bool,
    },

    /// Print the execution order without touching the network.
    Plan {
        /// The target network.
        #[arg(short, long, env = "EMOSWAP_NETWORK")]
        network: Network,

        #[arg(short, long)]
        tags: Vec<String>,
    },

    /// List the recorded deployments for a network.
    Addresses {
        /// The target network.
        #[arg(short, long, env = "EMOSWAP_NETWORK")]
        network: Network,
    },

    /// Re-submit explorer verification for a recorded contract.
    Verify {
        /// The target network.
        #[arg(short, long, env = "EMOSWAP_NETWORK")]
        network: Network,

        /// Ledger name of the contract to verify.
        name: String,
    },

    /// Invoke a state-mutating method on a recorded contract.
    Call {
        /// The target network.
        #[arg(short, long, env = "EMOSWAP_NETWORK")]
        network: Network,

        /// Ledger name of the target contract.
        name: String,

        /// Method name, e.g. `setRewardPool`.
        method: String,

        /// Arguments as `type:value` pairs, e.g. `address:0xabc…` `uint:800`.
        #[arg(short, long)]
        args: Vec<ArgValue>,
    },
}
