//! emoswap is a CLI tool to deploy and manage the EvmoSwap protocol contracts.

mod cli;
mod config;

use anyhow::{Context, Result, bail};
use clap::Parser;
use comfy_table::{Table, presets::UTF8_FULL};

use cli::{Cli, Command, Network};
use config::{AppConfig, NetworkConfig};
use emoswap_deploy::runner::{execution_order, select_steps};
use emoswap_deploy::steps::protocol_steps;
use emoswap_deploy::{
    AddressBook, DeployBackend, DeployRunner, EthBackend, ExplorerVerifier, Ledger, RunOptions,
    VerifyBackend, deployer_address,
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize the logger.
    tracing_subscriber::fmt()
        .with_max_level(cli.verbosity)
        .init();

    let config = AppConfig::load(&cli.config)?;

    match cli.command {
        Command::Run {
            network,
            tags,
            force,
        } => run(&config, &network, tags, force).await,
        Command::Plan { network, tags } => plan(&config, &network, tags),
        Command::Addresses { network } => addresses(&config, &network),
        Command::Verify { network, name } => verify(&config, &network, &name).await,
        Command::Call {
            network,
            name,
            method,
            args,
        } => call(&config, &network, &name, &method, args).await,
    }
}

fn private_key<'c>(net: &'c NetworkConfig, name: &str) -> Result<&'c str> {
    net.private_key
        .as_deref()
        .with_context(|| format!("No private key configured for network `{name}`"))
}

fn verifier_for(net: &NetworkConfig) -> Result<Option<ExplorerVerifier>> {
    let Some(api_url) = net.explorer_api_url.as_deref() else {
        return Ok(None);
    };
    let api_key = net.explorer_api_key.clone().unwrap_or_default();
    Ok(Some(ExplorerVerifier::new(api_url, api_key)?))
}

async fn run(config: &AppConfig, network: &Network, tags: Vec<String>, force: bool) -> Result<()> {
    let name = network.to_string();
    let net_config = config.network(&name)?;
    let descriptor = net_config.descriptor(&name);

    let deployer = deployer_address(private_key(net_config, &name)?)?;
    let backend = EthBackend::new(
        &descriptor.rpc_url,
        &config.artifacts_dir,
        descriptor.gas_price,
    )?;
    let mut ledger = Ledger::open(&config.deployments_dir, &name)?;
    let steps = protocol_steps(&config.protocol);
    let opts = RunOptions { tags, force };

    tracing::info!(network = %name, %deployer, "Starting deployment...");
    let report = match verifier_for(net_config)? {
        Some(verifier) => {
            DeployRunner::new(&descriptor, deployer, &mut ledger, &backend)
                .with_verifier(&verifier)
                .run(&steps, &opts)
                .await?
        }
        None => {
            DeployRunner::new(&descriptor, deployer, &mut ledger, &backend)
                .run(&steps, &opts)
                .await?
        }
    };

    println!("{}", report.table());
    if let Some(failed) = &report.failure {
        bail!("Deployment halted at step `{failed}`");
    }
    Ok(())
}

fn plan(config: &AppConfig, network: &Network, tags: Vec<String>) -> Result<()> {
    let name = network.to_string();
    config.network(&name)?;

    let steps = protocol_steps(&config.protocol);
    let selected = select_steps(&steps, &tags)?;
    let ordered = execution_order(&selected)?;

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec!["#", "Step", "Contract", "Applies"]);
    for (i, step) in ordered.iter().enumerate() {
        let applies = if step.networks.matches(&name) { "yes" } else { "no" };
        table.add_row(vec![
            (i + 1).to_string(),
            step.name.clone(),
            step.contract.clone(),
            applies.to_owned(),
        ]);
    }
    println!("{table}");
    Ok(())
}

fn addresses(config: &AppConfig, network: &Network) -> Result<()> {
    let name = network.to_string();
    let book = AddressBook::load(&config.deployments_dir, &name)?;

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec!["Name", "Contract", "Address", "Deployed"]);
    for record in book.list() {
        table.add_row(vec![
            record.name.clone(),
            record.contract.clone(),
            record.address.to_string(),
            record.deployed_at.to_rfc3339(),
        ]);
    }
    println!("{table}");
    Ok(())
}

async fn verify(config: &AppConfig, network: &Network, name: &str) -> Result<()> {
    let net_name = network.to_string();
    let net_config = config.network(&net_name)?;
    let verifier = verifier_for(net_config)?
        .with_context(|| format!("No explorer configured for network `{net_name}`"))?;

    let book = AddressBook::load(&config.deployments_dir, &net_name)?;
    let record = book.get(name)?;

    verifier
        .verify(record.address, &record.contract, &record.constructor_args)
        .await?;
    tracing::info!(name, address = %record.address, "Verification submitted");
    Ok(())
}

async fn call(
    config: &AppConfig,
    network: &Network,
    name: &str,
    method: &str,
    args: Vec<emoswap_deploy::ArgValue>,
) -> Result<()> {
    let net_name = network.to_string();
    let net_config = config.network(&net_name)?;
    let descriptor = net_config.descriptor(&net_name);

    let from = deployer_address(private_key(net_config, &net_name)?)?;
    let backend = EthBackend::new(
        &descriptor.rpc_url,
        &config.artifacts_dir,
        descriptor.gas_price,
    )?;

    let book = AddressBook::load(&config.deployments_dir, &net_name)?;
    let to = book.resolve(name)?;

    backend.call(to, method, &args, from).await?;
    tracing::info!(name, method, %to, "Call mined");
    Ok(())
}
