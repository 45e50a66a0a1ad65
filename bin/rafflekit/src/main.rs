//! rafflekit deploys a VRF-backed raffle, mocking its oracle on local chains.

mod cli;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use comfy_table::{Table, presets::UTF8_FULL};

use cli::Cli;
use rafflekit_deploy::{Deployer, NetworkClass, NetworkRegistry, RAFFLEKIT_FILENAME, RunReport};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize the logger.
    tracing_subscriber::fmt()
        .with_max_level(cli.verbosity)
        .init();

    let config_path = cli.config.clone().or_else(|| {
        let default = PathBuf::from(RAFFLEKIT_FILENAME);
        default.exists().then_some(default)
    });

    let registry = NetworkRegistry::load(config_path.as_deref())
        .context("Failed to load network configuration")?;

    if cli.list_networks {
        print_networks(&registry)?;
        return Ok(());
    }

    let mut deployer =
        Deployer::load(config_path.as_deref()).context("Failed to load run configuration")?;

    if let Some(network) = cli.network {
        deployer.network = Some(network);
    }
    if let Some(tags) = cli.tags {
        deployer.tags = tags;
    }
    if let Some(rpc_url) = cli.rpc_url {
        deployer.rpc_url = Some(rpc_url);
    }
    if let Some(artifacts) = cli.artifacts {
        deployer.artifacts = artifacts;
    }
    if let Some(deployments) = cli.deployments {
        deployer.deployments = deployments;
    }

    if let Some(path) = &cli.write_config {
        deployer.save_to_file(path)?;
        return Ok(());
    }

    tracing::info!(
        config_path = ?config_path,
        network = deployer.network.as_deref().unwrap_or("<from chain id>"),
        "Loading deployment configuration..."
    );

    let report = deployer.deploy(&registry).await?;
    print_report(&report);

    Ok(())
}

fn print_networks(registry: &NetworkRegistry) -> Result<()> {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header([
        "network",
        "chain id",
        "kind",
        "coordinator",
        "subscription",
        "confirmations",
    ]);

    for config in registry.validate_all()? {
        let (kind, coordinator, subscription) = match config.class {
            NetworkClass::Simulated => ("simulated", "mock".to_string(), "created".to_string()),
            NetworkClass::Live {
                vrf_coordinator,
                subscription_id,
            } => ("live", vrf_coordinator.to_string(), subscription_id.to_string()),
        };
        table.add_row([
            config.name,
            config.chain_id.to_string(),
            kind.to_string(),
            coordinator,
            subscription,
            config.block_confirmations.to_string(),
        ]);
    }

    println!("{table}");
    Ok(())
}

fn print_report(report: &RunReport) {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(["step", "result"]);

    table.add_row(["network".to_string(), report.network.clone()]);
    if let Some(mock) = &report.mock {
        table.add_row(["coordinator mock".to_string(), mock.address.to_string()]);
    }
    if let Some(subscription) = &report.subscription {
        let funded = subscription
            .funded
            .map(|amount| format!(" (funded {amount})"))
            .unwrap_or_default();
        table.add_row([
            "subscription".to_string(),
            format!("{}{funded}", subscription.id),
        ]);
    }
    if let Some(raffle) = &report.raffle {
        let state = if raffle.newly_deployed {
            "deployed"
        } else {
            "reused"
        };
        table.add_row([
            "raffle".to_string(),
            format!("{} ({state})", raffle.address),
        ]);
    }
    table.add_row([
        "verification".to_string(),
        report.verification.to_string(),
    ]);
    table.add_row([
        "stages".to_string(),
        report
            .stages
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" → "),
    ]);

    println!("{table}");
}
