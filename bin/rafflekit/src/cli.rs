use std::path::PathBuf;

use clap::Parser;
use rafflekit_deploy::DeployTag;
use tracing::level_filters::LevelFilter;
use url::Url;

#[derive(Parser)]
#[command(name = "rafflekit")]
#[command(
    author,
    version,
    about = "Deploy the VRF raffle and its randomness oracle dependencies"
)]
pub struct Cli {
    /// The verbosity level.
    #[arg(short, long, env = "RAFFLE_VERBOSITY", default_value_t = LevelFilter::INFO)]
    pub verbosity: LevelFilter,

    /// Path to a Rafflekit.toml configuration file.
    ///
    /// Defaults to ./Rafflekit.toml when it exists. Values can also be
    /// overridden with RAFFLE_-prefixed environment variables
    /// (e.g. RAFFLE_NETWORKS__SEPOLIA__SUBSCRIPTION_ID).
    #[arg(long, alias = "conf", env = "RAFFLE_CONFIG")]
    pub config: Option<PathBuf>,

    /// The network to deploy to (e.g. hardhat, localhost, sepolia).
    ///
    /// Without one, the network whose chain id the node reports is used.
    #[arg(short, long)]
    pub network: Option<String>,

    /// Deploy units to run, comma separated.
    #[arg(short, long, value_delimiter = ',')]
    pub tags: Option<Vec<DeployTag>>,

    /// The URL of the JSON-RPC endpoint, overriding the network's.
    #[arg(long, alias = "rpc")]
    pub rpc_url: Option<Url>,

    /// Root of the compilation artifacts.
    #[arg(long)]
    pub artifacts: Option<PathBuf>,

    /// Root of the deployment records.
    #[arg(long)]
    pub deployments: Option<PathBuf>,

    /// Print the known networks and exit.
    #[arg(long)]
    pub list_networks: bool,

    /// Write the resolved run configuration to this path and exit.
    #[arg(long)]
    pub write_config: Option<PathBuf>,
}
