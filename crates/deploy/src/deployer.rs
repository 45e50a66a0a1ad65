use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
    time::Duration,
};

use alloy_core::primitives::U256;
use anyhow::{Context, Result};
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::{
    artifacts::{Artifacts, DEFAULT_ARTIFACTS_DIR},
    config::{ENV_PREFIX, LOCAL_RPC_URL, NetworkConfig, NetworkRegistry},
    contracts::{RAFFLE, VRF_COORDINATOR_MOCK, VRF_SUB_FUND_AMOUNT},
    error::{ConfigurationError, EnvironmentError},
    pipeline::{DeployTag, NetworkDescriptor, Pipeline, RunReport},
    rpc::{DEFAULT_CONFIRMATION_TIMEOUT, EthClient},
    services::{
        DEFAULT_DEPLOYMENTS_DIR, EtherscanVerifier, FileDeployments, NamedAccount, RpcAccounts,
        RpcOracle, default_named_accounts,
    },
    stages::MockParams,
};

/// The default name for the rafflekit configuration file.
pub const RAFFLEKIT_FILENAME: &str = "Rafflekit.toml";

/// Run configuration: which network to provision, with which inputs.
///
/// Lives next to the `[networks.*]` tables in `Rafflekit.toml` and can be
/// overridden with `RAFFLE_`-prefixed environment variables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Deployer {
    /// Name of the target network record. Unset means the record whose
    /// chain id the node reports.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,
    /// JSON-RPC endpoint, overriding the network record's.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rpc_url: Option<Url>,
    /// Root of the compilation artifacts.
    pub artifacts: PathBuf,
    /// Root of the per-network deployment records.
    pub deployments: PathBuf,
    /// Deploy units to run.
    pub tags: Vec<DeployTag>,
    /// Amount funded into a locally created subscription, in juels.
    pub fund_amount: U256,
    /// Upper bound on waiting for a transaction's confirmations.
    pub confirmation_timeout_secs: u64,
    /// Coordinator mock constructor parameters.
    pub mocks: MockParams,
    pub named_accounts: BTreeMap<String, NamedAccount>,
}

impl Default for Deployer {
    fn default() -> Self {
        Self {
            network: None,
            rpc_url: None,
            artifacts: PathBuf::from(DEFAULT_ARTIFACTS_DIR),
            deployments: PathBuf::from(DEFAULT_DEPLOYMENTS_DIR),
            tags: vec![DeployTag::All],
            fund_amount: VRF_SUB_FUND_AMOUNT,
            confirmation_timeout_secs: DEFAULT_CONFIRMATION_TIMEOUT.as_secs(),
            mocks: MockParams::default(),
            named_accounts: default_named_accounts(),
        }
    }
}

impl Deployer {
    /// Layer the defaults, an optional TOML file and the environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigurationError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(path) = path {
            figment = figment.merge(Toml::file(path));
        }

        Ok(figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()?)
    }

    /// Save the configuration to a TOML file.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let content =
            toml::to_string_pretty(self).context("Failed to serialize deployer config to TOML")?;
        std::fs::write(path, content)
            .context(format!("Failed to write config to {}", path.display()))?;
        tracing::info!(path = %path.display(), "Configuration saved");
        Ok(())
    }

    /// Load the configuration from a TOML file, or from the
    /// [`RAFFLEKIT_FILENAME`] inside a directory.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(anyhow::anyhow!(
                "Configuration file or directory not found: {}",
                path.display()
            ));
        }

        let config_path = if path.is_dir() {
            path.join(RAFFLEKIT_FILENAME)
        } else {
            path.to_path_buf()
        };

        let content = std::fs::read_to_string(&config_path)
            .context(format!("Failed to read config from {}", config_path.display()))?;
        let config: Self =
            toml::from_str(&content).context("Failed to parse config file as TOML")?;
        tracing::info!(path = %config_path.display(), "Configuration loaded");
        Ok(config)
    }

    /// Contracts whose artifacts the selected units need on `config`.
    fn required_artifacts(&self, config: &NetworkConfig) -> Vec<&'static str> {
        let mut names = Vec::new();
        if config.is_simulated() && DeployTag::selects(&self.tags, DeployTag::Mocks) {
            names.push(VRF_COORDINATOR_MOCK);
        }
        if DeployTag::selects(&self.tags, DeployTag::Raffle) {
            names.push(RAFFLE);
        }
        names
    }

    fn check_artifacts(
        &self,
        artifacts: &Artifacts,
        config: &NetworkConfig,
    ) -> Result<(), ConfigurationError> {
        for name in self.required_artifacts(config) {
            artifacts.find(name)?;
        }
        Ok(())
    }

    /// Provision the configured network.
    ///
    /// With a named network, configuration problems (unknown network,
    /// incomplete record, missing artifacts) surface before the node is
    /// contacted. Without one, the node's chain id picks the record.
    pub async fn deploy(&self, registry: &NetworkRegistry) -> Result<RunReport> {
        let artifacts = Artifacts::new(&self.artifacts);

        let named = self
            .network
            .as_deref()
            .map(|name| registry.resolve(name))
            .transpose()?;

        let rpc_url = match &named {
            Some(config) => {
                self.check_artifacts(&artifacts, config)?;
                self.rpc_url
                    .clone()
                    .or_else(|| config.rpc_url.clone())
                    .ok_or_else(|| ConfigurationError::MissingField {
                        network: config.name.clone(),
                        field: "rpc_url",
                    })?
            }
            None => match &self.rpc_url {
                Some(url) => url.clone(),
                None => Url::parse(LOCAL_RPC_URL).context("Invalid local RPC URL")?,
            },
        };

        let client = EthClient::new(rpc_url.clone())?
            .with_confirmation_timeout(Duration::from_secs(self.confirmation_timeout_secs));

        let chain_id = client
            .chain_id()
            .await
            .map_err(|e| EnvironmentError::NetworkUnavailable(e.to_string()))?;

        let config = match named {
            Some(config) => config,
            None => {
                let config = registry.resolve_chain_id(chain_id)?;
                tracing::info!(network = %config.name, chain_id, "Network detected from the node");
                self.check_artifacts(&artifacts, &config)?;
                config
            }
        };

        tracing::info!(
            network = %config.name,
            rpc_url = %rpc_url,
            tags = ?self.tags,
            "Starting deployment..."
        );

        let descriptor = NetworkDescriptor::new(&config, chain_id);

        let book = FileDeployments::new(
            client.clone(),
            artifacts.clone(),
            &self.deployments,
            &config.name,
        );
        let oracle = RpcOracle::new(client.clone(), descriptor.block_confirmations);
        let accounts = RpcAccounts::new(client, self.named_accounts.clone());
        let verifier = EtherscanVerifier::from_env(
            &config.name,
            config.chain_id,
            config.explorer_api_url.clone(),
            artifacts,
        )?;

        let report = Pipeline::new(book, oracle, accounts, verifier)
            .with_mock_params(self.mocks)
            .with_fund_amount(self.fund_amount)
            .run(registry, &descriptor, &self.tags)
            .await
            .context(format!("Deployment to '{}' failed", config.name))?;

        tracing::info!("✓ Deployment complete!");
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::{Method::POST, MockServer};
    use tempdir::TempDir;

    #[test]
    fn test_config_save_and_load() {
        let temp_dir = TempDir::new("rafflekit-test").expect("Failed to create temp dir");
        let path = temp_dir.path().join(RAFFLEKIT_FILENAME);

        let original = Deployer {
            network: Some("sepolia".to_string()),
            tags: vec![DeployTag::Raffle],
            fund_amount: U256::from(5u8),
            ..Default::default()
        };
        original.save_to_file(&path).expect("Failed to save config");

        let loaded = Deployer::load_from_file(temp_dir.path()).expect("Failed to load config");
        assert_eq!(original, loaded, "Loaded config should match original");
    }

    #[test]
    fn test_load_from_missing_path_fails() {
        let temp_dir = TempDir::new("rafflekit-test").expect("Failed to create temp dir");
        assert!(Deployer::load_from_file(&temp_dir.path().join("nope.toml")).is_err());
    }

    #[test]
    fn test_layered_load_merges_partial_file() {
        let temp_dir = TempDir::new("rafflekit-test").expect("Failed to create temp dir");
        let path = temp_dir.path().join(RAFFLEKIT_FILENAME);
        std::fs::write(
            &path,
            r#"
network = "localhost"
tags = ["mocks"]

[networks.localhost]
interval = 60
"#,
        )
        .unwrap();

        let deployer = Deployer::load(Some(&path)).unwrap();
        assert_eq!(deployer.network.as_deref(), Some("localhost"));
        assert_eq!(deployer.tags, vec![DeployTag::Mocks]);
        assert_eq!(deployer.fund_amount, VRF_SUB_FUND_AMOUNT);
        assert_eq!(deployer.named_accounts, default_named_accounts());
    }

    #[test]
    fn test_required_artifacts_follow_tags() {
        let registry = NetworkRegistry::builtin();
        let hardhat = registry.resolve("hardhat").unwrap();
        let sepolia = registry.resolve("sepolia").unwrap();

        let all = Deployer::default();
        assert_eq!(all.required_artifacts(&hardhat), [VRF_COORDINATOR_MOCK, RAFFLE]);
        assert_eq!(all.required_artifacts(&sepolia), [RAFFLE]);

        let mocks = Deployer {
            tags: vec![DeployTag::Mocks],
            ..Default::default()
        };
        assert_eq!(mocks.required_artifacts(&hardhat), [VRF_COORDINATOR_MOCK]);
        assert!(mocks.required_artifacts(&sepolia).is_empty());
    }

    #[tokio::test]
    async fn test_unknown_network_fails_before_rpc() {
        let deployer = Deployer {
            network: Some("mars".to_string()),
            ..Default::default()
        };

        let err = deployer
            .deploy(&NetworkRegistry::builtin())
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConfigurationError>(),
            Some(ConfigurationError::UnknownNetwork(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_artifacts_fail_before_rpc() {
        let temp_dir = TempDir::new("rafflekit-test").expect("Failed to create temp dir");
        let deployer = Deployer {
            network: Some("hardhat".to_string()),
            artifacts: temp_dir.path().join("artifacts"),
            rpc_url: Some("http://127.0.0.1:1/".parse().unwrap()),
            ..Default::default()
        };

        let err = deployer
            .deploy(&NetworkRegistry::builtin())
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConfigurationError>(),
            Some(ConfigurationError::Artifact { .. })
        ));
    }

    async fn chain_id_node(chain_id: &str) -> MockServer {
        let server = MockServer::start_async().await;
        let chain_id = chain_id.to_string();
        server
            .mock_async(move |when, then| {
                when.method(POST).body_contains(r#""method":"eth_chainId""#);
                then.status(200)
                    .json_body(serde_json::json!({ "jsonrpc": "2.0", "id": 1, "result": chain_id }));
            })
            .await;
        server
    }

    #[tokio::test]
    async fn test_unnamed_network_is_detected_from_chain_id() {
        let temp_dir = TempDir::new("rafflekit-test").expect("Failed to create temp dir");
        let server = chain_id_node("0x7a69").await;
        let deployer = Deployer {
            artifacts: temp_dir.path().join("artifacts"),
            rpc_url: Some(server.base_url().parse().unwrap()),
            ..Default::default()
        };

        let err = deployer
            .deploy(&NetworkRegistry::builtin())
            .await
            .unwrap_err();

        // 31337 resolves to the simulated hardhat record, which needs the mock.
        assert!(matches!(
            err.downcast_ref::<ConfigurationError>(),
            Some(ConfigurationError::Artifact { name, .. }) if name == VRF_COORDINATOR_MOCK
        ));
    }

    #[tokio::test]
    async fn test_unnamed_network_with_unknown_chain_id_fails() {
        let server = chain_id_node("0x5").await;
        let deployer = Deployer {
            rpc_url: Some(server.base_url().parse().unwrap()),
            ..Default::default()
        };

        let err = deployer
            .deploy(&NetworkRegistry::builtin())
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConfigurationError>(),
            Some(ConfigurationError::UnknownChainId(5))
        ));
    }
}
