//! Network configuration records and the resolver that validates them.
//!
//! Records are layered with figment: the built-in table below, then an optional
//! TOML file, then `RAFFLE_`-prefixed environment variables
//! (e.g. `RAFFLE_NETWORKS__SEPOLIA__SUBSCRIPTION_ID=1234`).

use std::{collections::BTreeMap, path::Path};

use alloy_core::primitives::{Address, B256, U256, address, b256};
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::{error::ConfigurationError, types::SubscriptionId};

/// Network names treated as simulated when a record does not set `kind`.
pub const DEVELOPMENT_CHAINS: &[&str] = &["hardhat", "localhost"];

/// Confirmation depth used on live networks so the explorer has indexed the
/// contract by the time verification is submitted.
pub const VERIFICATION_BLOCK_CONFIRMATIONS: u64 = 6;

/// Confirmation depth when a record does not specify one.
pub const DEFAULT_BLOCK_CONFIRMATIONS: u64 = 1;

/// Default JSON-RPC endpoint of a local development node.
pub const LOCAL_RPC_URL: &str = "http://127.0.0.1:8545/";

/// Multichain Etherscan endpoint; the target is picked by `chainid`.
pub const ETHERSCAN_V2_API_URL: &str = "https://api.etherscan.io/v2/api";

/// Environment prefix for configuration overrides.
pub const ENV_PREFIX: &str = "RAFFLE_";

/// The 30 gwei key hash, shared by the built-in records.
const DEFAULT_GAS_LANE: B256 =
    b256!("474e34a077df58807dbe9c96d3c009b23b3c6d0cce433e59bbf5b34f823bc56c");

const SEPOLIA_VRF_COORDINATOR: Address = address!("8103B0A8A00be2DDC778e6e7eaa21791Cd364625");

/// 0.01 ether.
const DEFAULT_ENTRANCE_FEE: u64 = 10_000_000_000_000_000;
const DEFAULT_CALLBACK_GAS_LIMIT: u32 = 500_000;
const DEFAULT_INTERVAL: u64 = 30;

/// Explicit classification of a network record.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum NetworkKind {
    Simulated,
    Live,
}

/// Raw network record as it appears in configuration sources.
///
/// Every field is optional here; [`NetworkRegistry::resolve`] decides which
/// ones the record's classification requires.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<u64>,
    /// Classification. Falls back to [`DEVELOPMENT_CHAINS`] membership.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<NetworkKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vrf_coordinator: Option<Address>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gas_lane: Option<B256>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callback_gas_limit: Option<u32>,
    /// Keepers update interval, in seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interval: Option<u64>,
    /// Entrance fee, in wei.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entrance_fee: Option<U256>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_confirmations: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rpc_url: Option<Url>,
    /// Etherscan-compatible API endpoint used for source verification. The
    /// network's chain id is sent along, as the V2 API serves every chain.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explorer_api_url: Option<Url>,
}

/// Classification of a resolved network.
///
/// Live-only parameters live inside the `Live` variant, so a simulated record
/// cannot carry them and a live record cannot lack them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkClass {
    Simulated,
    Live {
        vrf_coordinator: Address,
        subscription_id: SubscriptionId,
    },
}

/// A fully validated network configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkConfig {
    pub name: String,
    pub chain_id: u64,
    pub class: NetworkClass,
    pub gas_lane: B256,
    pub callback_gas_limit: u32,
    pub interval: u64,
    pub entrance_fee: U256,
    pub block_confirmations: u64,
    pub rpc_url: Option<Url>,
    pub explorer_api_url: Option<Url>,
}

impl NetworkConfig {
    pub fn is_simulated(&self) -> bool {
        matches!(self.class, NetworkClass::Simulated)
    }
}

/// All known network records, keyed by network name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkRegistry {
    #[serde(default)]
    pub networks: BTreeMap<String, NetworkEntry>,
}

impl Default for NetworkRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl NetworkRegistry {
    /// The records shipped with the tool.
    pub fn builtin() -> Self {
        let local = |name: &str| {
            (
                name.to_string(),
                NetworkEntry {
                    chain_id: Some(31337),
                    kind: Some(NetworkKind::Simulated),
                    gas_lane: Some(DEFAULT_GAS_LANE),
                    callback_gas_limit: Some(DEFAULT_CALLBACK_GAS_LIMIT),
                    interval: Some(DEFAULT_INTERVAL),
                    entrance_fee: Some(U256::from(DEFAULT_ENTRANCE_FEE)),
                    block_confirmations: Some(DEFAULT_BLOCK_CONFIRMATIONS),
                    rpc_url: Url::parse(LOCAL_RPC_URL).ok(),
                    ..Default::default()
                },
            )
        };

        let sepolia = (
            "sepolia".to_string(),
            NetworkEntry {
                chain_id: Some(11155111),
                kind: Some(NetworkKind::Live),
                vrf_coordinator: Some(SEPOLIA_VRF_COORDINATOR),
                gas_lane: Some(DEFAULT_GAS_LANE),
                subscription_id: Some(588),
                callback_gas_limit: Some(DEFAULT_CALLBACK_GAS_LIMIT),
                interval: Some(DEFAULT_INTERVAL),
                entrance_fee: Some(U256::from(DEFAULT_ENTRANCE_FEE)),
                block_confirmations: Some(VERIFICATION_BLOCK_CONFIRMATIONS),
                rpc_url: None,
                explorer_api_url: Url::parse(ETHERSCAN_V2_API_URL).ok(),
            },
        );

        Self {
            networks: [local("hardhat"), local("localhost"), sepolia]
                .into_iter()
                .collect(),
        }
    }

    /// Layer the built-in records, an optional TOML file and the environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigurationError> {
        let mut figment = Figment::from(Serialized::defaults(Self::builtin()));

        if let Some(path) = path {
            if !path.exists() {
                return Err(ConfigurationError::Load(format!(
                    "configuration file not found: {}",
                    path.display()
                )));
            }
            figment = figment.merge(Toml::file(path));
        }

        let registry: Self = figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()?;

        tracing::debug!(
            networks = ?registry.networks.keys().collect::<Vec<_>>(),
            "Network configuration loaded"
        );

        Ok(registry)
    }

    /// Resolve a network name into a validated configuration.
    pub fn resolve(&self, name: &str) -> Result<NetworkConfig, ConfigurationError> {
        let entry = self
            .networks
            .get(name)
            .ok_or_else(|| ConfigurationError::UnknownNetwork(name.to_string()))?;

        Self::validate(name, entry)
    }

    /// Resolve the first record (in name order) matching a chain id.
    pub fn resolve_chain_id(&self, chain_id: u64) -> Result<NetworkConfig, ConfigurationError> {
        let (name, entry) = self
            .networks
            .iter()
            .find(|(_, entry)| entry.chain_id == Some(chain_id))
            .ok_or(ConfigurationError::UnknownChainId(chain_id))?;

        Self::validate(name, entry)
    }

    /// Validate every record, failing on the first incomplete one.
    pub fn validate_all(&self) -> Result<Vec<NetworkConfig>, ConfigurationError> {
        self.networks
            .iter()
            .map(|(name, entry)| Self::validate(name, entry))
            .collect()
    }

    fn validate(name: &str, entry: &NetworkEntry) -> Result<NetworkConfig, ConfigurationError> {
        fn required<T: Copy>(
            network: &str,
            field: &'static str,
            value: Option<T>,
        ) -> Result<T, ConfigurationError> {
            value.ok_or_else(|| ConfigurationError::MissingField {
                network: network.to_string(),
                field,
            })
        }

        let kind = entry.kind.unwrap_or(if DEVELOPMENT_CHAINS.contains(&name) {
            NetworkKind::Simulated
        } else {
            NetworkKind::Live
        });

        let class = match kind {
            NetworkKind::Simulated => {
                let derived = [
                    ("vrf_coordinator", entry.vrf_coordinator.is_some()),
                    ("subscription_id", entry.subscription_id.is_some()),
                ];
                if let Some((field, _)) = derived.into_iter().find(|(_, set)| *set) {
                    return Err(ConfigurationError::UnexpectedField {
                        network: name.to_string(),
                        field,
                    });
                }
                NetworkClass::Simulated
            }
            NetworkKind::Live => NetworkClass::Live {
                vrf_coordinator: required(name, "vrf_coordinator", entry.vrf_coordinator)?,
                subscription_id: required(name, "subscription_id", entry.subscription_id)?
                    .into(),
            },
        };

        Ok(NetworkConfig {
            name: name.to_string(),
            chain_id: required(name, "chain_id", entry.chain_id)?,
            class,
            gas_lane: required(name, "gas_lane", entry.gas_lane)?,
            callback_gas_limit: required(name, "callback_gas_limit", entry.callback_gas_limit)?,
            interval: required(name, "interval", entry.interval)?,
            entrance_fee: required(name, "entrance_fee", entry.entrance_fee)?,
            block_confirmations: entry
                .block_confirmations
                .unwrap_or(DEFAULT_BLOCK_CONFIRMATIONS),
            rpc_url: entry.rpc_url.clone(),
            explorer_api_url: entry.explorer_api_url.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempdir::TempDir;

    #[test]
    fn test_builtin_records_are_complete() {
        let registry = NetworkRegistry::builtin();
        let configs = registry.validate_all().expect("built-in records should validate");
        assert_eq!(configs.len(), 3);

        for config in configs {
            assert_ne!(config.chain_id, 0);
            assert_ne!(config.gas_lane, B256::ZERO);
            assert!(config.callback_gas_limit > 0);
            assert!(config.interval > 0);
            assert!(config.entrance_fee > U256::ZERO);
            assert!(config.block_confirmations >= 1);
            if let NetworkClass::Live {
                vrf_coordinator, ..
            } = config.class
            {
                assert_ne!(vrf_coordinator, Address::ZERO);
            }
        }
    }

    #[test]
    fn test_resolve_development_chains_as_simulated() {
        let registry = NetworkRegistry::builtin();
        for name in DEVELOPMENT_CHAINS {
            let config = registry.resolve(name).unwrap();
            assert!(config.is_simulated(), "{name} should be simulated");
        }
    }

    #[test]
    fn test_resolve_sepolia_as_live() {
        let config = NetworkRegistry::builtin().resolve("sepolia").unwrap();
        assert_eq!(
            config.class,
            NetworkClass::Live {
                vrf_coordinator: SEPOLIA_VRF_COORDINATOR,
                subscription_id: SubscriptionId(588),
            }
        );
        assert_eq!(config.block_confirmations, VERIFICATION_BLOCK_CONFIRMATIONS);
    }

    #[test]
    fn test_resolve_unknown_network() {
        let err = NetworkRegistry::builtin().resolve("mars").unwrap_err();
        assert!(matches!(err, ConfigurationError::UnknownNetwork(name) if name == "mars"));
    }

    #[test]
    fn test_live_record_without_subscription_fails() {
        let mut registry = NetworkRegistry::builtin();
        registry
            .networks
            .get_mut("sepolia")
            .unwrap()
            .subscription_id = None;

        let err = registry.resolve("sepolia").unwrap_err();
        assert!(matches!(
            err,
            ConfigurationError::MissingField { field: "subscription_id", .. }
        ));
    }

    #[test]
    fn test_simulated_record_with_subscription_fails() {
        let mut registry = NetworkRegistry::builtin();
        registry.networks.get_mut("hardhat").unwrap().subscription_id = Some(7);

        let err = registry.resolve("hardhat").unwrap_err();
        assert!(matches!(
            err,
            ConfigurationError::UnexpectedField { field: "subscription_id", .. }
        ));
    }

    #[test]
    fn test_kind_defaults_from_name() {
        let mut registry = NetworkRegistry::builtin();
        let mut entry = registry.networks["sepolia"].clone();
        entry.kind = None;
        registry.networks.insert("goerli".to_string(), entry);

        let config = registry.resolve("goerli").unwrap();
        assert!(!config.is_simulated());
    }

    #[test]
    fn test_missing_confirmations_default_to_one() {
        let mut registry = NetworkRegistry::builtin();
        registry
            .networks
            .get_mut("localhost")
            .unwrap()
            .block_confirmations = None;

        let config = registry.resolve("localhost").unwrap();
        assert_eq!(config.block_confirmations, DEFAULT_BLOCK_CONFIRMATIONS);
    }

    #[test]
    fn test_resolve_chain_id() {
        let registry = NetworkRegistry::builtin();
        assert_eq!(registry.resolve_chain_id(11155111).unwrap().name, "sepolia");
        assert_eq!(registry.resolve_chain_id(31337).unwrap().name, "hardhat");
        assert!(matches!(
            registry.resolve_chain_id(5).unwrap_err(),
            ConfigurationError::UnknownChainId(5)
        ));
    }

    #[test]
    fn test_sepolia_verifies_through_v2_api() {
        let sepolia = NetworkRegistry::builtin().resolve("sepolia").unwrap();
        assert_eq!(
            sepolia.explorer_api_url.unwrap().as_str(),
            ETHERSCAN_V2_API_URL
        );
        assert_eq!(sepolia.chain_id, 11155111);
    }

    #[test]
    fn test_load_merges_toml_over_builtin() {
        let temp_dir = TempDir::new("rafflekit-config").expect("Failed to create temp dir");
        let path = temp_dir.path().join("Rafflekit.toml");
        std::fs::write(
            &path,
            r#"
[networks.sepolia]
subscription_id = 1234
entrance_fee = "20000000000000000"

[networks.anvil]
chain_id = 31337
kind = "simulated"
gas_lane = "0x474e34a077df58807dbe9c96d3c009b23b3c6d0cce433e59bbf5b34f823bc56c"
callback_gas_limit = 250000
interval = 60
entrance_fee = "1000"
"#,
        )
        .expect("Failed to write config");

        let registry = NetworkRegistry::load(Some(&path)).expect("Failed to load config");

        let sepolia = registry.resolve("sepolia").unwrap();
        assert_eq!(
            sepolia.class,
            NetworkClass::Live {
                vrf_coordinator: SEPOLIA_VRF_COORDINATOR,
                subscription_id: SubscriptionId(1234),
            }
        );
        assert_eq!(sepolia.entrance_fee, U256::from(20_000_000_000_000_000u64));
        assert_eq!(sepolia.interval, DEFAULT_INTERVAL);

        let anvil = registry.resolve("anvil").unwrap();
        assert!(anvil.is_simulated());
        assert_eq!(anvil.callback_gas_limit, 250_000);
        assert_eq!(anvil.block_confirmations, DEFAULT_BLOCK_CONFIRMATIONS);
    }

    #[test]
    fn test_load_missing_file() {
        let temp_dir = TempDir::new("rafflekit-config").expect("Failed to create temp dir");
        let path = temp_dir.path().join("nonexistent.toml");

        let err = NetworkRegistry::load(Some(&path)).unwrap_err();
        assert!(matches!(err, ConfigurationError::Load(_)));
    }
}
