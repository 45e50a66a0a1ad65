use std::path::Path;

use alloy_core::primitives::{Address, B256, Bytes};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::types::{ConstructorArgs, DeploymentRecord};

/// Inputs that, when changed, require redeploying a contract.
///
/// Only the creation code and the encoded constructor arguments matter; the
/// sender and confirmation depth do not change what ends up on chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentHash {
    pub contract_name: String,
    pub bytecode: Bytes,
    pub constructor_args: Bytes,
}

impl DeploymentHash {
    pub fn new(contract_name: &str, bytecode: &Bytes, args: &ConstructorArgs) -> Self {
        Self {
            contract_name: contract_name.to_string(),
            bytecode: bytecode.clone(),
            constructor_args: args.abi_encode(),
        }
    }

    /// Compute a SHA-256 hash of these inputs.
    ///
    /// The hash is deterministic: the inputs are serialized to JSON in field
    /// order before hashing.
    pub fn compute_hash(&self) -> Result<String> {
        let json = serde_json::to_string(self).context("Failed to serialize deployment hash")?;

        let mut hasher = Sha256::new();
        hasher.update(json.as_bytes());
        Ok(hex::encode(hasher.finalize()))
    }
}

/// A deployment as persisted by the bookkeeping store.
///
/// Saved to `deployments/<network>/<Contract>.json` after a successful
/// deployment and compared against on the next run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredDeployment {
    pub address: Address,
    pub args: ConstructorArgs,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_hash: Option<B256>,
    pub confirmations: u64,
    /// SHA-256 of the [`DeploymentHash`] the contract was deployed with.
    pub deployment_hash: String,
    /// Unix timestamp of the deployment.
    pub deployed_at: i64,
    /// Version of the tool that created this deployment.
    pub tool_version: String,
}

impl StoredDeployment {
    pub fn new(record: &DeploymentRecord, deployment_hash: String) -> Self {
        Self {
            address: record.address,
            args: record.args.clone(),
            transaction_hash: record.transaction_hash,
            confirmations: record.confirmations,
            deployment_hash,
            deployed_at: chrono::Utc::now().timestamp(),
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    pub fn into_record(self, name: &str) -> DeploymentRecord {
        DeploymentRecord {
            name: name.to_string(),
            address: self.address,
            args: self.args,
            confirmations: self.confirmations,
            transaction_hash: self.transaction_hash,
            newly_deployed: false,
        }
    }

    /// Save this deployment to a file, as formatted JSON.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context(format!(
                "Failed to create deployments directory {}",
                parent.display()
            ))?;
        }

        let json = serde_json::to_string_pretty(self).context("Failed to serialize deployment")?;

        std::fs::write(path, json)
            .context(format!("Failed to write deployment to {}", path.display()))?;

        Ok(())
    }

    /// Load a deployment from a file.
    ///
    /// Returns `Ok(None)` if the file does not exist, and an error if it is
    /// malformed or cannot be read.
    pub fn load_from_file(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(path)
            .context(format!("Failed to read deployment from {}", path.display()))?;

        let deployment: Self =
            serde_json::from_str(&content).context("Failed to parse deployment JSON")?;

        Ok(Some(deployment))
    }
}
