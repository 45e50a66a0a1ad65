//! File-backed deploy-if-changed bookkeeping.

use std::path::{Path, PathBuf};

use alloy_core::primitives::Bytes;

use crate::{
    artifacts::Artifacts,
    deployment_hash::{DeploymentHash, StoredDeployment},
    error::TransactionError,
    rpc::{EthClient, TransactionRequest},
    traits::{DeployRequest, DeploymentBook},
    types::DeploymentRecord,
};

/// Default root of the per-network deployment records.
pub const DEFAULT_DEPLOYMENTS_DIR: &str = "deployments";

/// Keeps one JSON record per contract under `<root>/<network>/<Name>.json`.
///
/// A contract is redeployed only when its [`DeploymentHash`] changed or the
/// recorded address no longer holds code (e.g. a restarted local node).
#[derive(Debug, Clone)]
pub struct FileDeployments {
    client: EthClient,
    artifacts: Artifacts,
    dir: PathBuf,
}

impl FileDeployments {
    pub fn new(client: EthClient, artifacts: Artifacts, root: &Path, network: &str) -> Self {
        Self {
            client,
            artifacts,
            dir: root.join(network),
        }
    }

    fn record_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.json"))
    }

    fn bookkeeping_error(name: &str, err: impl std::fmt::Display) -> TransactionError {
        TransactionError::Bookkeeping {
            name: name.to_string(),
            message: format!("{err:#}"),
        }
    }

    /// Return the stored deployment if it matches `hash` and still has code.
    async fn reusable(
        &self,
        name: &str,
        hash: &str,
    ) -> Result<Option<StoredDeployment>, TransactionError> {
        let stored = StoredDeployment::load_from_file(&self.record_path(name))
            .map_err(|e| Self::bookkeeping_error(name, e))?;

        let Some(stored) = stored else {
            return Ok(None);
        };

        if stored.deployment_hash != hash {
            tracing::info!(name, "Deployment inputs changed, redeploying");
            return Ok(None);
        }

        if self.client.get_code(stored.address).await?.is_empty() {
            tracing::info!(name, address = %stored.address, "No code at recorded address, redeploying");
            return Ok(None);
        }

        Ok(Some(stored))
    }
}

impl DeploymentBook for FileDeployments {
    async fn deploy(&self, request: DeployRequest) -> Result<DeploymentRecord, TransactionError> {
        let name = request.name.as_str();

        let artifact = self
            .artifacts
            .find(name)
            .map_err(|e| Self::bookkeeping_error(name, e))?;
        let hash = DeploymentHash::new(name, &artifact.bytecode, &request.args)
            .compute_hash()
            .map_err(|e| Self::bookkeeping_error(name, e))?;

        if let Some(stored) = self.reusable(name, &hash).await? {
            if request.log {
                tracing::info!("reusing \"{}\" at {}", name, stored.address);
            }
            return Ok(stored.into_record(name));
        }

        let encoded_args = request.args.abi_encode();
        let input: Bytes = [&artifact.bytecode[..], &encoded_args[..]].concat().into();

        let tx_hash = self
            .client
            .send_transaction(&TransactionRequest {
                from: request.from,
                to: None,
                input,
                value: None,
            })
            .await?;

        if request.log {
            tracing::info!("deploying \"{}\" (tx: {})...", name, tx_hash);
        }

        let confirmations = request.wait_confirmations.max(1);
        let receipt = self
            .client
            .wait_for_confirmations(tx_hash, confirmations)
            .await?;
        let address = receipt
            .contract_address
            .ok_or(TransactionError::MissingContractAddress(tx_hash))?;

        if request.log {
            tracing::info!(
                "deployed at {} with {} gas",
                address,
                receipt.gas_used
            );
        }

        let record = DeploymentRecord {
            name: name.to_string(),
            address,
            args: request.args,
            confirmations,
            transaction_hash: Some(tx_hash),
            newly_deployed: true,
        };

        StoredDeployment::new(&record, hash)
            .save_to_file(&self.record_path(name))
            .map_err(|e| Self::bookkeeping_error(name, e))?;

        Ok(record)
    }

    async fn get(&self, name: &str) -> Result<Option<DeploymentRecord>, TransactionError> {
        let stored = StoredDeployment::load_from_file(&self.record_path(name))
            .map_err(|e| Self::bookkeeping_error(name, e))?;

        let Some(stored) = stored else {
            return Ok(None);
        };

        // A restarted local node forgets everything the record points at.
        if self.client.get_code(stored.address).await?.is_empty() {
            tracing::warn!(name, address = %stored.address, "Recorded deployment has no code, ignoring it");
            return Ok(None);
        }

        Ok(Some(stored.into_record(name)))
    }
}
