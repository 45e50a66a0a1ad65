//! Error taxonomy for the provisioning pipeline.
//!
//! Configuration, transaction and environment errors abort a run. Verification
//! errors are the only recoverable class: they are reported and the run still
//! completes.

use alloy_core::primitives::{Address, B256};

/// Network identifier unresolved, or a record that is incomplete for its class.
#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    #[error("no network configuration for '{0}'")]
    UnknownNetwork(String),
    #[error("no network configuration for chain id {0}")]
    UnknownChainId(u64),
    #[error("network '{network}' is missing required field '{field}'")]
    MissingField { network: String, field: &'static str },
    #[error("network '{network}' is simulated and must not configure '{field}'; it is derived at deploy time")]
    UnexpectedField { network: String, field: &'static str },
    #[error("failed to load configuration: {0}")]
    Load(String),
    #[error("artifact for contract '{name}' is unusable: {reason}")]
    Artifact { name: String, reason: String },
}

/// An on-chain transaction failed to submit, reverted, or never reached its
/// required confirmation depth.
#[derive(Debug, thiserror::Error)]
pub enum TransactionError {
    #[error("rpc call '{method}' failed: {message}")]
    Rpc { method: &'static str, message: String },
    #[error("transaction {0} reverted")]
    Reverted(B256),
    #[error("transaction {tx_hash} did not reach {confirmations} confirmation(s) within {timeout_secs}s")]
    Timeout {
        tx_hash: B256,
        confirmations: u64,
        timeout_secs: u64,
    },
    #[error("contract creation {0} returned no contract address")]
    MissingContractAddress(B256),
    #[error("transaction {tx_hash} emitted no '{event}' event")]
    MissingEvent { tx_hash: B256, event: &'static str },
    #[error("value out of range for '{field}': {value}")]
    OutOfRange { field: &'static str, value: String },
    #[error("failed to record deployment of '{name}': {message}")]
    Bookkeeping { name: String, message: String },
}

/// Source verification failed or could not be attempted.
#[derive(Debug, thiserror::Error)]
pub enum VerificationError {
    #[error("no verification credential in the environment")]
    MissingCredential,
    #[error("network '{0}' has no verification endpoint configured")]
    MissingEndpoint(String),
    #[error("verification request failed: {0}")]
    Http(String),
    #[error("verification submission rejected: {0}")]
    Rejected(String),
    #[error("verification of {address} failed: {message}")]
    Failed { address: Address, message: String },
    #[error("verification of {0} still pending after polling")]
    StillPending(Address),
}

/// A precondition of the run is not met.
#[derive(Debug, thiserror::Error)]
pub enum EnvironmentError {
    #[error("named account '{0}' is not available")]
    MissingAccount(String),
    #[error("network descriptor unavailable: {0}")]
    NetworkUnavailable(String),
    #[error("connected to chain id {actual}, but network '{network}' expects {expected}")]
    ChainIdMismatch {
        network: String,
        expected: u64,
        actual: u64,
    },
    #[error("'{0}' has not been deployed on this network; run the 'mocks' tag first")]
    MissingDeployment(String),
}

/// Any error that aborts a run.
#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error(transparent)]
    Transaction(#[from] TransactionError),
    #[error(transparent)]
    Environment(#[from] EnvironmentError),
}

impl From<figment::Error> for ConfigurationError {
    fn from(err: figment::Error) -> Self {
        Self::Load(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_error_converts_into_deploy_error() {
        let err: DeployError = ConfigurationError::UnknownNetwork("mars".to_string()).into();
        assert!(matches!(err, DeployError::Configuration(_)));
        assert_eq!(err.to_string(), "no network configuration for 'mars'");
    }

    #[test]
    fn test_timeout_message_names_confirmations() {
        let err = TransactionError::Timeout {
            tx_hash: B256::ZERO,
            confirmations: 6,
            timeout_secs: 300,
        };
        assert!(err.to_string().contains("6 confirmation(s) within 300s"));
    }
}
