//! rafflekit-deploy - Provisioning pipeline for the VRF-backed raffle.
//!
//! This crate resolves a network's parameters, satisfies the raffle's
//! randomness oracle dependency (a local coordinator mock and a funded
//! subscription on development chains, the configured coordinator elsewhere),
//! deploys the raffle, registers it as a subscription consumer and submits its
//! source for verification on live networks.

pub mod artifacts;
pub mod config;
pub mod contracts;
pub mod error;
pub mod pipeline;
pub mod rpc;
pub mod services;
pub mod stages;
pub mod traits;
pub mod types;

mod deployer;
mod deployment_hash;

pub use artifacts::{Artifacts, BuildInfo, ContractArtifact};
pub use config::{
    DEVELOPMENT_CHAINS, NetworkClass, NetworkConfig, NetworkEntry, NetworkKind, NetworkRegistry,
};
pub use deployer::{Deployer, RAFFLEKIT_FILENAME};
pub use deployment_hash::{DeploymentHash, StoredDeployment};
pub use error::{
    ConfigurationError, DeployError, EnvironmentError, TransactionError, VerificationError,
};
pub use pipeline::{
    DeployTag, NetworkDescriptor, Pipeline, PipelineStage, RunReport, VerificationStatus,
};
pub use rpc::EthClient;
pub use services::{EtherscanVerifier, FileDeployments, RpcAccounts, RpcOracle};
pub use stages::{MockParams, OracleBinding};
pub use traits::{DeploymentBook, NamedAccounts, RandomnessOracle, SourceVerifier};
pub use types::{
    ConstructorArg, ConstructorArgs, DeploymentRecord, OracleMockHandle, SubscriptionHandle,
    SubscriptionId, VerificationOutcome, VerificationRequest,
};
