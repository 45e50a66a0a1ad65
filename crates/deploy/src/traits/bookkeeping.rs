//! Deploy-if-changed bookkeeping.

use std::future::Future;

use alloy_core::primitives::Address;

use crate::{
    error::TransactionError,
    types::{ConstructorArgs, DeploymentRecord},
};

/// A request to make `name` deployed with `args`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployRequest {
    pub name: String,
    pub from: Address,
    pub args: ConstructorArgs,
    /// Emit progress logs for this deployment.
    pub log: bool,
    /// Confirmations to await before the deployment counts as done.
    pub wait_confirmations: u64,
}

/// Tracks which contracts are deployed and skips redundant deployments.
///
/// Implementations are authoritative for "already deployed": when the recorded
/// deployment matches the request they return it without sending a
/// transaction.
pub trait DeploymentBook: Send + Sync {
    fn deploy(
        &self,
        request: DeployRequest,
    ) -> impl Future<Output = Result<DeploymentRecord, TransactionError>> + Send;

    /// Look up the recorded deployment of `name`, if any.
    fn get(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<Option<DeploymentRecord>, TransactionError>> + Send;
}
