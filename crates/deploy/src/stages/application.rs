use alloy_core::primitives::Address;

use crate::{
    config::NetworkConfig,
    contracts::{self, RAFFLE},
    error::TransactionError,
    traits::{DeployRequest, DeploymentBook},
    types::{DeploymentRecord, SubscriptionHandle},
};

/// Deploy the raffle against `subscription`, awaiting the network's
/// confirmation depth.
pub async fn deploy_application<B: DeploymentBook>(
    book: &B,
    config: &NetworkConfig,
    subscription: &SubscriptionHandle,
    deployer: Address,
) -> Result<DeploymentRecord, TransactionError> {
    let args = contracts::raffle_args(subscription.coordinator, subscription.id, config);
    tracing::debug!(%args, network = %config.name, "Raffle constructor arguments");

    book.deploy(DeployRequest {
        name: RAFFLE.to_string(),
        from: deployer,
        args,
        log: true,
        wait_confirmations: config.block_confirmations,
    })
    .await
}
