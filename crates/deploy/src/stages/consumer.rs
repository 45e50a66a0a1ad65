use alloy_core::primitives::Address;

use crate::{
    error::TransactionError,
    traits::RandomnessOracle,
    types::{DeploymentRecord, SubscriptionHandle},
};

/// Authorize the raffle on a locally created subscription.
pub async fn register_consumer<O: RandomnessOracle>(
    oracle: &O,
    subscription: &SubscriptionHandle,
    raffle: &DeploymentRecord,
    deployer: Address,
) -> Result<(), TransactionError> {
    oracle
        .add_consumer(
            subscription.coordinator,
            deployer,
            subscription.id,
            raffle.address,
        )
        .await?;

    tracing::info!(id = %subscription.id, consumer = %raffle.address, "Consumer registered");
    Ok(())
}
