use alloy_core::primitives::{Address, U256};

use crate::{error::TransactionError, traits::RandomnessOracle, types::SubscriptionHandle};

use super::OracleBinding;

/// Obtain the subscription the raffle bills its randomness requests to.
///
/// On a simulated binding a fresh subscription is created on the mock and
/// funded exactly once with `fund_amount`. A live binding performs no I/O:
/// the configured subscription is used as-is and its balance is not read.
pub async fn provision_subscription<O: RandomnessOracle>(
    oracle: &O,
    binding: &OracleBinding,
    deployer: Address,
    fund_amount: U256,
) -> Result<SubscriptionHandle, TransactionError> {
    let coordinator = binding.coordinator();

    match *binding {
        OracleBinding::Simulated { .. } => {
            let id = oracle.create_subscription(coordinator, deployer).await?;
            tracing::info!(%id, %coordinator, "Subscription created");

            oracle
                .fund_subscription(coordinator, deployer, id, fund_amount)
                .await?;
            tracing::info!(%id, amount = %fund_amount, "Subscription funded");

            Ok(SubscriptionHandle {
                id,
                coordinator,
                funded: Some(fund_amount),
            })
        }
        OracleBinding::Live {
            subscription_id, ..
        } => {
            tracing::debug!(id = %subscription_id, %coordinator, "Using configured subscription");
            Ok(SubscriptionHandle {
                id: subscription_id,
                coordinator,
                funded: None,
            })
        }
    }
}
