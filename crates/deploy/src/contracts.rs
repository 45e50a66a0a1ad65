//! Contract names, bindings and fixed deployment parameters.

use alloy_core::primitives::{Address, U256};
use alloy_sol_types::{SolEvent, sol};

use crate::{
    config::NetworkConfig,
    rpc::Log,
    types::{ConstructorArgs, SubscriptionId},
};

/// Name of the simulated coordinator contract.
pub const VRF_COORDINATOR_MOCK: &str = "VRFCoordinatorV2Mock";

/// Name of the application contract.
pub const RAFFLE: &str = "Raffle";

/// Flat fee per randomness request of the mock coordinator: 0.25 LINK.
pub const BASE_FEE: U256 = U256::from_limbs([250_000_000_000_000_000, 0, 0, 0]);

/// LINK per gas unit of the mock coordinator's fulfilment callback.
pub const GAS_PRICE_LINK: U256 = U256::from_limbs([1_000_000_000, 0, 0, 0]);

/// Amount funded into a locally created subscription: one whole LINK.
pub const VRF_SUB_FUND_AMOUNT: U256 = U256::from_limbs([1_000_000_000_000_000_000, 0, 0, 0]);

sol! {
    /// Subscription management surface of the VRF v2 coordinator mock.
    interface VRFCoordinatorV2Mock {
        event SubscriptionCreated(uint64 indexed subId, address owner);

        function createSubscription() external returns (uint64 subId);
        function fundSubscription(uint64 subId, uint96 amount) external;
        function addConsumer(uint64 subId, address consumer) external;
    }
}

/// Extract the subscription id from the logs of a `createSubscription` call.
pub fn subscription_created(coordinator: Address, logs: &[Log]) -> Option<SubscriptionId> {
    logs.iter()
        .filter(|log| log.address == coordinator)
        .find(|log| {
            log.topics.first() == Some(&VRFCoordinatorV2Mock::SubscriptionCreated::SIGNATURE_HASH)
        })
        .and_then(|log| log.topics.get(1))
        .and_then(|topic| u64::try_from(U256::from_be_bytes(topic.0)).ok())
        .map(SubscriptionId)
}

/// Constructor arguments of the coordinator mock.
pub fn mock_args(base_fee: U256, gas_price_link: U256) -> ConstructorArgs {
    ConstructorArgs::new([base_fee.into(), gas_price_link.into()])
}

/// Constructor arguments of the raffle, in declaration order:
/// `[vrfCoordinator, entranceFee, gasLane, subscriptionId, callbackGasLimit, interval]`.
pub fn raffle_args(
    coordinator: Address,
    subscription_id: SubscriptionId,
    config: &NetworkConfig,
) -> ConstructorArgs {
    ConstructorArgs::new([
        coordinator.into(),
        config.entrance_fee.into(),
        config.gas_lane.into(),
        subscription_id.into(),
        config.callback_gas_limit.into(),
        config.interval.into(),
    ])
}
