//! Randomness oracle subscription management.

use std::future::Future;

use alloy_core::primitives::{Address, U256};

use crate::{error::TransactionError, types::SubscriptionId};

/// Subscription surface of a VRF coordinator.
///
/// Every call returns once its transaction reached the configured
/// confirmation depth.
pub trait RandomnessOracle: Send + Sync {
    /// Create a subscription owned by `from` and return its identifier.
    fn create_subscription(
        &self,
        coordinator: Address,
        from: Address,
    ) -> impl Future<Output = Result<SubscriptionId, TransactionError>> + Send;

    fn fund_subscription(
        &self,
        coordinator: Address,
        from: Address,
        id: SubscriptionId,
        amount: U256,
    ) -> impl Future<Output = Result<(), TransactionError>> + Send;

    /// Authorize `consumer` to request randomness billed to `id`.
    fn add_consumer(
        &self,
        coordinator: Address,
        from: Address,
        id: SubscriptionId,
        consumer: Address,
    ) -> impl Future<Output = Result<(), TransactionError>> + Send;
}
