//! VRF coordinator subscription calls over JSON-RPC.

use alloy_core::primitives::{
    Address, Bytes, U256,
    aliases::U96,
    ruint::UintTryFrom,
};
use alloy_sol_types::SolCall;

use crate::{
    contracts::{self, VRFCoordinatorV2Mock},
    error::TransactionError,
    rpc::{EthClient, TransactionReceipt, TransactionRequest},
    traits::RandomnessOracle,
    types::SubscriptionId,
};

/// Drives a VRF coordinator through the node.
#[derive(Debug, Clone)]
pub struct RpcOracle {
    client: EthClient,
    confirmations: u64,
}

impl RpcOracle {
    pub fn new(client: EthClient, confirmations: u64) -> Self {
        Self {
            client,
            confirmations,
        }
    }

    async fn transact(
        &self,
        coordinator: Address,
        from: Address,
        input: Vec<u8>,
    ) -> Result<TransactionReceipt, TransactionError> {
        let request = TransactionRequest {
            from,
            to: Some(coordinator),
            input: Bytes::from(input),
            value: None,
        };
        self.client
            .send_and_confirm(&request, self.confirmations)
            .await
    }
}

/// Narrow a funding amount to the coordinator's `uint96`.
fn to_u96(amount: U256) -> Result<U96, TransactionError> {
    U96::uint_try_from(amount).map_err(|_| TransactionError::OutOfRange {
        field: "amount",
        value: amount.to_string(),
    })
}

impl RandomnessOracle for RpcOracle {
    async fn create_subscription(
        &self,
        coordinator: Address,
        from: Address,
    ) -> Result<SubscriptionId, TransactionError> {
        let call = VRFCoordinatorV2Mock::createSubscriptionCall {};
        let receipt = self.transact(coordinator, from, call.abi_encode()).await?;

        contracts::subscription_created(coordinator, &receipt.logs).ok_or(
            TransactionError::MissingEvent {
                tx_hash: receipt.transaction_hash,
                event: "SubscriptionCreated",
            },
        )
    }

    async fn fund_subscription(
        &self,
        coordinator: Address,
        from: Address,
        id: SubscriptionId,
        amount: U256,
    ) -> Result<(), TransactionError> {
        let call = VRFCoordinatorV2Mock::fundSubscriptionCall {
            subId: id.0,
            amount: to_u96(amount)?,
        };
        let receipt = self.transact(coordinator, from, call.abi_encode()).await?;
        tracing::debug!(%id, %amount, tx_hash = %receipt.transaction_hash, "Subscription funded");
        Ok(())
    }

    async fn add_consumer(
        &self,
        coordinator: Address,
        from: Address,
        id: SubscriptionId,
        consumer: Address,
    ) -> Result<(), TransactionError> {
        let call = VRFCoordinatorV2Mock::addConsumerCall {
            subId: id.0,
            consumer,
        };
        let receipt = self.transact(coordinator, from, call.abi_encode()).await?;
        tracing::debug!(%id, %consumer, tx_hash = %receipt.transaction_hash, "Consumer added");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_u96_bounds() {
        assert_eq!(
            to_u96(contracts::VRF_SUB_FUND_AMOUNT).unwrap(),
            U96::from(1_000_000_000_000_000_000u64)
        );
        let max = (U256::from(1u8) << 96usize) - U256::from(1u8);
        assert_eq!(to_u96(max).unwrap(), U96::MAX);
        assert!(to_u96(U256::from(1u8) << 96usize).is_err());
        assert!(to_u96(U256::MAX).is_err());
    }

    #[test]
    fn test_call_selectors() {
        let create = VRFCoordinatorV2Mock::createSubscriptionCall {}.abi_encode();
        assert_eq!(create, VRFCoordinatorV2Mock::createSubscriptionCall::SELECTOR.to_vec());

        let add = VRFCoordinatorV2Mock::addConsumerCall {
            subId: 1,
            consumer: Address::repeat_byte(0x22),
        }
        .abi_encode();
        assert_eq!(add.len(), 4 + 64);
        assert_eq!(add[35], 1);
    }
}
