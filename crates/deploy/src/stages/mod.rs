//! The individual provisioning stages.
//!
//! Each stage is a free async function over the ports in [`crate::traits`].
//! The [`crate::pipeline::Pipeline`] sequences them; they can also be driven
//! one by one.

mod application;
mod consumer;
mod mock;
mod subscription;
mod verify;

pub use application::deploy_application;
pub use consumer::register_consumer;
pub use mock::{deploy_mock, existing_mock};
pub use subscription::provision_subscription;
pub use verify::verify_application;

use alloy_core::primitives::{Address, U256};
use serde::{Deserialize, Serialize};

use crate::{
    contracts::{BASE_FEE, GAS_PRICE_LINK},
    types::{OracleMockHandle, SubscriptionId},
};

/// Logged after each deploy unit.
pub const SEPARATOR: &str = "----------------------------------------------------";

/// Constructor parameters of the simulated coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MockParams {
    /// Flat fee per randomness request.
    pub base_fee: U256,
    /// Price per gas unit of the fulfilment callback.
    pub gas_price_link: U256,
}

impl Default for MockParams {
    fn default() -> Self {
        Self {
            base_fee: BASE_FEE,
            gas_price_link: GAS_PRICE_LINK,
        }
    }
}

/// Where the randomness oracle of this run comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OracleBinding {
    /// A mock deployed (or reused) by this run.
    Simulated { mock: OracleMockHandle },
    /// The configured coordinator and pre-existing subscription.
    Live {
        coordinator: Address,
        subscription_id: SubscriptionId,
    },
}

impl OracleBinding {
    pub fn coordinator(&self) -> Address {
        match self {
            Self::Simulated { mock } => mock.address,
            Self::Live { coordinator, .. } => *coordinator,
        }
    }

    pub fn is_simulated(&self) -> bool {
        matches!(self, Self::Simulated { .. })
    }
}
