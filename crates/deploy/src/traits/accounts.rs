//! Named signing accounts.

use std::future::Future;

use alloy_core::primitives::Address;

use crate::error::EnvironmentError;

/// Name of the account every transaction is sent from.
pub const DEPLOYER: &str = "deployer";

/// Supplies signing identities by role name.
pub trait NamedAccounts: Send + Sync {
    /// Resolve the address of a named account.
    fn named_account(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<Address, EnvironmentError>> + Send;
}
