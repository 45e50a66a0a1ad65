//! Named accounts backed by the node's unlocked accounts.

use std::collections::BTreeMap;

use alloy_core::primitives::Address;
use serde::{Deserialize, Serialize};

use crate::{error::EnvironmentError, rpc::EthClient, traits::{DEPLOYER, NamedAccounts}};

/// How a named account is located.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NamedAccount {
    /// Index into `eth_accounts`.
    Index(usize),
    /// A fixed address the node can sign for.
    Address(Address),
}

/// Default role mapping: the deployer is the node's first account.
pub fn default_named_accounts() -> BTreeMap<String, NamedAccount> {
    BTreeMap::from([(DEPLOYER.to_string(), NamedAccount::Index(0))])
}

/// Resolves named accounts through `eth_accounts`.
#[derive(Debug, Clone)]
pub struct RpcAccounts {
    client: EthClient,
    named: BTreeMap<String, NamedAccount>,
}

impl RpcAccounts {
    pub fn new(client: EthClient, named: BTreeMap<String, NamedAccount>) -> Self {
        Self { client, named }
    }
}

impl NamedAccounts for RpcAccounts {
    async fn named_account(&self, name: &str) -> Result<Address, EnvironmentError> {
        let index = match self.named.get(name) {
            Some(NamedAccount::Address(address)) => return Ok(*address),
            Some(NamedAccount::Index(index)) => *index,
            None => return Err(EnvironmentError::MissingAccount(name.to_string())),
        };

        let accounts = self
            .client
            .accounts()
            .await
            .map_err(|e| EnvironmentError::NetworkUnavailable(e.to_string()))?;

        let address = accounts.get(index).copied().ok_or_else(|| {
            EnvironmentError::MissingAccount(format!(
                "{name} (index {index}, node exposes {} account(s))",
                accounts.len()
            ))
        })?;

        tracing::debug!(name, %address, "Named account resolved");
        Ok(address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_account_toml_forms() {
        #[derive(Deserialize)]
        struct Accounts {
            named_accounts: BTreeMap<String, NamedAccount>,
        }

        let parsed: Accounts = toml::from_str(
            r#"
[named_accounts]
deployer = 0
player = "0x70997970C51812dc3A010C7d01b50e0d17dc79C8"
"#,
        )
        .unwrap();

        assert_eq!(parsed.named_accounts["deployer"], NamedAccount::Index(0));
        assert!(matches!(
            parsed.named_accounts["player"],
            NamedAccount::Address(_)
        ));
    }

    #[tokio::test]
    async fn test_fixed_address_needs_no_rpc() {
        let address = Address::repeat_byte(0x11);
        let client = EthClient::new("http://127.0.0.1:1/".parse().unwrap()).unwrap();
        let accounts = RpcAccounts::new(
            client,
            BTreeMap::from([(DEPLOYER.to_string(), NamedAccount::Address(address))]),
        );

        assert_eq!(accounts.named_account(DEPLOYER).await.unwrap(), address);
        assert!(matches!(
            accounts.named_account("player").await.unwrap_err(),
            EnvironmentError::MissingAccount(_)
        ));
    }
}
