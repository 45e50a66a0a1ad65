//! Adapters implementing the [`crate::traits`] ports against a real node,
//! the filesystem and an explorer API.

mod accounts;
mod coordinator;
mod deployments;
mod etherscan;

pub use accounts::{NamedAccount, RpcAccounts, default_named_accounts};
pub use coordinator::RpcOracle;
pub use deployments::{DEFAULT_DEPLOYMENTS_DIR, FileDeployments};
pub use etherscan::{ETHERSCAN_API_KEY_ENV, EtherscanVerifier};
