//! Handles and records produced by the pipeline stages.

use std::fmt;

use alloy_core::primitives::{Address, B256, Bytes, U256};
use alloy_sol_types::SolValue;
use derive_more::{Deref, Display, From};
use serde::{Deserialize, Serialize};

/// Identifier of a VRF subscription.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, From, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct SubscriptionId(pub u64);

/// A simulated VRF coordinator deployed for this run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OracleMockHandle {
    pub address: Address,
    /// Flat fee charged per randomness request.
    pub base_fee: U256,
    /// Price per gas unit of the fulfilment callback.
    pub gas_price_link: U256,
}

/// A subscription usable by the application contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionHandle {
    pub id: SubscriptionId,
    pub coordinator: Address,
    /// Amount funded by this run. `None` for live subscriptions, whose balance
    /// is managed out-of-band.
    pub funded: Option<U256>,
}

/// A single static constructor argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum ConstructorArg {
    Address(Address),
    Uint(U256),
    Bytes32(B256),
}

impl ConstructorArg {
    pub fn as_uint(&self) -> Option<U256> {
        match self {
            Self::Uint(value) => Some(*value),
            _ => None,
        }
    }

    /// ABI-encode as a single 32-byte word.
    fn encode_word(&self) -> Vec<u8> {
        match self {
            Self::Address(address) => address.abi_encode(),
            Self::Uint(value) => value.abi_encode(),
            Self::Bytes32(value) => value.abi_encode(),
        }
    }
}

impl fmt::Display for ConstructorArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Address(address) => write!(f, "{address}"),
            Self::Uint(value) => write!(f, "{value}"),
            Self::Bytes32(value) => write!(f, "{value}"),
        }
    }
}

impl From<Address> for ConstructorArg {
    fn from(value: Address) -> Self {
        Self::Address(value)
    }
}

impl From<U256> for ConstructorArg {
    fn from(value: U256) -> Self {
        Self::Uint(value)
    }
}

impl From<B256> for ConstructorArg {
    fn from(value: B256) -> Self {
        Self::Bytes32(value)
    }
}

impl From<u64> for ConstructorArg {
    fn from(value: u64) -> Self {
        Self::Uint(U256::from(value))
    }
}

impl From<u32> for ConstructorArg {
    fn from(value: u32) -> Self {
        Self::Uint(U256::from(value))
    }
}

impl From<SubscriptionId> for ConstructorArg {
    fn from(value: SubscriptionId) -> Self {
        value.0.into()
    }
}

/// Ordered constructor arguments of a contract.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Deref, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConstructorArgs(Vec<ConstructorArg>);

impl ConstructorArgs {
    pub fn new(args: impl IntoIterator<Item = ConstructorArg>) -> Self {
        Self(args.into_iter().collect())
    }

    /// ABI-encode the arguments as they are appended to creation bytecode.
    pub fn abi_encode(&self) -> Bytes {
        self.0
            .iter()
            .flat_map(ConstructorArg::encode_word)
            .collect::<Vec<u8>>()
            .into()
    }
}

impl fmt::Display for ConstructorArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, arg) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{arg}")?;
        }
        write!(f, "]")
    }
}

/// Outcome of deploying (or reusing) a contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentRecord {
    pub name: String,
    pub address: Address,
    pub args: ConstructorArgs,
    /// Confirmations observed before the deployment was considered final.
    pub confirmations: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_hash: Option<B256>,
    /// `false` when an unchanged existing deployment was reused.
    #[serde(skip)]
    pub newly_deployed: bool,
}

/// A source verification submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationRequest {
    pub contract_name: String,
    pub address: Address,
    pub args: ConstructorArgs,
}

impl From<&DeploymentRecord> for VerificationRequest {
    fn from(record: &DeploymentRecord) -> Self {
        Self {
            contract_name: record.name.clone(),
            address: record.address,
            args: record.args.clone(),
        }
    }
}

/// Successful verification outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum VerificationOutcome {
    #[display("verified")]
    Verified,
    #[display("already verified")]
    AlreadyVerified,
}
