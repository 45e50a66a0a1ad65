//! Ports to the collaborators the pipeline drives.
//!
//! The pipeline only talks to the outside world through these traits, so runs
//! can be exercised against in-memory fakes. The adapters in
//! [`crate::services`] implement them over JSON-RPC, the filesystem and an
//! explorer API.

mod accounts;
mod bookkeeping;
mod oracle;
mod verifier;

pub use accounts::{DEPLOYER, NamedAccounts};
pub use bookkeeping::{DeployRequest, DeploymentBook};
pub use oracle::RandomnessOracle;
pub use verifier::SourceVerifier;
