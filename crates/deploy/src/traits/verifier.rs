//! Public source verification.

use std::future::Future;

use crate::{
    error::VerificationError,
    types::{VerificationOutcome, VerificationRequest},
};

pub trait SourceVerifier: Send + Sync {
    /// Whether a verification credential is available.
    fn has_credential(&self) -> bool;

    fn verify(
        &self,
        request: &VerificationRequest,
    ) -> impl Future<Output = Result<VerificationOutcome, VerificationError>> + Send;
}
