use crate::{
    error::VerificationError,
    traits::SourceVerifier,
    types::{DeploymentRecord, VerificationOutcome, VerificationRequest},
};

/// Submit the raffle's source for public verification.
///
/// Errors are returned to the caller, which decides they are not fatal.
pub async fn verify_application<V: SourceVerifier>(
    verifier: &V,
    raffle: &DeploymentRecord,
) -> Result<VerificationOutcome, VerificationError> {
    tracing::info!("Verifying...");

    let outcome = verifier.verify(&VerificationRequest::from(raffle)).await?;
    match outcome {
        VerificationOutcome::Verified => {
            tracing::info!(address = %raffle.address, "Raffle verified")
        }
        VerificationOutcome::AlreadyVerified => {
            tracing::info!(address = %raffle.address, "Raffle already verified")
        }
    }

    Ok(outcome)
}
