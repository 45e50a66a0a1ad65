use alloy_core::primitives::Address;

use crate::{
    contracts::{self, VRF_COORDINATOR_MOCK},
    error::{DeployError, EnvironmentError},
    traits::{DeployRequest, DeploymentBook},
    types::OracleMockHandle,
};

use super::{MockParams, SEPARATOR};

/// Deploy the simulated coordinator, reusing an unchanged prior deployment.
pub async fn deploy_mock<B: DeploymentBook>(
    book: &B,
    deployer: Address,
    params: MockParams,
) -> Result<OracleMockHandle, DeployError> {
    tracing::info!("Local network detected. Deploying mocks....");

    let record = book
        .deploy(DeployRequest {
            name: VRF_COORDINATOR_MOCK.to_string(),
            from: deployer,
            args: contracts::mock_args(params.base_fee, params.gas_price_link),
            log: true,
            wait_confirmations: 1,
        })
        .await?;

    tracing::info!("Mocks deployed!");
    tracing::info!("{SEPARATOR}");

    Ok(OracleMockHandle {
        address: record.address,
        base_fee: params.base_fee,
        gas_price_link: params.gas_price_link,
    })
}

/// Look up a coordinator mock deployed by an earlier run.
///
/// Parameters are read back from the recorded constructor arguments, falling
/// back to `params` when the record does not carry them.
pub async fn existing_mock<B: DeploymentBook>(
    book: &B,
    params: MockParams,
) -> Result<OracleMockHandle, DeployError> {
    let record = book
        .get(VRF_COORDINATOR_MOCK)
        .await?
        .ok_or_else(|| EnvironmentError::MissingDeployment(VRF_COORDINATOR_MOCK.to_string()))?;

    let recorded = |index: usize| record.args.get(index).and_then(|arg| arg.as_uint());

    tracing::debug!(address = %record.address, "Using previously deployed coordinator mock");

    Ok(OracleMockHandle {
        address: record.address,
        base_fee: recorded(0).unwrap_or(params.base_fee),
        gas_price_link: recorded(1).unwrap_or(params.gas_price_link),
    })
}
