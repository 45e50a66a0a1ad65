//! Sequencing of the provisioning stages for one network.

use alloy_core::primitives::U256;
use derive_more::Display;
use serde::{Deserialize, Serialize};

use crate::{
    config::{NetworkClass, NetworkConfig, NetworkRegistry},
    contracts::VRF_SUB_FUND_AMOUNT,
    error::{DeployError, EnvironmentError},
    stages::{self, MockParams, OracleBinding, SEPARATOR},
    traits::{DEPLOYER, DeploymentBook, NamedAccounts, RandomnessOracle, SourceVerifier},
    types::{DeploymentRecord, OracleMockHandle, SubscriptionHandle, VerificationOutcome},
};

/// Deploy units a run can select.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DeployTag {
    All,
    /// The simulated coordinator.
    Mocks,
    /// Subscription, raffle, consumer registration and verification.
    Raffle,
}

impl DeployTag {
    /// Whether `tags` select the `unit`. No tags select everything.
    pub fn selects(tags: &[DeployTag], unit: DeployTag) -> bool {
        tags.is_empty() || tags.contains(&DeployTag::All) || tags.contains(&unit)
    }
}

/// The network the run is connected to, as observed at run time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkDescriptor {
    pub name: String,
    pub chain_id: u64,
    /// Confirmations the application deployment waits for.
    pub block_confirmations: u64,
}

impl NetworkDescriptor {
    /// Describe `config` as reached over a node reporting `chain_id`.
    pub fn new(config: &NetworkConfig, chain_id: u64) -> Self {
        Self {
            name: config.name.clone(),
            chain_id,
            block_confirmations: config.block_confirmations,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum PipelineStage {
    ResolveConfig,
    DeployMock,
    ProvisionSubscription,
    DeployApplication,
    RegisterConsumer,
    Verify,
    Done,
}

/// How the verification step ended.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum VerificationStatus {
    #[display("skipped ({_0})")]
    Skipped(&'static str),
    #[display("{_0}")]
    Succeeded(VerificationOutcome),
    #[display("failed: {_0}")]
    Failed(String),
}

/// Everything a completed run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub network: String,
    /// Stages in execution order, ending with [`PipelineStage::Done`].
    pub stages: Vec<PipelineStage>,
    pub mock: Option<OracleMockHandle>,
    pub subscription: Option<SubscriptionHandle>,
    pub raffle: Option<DeploymentRecord>,
    pub verification: VerificationStatus,
}

impl RunReport {
    fn new(network: &str) -> Self {
        Self {
            network: network.to_string(),
            stages: Vec::new(),
            mock: None,
            subscription: None,
            raffle: None,
            verification: VerificationStatus::Skipped("raffle not selected"),
        }
    }
}

/// Drives the stages against a set of collaborators.
#[derive(Debug, Clone)]
pub struct Pipeline<B, O, A, V> {
    book: B,
    oracle: O,
    accounts: A,
    verifier: V,
    mock_params: MockParams,
    fund_amount: U256,
}

impl<B, O, A, V> Pipeline<B, O, A, V>
where
    B: DeploymentBook,
    O: RandomnessOracle,
    A: NamedAccounts,
    V: SourceVerifier,
{
    pub fn new(book: B, oracle: O, accounts: A, verifier: V) -> Self {
        Self {
            book,
            oracle,
            accounts,
            verifier,
            mock_params: MockParams::default(),
            fund_amount: VRF_SUB_FUND_AMOUNT,
        }
    }

    pub fn with_mock_params(mut self, mock_params: MockParams) -> Self {
        self.mock_params = mock_params;
        self
    }

    /// Amount funded into a locally created subscription.
    pub fn with_fund_amount(mut self, fund_amount: U256) -> Self {
        self.fund_amount = fund_amount;
        self
    }

    /// Run the selected units on the network described by `descriptor`.
    ///
    /// Stops at the first configuration, environment or transaction error.
    /// Verification failures are recorded in the report instead.
    pub async fn run(
        &self,
        registry: &NetworkRegistry,
        descriptor: &NetworkDescriptor,
        tags: &[DeployTag],
    ) -> Result<RunReport, DeployError> {
        let mut report = RunReport::new(&descriptor.name);

        match self.run_stages(registry, descriptor, tags, &mut report).await {
            Ok(()) => {
                report.stages.push(PipelineStage::Done);
                Ok(report)
            }
            Err(err) => {
                tracing::error!(
                    network = %descriptor.name,
                    stage = ?report.stages.last(),
                    error = %err,
                    "Run aborted"
                );
                Err(err)
            }
        }
    }

    async fn run_stages(
        &self,
        registry: &NetworkRegistry,
        descriptor: &NetworkDescriptor,
        tags: &[DeployTag],
        report: &mut RunReport,
    ) -> Result<(), DeployError> {
        let deployer = self.accounts.named_account(DEPLOYER).await?;

        report.stages.push(PipelineStage::ResolveConfig);
        let config = registry.resolve(&descriptor.name)?;
        if config.chain_id != descriptor.chain_id {
            return Err(EnvironmentError::ChainIdMismatch {
                network: config.name,
                expected: config.chain_id,
                actual: descriptor.chain_id,
            }
            .into());
        }
        tracing::info!(
            network = %config.name,
            chain_id = config.chain_id,
            simulated = config.is_simulated(),
            %deployer,
            "Network resolved"
        );

        if DeployTag::selects(tags, DeployTag::Mocks) && config.is_simulated() {
            report.stages.push(PipelineStage::DeployMock);
            report.mock =
                Some(stages::deploy_mock(&self.book, deployer, self.mock_params).await?);
        }

        if !DeployTag::selects(tags, DeployTag::Raffle) {
            return Ok(());
        }

        let binding = match config.class {
            NetworkClass::Simulated => {
                let mock = match report.mock {
                    Some(mock) => mock,
                    None => stages::existing_mock(&self.book, self.mock_params).await?,
                };
                report.mock = Some(mock);
                OracleBinding::Simulated { mock }
            }
            NetworkClass::Live {
                vrf_coordinator,
                subscription_id,
            } => OracleBinding::Live {
                coordinator: vrf_coordinator,
                subscription_id,
            },
        };

        report.stages.push(PipelineStage::ProvisionSubscription);
        let subscription =
            stages::provision_subscription(&self.oracle, &binding, deployer, self.fund_amount)
                .await?;
        report.subscription = Some(subscription);

        report.stages.push(PipelineStage::DeployApplication);
        let config = NetworkConfig {
            block_confirmations: descriptor.block_confirmations,
            ..config
        };
        let raffle =
            stages::deploy_application(&self.book, &config, &subscription, deployer).await?;

        if binding.is_simulated() {
            report.stages.push(PipelineStage::RegisterConsumer);
            stages::register_consumer(&self.oracle, &subscription, &raffle, deployer).await?;
        }

        report.verification = if binding.is_simulated() {
            VerificationStatus::Skipped("simulated network")
        } else if !self.verifier.has_credential() {
            VerificationStatus::Skipped("no verification credential")
        } else {
            report.stages.push(PipelineStage::Verify);
            match stages::verify_application(&self.verifier, &raffle).await {
                Ok(outcome) => VerificationStatus::Succeeded(outcome),
                Err(err) => {
                    tracing::warn!(address = %raffle.address, error = %err, "Verification failed");
                    VerificationStatus::Failed(err.to_string())
                }
            }
        };

        report.raffle = Some(raffle);
        tracing::info!("{SEPARATOR}");

        Ok(())
    }
}
