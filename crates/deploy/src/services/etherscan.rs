//! Source verification against an Etherscan-compatible API.

use std::time::Duration;

use alloy_core::primitives::Address;
use backon::{ConstantBuilder, Retryable};
use serde::Deserialize;
use url::Url;

use crate::{
    artifacts::Artifacts,
    error::VerificationError,
    traits::SourceVerifier,
    types::{VerificationOutcome, VerificationRequest},
};

/// Environment variable holding the explorer API key.
pub const ETHERSCAN_API_KEY_ENV: &str = "ETHERSCAN_API_KEY";

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);
const DEFAULT_MAX_POLLS: usize = 12;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct EtherscanResponse {
    status: String,
    #[serde(default)]
    message: String,
    result: String,
}

fn is_already_verified(text: &str) -> bool {
    text.to_lowercase().contains("already verified")
}

/// Submits standard-JSON sources and polls until the explorer settles.
///
/// Speaks the multichain V2 API: every request carries the target `chainid`.
#[derive(Debug, Clone)]
pub struct EtherscanVerifier {
    client: reqwest::Client,
    network: String,
    chain_id: u64,
    api_url: Option<Url>,
    api_key: Option<String>,
    artifacts: Artifacts,
    poll_interval: Duration,
    max_polls: usize,
}

impl EtherscanVerifier {
    pub fn new(
        network: &str,
        chain_id: u64,
        api_url: Option<Url>,
        api_key: Option<String>,
        artifacts: Artifacts,
    ) -> Result<Self, anyhow::Error> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to create HTTP client: {e}"))?;

        Ok(Self {
            client,
            network: network.to_string(),
            chain_id,
            api_url,
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            artifacts,
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_polls: DEFAULT_MAX_POLLS,
        })
    }

    /// Read the API key from [`ETHERSCAN_API_KEY_ENV`].
    pub fn from_env(
        network: &str,
        chain_id: u64,
        api_url: Option<Url>,
        artifacts: Artifacts,
    ) -> Result<Self, anyhow::Error> {
        Self::new(
            network,
            chain_id,
            api_url,
            std::env::var(ETHERSCAN_API_KEY_ENV).ok(),
            artifacts,
        )
    }

    async fn submit(
        &self,
        url: &Url,
        form: &[(&str, String)],
    ) -> Result<EtherscanResponse, VerificationError> {
        self.client
            .post(url.clone())
            .form(form)
            .send()
            .await
            .map_err(|e| VerificationError::Http(e.to_string()))?
            .json()
            .await
            .map_err(|e| VerificationError::Http(e.to_string()))
    }

    async fn check_status(
        &self,
        url: &Url,
        api_key: &str,
        guid: &str,
        address: Address,
    ) -> Result<VerificationOutcome, VerificationError> {
        let chain_id = self.chain_id.to_string();
        let response: EtherscanResponse = self
            .client
            .get(url.clone())
            .query(&[
                ("chainid", chain_id.as_str()),
                ("apikey", api_key),
                ("module", "contract"),
                ("action", "checkverifystatus"),
                ("guid", guid),
            ])
            .send()
            .await
            .map_err(|e| VerificationError::Http(e.to_string()))?
            .json()
            .await
            .map_err(|e| VerificationError::Http(e.to_string()))?;

        if is_already_verified(&response.result) {
            return Ok(VerificationOutcome::AlreadyVerified);
        }
        if response.status == "1" {
            return Ok(VerificationOutcome::Verified);
        }
        if response.result.to_lowercase().contains("pending") {
            return Err(VerificationError::StillPending(address));
        }

        Err(VerificationError::Failed {
            address,
            message: response.result,
        })
    }
}

impl SourceVerifier for EtherscanVerifier {
    fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }

    async fn verify(
        &self,
        request: &VerificationRequest,
    ) -> Result<VerificationOutcome, VerificationError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(VerificationError::MissingCredential)?;
        let url = self
            .api_url
            .as_ref()
            .ok_or_else(|| VerificationError::MissingEndpoint(self.network.clone()))?;

        let failed = |message: String| VerificationError::Failed {
            address: request.address,
            message,
        };

        let artifact = self
            .artifacts
            .find(&request.contract_name)
            .map_err(|e| failed(e.to_string()))?;
        let build_info = self
            .artifacts
            .build_info(&artifact)
            .map_err(|e| failed(e.to_string()))?;
        let source_code = serde_json::to_string(&build_info.input)
            .map_err(|e| failed(format!("failed to serialize compiler input: {e}")))?;

        let form = [
            ("chainid", self.chain_id.to_string()),
            ("apikey", api_key.to_string()),
            ("module", "contract".to_string()),
            ("action", "verifysourcecode".to_string()),
            ("contractaddress", request.address.to_string()),
            ("sourceCode", source_code),
            ("codeformat", "solidity-standard-json-input".to_string()),
            ("contractname", artifact.fully_qualified_name()),
            ("compilerversion", build_info.compiler_version()),
            // Misspelling is part of the explorer API.
            ("constructorArguements", hex::encode(request.args.abi_encode())),
        ];

        let submitted = self.submit(url, &form).await?;
        if submitted.status != "1" {
            if is_already_verified(&submitted.result) {
                return Ok(VerificationOutcome::AlreadyVerified);
            }
            return Err(VerificationError::Rejected(format!(
                "{}: {}",
                submitted.message, submitted.result
            )));
        }

        let guid = submitted.result;
        tracing::debug!(%guid, address = %request.address, "Verification submitted");

        (|| self.check_status(url, api_key, &guid, request.address))
            .retry(
                ConstantBuilder::default()
                    .with_delay(self.poll_interval)
                    .with_max_times(self.max_polls),
            )
            .when(|e| matches!(e, VerificationError::StillPending(_)))
            .notify(|_, delay| {
                tracing::debug!(?delay, "Verification pending, polling again...");
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::{
        Method::{GET, POST},
        MockServer,
    };
    use serde_json::json;
    use std::path::Path;
    use tempdir::TempDir;

    const SEPOLIA: u64 = 11155111;

    fn write_raffle_build(root: &Path) {
        let raffle_dir = root.join("contracts/Raffle.sol");
        std::fs::create_dir_all(&raffle_dir).unwrap();
        std::fs::write(
            raffle_dir.join("Raffle.json"),
            r#"{"contractName":"Raffle","sourceName":"contracts/Raffle.sol","bytecode":"0x6080604052"}"#,
        )
        .unwrap();
        std::fs::write(
            raffle_dir.join("Raffle.dbg.json"),
            r#"{"_format":"hh-sol-dbg-1","buildInfo":"../../build-info/abc.json"}"#,
        )
        .unwrap();

        let build_info = root.join("build-info");
        std::fs::create_dir_all(&build_info).unwrap();
        std::fs::write(
            build_info.join("abc.json"),
            r#"{"solcLongVersion":"0.8.7+commit.e28d00a7","input":{"language":"Solidity"}}"#,
        )
        .unwrap();
    }

    fn raffle_request() -> VerificationRequest {
        VerificationRequest {
            contract_name: "Raffle".to_string(),
            address: Address::repeat_byte(0x42),
            args: Default::default(),
        }
    }

    #[test]
    fn test_already_verified_detection() {
        assert!(is_already_verified("Contract source code already verified"));
        assert!(is_already_verified("Already Verified"));
        assert!(!is_already_verified("Pass - Verified"));
    }

    #[test]
    fn test_blank_key_counts_as_missing() {
        let verifier = EtherscanVerifier::new(
            "sepolia",
            SEPOLIA,
            None,
            Some("  ".to_string()),
            Artifacts::new("."),
        )
        .unwrap();
        assert!(!verifier.has_credential());
    }

    #[tokio::test]
    async fn test_verify_without_endpoint_fails() {
        let verifier = EtherscanVerifier::new(
            "sepolia",
            SEPOLIA,
            None,
            Some("KEY".to_string()),
            Artifacts::new("."),
        )
        .unwrap();

        let err = verifier.verify(&raffle_request()).await.unwrap_err();

        assert!(matches!(err, VerificationError::MissingEndpoint(network) if network == "sepolia"));
    }

    #[tokio::test]
    async fn test_verify_sends_chain_id_on_submit_and_status() {
        let temp_dir = TempDir::new("rafflekit-etherscan").expect("Failed to create temp dir");
        write_raffle_build(temp_dir.path());

        let server = MockServer::start_async().await;
        let submit = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v2/api")
                    .body_contains("chainid=11155111")
                    .body_contains("action=verifysourcecode");
                then.status(200)
                    .json_body(json!({ "status": "1", "message": "OK", "result": "guid-1" }));
            })
            .await;
        let status = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/v2/api")
                    .query_param("chainid", "11155111")
                    .query_param("action", "checkverifystatus")
                    .query_param("guid", "guid-1");
                then.status(200).json_body(
                    json!({ "status": "1", "message": "OK", "result": "Pass - Verified" }),
                );
            })
            .await;

        let verifier = EtherscanVerifier::new(
            "sepolia",
            SEPOLIA,
            Some(server.url("/v2/api").parse().unwrap()),
            Some("KEY".to_string()),
            Artifacts::new(temp_dir.path()),
        )
        .unwrap();

        let outcome = verifier.verify(&raffle_request()).await.unwrap();

        assert_eq!(outcome, VerificationOutcome::Verified);
        assert_eq!(submit.hits_async().await, 1);
        assert_eq!(status.hits_async().await, 1);
    }

    #[tokio::test]
    async fn test_already_verified_submission_is_success() {
        let temp_dir = TempDir::new("rafflekit-etherscan").expect("Failed to create temp dir");
        write_raffle_build(temp_dir.path());

        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).body_contains("chainid=11155111");
                then.status(200).json_body(json!({
                    "status": "0",
                    "message": "NOTOK",
                    "result": "Contract source code already verified"
                }));
            })
            .await;

        let verifier = EtherscanVerifier::new(
            "sepolia",
            SEPOLIA,
            Some(server.url("/v2/api").parse().unwrap()),
            Some("KEY".to_string()),
            Artifacts::new(temp_dir.path()),
        )
        .unwrap();

        let outcome = verifier.verify(&raffle_request()).await.unwrap();
        assert_eq!(outcome, VerificationOutcome::AlreadyVerified);
    }
}
