//! Ethereum JSON-RPC client used by the on-chain adapters.

use std::time::Duration;

use alloy_core::primitives::{Address, B256, Bytes, U64, U256};
use anyhow::Context;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;
use url::Url;

use crate::error::TransactionError;

/// Default timeout for RPC requests.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default interval between receipt polling attempts.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Default time allowed for a transaction to reach its confirmation depth.
pub const DEFAULT_CONFIRMATION_TIMEOUT: Duration = Duration::from_secs(300);

/// Create an HTTP client configured for JSON-RPC requests.
pub fn create_client() -> Result<reqwest::Client, anyhow::Error> {
    reqwest::Client::builder()
        .timeout(DEFAULT_TIMEOUT)
        .build()
        .context("Failed to create HTTP client")
}

/// Make a JSON-RPC call and deserialize the result.
///
/// A `null` result deserializes into `Option::None` for optional targets.
pub async fn json_rpc_call<T: DeserializeOwned>(
    client: &reqwest::Client,
    url: &str,
    method: &str,
    params: Vec<Value>,
) -> Result<T, anyhow::Error> {
    let response = client
        .post(url)
        .json(&serde_json::json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": 1
        }))
        .send()
        .await
        .with_context(|| format!("Failed to send {} request", method))?;

    let result: Value = response
        .json()
        .await
        .with_context(|| format!("Failed to parse {} response", method))?;

    if let Some(error) = result.get("error") {
        anyhow::bail!(
            "RPC error: {}",
            error
                .get("message")
                .and_then(|m| m.as_str())
                .unwrap_or("unknown")
        );
    }

    let result_value = result
        .get("result")
        .context("No result in response")?
        .clone();

    serde_json::from_value(result_value)
        .with_context(|| format!("Failed to deserialize {} result", method))
}

/// Parameters of an `eth_sendTransaction` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRequest {
    pub from: Address,
    /// `None` for contract creation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<Address>,
    #[serde(rename = "data")]
    pub input: Bytes,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<U256>,
}

/// A log entry of a transaction receipt.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Log {
    pub address: Address,
    pub topics: Vec<B256>,
    pub data: Bytes,
}

/// The subset of a transaction receipt the pipeline relies on.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionReceipt {
    pub transaction_hash: B256,
    pub block_number: U64,
    /// Absent on pre-Byzantium chains; treated as success.
    #[serde(default)]
    pub status: Option<U64>,
    #[serde(default)]
    pub contract_address: Option<Address>,
    #[serde(default)]
    pub gas_used: U256,
    #[serde(default)]
    pub logs: Vec<Log>,
}

impl TransactionReceipt {
    pub fn succeeded(&self) -> bool {
        self.status.is_none_or(|status| status != U64::ZERO)
    }

    pub fn block(&self) -> u64 {
        self.block_number.to::<u64>()
    }
}

/// Thin typed wrapper around the node's JSON-RPC endpoint.
///
/// Transactions are submitted with `eth_sendTransaction`, so the node signs
/// on behalf of the named account.
#[derive(Debug, Clone)]
pub struct EthClient {
    client: reqwest::Client,
    url: Url,
    poll_interval: Duration,
    confirmation_timeout: Duration,
}

impl EthClient {
    pub fn new(url: Url) -> Result<Self, anyhow::Error> {
        Ok(Self {
            client: create_client()?,
            url,
            poll_interval: DEFAULT_POLL_INTERVAL,
            confirmation_timeout: DEFAULT_CONFIRMATION_TIMEOUT,
        })
    }

    pub fn with_confirmation_timeout(mut self, timeout: Duration) -> Self {
        self.confirmation_timeout = timeout;
        self
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &'static str,
        params: Vec<Value>,
    ) -> Result<T, TransactionError> {
        json_rpc_call(&self.client, self.url.as_str(), method, params)
            .await
            .map_err(|e| TransactionError::Rpc {
                method,
                message: format!("{e:#}"),
            })
    }

    pub async fn chain_id(&self) -> Result<u64, TransactionError> {
        let chain_id: U64 = self.call("eth_chainId", vec![]).await?;
        Ok(chain_id.to::<u64>())
    }

    pub async fn accounts(&self) -> Result<Vec<Address>, TransactionError> {
        self.call("eth_accounts", vec![]).await
    }

    pub async fn block_number(&self) -> Result<u64, TransactionError> {
        let number: U64 = self.call("eth_blockNumber", vec![]).await?;
        Ok(number.to::<u64>())
    }

    pub async fn get_code(&self, address: Address) -> Result<Bytes, TransactionError> {
        self.call(
            "eth_getCode",
            vec![serde_json::json!(address), serde_json::json!("latest")],
        )
        .await
    }

    pub async fn send_transaction(
        &self,
        request: &TransactionRequest,
    ) -> Result<B256, TransactionError> {
        let tx_hash: B256 = self
            .call("eth_sendTransaction", vec![serde_json::json!(request)])
            .await?;
        tracing::debug!(%tx_hash, from = %request.from, to = ?request.to, "Transaction sent");
        Ok(tx_hash)
    }

    pub async fn transaction_receipt(
        &self,
        tx_hash: B256,
    ) -> Result<Option<TransactionReceipt>, TransactionError> {
        self.call(
            "eth_getTransactionReceipt",
            vec![serde_json::json!(tx_hash)],
        )
        .await
    }

    /// Wait until `tx_hash` is mined and buried under `confirmations - 1` blocks.
    ///
    /// A reverted receipt fails immediately; it is never retried.
    pub async fn wait_for_confirmations(
        &self,
        tx_hash: B256,
        confirmations: u64,
    ) -> Result<TransactionReceipt, TransactionError> {
        let confirmations = confirmations.max(1);

        let wait = async {
            loop {
                if let Some(receipt) = self.transaction_receipt(tx_hash).await? {
                    if !receipt.succeeded() {
                        return Err(TransactionError::Reverted(tx_hash));
                    }

                    let head = self.block_number().await?;
                    let observed = head.saturating_sub(receipt.block()) + 1;
                    if observed >= confirmations {
                        return Ok(receipt);
                    }

                    tracing::trace!(%tx_hash, observed, confirmations, "Waiting for confirmations...");
                } else {
                    tracing::trace!(%tx_hash, "Transaction not mined yet, retrying...");
                }

                tokio::time::sleep(self.poll_interval).await;
            }
        };

        tokio::time::timeout(self.confirmation_timeout, wait)
            .await
            .map_err(|_| TransactionError::Timeout {
                tx_hash,
                confirmations,
                timeout_secs: self.confirmation_timeout.as_secs(),
            })?
    }

    /// Send a transaction and wait for its confirmation depth.
    pub async fn send_and_confirm(
        &self,
        request: &TransactionRequest,
        confirmations: u64,
    ) -> Result<TransactionReceipt, TransactionError> {
        let tx_hash = self.send_transaction(request).await?;
        self.wait_for_confirmations(tx_hash, confirmations).await
    }
}

/// A JSON-RPC node stand-in for adapter tests.
#[cfg(test)]
pub(crate) mod fake_node {
    use httpmock::{Method::POST, Mock, MockServer};
    use serde_json::{Value, json};

    use super::EthClient;

    pub const TX_HASH: &str = "0x1111111111111111111111111111111111111111111111111111111111111111";

    /// Answer every `method` request with `result`.
    pub async fn answer<'a>(server: &'a MockServer, method: &str, result: Value) -> Mock<'a> {
        let marker = format!("\"method\":\"{method}\"");
        server
            .mock_async(move |when, then| {
                when.method(POST).body_contains(marker);
                then.status(200)
                    .json_body(json!({ "jsonrpc": "2.0", "id": 1, "result": result }));
            })
            .await
    }

    pub fn receipt(block: &str, status: &str, contract_address: Option<&str>) -> Value {
        json!({
            "transactionHash": TX_HASH,
            "blockNumber": block,
            "status": status,
            "contractAddress": contract_address,
            "gasUsed": "0x5208",
            "logs": []
        })
    }

    pub fn client(server: &MockServer) -> EthClient {
        EthClient::new(server.base_url().parse().unwrap()).unwrap()
    }
}
