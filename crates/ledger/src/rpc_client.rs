use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use tracing::{debug, info};

use crate::{Confirmation, LedgerClient, LedgerError, RecordCreated, RecordMetadata};

/// Gas limit for the create-record write.
pub const CREATE_GAS_LIMIT: u64 = 500_000;

/// Gas limit for an append-chunk write, sized for a full chunk payload
/// with some buffer.
pub const APPEND_GAS_LIMIT: u64 = 29_700_000;

/// Interval between receipt polls after a write is accepted.
const RECEIPT_POLL: Duration = Duration::from_secs(5);

/// Default ceiling on the whole confirmation wait.
const RECEIPT_TIMEOUT: Duration = Duration::from_secs(600);

/// Ledger client over JSON-RPC to a publisher node.
///
/// The node signs on the client's behalf with the forwarded credential;
/// this adapter only submits and waits for terminal receipts. A write
/// whose receipt never appears within the timeout is surfaced as
/// [`LedgerError::ConfirmationTimeout`] and never retried here — the
/// transaction may still land, and retrying would risk a duplicate slot
/// assignment.
pub struct RpcLedgerClient {
    http: reqwest::Client,
    rpc_url: String,
    contract_address: String,
    credential: String,
    receipt_timeout: Duration,
}

impl RpcLedgerClient {
    pub fn new(
        http: reqwest::Client,
        rpc_url: String,
        contract_address: String,
        credential: String,
    ) -> Self {
        Self {
            http,
            rpc_url,
            contract_address,
            credential,
            receipt_timeout: RECEIPT_TIMEOUT,
        }
    }

    /// Overrides the confirmation timeout (mainly for tests).
    pub fn with_receipt_timeout(mut self, timeout: Duration) -> Self {
        self.receipt_timeout = timeout;
        self
    }

    async fn call(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<serde_json::Value, LedgerError> {
        let req = chainvid_rpc::Request::new(method, params, 1);
        let resp: chainvid_rpc::Response = self
            .http
            .post(&self.rpc_url)
            .json(&req)
            .send()
            .await?
            .json()
            .await?;
        Ok(resp.into_result()?)
    }

    /// Submits a write and returns its transaction hash.
    async fn submit(
        &self,
        method: &str,
        mut params: serde_json::Value,
    ) -> Result<String, LedgerError> {
        params["signer"] = serde_json::Value::String(self.credential.clone());
        let result = self.call(method, serde_json::json!([params])).await?;
        result
            .as_str()
            .map(str::to_owned)
            .ok_or(LedgerError::MalformedReceipt("transaction hash"))
    }

    /// Polls for the terminal receipt of `tx_hash`.
    async fn wait_for_receipt(&self, tx_hash: &str) -> Result<Receipt, LedgerError> {
        let deadline = tokio::time::Instant::now() + self.receipt_timeout;
        loop {
            let result = self
                .call("vid_getReceipt", serde_json::json!([tx_hash]))
                .await?;
            if !result.is_null() {
                let receipt = parse_receipt(&result)?;
                if !receipt.status {
                    return Err(LedgerError::Reverted {
                        tx_hash: tx_hash.to_string(),
                    });
                }
                return Ok(receipt);
            }

            if tokio::time::Instant::now() + RECEIPT_POLL > deadline {
                return Err(LedgerError::ConfirmationTimeout {
                    tx_hash: tx_hash.to_string(),
                    timeout_secs: self.receipt_timeout.as_secs(),
                });
            }
            debug!(tx_hash, "receipt pending");
            tokio::time::sleep(RECEIPT_POLL).await;
        }
    }
}

impl LedgerClient for RpcLedgerClient {
    fn create_record(
        &self,
        meta: &RecordMetadata,
        max_price_wei: u128,
    ) -> Pin<Box<dyn Future<Output = Result<RecordCreated, LedgerError>> + Send + '_>> {
        let params = serde_json::json!({
            "contract": self.contract_address,
            "name": meta.filename,
            "durationHint": meta.duration_secs,
            "metadata": meta.metadata,
            "maxFeePerGas": chainvid_rpc::format_quantity(max_price_wei),
            "gasLimit": chainvid_rpc::format_quantity(CREATE_GAS_LIMIT as u128),
        });
        Box::pin(async move {
            let tx_hash = self.submit("vid_createRecord", params).await?;
            let receipt = self.wait_for_receipt(&tx_hash).await?;
            let record_id = receipt.record_id.clone().ok_or_else(|| {
                LedgerError::RecordCreation(format!(
                    "confirmed transaction {tx_hash} carries no record id"
                ))
            })?;
            info!(tx_hash, record_id, gas_used = receipt.gas_used, "record created");
            Ok(RecordCreated {
                record_id,
                confirmation: Confirmation {
                    tx_hash,
                    gas_used: receipt.gas_used,
                },
            })
        })
    }

    fn append_chunk(
        &self,
        record_id: &str,
        chunk: &[u8],
        max_price_wei: u128,
    ) -> Pin<Box<dyn Future<Output = Result<Confirmation, LedgerError>> + Send + '_>> {
        let params = serde_json::json!({
            "contract": self.contract_address,
            "recordId": record_id,
            "data": format!("0x{}", hex::encode(chunk)),
            "maxFeePerGas": chainvid_rpc::format_quantity(max_price_wei),
            "gasLimit": chainvid_rpc::format_quantity(APPEND_GAS_LIMIT as u128),
        });
        Box::pin(async move {
            let tx_hash = self.submit("vid_appendChunk", params).await?;
            let receipt = self.wait_for_receipt(&tx_hash).await?;
            debug!(tx_hash, gas_used = receipt.gas_used, "chunk confirmed");
            Ok(Confirmation {
                tx_hash,
                gas_used: receipt.gas_used,
            })
        })
    }
}

/// A parsed write receipt.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Receipt {
    status: bool,
    gas_used: u64,
    /// Present on create-record receipts only.
    record_id: Option<String>,
}

fn parse_receipt(value: &serde_json::Value) -> Result<Receipt, LedgerError> {
    let status_hex = value
        .get("status")
        .and_then(|v| v.as_str())
        .ok_or(LedgerError::MalformedReceipt("status"))?;
    let gas_hex = value
        .get("gasUsed")
        .and_then(|v| v.as_str())
        .ok_or(LedgerError::MalformedReceipt("gasUsed"))?;
    let record_id = value
        .get("recordId")
        .and_then(|v| v.as_str())
        .map(str::to_owned);

    Ok(Receipt {
        status: chainvid_rpc::parse_quantity(status_hex)? == 1,
        gas_used: chainvid_rpc::parse_quantity(gas_hex)? as u64,
        record_id,
    })
}
