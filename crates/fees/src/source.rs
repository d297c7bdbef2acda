use std::future::Future;
use std::pin::Pin;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::FeeError;

/// One joint reading of both fee signals.
///
/// Ephemeral: re-sampled before every chunk submission, never persisted or
/// cached across calls.
#[derive(Debug, Clone, PartialEq)]
pub struct FeeSample {
    /// Settlement-layer gas price, gwei.
    pub settlement_fee_gwei: f64,
    /// Data-publication (blob) fee, gwei.
    pub publication_fee_gwei: f64,
    pub sampled_at: DateTime<Utc>,
}

/// Abstract real-time fee feed.
///
/// The production implementation is [`RpcFeeSource`]; tests substitute a
/// scripted mock. Each read is an independent network call — failures are
/// retryable per call and never averaged over.
pub trait FeeSource: Send + Sync {
    /// Current settlement-layer gas price in gwei.
    fn settlement_fee_gwei(&self)
    -> Pin<Box<dyn Future<Output = Result<f64, FeeError>> + Send + '_>>;

    /// Current data-publication fee in gwei.
    fn publication_fee_gwei(
        &self,
    ) -> Pin<Box<dyn Future<Output = Result<f64, FeeError>> + Send + '_>>;

    /// Latest base fee on the target network, in wei. This is the input to
    /// transaction pricing, distinct from the two admission signals.
    fn base_fee_wei(&self) -> Pin<Box<dyn Future<Output = Result<u128, FeeError>> + Send + '_>>;
}

/// Fee feed over JSON-RPC.
///
/// The admission signals come from a public fee endpoint
/// (`eth_gasPrice` / `eth_blobBaseFee`); the pricing base fee comes from
/// the target network's own RPC (latest block header).
pub struct RpcFeeSource {
    http: reqwest::Client,
    fee_feed_url: String,
    network_rpc_url: String,
}

impl RpcFeeSource {
    pub fn new(http: reqwest::Client, fee_feed_url: String, network_rpc_url: String) -> Self {
        Self {
            http,
            fee_feed_url,
            network_rpc_url,
        }
    }

    async fn call(&self, url: &str, method: &str) -> Result<serde_json::Value, FeeError> {
        let req = chainvid_rpc::Request::new(method, serde_json::json!([]), 1);
        let resp: chainvid_rpc::Response =
            self.http.post(url).json(&req).send().await?.json().await?;
        Ok(resp.into_result()?)
    }

    async fn call_with(
        &self,
        url: &str,
        method: &str,
        params: serde_json::Value,
    ) -> Result<serde_json::Value, FeeError> {
        let req = chainvid_rpc::Request::new(method, params, 1);
        let resp: chainvid_rpc::Response =
            self.http.post(url).json(&req).send().await?.json().await?;
        Ok(resp.into_result()?)
    }
}

impl FeeSource for RpcFeeSource {
    fn settlement_fee_gwei(
        &self,
    ) -> Pin<Box<dyn Future<Output = Result<f64, FeeError>> + Send + '_>> {
        Box::pin(async move {
            let result = self.call(&self.fee_feed_url, "eth_gasPrice").await?;
            let gwei = quantity_gwei(&result)?;
            debug!(gwei, "settlement fee sampled");
            Ok(gwei)
        })
    }

    fn publication_fee_gwei(
        &self,
    ) -> Pin<Box<dyn Future<Output = Result<f64, FeeError>> + Send + '_>> {
        Box::pin(async move {
            let result = self.call(&self.fee_feed_url, "eth_blobBaseFee").await?;
            let gwei = quantity_gwei(&result)?;
            debug!(gwei, "publication fee sampled");
            Ok(gwei)
        })
    }

    fn base_fee_wei(&self) -> Pin<Box<dyn Future<Output = Result<u128, FeeError>> + Send + '_>> {
        Box::pin(async move {
            let block = self
                .call_with(
                    &self.network_rpc_url,
                    "eth_getBlockByNumber",
                    serde_json::json!(["latest", false]),
                )
                .await?;
            parse_base_fee(&block)
        })
    }
}

/// Parses a hex quantity result into gwei.
fn quantity_gwei(result: &serde_json::Value) -> Result<f64, FeeError> {
    let hex = result.as_str().ok_or(FeeError::MissingField("result"))?;
    Ok(chainvid_rpc::wei_to_gwei(chainvid_rpc::parse_quantity(hex)?))
}

/// Extracts `baseFeePerGas` from a block header object.
fn parse_base_fee(block: &serde_json::Value) -> Result<u128, FeeError> {
    let hex = block
        .get("baseFeePerGas")
        .and_then(|v| v.as_str())
        .ok_or(FeeError::MissingField("baseFeePerGas"))?;
    Ok(chainvid_rpc::parse_quantity(hex)?)
}
