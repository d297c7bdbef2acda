use serde::{Deserialize, Serialize};

/// Error returned when a JSON-RPC response cannot be used.
#[derive(Debug, thiserror::Error)]
pub enum EnvelopeError {
    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("response carried neither result nor error")]
    Empty,
}

/// A JSON-RPC 2.0 request.
#[derive(Debug, Clone, Serialize)]
pub struct Request {
    pub jsonrpc: &'static str,
    pub method: String,
    pub params: serde_json::Value,
    pub id: u64,
}

impl Request {
    /// Builds a request with `jsonrpc: "2.0"` and the given id.
    pub fn new(method: impl Into<String>, params: serde_json::Value, id: u64) -> Self {
        Self {
            jsonrpc: "2.0",
            method: method.into(),
            params,
            id,
        }
    }
}

/// The error body of a failed JSON-RPC response.
#[derive(Debug, Clone, Deserialize)]
pub struct RpcErrorBody {
    pub code: i64,
    pub message: String,
}

/// A JSON-RPC 2.0 response.
#[derive(Debug, Clone, Deserialize)]
pub struct Response {
    #[serde(default)]
    pub result: Option<serde_json::Value>,
    #[serde(default)]
    pub error: Option<RpcErrorBody>,
    #[serde(default)]
    pub id: u64,
}

impl Response {
    /// Unwraps the result, converting a server-side error into [`EnvelopeError`].
    pub fn into_result(self) -> Result<serde_json::Value, EnvelopeError> {
        if let Some(err) = self.error {
            return Err(EnvelopeError::Rpc {
                code: err.code,
                message: err.message,
            });
        }
        self.result.ok_or(EnvelopeError::Empty)
    }
}
