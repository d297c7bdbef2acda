//! Ledger client boundary.
//!
//! Two write operations (create a record, append a chunk to it) and a
//! receipt read. Neither write carries a dedup key, so the caller's
//! checkpoint discipline is the only protection against duplicate
//! submission.

mod client;
mod rpc_client;

pub use client::{Confirmation, LedgerClient, RecordCreated, RecordMetadata};
pub use rpc_client::{APPEND_GAS_LIMIT, CREATE_GAS_LIMIT, RpcLedgerClient};

/// Errors from ledger writes and confirmation reads.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("RPC error: {0}")]
    Rpc(#[from] chainvid_rpc::EnvelopeError),

    #[error("bad quantity: {0}")]
    Quantity(#[from] chainvid_rpc::QuantityError),

    #[error("malformed receipt: missing {0}")]
    MalformedReceipt(&'static str),

    #[error("record creation failed: {0}")]
    RecordCreation(String),

    #[error("transaction {tx_hash} reverted")]
    Reverted { tx_hash: String },

    #[error("no confirmation for transaction {tx_hash} within {timeout_secs}s")]
    ConfirmationTimeout { tx_hash: String, timeout_secs: u64 },
}
