use std::future::Future;
use std::pin::Pin;

use crate::LedgerError;

/// Descriptive fields for a new ledger record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordMetadata {
    /// Display name of the asset; also the staged chunk file prefix.
    pub filename: String,
    /// Playback duration hint in seconds (0 when unknown).
    pub duration_secs: u64,
    /// Opaque metadata blob stored alongside the record (codec string etc).
    pub metadata: String,
}

/// Terminal confirmation of one ledger write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Confirmation {
    pub tx_hash: String,
    pub gas_used: u64,
}

/// Result of creating a record: the ledger-assigned identifier plus the
/// confirmation it was extracted from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordCreated {
    pub record_id: String,
    pub confirmation: Confirmation,
}

/// Abstract connection to the ledger.
///
/// The production implementation is [`RpcLedgerClient`](crate::RpcLedgerClient);
/// using a trait keeps the upload pipeline decoupled from transport and
/// testable with mocks. Every call is stateless request/response; success
/// means a terminal confirmation, not broadcast acceptance.
pub trait LedgerClient: Send + Sync {
    /// Creates the parent record and returns its ledger-assigned id.
    fn create_record(
        &self,
        meta: &RecordMetadata,
        max_price_wei: u128,
    ) -> Pin<Box<dyn Future<Output = Result<RecordCreated, LedgerError>> + Send + '_>>;

    /// Appends one chunk to the record's next slot. Slots are assigned by
    /// submission order, so calls must arrive in chunk-index order.
    fn append_chunk(
        &self,
        record_id: &str,
        chunk: &[u8],
        max_price_wei: u128,
    ) -> Pin<Box<dyn Future<Output = Result<Confirmation, LedgerError>> + Send + '_>>;
}
