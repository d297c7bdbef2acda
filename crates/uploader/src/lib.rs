//! Resumable, fee-gated chunk upload orchestration.
//!
//! Drives the per-chunk submission loop: fee gate, price calculation,
//! profile-specific pacing, submit, confirm, checkpoint. Chunks go out
//! strictly sequentially — ledger slots are assigned in submission order —
//! and the progress record is rewritten after every confirmation, so the
//! run can be interrupted between chunks and resumed without re-submitting
//! or skipping work.

mod events;
mod orchestrator;

pub use events::UploadEvent;
pub use orchestrator::{CAPPED_PAUSE, INSTANT_PAUSE, PACED_PAUSE, Uploader};

use chainvid_chunks::ChunkError;
use chainvid_fees::FeeError;
use chainvid_ledger::LedgerError;
use chainvid_progress::ProgressError;

/// Errors that halt an upload run.
///
/// Submission-level failures carry the chunk index so the operator can
/// diagnose and resume. None of them are auto-retried: the progress record
/// is left exactly as of the last confirmed chunk.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error(transparent)]
    Chunks(#[from] ChunkError),

    #[error(transparent)]
    Progress(#[from] ProgressError),

    #[error("fee source failed: {0}")]
    FeeSource(#[from] FeeError),

    #[error("record creation failed: {0}")]
    RecordCreation(#[source] LedgerError),

    #[error("chunk {chunk} submission failed: {source}")]
    Submission {
        chunk: u32,
        #[source]
        source: LedgerError,
    },

    #[error(
        "chunk {chunk} confirmation timed out: {source}; verify the ledger state before resuming"
    )]
    ConfirmationTimeout {
        chunk: u32,
        #[source]
        source: LedgerError,
    },

    #[error("an upload is already in flight in this working directory")]
    UploadInFlight,

    #[error("progress record has no record id; cannot resume")]
    MissingRecordId,

    #[error("cancelled")]
    Cancelled,
}
