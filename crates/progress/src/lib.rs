//! Durable upload progress checkpointing.
//!
//! One working directory holds the staged chunk files and a single
//! `upload_progress.json` record — the source of truth for how far an
//! upload got. The record is rewritten after every confirmed chunk, so a
//! crashed process can resume exactly where it left off.

mod file_store;
mod memory;
mod record;

pub use file_store::{FileProgressStore, PROGRESS_FILE};
pub use memory::MemoryProgressStore;
pub use record::ProgressRecord;

/// Errors from progress persistence.
#[derive(Debug, thiserror::Error)]
pub enum ProgressError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid progress record: lastUploadedChunk {last} with totalChunks {total}")]
    InvalidRecord { last: u32, total: u32 },
}

/// Storage for the single in-flight upload's progress record.
///
/// The orchestrator holds an injected implementation rather than a file
/// path, so tests can substitute [`MemoryProgressStore`].
pub trait ProgressStore: Send + Sync {
    /// Returns the persisted record, or `None` when no upload is in flight.
    fn load(&self) -> Result<Option<ProgressRecord>, ProgressError>;

    /// Atomically replaces the persisted record.
    fn save(&self, record: &ProgressRecord) -> Result<(), ProgressError>;

    /// Removes the record and all staged chunk files.
    fn clear(&self) -> Result<(), ProgressError>;
}
