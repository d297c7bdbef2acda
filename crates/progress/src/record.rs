use serde::{Deserialize, Serialize};

use crate::ProgressError;

/// The persisted state of one upload.
///
/// Serialized with camelCase keys — the on-disk key names are the resume
/// contract and must not change without a migration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressRecord {
    /// Name of the uploaded asset; also the staged chunk file prefix.
    pub filename: String,

    /// Total number of chunks in this upload.
    pub total_chunks: u32,

    /// Highest chunk index confirmed on the ledger, or `None` before the
    /// first confirmation. Every chunk at or below it is confirmed.
    pub last_uploaded_chunk: Option<u32>,

    /// Ledger-assigned identifier of the parent record, once created.
    pub record_id: Option<String>,
}

impl ProgressRecord {
    /// Creates a record for a freshly created ledger record with nothing
    /// confirmed yet.
    pub fn new(filename: impl Into<String>, total_chunks: u32, record_id: String) -> Self {
        Self {
            filename: filename.into(),
            total_chunks,
            last_uploaded_chunk: None,
            record_id: Some(record_id),
        }
    }

    /// Index of the next chunk to submit.
    pub fn next_chunk(&self) -> u32 {
        self.last_uploaded_chunk.map_or(0, |k| k + 1)
    }

    /// True once every chunk has been confirmed.
    pub fn is_complete(&self) -> bool {
        self.last_uploaded_chunk
            .is_some_and(|k| k + 1 >= self.total_chunks)
    }

    /// Checks the `lastUploadedChunk ∈ [0, totalChunks - 1]` invariant.
    pub fn validate(&self) -> Result<(), ProgressError> {
        if let Some(last) = self.last_uploaded_chunk
            && last >= self.total_chunks
        {
            return Err(ProgressError::InvalidRecord {
                last,
                total: self.total_chunks,
            });
        }
        Ok(())
    }
}
