/// Progress events emitted while an upload runs.
///
/// Consumed by the CLI for operator feedback; dropping the receiver is
/// harmless, sends are best-effort.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadEvent {
    /// The parent record was created and its id checkpointed.
    RecordCreated { record_id: String, tx_hash: String },

    /// A chunk passed the fee gate and is being submitted.
    ChunkSubmitting { index: u32, total: u32 },

    /// A chunk received its terminal confirmation and the checkpoint was
    /// written.
    ChunkConfirmed {
        index: u32,
        total: u32,
        tx_hash: String,
    },

    /// Every chunk is confirmed and the staging directory was cleared.
    Completed,
}
