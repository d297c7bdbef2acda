//! Chunk segmentation and disk staging.
//!
//! A source byte stream is split into fixed-size chunks, each staged as its
//! own file so an interrupted upload can be resumed without re-running the
//! transcoder. Chunk files are named `{name}_chunk_{index}` and reloaded in
//! numeric index order.

mod segment;
mod staging;

pub use segment::{Chunk, hex_prefix, reassemble, segment};
pub use staging::{chunk_file_name, load, persist};

/// Default chunk size: 1 MiB.
///
/// One ledger write carries one chunk, so this bounds per-transaction
/// payload size.
pub const DEFAULT_CHUNK_SIZE: usize = 1024 * 1024;

/// Errors produced by segmentation and staging.
#[derive(Debug, thiserror::Error)]
pub enum ChunkError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("staged chunk count {found} does not match expected {expected}")]
    CorruptStaging { expected: u32, found: u32 },

    #[error("malformed chunk file name: {0}")]
    MalformedChunkFile(String),
}
