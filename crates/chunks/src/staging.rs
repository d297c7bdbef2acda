use std::path::Path;

use tracing::debug;

use crate::{Chunk, ChunkError};

/// Returns the staging file name for one chunk.
pub fn chunk_file_name(name: &str, index: u32) -> String {
    format!("{name}_chunk_{index}")
}

/// Writes every chunk to its own file under `dir`.
///
/// Creates `dir` if needed. Files are written once per upload attempt and
/// never modified afterwards.
pub fn persist(chunks: &[Chunk], dir: &Path, name: &str) -> Result<(), ChunkError> {
    std::fs::create_dir_all(dir)?;
    for chunk in chunks {
        let path = dir.join(chunk_file_name(name, chunk.index));
        std::fs::write(&path, &chunk.data)?;
    }
    debug!(count = chunks.len(), dir = %dir.display(), "chunks staged");
    Ok(())
}

/// Reloads the staged chunk sequence for `name` from `dir`.
///
/// Chunks are read by numeric index, never by directory listing order —
/// indices 9 and 10 sort wrongly as strings. A missing or unreadable chunk
/// file surfaces as [`ChunkError::Io`]; a staged file count that disagrees
/// with `expected_total` surfaces as [`ChunkError::CorruptStaging`].
pub fn load(dir: &Path, name: &str, expected_total: u32) -> Result<Vec<Chunk>, ChunkError> {
    let found = count_staged(dir, name)?;
    if found > expected_total {
        return Err(ChunkError::CorruptStaging {
            expected: expected_total,
            found,
        });
    }

    let mut chunks = Vec::with_capacity(expected_total as usize);
    for index in 0..expected_total {
        let path = dir.join(chunk_file_name(name, index));
        let data = std::fs::read(&path)?;
        chunks.push(Chunk { index, data });
    }

    debug!(count = chunks.len(), dir = %dir.display(), "chunks reloaded");
    Ok(chunks)
}

/// Counts staged chunk files for `name`, rejecting unparsable indices.
fn count_staged(dir: &Path, name: &str) -> Result<u32, ChunkError> {
    let prefix = format!("{name}_chunk_");
    let mut found = 0u32;

    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let file_name = entry.file_name();
        let Some(file_name) = file_name.to_str() else {
            continue;
        };
        let Some(suffix) = file_name.strip_prefix(&prefix) else {
            continue;
        };
        suffix
            .parse::<u32>()
            .map_err(|_| ChunkError::MalformedChunkFile(file_name.to_string()))?;
        found += 1;
    }

    Ok(found)
}
