use crate::DEFAULT_CHUNK_SIZE;

/// One ordered, immutable chunk of the source stream.
///
/// Identity is `(record name, index)`; the final chunk may be shorter than
/// the configured size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub index: u32,
    pub data: Vec<u8>,
}

/// Hex-encodes the first `len` characters of `data` for operator display.
pub fn hex_prefix(data: &[u8], len: usize) -> String {
    let mut s = hex::encode(data);
    s.truncate(len);
    s
}

/// Splits `source` into fixed-size chunks.
///
/// Deterministic: the same input and chunk size always yield the same
/// sequence. If `chunk_size` is 0, [`DEFAULT_CHUNK_SIZE`] is used.
/// An empty source yields no chunks.
pub fn segment(source: &[u8], chunk_size: usize) -> Vec<Chunk> {
    let chunk_size = if chunk_size == 0 {
        DEFAULT_CHUNK_SIZE
    } else {
        chunk_size
    };

    source
        .chunks(chunk_size)
        .enumerate()
        .map(|(index, data)| Chunk {
            index: index as u32,
            data: data.to_vec(),
        })
        .collect()
}

/// Concatenates chunks in index order back into the original byte stream.
pub fn reassemble(chunks: &[Chunk]) -> Vec<u8> {
    let mut out = Vec::with_capacity(chunks.iter().map(|c| c.data.len()).sum());
    for chunk in chunks {
        out.extend_from_slice(&chunk.data);
    }
    out
}
