//! Chunk splitting for incremental decoding tests.

/// Splits `bytes` at `at`.
pub fn split_at(bytes: &[u8], at: usize) -> Vec<&[u8]> {
    let (head, tail) = bytes.split_at(at.min(bytes.len()));
    vec![head, tail]
}

/// Splits `bytes` into chunks of random sizes in `1..=max_chunk`.
pub fn random_chunks(bytes: &[u8], max_chunk: usize) -> Vec<&[u8]> {
    let max_chunk = max_chunk.max(1);
    let mut chunks = Vec::new();
    let mut rest = bytes;
    while !rest.is_empty() {
        let size = fastrand::usize(1..=max_chunk.min(rest.len()));
        let (chunk, tail) = rest.split_at(size);
        chunks.push(chunk);
        rest = tail;
    }
    chunks
}

/// Single-byte chunks.
pub fn byte_chunks(bytes: &[u8]) -> Vec<&[u8]> {
    bytes.chunks(1).collect()
}

/// Feeds `chunks` to `consume` the way a network transport would: bytes the
/// consumer did not take are kept and prepended to the next chunk.
///
/// `consume` receives the pending bytes and returns how many it consumed.
/// Returns the bytes still pending after the last chunk.
pub fn replay<E>(
    chunks: &[&[u8]],
    mut consume: impl FnMut(&[u8]) -> Result<usize, E>,
) -> Result<Vec<u8>, E> {
    let mut pending = Vec::new();
    for chunk in chunks {
        pending.extend_from_slice(chunk);
        loop {
            let consumed = consume(&pending)?;
            if consumed == 0 {
                break;
            }
            pending.drain(..consumed);
        }
    }
    Ok(pending)
}
