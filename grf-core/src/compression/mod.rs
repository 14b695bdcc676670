use std::io::Read;

use flate2::read::ZlibDecoder;

use crate::error::{GrfError, Result};

/// Upper bound on the deflate expansion ratio used to cap capacity hints.
const MAX_EXPANSION: usize = 1032;

/// Inflates a zlib stream. Bytes after the end of the stream are ignored.
///
/// `size_hint` comes from archive tables and is only trusted up to what
/// `data` could expand to.
pub fn inflate_zlib(data: &[u8], size_hint: usize) -> Result<Vec<u8>> {
    let mut decoder = ZlibDecoder::new(data);
    let mut output = Vec::with_capacity(capacity_hint(data.len(), size_hint));
    decoder
        .read_to_end(&mut output)
        .map_err(|e| GrfError::CorruptStream(e.to_string()))?;

    Ok(output)
}

fn capacity_hint(compressed_len: usize, size_hint: usize) -> usize {
    size_hint.min(compressed_len.saturating_mul(MAX_EXPANSION))
}

/// Inflates a zlib stream whose decoded length is known in advance.
pub fn inflate_zlib_sized(data: &[u8], expected_len: usize) -> Result<Vec<u8>> {
    let output = inflate_zlib(data, expected_len)?;
    if output.len() != expected_len {
        return Err(GrfError::CorruptStream(format!(
            "decoded size mismatch: expected {}, got {}",
            expected_len,
            output.len()
        )));
    }

    Ok(output)
}
