use super::des::decrypt_blocks;

/// Decodes an obfuscated legacy-table file name.
pub fn decode_name(encoded: &[u8]) -> String {
    let mut buf = encoded.to_vec();
    for b in buf.iter_mut() {
        *b = b.rotate_left(4);
    }
    decrypt_blocks(&mut buf, usize::MAX);

    let end = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
    latin1_to_string(&buf[..end])
}

/// Maps each byte to the char of the same value.
///
/// Names are stored in the client's legacy code page; one char per byte keeps
/// the mapping lossless and reversible.
pub fn latin1_to_string(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}
