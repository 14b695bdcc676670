use crate::grf::EntryFlags;

use super::des::{BLOCK_SIZE, Block, decrypt_block, decrypt_blocks};

/// Number of leading blocks that are always encrypted.
pub const HEADER_BLOCKS: usize = 20;

const SHUFFLE_PERIOD: usize = 7;

/// Runs the cipher pass selected by `flags` over raw entry bytes.
///
/// `MIXED` takes precedence over `DES`; entries with neither are left as-is.
pub fn decode_payload(data: &mut [u8], flags: EntryFlags, compressed_size: u32) {
    if flags.contains(EntryFlags::MIXED) {
        decode_full(data, compressed_size);
    } else if flags.contains(EntryFlags::DES) {
        decode_header(data);
    }
}

/// Decrypts the first `HEADER_BLOCKS` blocks.
pub fn decode_header(data: &mut [u8]) {
    decrypt_blocks(data, HEADER_BLOCKS);
}

/// Full mixed decode: header blocks, then periodic decrypted and shuffled blocks.
pub fn decode_full(data: &mut [u8], compressed_size: u32) {
    decode_header(data);

    let cipher_period = cipher_period(compressed_size);
    let mut shuffle_index: usize = 0;
    for (i, chunk) in data.chunks_exact_mut(BLOCK_SIZE).enumerate().skip(HEADER_BLOCKS) {
        let Ok(block) = <&mut Block>::try_from(chunk) else {
            continue;
        };
        if i % cipher_period == 0 {
            decrypt_block(block);
            continue;
        }

        // The first non-cipher block has index 0 and is never shuffled.
        if shuffle_index % SHUFFLE_PERIOD == 0 && shuffle_index != 0 {
            deshuffle_block(block);
        }
        shuffle_index += 1;
    }
}

/// Interval between decrypted blocks past the header, derived from the
/// decimal digit count of the unaligned compressed size.
pub fn cipher_period(compressed_size: u32) -> usize {
    let digits = compressed_size.checked_ilog10().map_or(1, |d| d as usize + 1);
    match digits {
        0..3 => 1,
        3..5 => digits + 1,
        5..7 => digits + 9,
        _ => digits + 15,
    }
}

pub fn deshuffle_block(block: &mut Block) {
    let src = *block;
    *block = [src[3], src[4], src[6], src[0], src[1], src[2], src[5], substitute(src[7])];
}

/// Involutive byte substitution applied to the last byte of shuffled blocks.
pub fn substitute(input: u8) -> u8 {
    match input {
        0x00 => 0x2B,
        0x2B => 0x00,
        0x6C => 0x80,
        0x80 => 0x6C,
        0x01 => 0x68,
        0x68 => 0x01,
        0x48 => 0x77,
        0x77 => 0x48,
        0x60 => 0xFF,
        0xFF => 0x60,
        0xB9 => 0xC0,
        0xC0 => 0xB9,
        0xFE => 0xEB,
        0xEB => 0xFE,
        other => other,
    }
}
