//! Legacy (0x102/0x103) file table: chained records with obfuscated names
//! and offset-distorted sizes.

use std::io::Cursor;

use byteorder::{LE, ReadBytesExt};
use tracing::{trace, warn};

use crate::error::{GrfError, Result};
use crate::grf::cipher::{BLOCK_SIZE, decode_name};
use crate::grf::{EntryFlags, HEADER_SIZE};
use crate::spec::RecordTail;

use super::{RecordValues, TableRecord};

/// Bytes between the start of a record and its name: the length field and two skipped bytes.
const NAME_START: usize = 6;
/// Added to the aligned size on disk.
const ALIGNED_SIZE_BIAS: u32 = 37579;
/// Added to the compressed size on disk, on top of the uncompressed size.
const COMPRESSED_SIZE_BIAS: u32 = 715;

pub fn read_records(table: &[u8], file_count: u32) -> Result<Vec<TableRecord>> {
    // every record holds at least the name prefix and the tail
    let capacity = (file_count as usize).min(table.len() / (NAME_START + RecordTail::SIZE));
    let mut records = Vec::with_capacity(capacity);
    let mut cursor = 0usize;

    for index in 0..file_count {
        let malformed = |reason: &'static str| GrfError::MalformedRecord {
            index,
            offset: cursor,
            reason,
        };

        let record = table.get(cursor..).ok_or_else(|| malformed("record starts past end of table"))?;
        let record_len = Cursor::new(record)
            .read_u32::<LE>()
            .map_err(|_| malformed("record length truncated"))? as usize;

        // The name length comes from the first byte of the record alone.
        let name_len = (record[0] as usize)
            .checked_sub(NAME_START)
            .ok_or_else(|| malformed("name length below minimum"))?;
        let encoded_name = record
            .get(NAME_START..NAME_START + name_len)
            .ok_or_else(|| malformed("name runs past end of table"))?;
        let name = decode_name(encoded_name);

        let tail_start = record_len
            .checked_add(4)
            .ok_or_else(|| malformed("record length overflow"))?;
        let tail = record
            .get(tail_start..)
            .and_then(RecordTail::from_prefix)
            .ok_or_else(|| malformed("record tail runs past end of table"))?;

        let values = undistort(&tail, &name);
        trace!(index, name = %name, ?values, "legacy record");
        if values.flags.is_retained(values.uncompressed_size) && values.compressed_size_aligned as usize % BLOCK_SIZE != 0 {
            warn!(name = %name, aligned = values.compressed_size_aligned, "aligned size is not a multiple of the block size");
        }

        records.push(TableRecord { name, values });
        cursor += tail_start + RecordTail::SIZE;
    }

    Ok(records)
}

fn undistort(tail: &RecordTail, name: &str) -> RecordValues {
    let uncompressed_size = tail.uncompressed_size.get();
    let compressed_size = tail
        .compressed_size
        .get()
        .wrapping_sub(uncompressed_size)
        .wrapping_sub(COMPRESSED_SIZE_BIAS);
    let compressed_size_aligned = tail.compressed_size_aligned.get().wrapping_sub(ALIGNED_SIZE_BIAS);
    let flags = EntryFlags::from_bits_retain(tail.flags) | EntryFlags::legacy_cipher_for(name);

    RecordValues {
        offset: tail.offset.get() as u64 + HEADER_SIZE as u64,
        compressed_size,
        compressed_size_aligned,
        uncompressed_size,
        flags,
    }
}
