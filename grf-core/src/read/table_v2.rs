//! 0x200 file table: a zlib-compressed stream of plain records.

use std::io::Cursor;

use byteorder::{LE, ReadBytesExt};
use tracing::{trace, warn};

use crate::compression;
use crate::error::{GrfError, Result};
use crate::grf::cipher::latin1_to_string;
use crate::grf::{EntryFlags, HEADER_SIZE};
use crate::spec::RecordTail;

use super::{RecordValues, TableRecord};

/// Longest accepted name, terminator excluded.
pub const MAX_NAME_LEN: usize = 256;

pub fn read_records(table: &[u8], file_count: u32) -> Result<Vec<TableRecord>> {
    let mut reader = Cursor::new(table);
    let compressed_len = reader.read_u32::<LE>().map_err(|_| table_truncated())?;
    let uncompressed_len = reader.read_u32::<LE>().map_err(|_| table_truncated())?;

    let body = &table[8..];
    if body.len() < compressed_len as usize {
        warn!(compressed_len, available = body.len(), "compressed table is shorter than declared");
    }
    let stream = compression::inflate_zlib(body, uncompressed_len as usize)?;
    if stream.len() != uncompressed_len as usize {
        warn!(declared = uncompressed_len, actual = stream.len(), "table size disagrees with header");
    }

    parse_records(&stream, file_count)
}

fn table_truncated() -> GrfError {
    GrfError::MalformedRecord {
        index: 0,
        offset: 0,
        reason: "table size fields truncated",
    }
}

fn parse_records(stream: &[u8], file_count: u32) -> Result<Vec<TableRecord>> {
    // every record holds at least a terminator and the tail
    let capacity = (file_count as usize).min(stream.len() / (1 + RecordTail::SIZE));
    let mut records = Vec::with_capacity(capacity);
    let mut cursor = 0usize;

    for index in 0..file_count {
        let malformed = |reason: &'static str| GrfError::MalformedRecord {
            index,
            offset: cursor,
            reason,
        };

        let rest = stream.get(cursor..).ok_or_else(|| malformed("record starts past end of table"))?;
        let window = &rest[..rest.len().min(MAX_NAME_LEN + 1)];
        let name_len = window.iter().position(|&b| b == 0).ok_or_else(|| {
            if window.len() > MAX_NAME_LEN {
                malformed("name exceeds maximum length")
            } else {
                malformed("name runs past end of table")
            }
        })?;
        let name = latin1_to_string(&window[..name_len]);

        let tail = RecordTail::from_prefix(&rest[name_len + 1..])
            .ok_or_else(|| malformed("record tail runs past end of table"))?;
        let values = RecordValues {
            offset: tail.offset.get() as u64 + HEADER_SIZE as u64,
            compressed_size: tail.compressed_size.get(),
            compressed_size_aligned: tail.compressed_size_aligned.get(),
            uncompressed_size: tail.uncompressed_size.get(),
            flags: EntryFlags::from_bits_retain(tail.flags),
        };
        trace!(index, name = %name, ?values, "record");

        records.push(TableRecord { name, values });
        cursor += name_len + 1 + RecordTail::SIZE;
    }

    Ok(records)
}
