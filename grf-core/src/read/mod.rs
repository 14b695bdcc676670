use std::io::{Read, Seek, SeekFrom};

use tracing::debug;

use crate::error::{GrfError, Result};
use crate::grf::{EntryMap, GrfArchive, GrfEntry, GrfHeader, GrfVersion};
use crate::spec;

pub mod entry;
pub mod table_v1;
pub mod table_v2;

/// A table record before it is accepted as an entry.
#[derive(Debug, Clone)]
pub struct TableRecord {
    pub name: String,
    pub values: RecordValues,
}

/// Record sizes and flags with any format distortion already undone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordValues {
    pub offset: u64,
    pub compressed_size: u32,
    pub compressed_size_aligned: u32,
    pub uncompressed_size: u32,
    pub flags: crate::grf::EntryFlags,
}

impl TableRecord {
    pub fn is_retained(&self) -> bool {
        self.values.flags.is_retained(self.values.uncompressed_size)
    }

    fn into_entry(self) -> GrfEntry {
        GrfEntry::new(
            self.name,
            self.values.offset,
            self.values.compressed_size,
            self.values.compressed_size_aligned,
            self.values.uncompressed_size,
            self.values.flags,
        )
    }
}

pub fn read_header<R>(reader: &mut R) -> Result<GrfHeader>
where
    R: Read,
{
    let spec_header = spec::Header::from_reader(reader)?;
    let header = GrfHeader::try_from(spec_header)?;
    debug!(?header, "read GRF header");
    Ok(header)
}

pub fn read_archive<R>(reader: &mut R) -> Result<GrfArchive>
where
    R: Read + Seek,
{
    // read header
    reader.seek(SeekFrom::Start(0))?;
    let header = read_header(reader)?;

    // read table region
    let table_position = header.table_position();
    let file_len = reader.seek(SeekFrom::End(0))?;
    if table_position > file_len {
        return Err(GrfError::InvalidHeader(format!(
            "table position {table_position} is past the end of the file ({file_len} bytes)"
        )));
    }
    reader.seek(SeekFrom::Start(table_position))?;
    let mut table = Vec::with_capacity((file_len - table_position) as usize);
    reader.read_to_end(&mut table)?;

    // parse records
    let records = match header.version() {
        GrfVersion::V102 | GrfVersion::V103 => table_v1::read_records(&table, header.file_count())?,
        GrfVersion::V200 => table_v2::read_records(&table, header.file_count())?,
    };

    let entries = index_records(records);
    debug!(
        version = ?header.version(),
        file_count = header.file_count(),
        retained = entries.len(),
        "read GRF file table"
    );

    Ok(GrfArchive::new(header, entries))
}

/// Keeps retained records, keyed by path; a later duplicate replaces an earlier one.
fn index_records(records: Vec<TableRecord>) -> EntryMap {
    let mut entries = EntryMap::with_capacity_and_hasher(records.len(), Default::default());
    for record in records {
        if !record.is_retained() {
            continue;
        }
        let entry = record.into_entry();
        entries.insert(entry.path.clone(), entry);
    }
    entries
}
