//! Synthetic archive builders for tests.

use std::io::Write;

use zerocopy::byteorder::little_endian::U32;
use zerocopy::{FromZeros, IntoBytes};

use crate::compression::tests::deflate_zlib;
use crate::grf::cipher::{BLOCK_SIZE, encode_name, encode_payload};
use crate::grf::{EntryFlags, GrfVersion};
use crate::spec;

pub(crate) const SIGNATURE: &str = "Master of Magic";

#[derive(Debug, Clone)]
pub(crate) struct FixtureEntry {
    pub path: String,
    pub data: Vec<u8>,
    pub flags: EntryFlags,
}

pub(crate) struct EncodedBlob {
    pub bytes: Vec<u8>,
    pub compressed_size: u32,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct Layout {
    pub offset: u32,
    pub compressed_size: u32,
    pub compressed_size_aligned: u32,
}

impl FixtureEntry {
    pub fn file(path: &str, data: &[u8]) -> Self {
        Self {
            path: path.to_string(),
            data: data.to_vec(),
            flags: EntryFlags::FILE | EntryFlags::legacy_cipher_for(path),
        }
    }

    pub fn folder(path: &str) -> Self {
        Self {
            path: path.to_string(),
            data: Vec::new(),
            flags: EntryFlags::FOLDER,
        }
    }

    pub fn empty_file(path: &str) -> Self {
        Self {
            path: path.to_string(),
            data: Vec::new(),
            flags: EntryFlags::FILE,
        }
    }

    pub fn with_flags(mut self, flags: EntryFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn reference_names() -> [&'static str; 9] {
        [
            "data\\0_Tex1.bmp",
            "data\\11001.txt",
            "data\\balls.wav",
            "data\\idnum2itemdesctable.txt",
            "data\\idnum2itemdisplaynametable.txt",
            "data\\loading00.jpg",
            "data\\monstertalktable.xml",
            "data\\resnametable.txt",
            "data\\t2_\u{b9}\u{e8}\u{b0}\u{e6}1-1.bmp",
        ]
    }

    /// Nine files with payloads of varied size, so every cipher schedule is hit.
    pub fn reference_set() -> Vec<FixtureEntry> {
        Self::reference_names()
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let len = 64 + i * 2_500;
                let mut seed = 0x9E37_79B9u32.wrapping_mul(i as u32 + 1);
                let data: Vec<u8> = (0..len)
                    .map(|_| {
                        seed = seed.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
                        (seed >> 24) as u8
                    })
                    .collect();
                FixtureEntry::file(name, &data)
            })
            .collect()
    }

    /// Compressed, padded and obfuscated payload as it sits in the archive.
    pub fn encode(&self) -> EncodedBlob {
        let mut bytes = deflate_zlib(&self.data);
        let compressed_size = bytes.len() as u32;
        bytes.resize(bytes.len().div_ceil(BLOCK_SIZE) * BLOCK_SIZE, 0);
        encode_payload(&mut bytes, self.flags, compressed_size);
        EncodedBlob { bytes, compressed_size }
    }

    fn legacy_effective(&self) -> FixtureEntry {
        let stored = self.flags & (EntryFlags::FILE | EntryFlags::FOLDER);
        self.clone().with_flags(stored | EntryFlags::legacy_cipher_for(&self.path))
    }
}

fn data_region(entries: &[FixtureEntry], first_offset: u32) -> (Vec<u8>, Vec<Layout>) {
    let mut region = Vec::new();
    let mut layouts = Vec::with_capacity(entries.len());
    for entry in entries {
        let blob = entry.encode();
        layouts.push(Layout {
            offset: first_offset + region.len() as u32,
            compressed_size: blob.compressed_size,
            compressed_size_aligned: blob.bytes.len() as u32,
        });
        region.extend_from_slice(&blob.bytes);
    }
    (region, layouts)
}

fn tail(layout: &Layout, uncompressed_size: u32, flags: u8) -> spec::RecordTail {
    spec::RecordTail {
        compressed_size: U32::new(layout.compressed_size),
        compressed_size_aligned: U32::new(layout.compressed_size_aligned),
        uncompressed_size: U32::new(uncompressed_size),
        flags,
        offset: U32::new(layout.offset),
    }
}

/// Legacy table for `entries`, assuming their data starts at `first_offset`.
pub(crate) fn legacy_table(entries: &[FixtureEntry], first_offset: u32) -> (Vec<u8>, Vec<Layout>) {
    let effective: Vec<FixtureEntry> = entries.iter().map(FixtureEntry::legacy_effective).collect();
    let (_, layouts) = data_region(&effective, first_offset);

    let mut table = Vec::new();
    for (entry, layout) in effective.iter().zip(&layouts) {
        let encoded_name = encode_name(&entry.path);
        let record_len = encoded_name.len() + 6;
        assert!(record_len < 256, "fixture name too long");

        let uncompressed = entry.data.len() as u32;
        let mut distorted = *layout;
        distorted.compressed_size = layout.compressed_size + uncompressed + 715;
        distorted.compressed_size_aligned = layout.compressed_size_aligned + 37579;
        let stored_flags = (entry.flags & (EntryFlags::FILE | EntryFlags::FOLDER)).bits();

        table.extend_from_slice(&(record_len as u32).to_le_bytes());
        table.extend_from_slice(&[0, 0]);
        table.extend_from_slice(&encoded_name);
        table.extend_from_slice(&[0; 4]);
        table.extend_from_slice(tail(&distorted, uncompressed, stored_flags).as_bytes());
    }
    (table, layouts)
}

/// 0x200 table for `entries`, assuming their data starts at `first_offset`.
pub(crate) fn v200_table(entries: &[FixtureEntry], first_offset: u32) -> (Vec<u8>, Vec<Layout>) {
    let (_, layouts) = data_region(entries, first_offset);

    let mut stream = Vec::new();
    for (entry, layout) in entries.iter().zip(&layouts) {
        stream.extend(entry.path.chars().map(|c| c as u32 as u8));
        stream.push(0);
        stream.extend_from_slice(tail(layout, entry.data.len() as u32, entry.flags.bits()).as_bytes());
    }

    let compressed = deflate_zlib(&stream);
    let mut table = Vec::new();
    table.extend_from_slice(&(compressed.len() as u32).to_le_bytes());
    table.extend_from_slice(&(stream.len() as u32).to_le_bytes());
    table.extend_from_slice(&compressed);
    (table, layouts)
}

fn header(version: GrfVersion, seed: u32, distorted_file_count: u32, table_offset: u32) -> Vec<u8> {
    let mut header = spec::Header::new_zeroed();
    header.signature[..15].copy_from_slice(SIGNATURE.as_bytes());
    header.key = *b"\x01\x02\x03\x04\x05\x06\x07\x08\x09\x0A\x0B\x0C\x0D\x0E";
    header.table_offset = U32::new(table_offset);
    header.seed = U32::new(seed);
    header.distorted_file_count = U32::new(distorted_file_count);
    header.version = U32::new(version as u32);
    header.as_bytes().to_vec()
}

/// Complete legacy archive: header, payloads, then the table.
pub(crate) fn build_legacy(version: GrfVersion, seed: u32, entries: &[FixtureEntry]) -> Vec<u8> {
    assert!(version.is_legacy());
    let effective: Vec<FixtureEntry> = entries.iter().map(FixtureEntry::legacy_effective).collect();
    let (data, _) = data_region(&effective, 0);
    let (table, _) = legacy_table(entries, 0);

    let mut bytes = header(version, seed, entries.len() as u32 + seed + 7, data.len() as u32);
    bytes.extend_from_slice(&data);
    bytes.extend_from_slice(&table);
    bytes
}

/// Complete 0x200 archive: header, payloads, then the table.
pub(crate) fn build_v200(entries: &[FixtureEntry]) -> Vec<u8> {
    let (data, _) = data_region(entries, 0);
    let (table, _) = v200_table(entries, 0);

    // The seed is not part of the 0x200 count formula.
    let mut bytes = header(GrfVersion::V200, 5, entries.len() as u32 + 7, data.len() as u32);
    bytes.extend_from_slice(&data);
    bytes.extend_from_slice(&table);
    bytes
}

pub(crate) fn write_temp(bytes: &[u8]) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".grf").tempfile().unwrap();
    file.write_all(bytes).unwrap();
    file.flush().unwrap();
    file
}
