use std::io::Read;

use zerocopy::byteorder::little_endian::U32;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

use crate::error::{GrfError, Result};

/// Raw 46-byte archive header as stored on disk.
#[derive(Debug, Clone, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
#[repr(C)]
pub struct Header {
    /// 15 ASCII bytes followed by a terminator.
    pub signature: [u8; 16],
    pub key: [u8; 14],
    pub table_offset: U32,
    pub seed: U32,
    pub distorted_file_count: U32,
    pub version: U32,
}

static_assertions::assert_eq_size!(Header, [u8; 46]);

impl Header {
    pub const SIZE: usize = std::mem::size_of::<Self>();

    pub fn from_reader<R>(reader: &mut R) -> Result<Self>
    where
        R: Read,
    {
        let mut buf = [0u8; Self::SIZE];
        reader.read_exact(&mut buf).map_err(|e| {
            if e.kind() == std::io::ErrorKind::UnexpectedEof {
                GrfError::InvalidHeader(format!("file is shorter than {} bytes", Self::SIZE))
            } else {
                GrfError::IO(e)
            }
        })?;
        Self::read_from_bytes(&buf).map_err(|_| GrfError::InvalidHeader("header layout mismatch".to_string()))
    }
}
