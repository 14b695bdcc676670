use zerocopy::byteorder::little_endian::U32;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

/// Fixed 17-byte tail shared by the records of both table layouts.
///
/// In the legacy layout `compressed_size` and `compressed_size_aligned` hold
/// offset-distorted values, see `read::table_v1`.
#[derive(Debug, Clone, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
#[repr(C)]
pub struct RecordTail {
    pub compressed_size: U32,
    pub compressed_size_aligned: U32,
    pub uncompressed_size: U32,
    pub flags: u8,
    pub offset: U32,
}

static_assertions::assert_eq_size!(RecordTail, [u8; 17]);

impl RecordTail {
    pub const SIZE: usize = std::mem::size_of::<Self>();

    /// Reads a tail from the start of `bytes`, returning `None` if too short.
    pub fn from_prefix(bytes: &[u8]) -> Option<Self> {
        Self::read_from_prefix(bytes).ok().map(|(tail, _)| tail)
    }
}
