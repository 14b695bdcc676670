use crate::spec;

use super::cipher::latin1_to_string;

/// Size of the on-disk header; table and data offsets are relative to it.
pub const HEADER_SIZE: u32 = spec::Header::SIZE as u32;

/// Constant subtracted from the stored file count.
const FILE_COUNT_BIAS: u32 = 7;

#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GrfVersion {
    V102 = 0x102,
    V103 = 0x103,
    V200 = 0x200,
}

impl GrfVersion {
    pub fn is_legacy(&self) -> bool {
        matches!(self, GrfVersion::V102 | GrfVersion::V103)
    }
}

impl TryFrom<u32> for GrfVersion {
    type Error = crate::error::GrfError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            0x102 => Ok(GrfVersion::V102),
            0x103 => Ok(GrfVersion::V103),
            0x200 => Ok(GrfVersion::V200),
            other => Err(Self::Error::UnsupportedVersion(other)),
        }
    }
}

#[derive(Clone)]
pub struct GrfHeader {
    signature: String,
    key: [u8; 14],
    table_offset: u32,
    seed: u32,
    distorted_file_count: u32,
    file_count: u32,
    version: GrfVersion,
}

impl GrfHeader {
    #[inline]
    pub fn signature(&self) -> &str {
        &self.signature
    }

    /// Raw key material; present on disk but unused for decoding.
    #[inline]
    pub fn key(&self) -> &[u8; 14] {
        &self.key
    }

    /// Table offset relative to the end of the header.
    #[inline]
    pub fn table_offset(&self) -> u32 {
        self.table_offset
    }

    /// Absolute position of the file table.
    #[inline]
    pub fn table_position(&self) -> u64 {
        HEADER_SIZE as u64 + self.table_offset as u64
    }

    #[inline]
    pub fn seed(&self) -> u32 {
        self.seed
    }

    #[inline]
    pub fn distorted_file_count(&self) -> u32 {
        self.distorted_file_count
    }

    /// Number of table records, derived from the distorted count.
    #[inline]
    pub fn file_count(&self) -> u32 {
        self.file_count
    }

    #[inline]
    pub fn version(&self) -> GrfVersion {
        self.version
    }
}

impl TryFrom<spec::Header> for GrfHeader {
    type Error = crate::error::GrfError;

    fn try_from(this: spec::Header) -> Result<Self, Self::Error> {
        let version = GrfVersion::try_from(this.version.get())?;
        let seed = this.seed.get();
        let distorted_file_count = this.distorted_file_count.get();

        let file_count = match version {
            GrfVersion::V102 | GrfVersion::V103 => distorted_file_count
                .checked_sub(seed)
                .and_then(|n| n.checked_sub(FILE_COUNT_BIAS)),
            GrfVersion::V200 => distorted_file_count.checked_sub(FILE_COUNT_BIAS),
        }
        .ok_or_else(|| {
            Self::Error::InvalidHeader(format!(
                "file count underflow: distorted={distorted_file_count}, seed={seed}"
            ))
        })?;

        let signature_bytes = &this.signature[..15];
        let end = signature_bytes.iter().position(|&b| b == 0).unwrap_or(signature_bytes.len());

        Ok(GrfHeader {
            signature: latin1_to_string(&signature_bytes[..end]),
            key: this.key,
            table_offset: this.table_offset.get(),
            seed,
            distorted_file_count,
            file_count,
            version,
        })
    }
}

impl std::fmt::Debug for GrfHeader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GrfHeader")
            .field("signature", &self.signature)
            .field("key", &format!("{:02x?}", self.key))
            .field("table_offset", &format!("{:08x}", self.table_offset))
            .field("seed", &self.seed)
            .field("file_count", &self.file_count)
            .field("version", &self.version)
            .finish()
    }
}
