use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, GrfError>;

#[derive(Debug, thiserror::Error)]
pub enum GrfError {
    #[error("Upstream IO Error: {0}")]
    IO(#[from] std::io::Error),

    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("Unsupported GRF version: 0x{0:X}")]
    UnsupportedVersion(u32),
    #[error("Invalid GRF header: {0}")]
    InvalidHeader(String),
    #[error("Malformed file table record #{index} at table offset {offset}: {reason}")]
    MalformedRecord {
        index: u32,
        offset: usize,
        reason: &'static str,
    },

    /// Inflate failure, or a decoded length that disagrees with the table.
    #[error("Corrupt compressed stream: {0}")]
    CorruptStream(String),
    #[error("Invalid entry range: offset={offset}, size={size}, file_size={file_size}")]
    InvalidEntryRange { offset: u64, size: u64, file_size: u64 },

    #[error("Section not found: [{0}]")]
    SectionMissing(String),

    #[error("Failed to build rayon thread pool: {0}")]
    ThreadPoolBuild(String),
}

impl GrfError {
    pub(crate) fn not_found_or_io(err: std::io::Error, path: impl Into<PathBuf>) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            GrfError::NotFound(path.into())
        } else {
            GrfError::IO(err)
        }
    }
}
