use std::sync::OnceLock;

use serde::Serialize;

use super::flag::EntryFlags;

/// One file stored in a GRF archive.
///
/// Metadata is immutable; the decoded payload is cached on first access.
#[derive(Clone, Default, Serialize, derive_more::Debug)]
pub struct GrfEntry {
    pub(crate) path: String,
    pub(crate) offset: u64,
    pub(crate) compressed_size: u32,
    pub(crate) compressed_size_aligned: u32,
    pub(crate) uncompressed_size: u32,
    pub(crate) flags: EntryFlags,
    #[serde(skip)]
    #[debug(skip)]
    pub(crate) cache: OnceLock<Vec<u8>>,
}

impl GrfEntry {
    pub(crate) fn new(
        path: String,
        offset: u64,
        compressed_size: u32,
        compressed_size_aligned: u32,
        uncompressed_size: u32,
        flags: EntryFlags,
    ) -> Self {
        Self {
            path,
            offset,
            compressed_size,
            compressed_size_aligned,
            uncompressed_size,
            flags,
            cache: OnceLock::new(),
        }
    }

    /// Full path inside the archive, `\`-separated as stored.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Last path component.
    pub fn name(&self) -> &str {
        self.path.rsplit(['\\', '/']).next().unwrap_or(&self.path)
    }

    /// Extension of the file name without the dot, or `""` if none.
    pub fn kind(&self) -> &str {
        let name = self.name();
        match name.rfind('.') {
            Some(index) => &name[index + 1..],
            None => "",
        }
    }

    /// Absolute offset of the payload in the archive.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn compressed_size(&self) -> u32 {
        self.compressed_size
    }

    /// On-disk span of the payload, padded to the cipher block size.
    pub fn compressed_size_aligned(&self) -> u32 {
        self.compressed_size_aligned
    }

    pub fn uncompressed_size(&self) -> u32 {
        self.uncompressed_size
    }

    pub fn flags(&self) -> EntryFlags {
        self.flags
    }

    pub fn is_cached(&self) -> bool {
        self.cache.get().is_some()
    }
}

impl PartialEq for GrfEntry {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
    }
}

impl Eq for GrfEntry {}
