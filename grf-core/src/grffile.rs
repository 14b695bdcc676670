use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use memmap2::{Mmap, MmapOptions};
use tracing::debug;

use crate::error::{GrfError, Result};
use crate::grf::{EntryFlags, GrfArchive, GrfEntry, GrfHeader};
use crate::read::{self, entry::decode_entry};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrfBackend {
    /// Use `memmap2` memory mapping.
    Mmap,
    /// Open a fresh file handle for every raw read.
    File,
}

impl Default for GrfBackend {
    fn default() -> Self {
        Self::Mmap
    }
}

#[derive(Debug, Default)]
pub struct GrfFileBuilder {
    backend: GrfBackend,
}

impl GrfFileBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn backend(mut self, backend: GrfBackend) -> Self {
        self.backend = backend;
        self
    }

    pub fn mmap(mut self, enabled: bool) -> Self {
        self.backend = if enabled { GrfBackend::Mmap } else { GrfBackend::File };
        self
    }

    /// An archive with no file loaded yet; [`GrfFile::load`] keeps the backend.
    pub fn build(self) -> GrfFile {
        GrfFile {
            backend: self.backend,
            loaded: None,
        }
    }

    pub fn open(self, path: impl AsRef<Path>) -> Result<GrfFile> {
        GrfFile::open_with_backend(path, self.backend)
    }
}

/// High-level GRF archive handle.
///
/// The entry index is read-only once opened, so entries can be decoded from
/// many threads at once. `Default` is the unloaded state.
#[derive(Default)]
pub struct GrfFile {
    backend: GrfBackend,
    loaded: Option<LoadedGrf>,
}

struct LoadedGrf {
    path: PathBuf,
    archive: GrfArchive,
    source: DataSource,
}

enum DataSource {
    Mmap { mmap: Arc<Mmap> },
    File,
}

impl GrfFile {
    pub fn builder() -> GrfFileBuilder {
        GrfFileBuilder::new()
    }

    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_backend(path, GrfBackend::default())
    }

    pub fn open_with_backend(path: impl AsRef<Path>, backend: GrfBackend) -> Result<Self> {
        let path = path.as_ref();
        let path_abs = path
            .canonicalize()
            .map_err(|e| GrfError::not_found_or_io(e, path))?;
        if !path_abs.is_file() {
            return Err(GrfError::NotFound(path.to_path_buf()));
        }

        let file = File::open(&path_abs).map_err(|e| GrfError::not_found_or_io(e, path))?;
        let mut reader = BufReader::new(file);
        let archive = read::read_archive(&mut reader)?;

        let file = reader.into_inner();
        let source = match backend {
            GrfBackend::Mmap => {
                // SAFETY: read-only mapping; the archive is not modified while open.
                let mmap = unsafe { MmapOptions::new().map(&file)? };
                DataSource::Mmap { mmap: Arc::new(mmap) }
            }
            GrfBackend::File => DataSource::File,
        };

        debug!(
            path = %path_abs.display(),
            ?backend,
            entries = archive.entries().len(),
            "opened GRF archive"
        );

        Ok(Self {
            backend,
            loaded: Some(LoadedGrf {
                path: path_abs,
                archive,
                source,
            }),
        })
    }

    /// Replaces the current contents with the archive at `path`.
    ///
    /// On failure `self` is left exactly as it was.
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let fresh = Self::open_with_backend(path, self.backend)?;
        *self = fresh;
        Ok(())
    }

    /// Drops the index, all cached payloads and the data source.
    pub fn unload(&mut self) {
        if let Some(loaded) = self.loaded.take() {
            debug!(path = %loaded.path.display(), "unloaded GRF archive");
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded.is_some()
    }

    pub fn backend(&self) -> GrfBackend {
        self.backend
    }

    pub fn path(&self) -> Option<&Path> {
        self.loaded.as_ref().map(|l| l.path.as_path())
    }

    pub fn archive(&self) -> Option<&GrfArchive> {
        self.loaded.as_ref().map(|l| &l.archive)
    }

    pub fn header(&self) -> Option<&GrfHeader> {
        self.archive().map(GrfArchive::header)
    }

    /// Header signature, or `""` when nothing is loaded.
    pub fn signature(&self) -> &str {
        self.header().map(GrfHeader::signature).unwrap_or("")
    }

    /// Number of retained entries.
    pub fn count(&self) -> usize {
        self.archive().map_or(0, |a| a.entries().len())
    }

    /// Exact, case-sensitive lookup.
    pub fn find(&self, path: &str) -> Option<EntryRef<'_>> {
        let entry = self.archive()?.get(path)?;
        Some(EntryRef { grf: self, entry })
    }

    /// Entries in table order.
    pub fn entries(&self) -> impl Iterator<Item = EntryRef<'_>> {
        self.archive()
            .into_iter()
            .flat_map(|a| a.entries().values())
            .map(move |entry| EntryRef { grf: self, entry })
    }

    /// Entry paths in table order.
    pub fn entry_names(&self) -> impl Iterator<Item = &str> {
        self.archive()
            .into_iter()
            .flat_map(|a| a.entries().keys())
            .map(String::as_str)
    }

    /// Reads the on-disk bytes of `entry`, still obfuscated and compressed.
    pub fn read_raw(&self, entry: &GrfEntry) -> Result<Vec<u8>> {
        let offset = entry.offset();
        let len = entry.compressed_size_aligned() as u64;
        let range_error = |file_size: u64| GrfError::InvalidEntryRange {
            offset,
            size: len,
            file_size,
        };

        let Some(loaded) = &self.loaded else {
            return Err(range_error(0));
        };

        match &loaded.source {
            DataSource::Mmap { mmap } => {
                let file_size = mmap.len() as u64;
                let end = offset.checked_add(len).filter(|&end| end <= file_size);
                let Some(end) = end else {
                    return Err(range_error(file_size));
                };
                Ok(mmap[offset as usize..end as usize].to_vec())
            }
            DataSource::File => {
                let mut file = File::open(&loaded.path).map_err(|e| GrfError::not_found_or_io(e, &loaded.path))?;
                let file_size = file.metadata()?.len();
                if offset.checked_add(len).is_none_or(|end| end > file_size) {
                    return Err(range_error(file_size));
                }
                file.seek(SeekFrom::Start(offset))?;
                let mut raw = vec![0u8; len as usize];
                file.read_exact(&mut raw)?;
                Ok(raw)
            }
        }
    }
}

impl std::fmt::Debug for GrfFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GrfFile")
            .field("backend", &self.backend)
            .field("path", &self.path())
            .field("count", &self.count())
            .finish()
    }
}

/// An entry borrowed from the archive that owns its bytes.
#[derive(Debug, Clone, Copy)]
pub struct EntryRef<'a> {
    grf: &'a GrfFile,
    entry: &'a GrfEntry,
}

impl<'a> EntryRef<'a> {
    pub fn entry(&self) -> &'a GrfEntry {
        self.entry
    }

    pub fn path(&self) -> &'a str {
        self.entry.path()
    }

    pub fn name(&self) -> &'a str {
        self.entry.name()
    }

    pub fn kind(&self) -> &'a str {
        self.entry.kind()
    }

    /// Decoded payload size.
    pub fn size(&self) -> u32 {
        self.entry.uncompressed_size()
    }

    pub fn compressed_size(&self) -> u32 {
        self.entry.compressed_size()
    }

    pub fn flags(&self) -> EntryFlags {
        self.entry.flags()
    }

    /// Decoded payload, decoded on first call and cached on the entry.
    pub fn data(&self) -> Result<&'a [u8]> {
        if let Some(data) = self.entry.cache.get() {
            return Ok(data);
        }
        let decoded = self.decode()?;
        Ok(self.entry.cache.get_or_init(|| decoded))
    }

    /// Decodes the payload without touching the cache.
    pub fn decode(&self) -> Result<Vec<u8>> {
        let raw = self.grf.read_raw(self.entry)?;
        decode_entry(raw, self.entry)
    }
}
