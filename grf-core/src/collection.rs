use std::path::Path;

use indexmap::IndexSet;
use rustc_hash::FxBuildHasher;
use tracing::debug;

use crate::error::Result;
use crate::grffile::{EntryRef, GrfBackend, GrfFile};
use crate::ini::IniFile;

pub const DEFAULT_SECTION: &str = "Data";

/// Several archives searched as one, in priority order.
#[derive(Debug, Default)]
pub struct GrfCollection {
    backend: GrfBackend,
    archives: Vec<GrfFile>,
}

impl GrfCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_backend(backend: GrfBackend) -> Self {
        Self {
            backend,
            archives: Vec::new(),
        }
    }

    /// Opens every archive listed in the [`DEFAULT_SECTION`] of an INI file.
    pub fn open(ini_path: impl AsRef<Path>) -> Result<Self> {
        let mut this = Self::new();
        this.load(ini_path, DEFAULT_SECTION)?;
        Ok(this)
    }

    /// Replaces the collection with the archives listed in `section`.
    ///
    /// Relative archive paths resolve against the INI file's directory.
    /// Nothing changes if any archive fails to open.
    pub fn load(&mut self, ini_path: impl AsRef<Path>, section: &str) -> Result<()> {
        let ini_path = ini_path.as_ref();
        let ini = IniFile::load(ini_path)?;
        let base_dir = ini_path.parent().unwrap_or_else(|| Path::new(""));

        let archives = ini
            .values(section)?
            .into_iter()
            .map(|name| GrfFile::open_with_backend(base_dir.join(name), self.backend))
            .collect::<Result<Vec<_>>>()?;

        debug!(
            ini = %ini_path.display(),
            section,
            archives = archives.len(),
            "loaded GRF collection"
        );
        self.archives = archives;
        Ok(())
    }

    /// Adds an already opened archive with the lowest priority.
    pub fn push(&mut self, grf: GrfFile) {
        self.archives.push(grf);
    }

    pub fn unload(&mut self) {
        for grf in &mut self.archives {
            grf.unload();
        }
        self.archives.clear();
    }

    pub fn len(&self) -> usize {
        self.archives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.archives.is_empty()
    }

    pub fn archives(&self) -> &[GrfFile] {
        &self.archives
    }

    /// First hit in archive order.
    pub fn find(&self, path: &str) -> Option<EntryRef<'_>> {
        self.archives.iter().find_map(|grf| grf.find(path))
    }

    /// Distinct entry paths of all archives, first occurrence first.
    pub fn all_file_names(&self) -> Vec<&str> {
        let names: IndexSet<&str, FxBuildHasher> = self.archives.iter().flat_map(GrfFile::entry_names).collect();
        names.into_iter().collect()
    }
}
