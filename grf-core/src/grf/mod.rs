pub mod cipher;
mod entry;
mod flag;
mod header;

use indexmap::IndexMap;
use rustc_hash::FxBuildHasher;

pub use entry::*;
pub use flag::*;
pub use header::*;

/// Path-indexed entries in table order.
pub type EntryMap = IndexMap<String, GrfEntry, FxBuildHasher>;

/// GRF archive index: the header and the retained entries.
#[derive(Debug, Clone)]
pub struct GrfArchive {
    header: GrfHeader,
    entries: EntryMap,
}

impl GrfArchive {
    pub fn new(header: GrfHeader, entries: EntryMap) -> Self {
        GrfArchive { header, entries }
    }

    pub fn header(&self) -> &GrfHeader {
        &self.header
    }

    pub fn entries(&self) -> &EntryMap {
        &self.entries
    }

    pub fn get(&self, path: &str) -> Option<&GrfEntry> {
        self.entries.get(path)
    }
}
