pub mod collection;
pub mod error;
pub mod extract;
pub mod grf;
pub mod grffile;
pub mod ini;
pub mod read;

mod compression;
mod spec;

#[cfg(test)]
mod test_util;

pub use collection::GrfCollection;
pub use error::{GrfError, Result};
pub use grf::{EntryFlags, GrfEntry, GrfHeader, GrfVersion};
pub use grffile::{EntryRef, GrfBackend, GrfFile};
