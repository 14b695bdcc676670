mod entry;
mod header;

pub use entry::*;
pub use header::*;
