//! Read-only access to zip archives.
//!
//! Zip containers are read from the end: the End of Central Directory record
//! locates the central directory, which carries the metadata for every entry;
//! entry data is then reached through each entry's local file header. STORED
//! and DEFLATE entries are supported, with ZIP64 extensions for large
//! archives.

mod reader;
mod structures;

use thiserror::Error;

pub use reader::ZipArchive;
pub use structures::{CompressionMethod, EntryInfo};

/// The archive as a whole could not be opened. The caller abandons it and
/// moves on to the next one.
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("not a zip archive: {0}")]
    Format(String),
}

/// A single entry could not be read. The archive itself stays usable and the
/// caller skips to the next entry.
#[derive(Debug, Error)]
pub enum EntryError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid local header for entry {0}")]
    BadLocalHeader(String),
    #[error("unsupported compression method {method} for entry {name}")]
    Unsupported { name: String, method: u16 },
    #[error("corrupted entry {name}: {reason}")]
    Corrupt { name: String, reason: String },
}
