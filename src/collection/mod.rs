//! osu! collection files (`collection.db` layout).
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use collection_factory::collection::{ChecksumSet, CollectionFile, write_collection};
//!
//! # fn example() -> Result<(), collection_factory::collection::CollectionError> {
//! let mut checksums = ChecksumSet::new();
//! checksums.add("d41d8cd98f00b204e9800998ecf8427e");
//! let file = CollectionFile::from_set("favourites", checksums);
//! write_collection(&file, Path::new("favourites.db"))?;
//! # Ok(())
//! # }
//! ```

mod checksum_set;
mod error;
mod reader;
mod writer;

pub use checksum_set::ChecksumSet;
pub use error::CollectionError;
pub use reader::{decode_collections, read_collection, read_collections};
pub use writer::{encode_collection, write_collection};

use std::path::{Path, PathBuf};

/// Value of the leading version field; the client does not check it.
pub const FORMAT_VERSION: i32 = 0;

/// Marker preceding every string in the file.
pub const STRING_MARKER: u8 = 0x0B;

/// Second entry marker byte; the fixed checksum length.
pub const ENTRY_MARKER: u8 = 0x20;

/// Byte width of every checksum entry.
pub const CHECKSUM_WIDTH: usize = 32;

/// Longest collection name the one-byte length prefix allows.
pub const MAX_NAME_BYTES: usize = 255;

/// File extension of collection files.
pub const COLLECTION_EXTENSION: &str = "db";

/// A named, duplicate-free list of beatmap checksums.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionFile {
    /// Collection name shown by the client
    pub name: String,
    /// Checksums in output order
    pub checksums: Vec<String>,
}

impl CollectionFile {
    /// Creates a collection from already deduplicated checksums.
    #[must_use]
    pub fn new(name: impl Into<String>, checksums: Vec<String>) -> Self {
        Self {
            name: name.into(),
            checksums,
        }
    }

    /// Creates a collection from a [`ChecksumSet`], keeping its order.
    #[must_use]
    pub fn from_set(name: impl Into<String>, checksums: ChecksumSet) -> Self {
        Self::new(name, checksums.into_ordered())
    }
}

/// Normalizes a user-supplied collection name.
///
/// Surrounding whitespace and one trailing `.db` are removed.
///
/// # Errors
///
/// Returns [`CollectionError::InvalidName`] if the result is empty, longer
/// than [`MAX_NAME_BYTES`], or contains `/`, `\` or `..`.
pub fn normalize_name(raw: &str) -> Result<String, CollectionError> {
    let trimmed = raw.trim();
    let name = trimmed
        .strip_suffix(".db")
        .or_else(|| trimmed.strip_suffix(".DB"))
        .unwrap_or(trimmed)
        .trim_end();
    if name.is_empty() || name.len() > MAX_NAME_BYTES {
        return Err(CollectionError::invalid_name(name.len()));
    }
    if name.contains(['/', '\\']) || name.contains("..") {
        return Err(CollectionError::name_with_path(name));
    }
    Ok(name.to_string())
}

/// Returns `<dir>/<name>.db`.
#[must_use]
pub fn collection_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("{name}.{COLLECTION_EXTENSION}"))
}
