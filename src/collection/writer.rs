//! Encoding and atomic writing of collection files.

use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::{debug, info, instrument};

use super::{
    CHECKSUM_WIDTH, CollectionError, CollectionFile, ENTRY_MARKER, FORMAT_VERSION, STRING_MARKER,
};

/// Encodes a single-collection file.
///
/// Layout, little-endian: `i32` version (0), `i32` collection count (1),
/// `0x0B`, `u8` name length, name bytes, `i32` entry count, then per entry
/// `0x0B 0x20` followed by the 32 checksum bytes.
///
/// # Errors
///
/// Returns [`CollectionError::InvalidName`] for an empty or over-long name,
/// [`CollectionError::ChecksumWidth`] for any checksum that is not 32 bytes,
/// and [`CollectionError::TooManyEntries`] if the count overflows `i32`.
pub fn encode_collection(file: &CollectionFile) -> Result<Vec<u8>, CollectionError> {
    let name = file.name.as_bytes();
    let name_length = match u8::try_from(name.len()) {
        Ok(0) | Err(_) => return Err(CollectionError::invalid_name(name.len())),
        Ok(length) => length,
    };

    for (index, checksum) in file.checksums.iter().enumerate() {
        if checksum.len() != CHECKSUM_WIDTH {
            return Err(CollectionError::ChecksumWidth {
                index,
                checksum: checksum.clone(),
                length: checksum.len(),
            });
        }
    }
    let entry_count = i32::try_from(file.checksums.len()).map_err(|_| {
        CollectionError::TooManyEntries {
            count: file.checksums.len(),
        }
    })?;

    let mut bytes =
        Vec::with_capacity(14 + name.len() + file.checksums.len() * (CHECKSUM_WIDTH + 2));
    bytes.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
    bytes.extend_from_slice(&1_i32.to_le_bytes());
    bytes.push(STRING_MARKER);
    bytes.push(name_length);
    bytes.extend_from_slice(name);
    bytes.extend_from_slice(&entry_count.to_le_bytes());
    for checksum in &file.checksums {
        bytes.push(STRING_MARKER);
        bytes.push(ENTRY_MARKER);
        bytes.extend_from_slice(checksum.as_bytes());
    }
    Ok(bytes)
}

/// Writes `file` to `path` atomically.
///
/// The bytes go to a temporary file in the destination directory which is
/// then moved over `path`, so a failed write never leaves a partial file.
///
/// # Errors
///
/// Returns the validation errors of [`encode_collection`], or
/// [`CollectionError::Io`] if the destination directory is unusable.
#[instrument(skip(file, path), fields(name = %file.name, entries = file.checksums.len(), path = %path.display()))]
pub fn write_collection(file: &CollectionFile, path: &Path) -> Result<(), CollectionError> {
    let bytes = encode_collection(file)?;

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut temp = NamedTempFile::new_in(dir).map_err(|e| CollectionError::io(dir, e))?;
    debug!(temp = %temp.path().display(), "writing collection to temporary file");
    temp.write_all(&bytes)
        .and_then(|()| temp.as_file().sync_all())
        .map_err(|e| CollectionError::io(temp.path(), e))?;
    temp.persist(path)
        .map_err(|e| CollectionError::io(path, e.error))?;

    info!(
        entries = file.checksums.len(),
        bytes = bytes.len(),
        "Collection written"
    );
    Ok(())
}
