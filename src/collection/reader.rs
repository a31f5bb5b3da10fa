//! Decoding of collection files.

use std::path::Path;

use tracing::{debug, instrument};

use super::{CHECKSUM_WIDTH, CollectionError, CollectionFile, ENTRY_MARKER, STRING_MARKER};

/// Byte cursor that reports the offset of every failure.
struct Cursor<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> Cursor<'a> {
    fn take(&mut self, len: usize, what: &str) -> Result<&'a [u8], CollectionError> {
        let end = self
            .offset
            .checked_add(len)
            .filter(|end| *end <= self.bytes.len())
            .ok_or_else(|| CollectionError::format(self.offset, format!("truncated {what}")))?;
        let slice = &self.bytes[self.offset..end];
        self.offset = end;
        Ok(slice)
    }

    fn byte(&mut self, what: &str) -> Result<u8, CollectionError> {
        Ok(self.take(1, what)?[0])
    }

    fn expect_byte(&mut self, expected: u8, what: &str) -> Result<(), CollectionError> {
        let offset = self.offset;
        let found = self.byte(what)?;
        if found == expected {
            Ok(())
        } else {
            Err(CollectionError::format(
                offset,
                format!("expected {what} 0x{expected:02X}, found 0x{found:02X}"),
            ))
        }
    }

    fn count(&mut self, what: &str) -> Result<usize, CollectionError> {
        let offset = self.offset;
        let raw = self.take(4, what)?;
        let value = i32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]);
        usize::try_from(value)
            .map_err(|_| CollectionError::format(offset, format!("negative {what} {value}")))
    }

    fn utf8(&mut self, len: usize, what: &str) -> Result<String, CollectionError> {
        let offset = self.offset;
        let raw = self.take(len, what)?;
        String::from_utf8(raw.to_vec())
            .map_err(|_| CollectionError::format(offset, format!("{what} is not valid UTF-8")))
    }
}

/// Decodes every collection in `bytes`.
///
/// # Errors
///
/// Returns [`CollectionError::Format`] for wrong markers, truncation,
/// negative counts, or trailing bytes.
pub fn decode_collections(bytes: &[u8]) -> Result<Vec<CollectionFile>, CollectionError> {
    let mut cursor = Cursor { bytes, offset: 0 };
    let _version = cursor.count("format version")?;
    let collection_count = cursor.count("collection count")?;

    let mut collections = Vec::new();
    for _ in 0..collection_count {
        cursor.expect_byte(STRING_MARKER, "name marker")?;
        let name_length = cursor.byte("name length")?;
        let name = cursor.utf8(usize::from(name_length), "name")?;

        let entry_count = cursor.count("entry count")?;
        let mut checksums = Vec::with_capacity(entry_count.min(bytes.len() / CHECKSUM_WIDTH));
        for _ in 0..entry_count {
            cursor.expect_byte(STRING_MARKER, "entry marker")?;
            cursor.expect_byte(ENTRY_MARKER, "checksum length")?;
            checksums.push(cursor.utf8(CHECKSUM_WIDTH, "checksum")?);
        }
        collections.push(CollectionFile::new(name, checksums));
    }

    if cursor.offset != bytes.len() {
        return Err(CollectionError::format(
            cursor.offset,
            format!("{} trailing byte(s)", bytes.len() - cursor.offset),
        ));
    }
    Ok(collections)
}

/// Reads every collection stored in the file at `path`.
///
/// # Errors
///
/// Returns [`CollectionError::Io`] if the file cannot be read and
/// [`CollectionError::Format`] if its contents are malformed.
#[instrument(skip(path), fields(path = %path.display()))]
pub fn read_collections(path: &Path) -> Result<Vec<CollectionFile>, CollectionError> {
    let bytes = std::fs::read(path).map_err(|e| CollectionError::io(path, e))?;
    let collections = decode_collections(&bytes)?;
    debug!(count = collections.len(), "collections decoded");
    Ok(collections)
}

/// Reads the first collection stored in the file at `path`.
///
/// # Errors
///
/// As [`read_collections`], plus [`CollectionError::Format`] if the file
/// holds no collection.
pub fn read_collection(path: &Path) -> Result<CollectionFile, CollectionError> {
    read_collections(path)?
        .into_iter()
        .next()
        .ok_or_else(|| CollectionError::format(8, "file contains no collections"))
}
