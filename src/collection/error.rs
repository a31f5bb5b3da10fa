//! Error types for collection file encoding and decoding.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while writing or reading a collection file.
#[derive(Debug, Error)]
pub enum CollectionError {
    /// A checksum does not fit the fixed 32-byte entry width
    #[error(
        "checksum at position {index} is {length} bytes, expected 32: '{checksum}'\n  Suggestion: Checksums must be 32-character hex MD5 strings"
    )]
    ChecksumWidth {
        /// Position in the collection
        index: usize,
        /// The offending checksum
        checksum: String,
        /// Its byte length
        length: usize,
    },

    /// The collection name cannot be stored or cannot be used as a file name
    #[error("invalid collection name: {reason}\n  Suggestion: {suggestion}")]
    InvalidName {
        /// Why the name was rejected
        reason: String,
        /// How to fix the issue
        suggestion: String,
    },

    /// More entries than the 32-bit entry count can hold
    #[error("collection has {count} entries, more than the file format can hold")]
    TooManyEntries {
        /// Number of entries
        count: usize,
    },

    /// Reading, writing or moving the file failed
    #[error("I/O error on '{}': {source}", path.display())]
    Io {
        /// File involved
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// The bytes do not follow the collection file layout
    #[error("malformed collection file at byte {offset}: {reason}")]
    Format {
        /// Offset where decoding failed
        offset: usize,
        /// What was wrong
        reason: String,
    },
}

impl CollectionError {
    /// Creates an `InvalidName` error for a name of `length` bytes.
    #[must_use]
    pub fn invalid_name(length: usize) -> Self {
        let suggestion = if length == 0 {
            "Give the collection a name"
        } else {
            "Use a shorter collection name"
        };
        Self::InvalidName {
            reason: format!("must be 1 to 255 bytes, got {length}"),
            suggestion: suggestion.to_string(),
        }
    }

    /// Creates an `InvalidName` error for a name that would leave the output directory.
    #[must_use]
    pub fn name_with_path(name: &str) -> Self {
        Self::InvalidName {
            reason: format!("'{name}' contains a path separator or '..'"),
            suggestion: "Choose the directory with --output-dir instead".to_string(),
        }
    }

    /// Creates an `Io` error.
    #[must_use]
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates a `Format` error.
    #[must_use]
    pub fn format(offset: usize, reason: impl Into<String>) -> Self {
        Self::Format {
            offset,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collection_error_checksum_width_message() {
        let err = CollectionError::ChecksumWidth {
            index: 3,
            checksum: "abc".to_string(),
            length: 3,
        };
        let msg = err.to_string();
        assert!(msg.contains("position 3"));
        assert!(msg.contains("expected 32"));
    }

    #[test]
    fn test_collection_error_invalid_name_suggestions() {
        assert!(CollectionError::invalid_name(0).to_string().contains("Give the collection a name"));
        assert!(CollectionError::invalid_name(300).to_string().contains("shorter"));
        assert!(
            CollectionError::name_with_path("../x")
                .to_string()
                .contains("--output-dir")
        );
    }

    #[test]
    fn test_collection_error_io_message_has_path() {
        let err = CollectionError::io(
            "/nope/x.db",
            std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        );
        assert!(err.to_string().contains("/nope/x.db"));
    }
}
