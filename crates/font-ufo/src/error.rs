//! Error types for UFO reading and writing.

use std::path::{Path, PathBuf};

/// Result type for UFO operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while reading or writing a UFO.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An underlying filesystem operation failed.
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// An XML document could not be parsed.
    #[error("Failed to parse '{path}': {message}")]
    Parse { path: PathBuf, message: String },

    /// A document could not be serialized to XML.
    #[error("Failed to write '{path}': {message}")]
    Write { path: PathBuf, message: String },

    /// The directory is not a UFO (no metainfo.plist).
    #[error("'{path}' is not a UFO directory (missing metainfo.plist)")]
    NotUfo { path: PathBuf },

    /// The UFO declares a format version this crate does not read.
    #[error("Unsupported UFO format version {0}")]
    UnsupportedVersion(i64),

    /// A plist document had an unexpected root value type.
    #[error("Expected a {expected} at the root of '{path}'")]
    UnexpectedRoot {
        path: PathBuf,
        expected: &'static str,
    },
}

impl Error {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        Error::Io { path: path.to_path_buf(), source }
    }

    pub(crate) fn parse(path: &Path, message: impl Into<String>) -> Self {
        Error::Parse { path: path.to_path_buf(), message: message.into() }
    }

    pub(crate) fn write(path: &Path, message: impl Into<String>) -> Self {
        Error::Write { path: path.to_path_buf(), message: message.into() }
    }
}
