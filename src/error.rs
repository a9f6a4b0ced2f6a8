//! Error types for archive building.
//!
//! Every fallible operation in the library returns [`Result<T>`]. The
//! variants separate failures of the output sink ([`Error::Io`]) from bad
//! inputs ([`Error::InvalidInput`], [`Error::InvalidName`]) and from
//! archives that cannot be written in the requested shape
//! ([`Error::UnsupportedMode`], [`Error::FormatPrecondition`]).
//!
//! All of them are fatal for the build in progress. A partially written
//! output file is left behind and the caller is responsible for discarding it.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced while building or inspecting an archive.
#[derive(Debug, Error)]
pub enum Error {
    /// Reading a source or writing the output sink failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The compressor failed on an entry's data.
    #[error("compression failed: {0}")]
    Compression(#[source] io::Error),

    /// An explicitly named input path is missing or unreadable.
    #[error("invalid input {}: {reason}", path.display())]
    InvalidInput { path: PathBuf, reason: String },

    /// The entry name cannot be stored in an archive.
    #[error("invalid entry name {name:?}: {reason}")]
    InvalidName { name: String, reason: &'static str },

    /// The encoded entry name does not fit the 16-bit length field.
    #[error("entry name is {len} bytes long, the limit is 65535: {name:?}")]
    NameTooLong { name: String, len: usize },

    /// The requested open mode cannot be honoured for this sink.
    #[error("unsupported mode: {0}")]
    UnsupportedMode(String),

    /// The archive would violate a format constraint, e.g. it needs ZIP64
    /// records while ZIP64 is disabled.
    #[error("format precondition failed: {0}")]
    FormatPrecondition(String),

    /// An existing archive could not be parsed.
    #[error("invalid archive: {0}")]
    InvalidArchive(&'static str),
}

impl Error {
    pub(crate) fn invalid_name(name: impl Into<String>, reason: &'static str) -> Self {
        Error::InvalidName {
            name: name.into(),
            reason,
        }
    }
}
