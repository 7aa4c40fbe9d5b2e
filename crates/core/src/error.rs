//! Error types for lenskit.
//!
//! The lens engine itself never fails for valid input; errors only come from
//! the edges: parsing textual paths and talking to storage backends.

use alloc::string::String;
use core::fmt;

/// Result type alias for lenskit operations.
pub type Result<T> = core::result::Result<T, Error>;

/// Error types for lenskit operations.
#[derive(Clone, Debug, PartialEq)]
pub enum Error {
    /// A textual path could not be parsed.
    InvalidPath {
        message: String,
        position: usize,
    },
    /// A storage backend rejected a read or write.
    Storage {
        key: String,
        message: String,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidPath { message, position } => {
                write!(f, "Invalid path at {}: {}", position, message)
            }
            Error::Storage { key, message } => {
                write!(f, "Storage error for key {}: {}", key, message)
            }
        }
    }
}

impl Error {
    /// Creates an invalid path error.
    pub fn invalid_path(message: impl Into<String>, position: usize) -> Self {
        Error::InvalidPath {
            message: message.into(),
            position,
        }
    }

    /// Creates a storage error.
    pub fn storage(key: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Storage {
            key: key.into(),
            message: message.into(),
        }
    }
}
