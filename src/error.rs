//! Error types for the aitable engine.

use std::io;
use thiserror::Error as ThisError;

/// The result type used throughout aitable.
pub type Result<T> = std::result::Result<T, Error>;

/// The error type for table operations.
#[derive(Debug, ThisError)]
pub enum Error {
    /// An I/O error occurred in the underlying storage.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// A block, index or handle could not be decoded.
    #[error("Data corruption: {0}")]
    Corruption(String),

    /// A block checksum did not match its contents.
    #[error(
        "Checksum mismatch in block at offset {offset}: expected {expected:#x}, got {actual:#x}"
    )]
    ChecksumMismatch {
        /// File offset of the block.
        offset: u64,
        /// The checksum stored in the block trailer.
        expected: u32,
        /// The checksum computed over the block payload.
        actual: u32,
    },

    /// The file is not a table in a format this crate understands.
    #[error("Invalid table format: {0}")]
    InvalidFormat(String),

    /// The requested key is not in the table.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A key was written that is not strictly greater than its predecessor.
    #[error("Key {key:?} is not greater than previous key {previous:?}")]
    OutOfOrder {
        /// The rejected key, rendered lossily.
        key: String,
        /// The previously accepted key, rendered lossily.
        previous: String,
    },

    /// An invalid argument was provided.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The writer or reader is in a state that does not allow the call.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// The table uses a feature this build does not support.
    #[error("Unsupported: {0}")]
    Unsupported(String),
}

impl Error {
    /// Creates a new corruption error.
    pub fn corruption(msg: impl Into<String>) -> Self {
        Error::Corruption(msg.into())
    }

    /// Creates a new not found error.
    pub fn not_found(msg: impl Into<String>) -> Self {
        Error::NotFound(msg.into())
    }

    /// Creates a new invalid argument error.
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Error::InvalidArgument(msg.into())
    }

    /// Creates a new invalid state error.
    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Error::InvalidState(msg.into())
    }

    /// Creates a new invalid format error.
    pub fn invalid_format(msg: impl Into<String>) -> Self {
        Error::InvalidFormat(msg.into())
    }

    /// Creates an ordering error for `key` following `previous`.
    pub fn out_of_order(key: &[u8], previous: &[u8]) -> Self {
        Error::OutOfOrder {
            key: String::from_utf8_lossy(key).into_owned(),
            previous: String::from_utf8_lossy(previous).into_owned(),
        }
    }

    /// Returns true for a point-lookup miss.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }

    /// Returns true when the error reports damaged table contents.
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            Error::Corruption(_) | Error::ChecksumMismatch { .. } | Error::InvalidFormat(_)
        )
    }
}
