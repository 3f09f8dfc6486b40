//! File system capability consumed by the table engine.
//!
//! The engine never touches paths itself. Callers hand it a [`Writable`] to
//! build a table into and a [`Readable`] to serve lookups from, usually
//! obtained from a [`FileSystem`]:
//!
//! - [`DiskFileSystem`]: named files under a root directory
//! - [`MemFileSystem`]: named byte buffers held in memory

pub mod disk;
pub mod mem;

pub use disk::{DiskFile, DiskFileSystem, DiskWriter};
pub use mem::{MemFile, MemFileSystem, MemWriter};

use crate::error::Result;

/// A random-access, read-only view of a named byte blob.
///
/// Implementations must be safe to read from several threads at once;
/// tables are immutable, so concurrent readers never conflict.
pub trait Readable: Send + Sync {
    /// Fill `buf` with the bytes starting at `offset`.
    ///
    /// Returns an `Io` error with kind `UnexpectedEof` if the blob ends
    /// before `buf` is full.
    fn read_at(&self, buf: &mut [u8], offset: u64) -> Result<()>;

    /// Total size of the blob in bytes.
    fn size(&self) -> Result<u64>;

    /// Release the handle.
    fn close(self) -> Result<()>
    where
        Self: Sized,
    {
        Ok(())
    }
}

/// A sequential, append-only sink for a named byte blob.
pub trait Writable: Send {
    /// Append `data` at the current end of the blob.
    fn write(&mut self, data: &[u8]) -> Result<()>;

    /// Flush everything written and release the handle.
    fn close(self) -> Result<()>;
}

/// Creates and opens named blobs.
pub trait FileSystem {
    /// Handle returned by [`FileSystem::open`].
    type File: Readable;
    /// Handle returned by [`FileSystem::create`].
    type Writer: Writable;

    /// Create (or truncate) `name` for writing.
    fn create(&self, name: &str) -> Result<Self::Writer>;

    /// Open an existing `name` for reading.
    fn open(&self, name: &str) -> Result<Self::File>;
}
