//! In-memory file system.
//!
//! Files are `Bytes` buffers kept in a shared map. A writer accumulates its
//! contents privately and publishes them on `close`; an opened file is a
//! cheap snapshot that later writes to the same name do not affect.

use super::{FileSystem, Readable, Writable};
use crate::error::{Error, Result};
use bytes::{Bytes, BytesMut};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::io;
use std::sync::Arc;

type FileMap = Arc<RwLock<HashMap<String, Bytes>>>;

/// A file system whose files live in memory.
///
/// Cloning shares the underlying files.
#[derive(Debug, Clone, Default)]
pub struct MemFileSystem {
    files: FileMap,
}

impl MemFileSystem {
    /// Create an empty file system
    pub fn new() -> Self {
        Self::default()
    }

    /// Current contents of `name`, if it exists.
    pub fn contents(&self, name: &str) -> Option<Bytes> {
        self.files.read().get(name).cloned()
    }
}

impl FileSystem for MemFileSystem {
    type File = MemFile;
    type Writer = MemWriter;

    fn create(&self, name: &str) -> Result<MemWriter> {
        self.files.write().insert(name.to_string(), Bytes::new());
        Ok(MemWriter {
            name: name.to_string(),
            buf: BytesMut::new(),
            files: Arc::clone(&self.files),
        })
    }

    fn open(&self, name: &str) -> Result<MemFile> {
        match self.files.read().get(name) {
            Some(data) => Ok(MemFile { data: data.clone() }),
            None => Err(Error::Io(io::Error::new(
                io::ErrorKind::NotFound,
                format!("no such file: {}", name),
            ))),
        }
    }
}

/// Read handle over an in-memory snapshot.
#[derive(Debug, Clone)]
pub struct MemFile {
    data: Bytes,
}

impl MemFile {
    /// Wrap a buffer as a readable file
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self { data: data.into() }
    }

    /// The full contents
    pub fn bytes(&self) -> &Bytes {
        &self.data
    }
}

impl From<Vec<u8>> for MemFile {
    fn from(data: Vec<u8>) -> Self {
        Self::new(data)
    }
}

impl Readable for MemFile {
    fn read_at(&self, buf: &mut [u8], offset: u64) -> Result<()> {
        let start = usize::try_from(offset).ok().filter(|&s| s <= self.data.len());
        let end = start.and_then(|s| s.checked_add(buf.len())).filter(|&e| e <= self.data.len());
        match (start, end) {
            (Some(start), Some(end)) => {
                buf.copy_from_slice(&self.data[start..end]);
                Ok(())
            }
            _ => Err(Error::Io(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!(
                    "read of {} bytes at offset {} past end of {}-byte file",
                    buf.len(),
                    offset,
                    self.data.len()
                ),
            ))),
        }
    }

    fn size(&self) -> Result<u64> {
        Ok(self.data.len() as u64)
    }
}

/// Write handle that publishes its buffer on close.
#[derive(Debug)]
pub struct MemWriter {
    name: String,
    buf: BytesMut,
    files: FileMap,
}

impl Writable for MemWriter {
    fn write(&mut self, data: &[u8]) -> Result<()> {
        self.buf.extend_from_slice(data);
        Ok(())
    }

    fn close(self) -> Result<()> {
        self.files.write().insert(self.name, self.buf.freeze());
        Ok(())
    }
}
