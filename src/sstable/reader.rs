//! Table reader implementation.
//!
//! Opens a table through a [`Readable`], validates the footer and index, and
//! serves point lookups and positioned iteration.

use crate::config::Options;
use crate::error::{Error, Result};
use crate::fs::Readable;
use crate::sstable::block::{Block, BlockCodec, BlockKind};
use crate::sstable::footer::{BlockHandle, Footer};
use crate::sstable::index::TableIndex;
use crate::sstable::iterator::TableIterator;
use crate::sstable::FOOTER_SIZE;
use bytes::Bytes;

/// TableReader provides read access to a table.
///
/// The reader owns its [`Readable`] for its whole lifetime. It never mutates
/// the table, so a reader over a `Sync` handle can be shared across threads
/// and can hand out any number of iterators.
///
/// Usage:
/// ```
/// use aitable::fs::{FileSystem, MemFileSystem};
/// use aitable::{Options, TableReader, TableWriter};
///
/// # fn main() -> aitable::Result<()> {
/// let fs = MemFileSystem::new();
/// let mut writer = TableWriter::new(fs.create("t.sst")?, Options::default())?;
/// writer.set(b"key1", b"value1")?;
/// writer.close()?;
///
/// let reader = TableReader::open(fs.open("t.sst")?, Options::default())?;
/// assert_eq!(reader.get(b"key1")?, b"value1");
/// assert!(reader.get(b"key2").unwrap_err().is_not_found());
/// reader.close()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct TableReader<R: Readable> {
    file: R,
    options: Options,
    index: TableIndex,
    footer: Footer,
    file_size: u64,
}

impl<R: Readable> TableReader<R> {
    /// Open a table for reading.
    ///
    /// Fails with [`Error::InvalidFormat`] if the file is not a table and
    /// with a corruption error if the index cannot be decoded.
    pub fn open(file: R, options: Options) -> Result<Self> {
        let file_size = file.size()?;
        if file_size < FOOTER_SIZE as u64 {
            return Err(Error::invalid_format(format!(
                "File too small to be a valid table: {} bytes",
                file_size
            )));
        }

        let footer_offset = file_size - FOOTER_SIZE as u64;
        let mut footer_buf = [0u8; FOOTER_SIZE];
        file.read_at(&mut footer_buf, footer_offset)?;
        let footer = Footer::decode(&footer_buf)?;

        let index_handle = footer.index_handle;
        match index_handle.end_offset() {
            Some(end) if end <= footer_offset => {}
            _ => {
                return Err(Error::corruption(format!(
                    "Index block out of range: offset {}, size {}, footer at {}",
                    index_handle.offset, index_handle.size, footer_offset
                )))
            }
        }

        let index_block =
            read_block(&file, index_handle, BlockKind::Index, options.verify_checksums)?;
        let index = TableIndex::decode(&index_block, index_handle.offset)?;

        log::info!("Opened table: {} data blocks, {} bytes", index.len(), file_size);

        Ok(Self { file, options, index, footer, file_size })
    }

    /// Get the value stored under `key`.
    ///
    /// Returns [`Error::NotFound`] when the table has no such key.
    pub fn get(&self, key: &[u8]) -> Result<Vec<u8>> {
        let pos = match self.index.find_block(key) {
            Some(pos) => pos,
            None => return Err(not_found(key)),
        };

        let block = self.read_data_block(pos)?;
        match block.get(key) {
            Some(value) => Ok(value.to_vec()),
            None => Err(not_found(key)),
        }
    }

    /// Return an iterator positioned just before the first key >= `key`.
    ///
    /// The first [`advance`](TableIterator::advance) moves onto that key.
    /// An empty `key` starts at the beginning of the table.
    pub fn find(&self, key: &[u8]) -> Result<TableIterator<'_, R>> {
        TableIterator::seek(self, key)
    }

    /// Iterator over every record, in key order
    pub fn iter(&self) -> Result<TableIterator<'_, R>> {
        self.find(&[])
    }

    /// Read and decode the data block at index position `pos`
    pub(crate) fn read_data_block(&self, pos: usize) -> Result<Block> {
        let handle = match self.index.get(pos) {
            Some(entry) => entry.handle,
            None => return Err(Error::invalid_argument(format!("No data block {}", pos))),
        };
        read_block(&self.file, handle, BlockKind::Data, self.options.verify_checksums)
    }

    /// Release the underlying file.
    ///
    /// Consumes the reader, so no iterator can outlive it.
    pub fn close(self) -> Result<()> {
        self.file.close()
    }

    /// Get the number of data blocks
    pub fn num_blocks(&self) -> usize {
        self.index.len()
    }

    /// Get the file size
    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    /// The decoded index
    pub fn index(&self) -> &TableIndex {
        &self.index
    }

    /// The decoded footer
    pub fn footer(&self) -> &Footer {
        &self.footer
    }

    /// The options this reader was opened with
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Get the smallest key in the table
    pub fn smallest_key(&self) -> Result<Option<Vec<u8>>> {
        if self.index.is_empty() {
            return Ok(None);
        }
        let block = self.read_data_block(0)?;
        Ok((!block.is_empty()).then(|| block.key(0).to_vec()))
    }

    /// Get the largest key in the table.
    ///
    /// Separators are the last key of each block, so this needs no block read.
    pub fn largest_key(&self) -> Result<Option<Vec<u8>>> {
        Ok(self.index.entries().last().map(|entry| entry.key.clone()))
    }
}

/// Read raw block data from the file and decode it
fn read_block<R: Readable>(
    file: &R,
    handle: BlockHandle,
    kind: BlockKind,
    verify: bool,
) -> Result<Block> {
    let size = usize::try_from(handle.size)
        .map_err(|_| Error::corruption(format!("{} block size {} too large", kind, handle.size)))?;

    let mut buffer = vec![0u8; size];
    file.read_at(&mut buffer, handle.offset)?;

    BlockCodec::decode(Bytes::from(buffer), handle, kind, verify)
}

fn not_found(key: &[u8]) -> Error {
    Error::not_found(format!("key {:?}", String::from_utf8_lossy(key)))
}
