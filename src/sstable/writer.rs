//! Table writer implementation.
//!
//! Builds a table from a sequence of strictly increasing key-value pairs,
//! writing it front to back into a [`Writable`].

use crate::config::Options;
use crate::error::{Error, Result};
use crate::fs::Writable;
use crate::sstable::block::{BlockBuilder, BlockCodec};
use crate::sstable::footer::{BlockHandle, Footer};
use crate::sstable::index::IndexBlockBuilder;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriterState {
    Open,
    /// A previous call failed; the table can no longer be completed.
    Poisoned,
    Closed,
}

/// TableWriter builds a table file.
///
/// Usage:
/// ```
/// use aitable::fs::{FileSystem, MemFileSystem};
/// use aitable::{Options, TableWriter};
///
/// # fn main() -> aitable::Result<()> {
/// let fs = MemFileSystem::new();
/// let mut writer = TableWriter::new(fs.create("table.sst")?, Options::default())?;
/// writer.set(b"key1", b"value1")?;
/// writer.set(b"key2", b"value2")?;
/// writer.close()?;
/// # Ok(())
/// # }
/// ```
pub struct TableWriter<W: Writable> {
    writable: Option<W>,
    options: Options,
    data_block: BlockBuilder,
    index_block: IndexBlockBuilder,
    last_key: Option<Vec<u8>>,
    offset: u64,
    num_entries: u64,
    state: WriterState,
}

impl<W: Writable> TableWriter<W> {
    /// Create a writer that owns `writable` until [`close`](Self::close).
    pub fn new(writable: W, options: Options) -> Result<Self> {
        options.validate()?;

        Ok(Self {
            writable: Some(writable),
            options,
            data_block: BlockBuilder::new(),
            index_block: IndexBlockBuilder::new(),
            last_key: None,
            offset: 0,
            num_entries: 0,
            state: WriterState::Open,
        })
    }

    /// Append a key-value pair.
    ///
    /// `key` must be strictly greater than the previously set key. A key out
    /// of order is rejected with [`Error::OutOfOrder`] and leaves the writer
    /// unusable: later calls fail with [`Error::InvalidState`].
    pub fn set(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        self.check_open()?;

        if key.len() > u32::MAX as usize || value.len() > u32::MAX as usize {
            return Err(Error::invalid_argument(format!(
                "Record too large: key {} bytes, value {} bytes",
                key.len(),
                value.len()
            )));
        }

        if let Some(last) = &self.last_key {
            if key <= last.as_slice() {
                let err = Error::out_of_order(key, last);
                self.state = WriterState::Poisoned;
                return Err(err);
            }
        }

        // Roll over before the block would grow past the target size
        if !self.data_block.is_empty()
            && self.data_block.estimated_size_after(key, value) > self.options.block_size
        {
            // The pending records are gone once the flush fails
            if let Err(e) = self.flush_data_block() {
                self.state = WriterState::Poisoned;
                return Err(e);
            }
        }

        self.data_block.add(key, value);
        match &mut self.last_key {
            Some(last) => {
                last.clear();
                last.extend_from_slice(key);
            }
            None => self.last_key = Some(key.to_vec()),
        }
        self.num_entries += 1;

        Ok(())
    }

    fn check_open(&self) -> Result<()> {
        match self.state {
            WriterState::Open => Ok(()),
            WriterState::Poisoned => {
                Err(Error::invalid_state("table writer failed earlier and cannot be used"))
            }
            WriterState::Closed => Err(Error::invalid_state("table writer is closed")),
        }
    }

    /// Write `data` at the current offset, poisoning the writer on failure.
    fn write_raw(&mut self, data: &[u8]) -> Result<()> {
        let writable = match self.writable.as_mut() {
            Some(w) => w,
            None => return Err(Error::invalid_state("table writer is closed")),
        };
        if let Err(e) = writable.write(data) {
            self.state = WriterState::Poisoned;
            return Err(e);
        }
        self.offset += data.len() as u64;
        Ok(())
    }

    /// Encode `contents` as a block and write it, returning its handle.
    fn write_block(&mut self, contents: &[u8]) -> Result<BlockHandle> {
        let physical = BlockCodec::encode(contents, self.options.compression)?;
        let handle = BlockHandle::new(self.offset, physical.len() as u64);
        self.write_raw(&physical)?;
        Ok(handle)
    }

    /// Flush the current data block and index it under its last key
    fn flush_data_block(&mut self) -> Result<()> {
        if self.data_block.is_empty() {
            return Ok(());
        }

        let builder = std::mem::take(&mut self.data_block);
        let entries = builder.len();
        let contents = builder.finish();
        let handle = self.write_block(&contents)?;

        log::debug!(
            "Flushed data block at offset {}: {} entries, {} -> {} bytes",
            handle.offset,
            entries,
            contents.len(),
            handle.size
        );

        // The last key set is the last key of the block just flushed
        let last_key = self.last_key.as_deref().unwrap_or_default();
        self.index_block.add_entry(last_key, handle);
        Ok(())
    }

    /// Finish the table.
    ///
    /// Flushes the pending data block, writes the index block and footer,
    /// and closes the underlying writable. Returns the total file size.
    /// If this fails the table is incomplete and must not be opened.
    pub fn close(&mut self) -> Result<u64> {
        if self.state == WriterState::Poisoned {
            // Release the handle; the table is invalid either way
            self.state = WriterState::Closed;
            if let Some(writable) = self.writable.take() {
                writable.close()?;
            }
            return Err(Error::invalid_state("table writer failed earlier; table is incomplete"));
        }
        self.check_open()?;

        let result = self.finish_table();
        if result.is_err() {
            self.state = WriterState::Poisoned;
        }
        result
    }

    fn finish_table(&mut self) -> Result<u64> {
        self.flush_data_block()?;

        let num_blocks = self.index_block.len();
        let index_contents = std::mem::take(&mut self.index_block).finish();
        let index_handle = self.write_block(&index_contents)?;

        let footer = Footer::new(index_handle);
        self.write_raw(&footer.encode())?;

        if let Some(writable) = self.writable.take() {
            writable.close()?;
        }
        self.state = WriterState::Closed;

        log::info!(
            "Finished table: {} entries in {} data blocks, {} bytes",
            self.num_entries,
            num_blocks,
            self.offset
        );
        Ok(self.offset)
    }

    /// Get the number of entries added
    pub fn num_entries(&self) -> u64 {
        self.num_entries
    }

    /// Number of data blocks written so far
    pub fn num_blocks(&self) -> usize {
        self.index_block.len()
    }

    /// Bytes written to the underlying writable so far
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// The options this writer was created with
    pub fn options(&self) -> &Options {
        &self.options
    }
}

impl<W: Writable> Drop for TableWriter<W> {
    fn drop(&mut self) {
        if self.writable.is_some() {
            log::warn!(
                "TableWriter dropped without close after {} entries; table is incomplete",
                self.num_entries
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CompressionType;
    use crate::fs::{FileSystem, MemFileSystem};
    use crate::sstable::{BLOCK_TRAILER_SIZE, FOOTER_SIZE};
    use std::io;

    fn writer(fs: &MemFileSystem, options: Options) -> TableWriter<crate::fs::MemWriter> {
        TableWriter::new(fs.create("t.sst").unwrap(), options).unwrap()
    }

    fn uncompressed() -> Options {
        Options::default().compression(CompressionType::None)
    }

    #[test]
    fn test_writer_empty_table() {
        let fs = MemFileSystem::new();
        let mut w = writer(&fs, uncompressed());
        assert_eq!(w.num_entries(), 0);

        let size = w.close().unwrap();
        // Empty index block (4 bytes + trailer) and the footer
        assert_eq!(size, (4 + BLOCK_TRAILER_SIZE + FOOTER_SIZE) as u64);
        assert_eq!(fs.contents("t.sst").unwrap().len() as u64, size);
    }

    #[test]
    fn test_writer_multiple_entries() {
        let fs = MemFileSystem::new();
        let mut w = writer(&fs, uncompressed());

        w.set(b"apple", b"red").unwrap();
        w.set(b"banana", b"yellow").unwrap();
        w.set(b"cherry", b"red").unwrap();
        assert_eq!(w.num_entries(), 3);

        w.close().unwrap();
        assert_eq!(w.num_blocks(), 1);
    }

    #[test]
    fn test_writer_rolls_blocks_at_block_size() {
        let fs = MemFileSystem::new();
        let mut w = writer(&fs, uncompressed().block_size(32));

        // Each record is 16 bytes plus the 4-byte count: a second one would exceed 32
        w.set(b"1", b"red").unwrap();
        w.set(b"2", b"yel").unwrap();
        w.set(b"3", b"blu").unwrap();
        w.close().unwrap();

        assert_eq!(w.num_blocks(), 3);
    }

    #[test]
    fn test_writer_oversized_record_gets_own_block() {
        let fs = MemFileSystem::new();
        let mut w = writer(&fs, uncompressed().block_size(100));

        w.set(b"a", &[b'x'; 10]).unwrap();
        w.set(b"b", &[b'x'; 500]).unwrap();
        w.set(b"c", &[b'x'; 10]).unwrap();
        w.close().unwrap();

        assert_eq!(w.num_blocks(), 3);
    }

    #[test]
    fn test_writer_large_dataset() {
        let fs = MemFileSystem::new();
        let mut w = writer(&fs, Options::default().block_size(1024));

        for i in 0..1000 {
            let key = format!("key{:08}", i);
            let value = format!("value{:08}", i);
            w.set(key.as_bytes(), value.as_bytes()).unwrap();
        }
        assert_eq!(w.num_entries(), 1000);

        let size = w.close().unwrap();
        assert!(size > 1024);
        assert!(w.num_blocks() > 1);
    }

    #[test]
    fn test_writer_rejects_out_of_order_and_poisons() {
        let fs = MemFileSystem::new();
        let mut w = writer(&fs, uncompressed());

        w.set(b"a", b"1").unwrap();
        w.set(b"b", b"2").unwrap();

        let err = w.set(b"a", b"3").unwrap_err();
        assert!(matches!(err, Error::OutOfOrder { .. }));

        // Even a correctly ordered key is refused now
        assert!(matches!(w.set(b"c", b"4"), Err(Error::InvalidState(_))));
        assert!(matches!(w.close(), Err(Error::InvalidState(_))));
    }

    #[test]
    fn test_writer_rejects_duplicate_key() {
        let fs = MemFileSystem::new();
        let mut w = writer(&fs, uncompressed());
        w.set(b"same", b"1").unwrap();
        assert!(matches!(w.set(b"same", b"2"), Err(Error::OutOfOrder { .. })));
    }

    #[test]
    fn test_writer_accepts_empty_first_key() {
        let fs = MemFileSystem::new();
        let mut w = writer(&fs, uncompressed());
        w.set(b"", b"empty").unwrap();
        w.set(b"a", b"1").unwrap();
        assert!(matches!(w.set(b"", b"again"), Err(Error::OutOfOrder { .. })));
    }

    #[test]
    fn test_writer_set_after_close() {
        let fs = MemFileSystem::new();
        let mut w = writer(&fs, uncompressed());
        w.set(b"a", b"1").unwrap();
        w.close().unwrap();

        assert!(matches!(w.set(b"b", b"2"), Err(Error::InvalidState(_))));
        assert!(matches!(w.close(), Err(Error::InvalidState(_))));
    }

    #[test]
    fn test_writer_invalid_options() {
        let fs = MemFileSystem::new();
        let options = Options::default().block_size(0);
        let result = TableWriter::new(fs.create("t.sst").unwrap(), options);
        assert!(matches!(result, Err(Error::InvalidArgument(_))));
    }

    struct FailingWritable {
        budget: usize,
    }

    impl Writable for FailingWritable {
        fn write(&mut self, data: &[u8]) -> Result<()> {
            if data.len() > self.budget {
                return Err(Error::Io(io::Error::new(io::ErrorKind::Other, "disk full")));
            }
            self.budget -= data.len();
            Ok(())
        }

        fn close(self) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_writer_surfaces_io_errors() {
        let options = uncompressed().block_size(32);
        let mut w = TableWriter::new(FailingWritable { budget: 40 }, options).unwrap();
        w.set(b"1", b"red").unwrap();
        w.set(b"2", b"yel").unwrap();

        // Third set flushes the second block, which no longer fits
        let err = w.set(b"3", b"blu").unwrap_err();
        assert!(matches!(err, Error::Io(_)));
        assert!(matches!(w.set(b"4", b"grn"), Err(Error::InvalidState(_))));
    }

    #[test]
    fn test_writer_encode_failure_on_roll_over_poisons() {
        let fs = MemFileSystem::new();
        let mut w = writer(&fs, uncompressed().block_size(32));
        w.set(b"1", b"red").unwrap();

        // The roll-over flush of block "1" fails to encode
        BlockCodec::fail_next_encode();
        assert!(matches!(w.set(b"2", b"yel"), Err(Error::InvalidArgument(_))));

        // Nothing may be written past the lost block
        assert!(matches!(w.set(b"3", b"blu"), Err(Error::InvalidState(_))));
        assert!(matches!(w.close(), Err(Error::InvalidState(_))));
        assert!(fs.contents("t.sst").unwrap().is_empty());
    }

    #[test]
    fn test_writer_encode_failure_on_close_poisons() {
        let fs = MemFileSystem::new();
        let mut w = writer(&fs, uncompressed());
        w.set(b"a", b"1").unwrap();

        BlockCodec::fail_next_encode();
        assert!(matches!(w.close(), Err(Error::InvalidArgument(_))));
        assert!(matches!(w.set(b"b", b"2"), Err(Error::InvalidState(_))));
        assert!(matches!(w.close(), Err(Error::InvalidState(_))));
    }

    #[test]
    fn test_writer_close_failure_is_not_partial_success() {
        let mut w = TableWriter::new(FailingWritable { budget: 30 }, uncompressed()).unwrap();
        w.set(b"1", b"red").unwrap();

        assert!(matches!(w.close(), Err(Error::Io(_))));
        assert!(w.close().is_err());
    }
}
