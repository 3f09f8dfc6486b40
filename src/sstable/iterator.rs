//! Ordered cursors over a table.
//!
//! [`TableIterator`] hands out borrowed key and value slices that stay valid
//! until the next call to [`advance`](TableIterator::advance); the borrow
//! checker enforces this. [`Entries`] wraps it as a standard iterator that
//! yields owned copies instead.
//!
//! Each iterator decodes blocks into buffers of its own, so iterators over
//! the same reader never interfere with one another.

use crate::error::Result;
use crate::fs::Readable;
use crate::sstable::block::BlockIterator;
use crate::sstable::reader::TableReader;

/// A restartable cursor over a table's records in key order.
///
/// Created by [`TableReader::find`] or [`TableReader::iter`]. It starts just
/// before its first record:
///
/// ```
/// # use aitable::fs::{FileSystem, MemFileSystem};
/// # use aitable::{Options, TableReader, TableWriter};
/// # fn main() -> aitable::Result<()> {
/// # let fs = MemFileSystem::new();
/// # let mut writer = TableWriter::new(fs.create("t")?, Options::default())?;
/// # writer.set(b"a", b"1")?;
/// # writer.set(b"b", b"2")?;
/// # writer.close()?;
/// let reader = TableReader::open(fs.open("t")?, Options::default())?;
/// let mut iter = reader.find(b"b")?;
/// while iter.advance()? {
///     println!("{:?} => {:?}", iter.key(), iter.value());
/// }
/// iter.close()?;
/// # Ok(())
/// # }
/// ```
pub struct TableIterator<'r, R: Readable> {
    reader: &'r TableReader<R>,
    /// Position in the index of the next block to load
    next_block: usize,
    block_iter: Option<BlockIterator>,
    exhausted: bool,
}

impl<'r, R: Readable> TableIterator<'r, R> {
    /// Position a new iterator just before the first key >= `target`.
    pub(crate) fn seek(reader: &'r TableReader<R>, target: &[u8]) -> Result<Self> {
        let mut iter = Self { reader, next_block: 0, block_iter: None, exhausted: false };

        match reader.index().find_block(target) {
            Some(pos) => {
                let mut block_iter = reader.read_data_block(pos)?.iter();
                block_iter.seek(target);
                iter.block_iter = Some(block_iter);
                iter.next_block = pos + 1;
            }
            None => iter.exhausted = true,
        }

        Ok(iter)
    }

    /// Move to the next record, loading following blocks as needed.
    ///
    /// Returns `Ok(false)` once the table is exhausted. After an error the
    /// iterator is exhausted as well.
    pub fn advance(&mut self) -> Result<bool> {
        loop {
            if self.exhausted {
                return Ok(false);
            }

            if let Some(iter) = self.block_iter.as_mut() {
                if iter.advance() {
                    return Ok(true);
                }
            }

            if self.next_block >= self.reader.num_blocks() {
                self.finish();
                return Ok(false);
            }

            match self.reader.read_data_block(self.next_block) {
                Ok(block) => {
                    let mut iter = block.iter();
                    iter.seek_to_first();
                    self.block_iter = Some(iter);
                    self.next_block += 1;
                }
                Err(e) => {
                    self.finish();
                    return Err(e);
                }
            }
        }
    }

    fn finish(&mut self) {
        self.block_iter = None;
        self.exhausted = true;
    }

    /// Check if the iterator is positioned on a record
    pub fn valid(&self) -> bool {
        self.block_iter.as_ref().map(|i| i.valid()).unwrap_or(false)
    }

    /// Get the current key.
    ///
    /// # Panics
    ///
    /// Panics if the iterator is not [`valid`](Self::valid).
    pub fn key(&self) -> &[u8] {
        assert!(self.valid(), "Iterator not valid");
        self.block_iter.as_ref().map(|i| i.key()).unwrap_or_default()
    }

    /// Get the current value.
    ///
    /// # Panics
    ///
    /// Panics if the iterator is not [`valid`](Self::valid).
    pub fn value(&self) -> &[u8] {
        assert!(self.valid(), "Iterator not valid");
        self.block_iter.as_ref().map(|i| i.value()).unwrap_or_default()
    }

    /// Release the current block. Closing twice is harmless.
    pub fn close(&mut self) -> Result<()> {
        self.finish();
        Ok(())
    }

    /// Convert into a standard iterator over owned `(key, value)` pairs
    pub fn into_entries(self) -> Entries<'r, R> {
        Entries { iter: self }
    }
}

/// Standard iterator adapter yielding owned copies of each record.
///
/// Stops after the first error.
pub struct Entries<'r, R: Readable> {
    iter: TableIterator<'r, R>,
}

impl<R: Readable> Iterator for Entries<'_, R> {
    type Item = Result<(Vec<u8>, Vec<u8>)>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.iter.advance() {
            Ok(true) => Some(Ok((self.iter.key().to_vec(), self.iter.value().to_vec()))),
            Ok(false) => None,
            Err(e) => Some(Err(e)),
        }
    }
}

impl<R: Readable> std::iter::FusedIterator for Entries<'_, R> {}
