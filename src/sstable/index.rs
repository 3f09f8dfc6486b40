//! Index block implementation for tables.
//!
//! The index block maps keys to data blocks, enabling efficient lookup.
//! It is written with the same block encoding as data blocks and decoded
//! once per reader into an in-memory [`TableIndex`].

use crate::error::{Error, Result};
use crate::sstable::block::{Block, BlockBuilder};
use crate::sstable::footer::BlockHandle;
use bytes::Bytes;

/// IndexEntry represents a single entry in the index block.
///
/// Each entry contains:
/// - Key: The last key in the corresponding data block
/// - BlockHandle: Location and size of the data block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    /// The last key in the data block
    pub key: Vec<u8>,
    /// Handle to the data block
    pub handle: BlockHandle,
}

impl IndexEntry {
    /// Create a new IndexEntry
    pub fn new(key: Vec<u8>, handle: BlockHandle) -> Self {
        Self { key, handle }
    }
}

/// IndexBlockBuilder builds an index block.
#[derive(Debug, Default)]
pub struct IndexBlockBuilder {
    builder: BlockBuilder,
}

impl IndexBlockBuilder {
    /// Create a new IndexBlockBuilder
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an index entry for the block ending at `last_key`
    pub fn add_entry(&mut self, last_key: &[u8], handle: BlockHandle) {
        self.builder.add(last_key, &handle.encode());
    }

    /// Finish building and return the block contents
    pub fn finish(self) -> Bytes {
        self.builder.finish()
    }

    /// Number of entries added
    pub fn len(&self) -> usize {
        self.builder.len()
    }

    /// Check if the builder is empty
    pub fn is_empty(&self) -> bool {
        self.builder.is_empty()
    }
}

/// In-memory index of a table's data blocks, ordered by separator key.
#[derive(Debug, Clone, Default)]
pub struct TableIndex {
    entries: Vec<IndexEntry>,
}

impl TableIndex {
    /// Build the index from a decoded index block.
    ///
    /// `data_end` is the offset where the data region stops (the start of
    /// the index block); every handle must lie inside `[0, data_end)` and
    /// the separators must be strictly increasing.
    pub fn decode(block: &Block, data_end: u64) -> Result<Self> {
        let mut entries: Vec<IndexEntry> = Vec::with_capacity(block.len());

        for i in 0..block.len() {
            let key = block.key(i);
            let handle = BlockHandle::decode(block.value(i))?;

            if let Some(prev) = entries.last() {
                if key <= prev.key.as_slice() {
                    return Err(Error::corruption(format!("Index entry {} is out of order", i)));
                }
            }
            match handle.end_offset() {
                Some(end) if end <= data_end => {}
                _ => {
                    return Err(Error::corruption(format!(
                        "Index entry {} points outside the data region: offset {}, size {}",
                        i, handle.offset, handle.size
                    )))
                }
            }

            entries.push(IndexEntry::new(key.to_vec(), handle));
        }

        Ok(Self { entries })
    }

    /// Find the block that may contain `key`.
    ///
    /// Returns the position of the first entry whose separator is >= `key`,
    /// or `None` when `key` sorts after every key in the table.
    pub fn find_block(&self, key: &[u8]) -> Option<usize> {
        let pos = self.entries.partition_point(|entry| entry.key.as_slice() < key);
        (pos < self.entries.len()).then_some(pos)
    }

    /// Entry at `pos`
    pub fn get(&self, pos: usize) -> Option<&IndexEntry> {
        self.entries.get(pos)
    }

    /// All entries in key order
    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    /// Get the number of entries in the index
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the index is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
