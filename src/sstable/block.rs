//! Block format implementation for tables.
//!
//! Data blocks and the index block share this encoding; the only difference
//! between them is what the values mean, which is the caller's business.

use crate::config::CompressionType;
use crate::error::{Error, Result};
use crate::sstable::compression;
use crate::sstable::footer::BlockHandle;
use crate::sstable::BLOCK_TRAILER_SIZE;
use bytes::{BufMut, Bytes, BytesMut};
use std::fmt;
use std::sync::Arc;

/// Size of an entry header (key_len + value_len)
pub const ENTRY_HEADER_SIZE: usize = 8;

/// Which role a block plays in the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    /// Holds user records.
    Data,
    /// Maps separator keys to data block handles.
    Index,
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockKind::Data => f.write_str("data"),
            BlockKind::Index => f.write_str("index"),
        }
    }
}

/// Location of one entry inside the block contents.
#[derive(Debug, Clone, Copy)]
struct EntrySpan {
    key_start: usize,
    key_end: usize,
    value_end: usize,
}

/// A decoded, uncompressed block.
///
/// Contents format:
/// ```text
/// [Entry 1]
/// [Entry 2]
/// ...
/// [Entry N]
/// [Offset of Entry 1: u32]
/// ...
/// [Offset of Entry N: u32]
/// [Num Entries: u32]
/// ```
///
/// Each entry format:
/// ```text
/// [key_len: u32]
/// [value_len: u32]
/// [key: bytes]
/// [value: bytes]
/// ```
///
/// Cloning is cheap: the contents and the parsed entry table are shared.
#[derive(Debug, Clone)]
pub struct Block {
    data: Bytes,
    entries: Arc<[EntrySpan]>,
}

impl Block {
    /// Parse uncompressed block contents.
    ///
    /// Every length and offset is bounds-checked; entries must be laid out
    /// back to back, exactly as [`BlockBuilder`] writes them.
    pub fn new(data: Bytes) -> Result<Self> {
        if data.len() < 4 {
            return Err(Error::corruption("Block too small"));
        }

        let num_entries = read_u32(&data, data.len() - 4) as usize;
        let offsets_start = num_entries
            .checked_mul(4)
            .and_then(|n| (data.len() - 4).checked_sub(n))
            .ok_or_else(|| Error::corruption(format!("Invalid entry count {}", num_entries)))?;

        let mut entries = Vec::with_capacity(num_entries);
        let mut expected = 0usize;
        for i in 0..num_entries {
            let offset = read_u32(&data, offsets_start + i * 4) as usize;
            if offset != expected {
                return Err(Error::corruption(format!(
                    "Entry {} at offset {}, expected {}",
                    i, offset, expected
                )));
            }
            if offset + ENTRY_HEADER_SIZE > offsets_start {
                return Err(Error::corruption(format!("Entry {} header out of bounds", i)));
            }

            let key_len = read_u32(&data, offset) as usize;
            let value_len = read_u32(&data, offset + 4) as usize;
            let key_start = offset + ENTRY_HEADER_SIZE;
            let value_end = key_start
                .checked_add(key_len)
                .and_then(|n| n.checked_add(value_len))
                .filter(|&end| end <= offsets_start)
                .ok_or_else(|| Error::corruption(format!("Entry {} body out of bounds", i)))?;

            entries.push(EntrySpan { key_start, key_end: key_start + key_len, value_end });
            expected = value_end;
        }

        if expected != offsets_start {
            return Err(Error::corruption(format!(
                "{} trailing bytes after last entry",
                offsets_start - expected
            )));
        }

        Ok(Self { data, entries: entries.into() })
    }

    /// Number of entries in the block
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the block holds no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Key of the entry at `index`
    pub fn key(&self, index: usize) -> &[u8] {
        let span = &self.entries[index];
        &self.data[span.key_start..span.key_end]
    }

    /// Value of the entry at `index`
    pub fn value(&self, index: usize) -> &[u8] {
        let span = &self.entries[index];
        &self.data[span.key_end..span.value_end]
    }

    /// Index of the first entry whose key is >= `target`, or `len()` if none.
    pub fn lower_bound(&self, target: &[u8]) -> usize {
        let (mut left, mut right) = (0, self.len());
        while left < right {
            let mid = left + (right - left) / 2;
            if self.key(mid) < target {
                left = mid + 1;
            } else {
                right = mid;
            }
        }
        left
    }

    /// Value stored under exactly `key`
    pub fn get(&self, key: &[u8]) -> Option<&[u8]> {
        let index = self.lower_bound(key);
        (index < self.len() && self.key(index) == key).then(|| self.value(index))
    }

    /// Create an iterator over the block
    pub fn iter(&self) -> BlockIterator {
        BlockIterator::new(self.clone())
    }

    /// Get the raw contents
    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

fn read_u32(data: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([data[offset], data[offset + 1], data[offset + 2], data[offset + 3]])
}

/// BlockBuilder accumulates sorted entries into uncompressed block contents.
#[derive(Debug, Default)]
pub struct BlockBuilder {
    buffer: BytesMut,
    offsets: Vec<u32>,
}

impl BlockBuilder {
    /// Create a new BlockBuilder
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes one entry adds to the finished block, offset slot included.
    pub fn entry_size(key: &[u8], value: &[u8]) -> usize {
        ENTRY_HEADER_SIZE + key.len() + value.len() + 4
    }

    /// Add a key-value pair to the block.
    ///
    /// Keys must arrive in strictly increasing order; the table writer
    /// enforces this before calling.
    pub fn add(&mut self, key: &[u8], value: &[u8]) {
        debug_assert!(
            self.offsets.is_empty() || key > self.last_key(),
            "Keys must be added in sorted order"
        );

        // Blocks never exceed u32 range: lengths are checked by the writer and
        // an oversized record always starts a block of its own.
        self.offsets.push(self.buffer.len() as u32);
        self.buffer.put_u32_le(key.len() as u32);
        self.buffer.put_u32_le(value.len() as u32);
        self.buffer.put_slice(key);
        self.buffer.put_slice(value);
    }

    fn last_key(&self) -> &[u8] {
        match self.offsets.last() {
            Some(&offset) => {
                let offset = offset as usize;
                let key_len = read_u32(&self.buffer, offset) as usize;
                let start = offset + ENTRY_HEADER_SIZE;
                &self.buffer[start..start + key_len]
            }
            None => &[],
        }
    }

    /// Finish building and return the block contents
    pub fn finish(mut self) -> Bytes {
        for offset in &self.offsets {
            self.buffer.put_u32_le(*offset);
        }
        self.buffer.put_u32_le(self.offsets.len() as u32);
        self.buffer.freeze()
    }

    /// Get the current size of the finished block
    pub fn current_size(&self) -> usize {
        self.buffer.len() + self.offsets.len() * 4 + 4
    }

    /// Size the finished block would have after adding this entry
    pub fn estimated_size_after(&self, key: &[u8], value: &[u8]) -> usize {
        self.current_size() + Self::entry_size(key, value)
    }

    /// Number of entries added so far
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    /// Check if the block is empty
    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }
}

/// Turns block contents into physical blocks and back.
///
/// Physical block:
/// ```text
/// [payload: bytes]    // contents, compressed unless tag == 0
/// [tag: u8]           // CompressionType
/// [crc32: u32]        // over payload and tag
/// ```
pub struct BlockCodec;

#[cfg(test)]
thread_local! {
    static FAIL_NEXT_ENCODE: std::cell::Cell<bool> = const { std::cell::Cell::new(false) };
}

impl BlockCodec {
    /// Make the next `encode` on the current thread fail.
    #[cfg(test)]
    pub(crate) fn fail_next_encode() {
        FAIL_NEXT_ENCODE.with(|fail| fail.set(true));
    }

    /// Compress and checksum block contents.
    ///
    /// Falls back to storing the contents uncompressed when compression
    /// does not save at least 12.5%.
    pub fn encode(raw: &[u8], compression: CompressionType) -> Result<Bytes> {
        #[cfg(test)]
        if FAIL_NEXT_ENCODE.with(|fail| fail.replace(false)) {
            return Err(Error::invalid_argument("block encoding failed"));
        }

        let compressed = match compression {
            CompressionType::None => None,
            codec => {
                let out = compression::compress(codec, raw)?;
                compression::worth_compressing(raw.len(), out.len()).then_some(out)
            }
        };

        let (tag, payload): (u8, &[u8]) = match &compressed {
            Some(out) => (compression as u8, out),
            None => (CompressionType::None as u8, raw),
        };

        let mut buf = BytesMut::with_capacity(payload.len() + BLOCK_TRAILER_SIZE);
        buf.put_slice(payload);
        buf.put_u8(tag);
        buf.put_u32_le(checksum(payload, tag));
        Ok(buf.freeze())
    }

    /// Verify, decompress and parse a physical block read from `handle`.
    pub fn decode(
        physical: Bytes,
        handle: BlockHandle,
        kind: BlockKind,
        verify: bool,
    ) -> Result<Block> {
        if physical.len() < BLOCK_TRAILER_SIZE {
            return Err(Error::corruption(format!(
                "{} block at offset {} too small: {} bytes",
                kind,
                handle.offset,
                physical.len()
            )));
        }

        let payload_len = physical.len() - BLOCK_TRAILER_SIZE;
        let tag = physical[payload_len];
        let stored = read_u32(&physical, payload_len + 1);
        let payload = physical.slice(..payload_len);

        if verify {
            let actual = checksum(&payload, tag);
            if actual != stored {
                log::warn!(
                    "Checksum mismatch in {} block at offset {}: stored {:#x}, computed {:#x}",
                    kind,
                    handle.offset,
                    stored,
                    actual
                );
                return Err(Error::ChecksumMismatch {
                    offset: handle.offset,
                    expected: stored,
                    actual,
                });
            }
        }

        let contents = match compression::codec_for_tag(tag)? {
            CompressionType::None => payload,
            codec => {
                let out = compression::decompress(codec, &payload)
                    .map_err(|e| in_block(e, kind, handle))?;
                Bytes::from(out)
            }
        };

        log::debug!("Decoded {} block at offset {}: {} bytes", kind, handle.offset, contents.len());

        Block::new(contents).map_err(|e| in_block(e, kind, handle))
    }
}

fn checksum(payload: &[u8], tag: u8) -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(payload);
    hasher.update(&[tag]);
    hasher.finalize()
}

fn in_block(err: Error, kind: BlockKind, handle: BlockHandle) -> Error {
    match err {
        Error::Corruption(msg) => {
            Error::corruption(format!("{} block at offset {}: {}", kind, handle.offset, msg))
        }
        other => other,
    }
}

/// Cursor over the entries of a single block.
///
/// Starts unpositioned; the first [`advance`](Self::advance) moves onto the
/// first entry at or after the seek target.
#[derive(Debug, Clone)]
pub struct BlockIterator {
    block: Block,
    next: usize,
    current: Option<usize>,
}

impl BlockIterator {
    /// Create a new BlockIterator positioned before the first entry
    pub fn new(block: Block) -> Self {
        Self { block, next: 0, current: None }
    }

    /// Seek to just before the first entry
    pub fn seek_to_first(&mut self) {
        self.next = 0;
        self.current = None;
    }

    /// Seek to just before the first entry whose key is >= `target`
    pub fn seek(&mut self, target: &[u8]) {
        self.next = self.block.lower_bound(target);
        self.current = None;
    }

    /// Move to the next entry
    pub fn advance(&mut self) -> bool {
        if self.next < self.block.len() {
            self.current = Some(self.next);
            self.next += 1;
            true
        } else {
            self.next = self.block.len();
            self.current = None;
            false
        }
    }

    /// Check if the iterator is valid
    pub fn valid(&self) -> bool {
        self.current.is_some()
    }

    /// Get the current key
    pub fn key(&self) -> &[u8] {
        let index = self.current.expect("Iterator not valid");
        self.block.key(index)
    }

    /// Get the current value
    pub fn value(&self) -> &[u8] {
        let index = self.current.expect("Iterator not valid");
        self.block.value(index)
    }
}
