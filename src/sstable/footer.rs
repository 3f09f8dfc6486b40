//! Table footer and block handles.
//!
//! The footer is a fixed-size (32 bytes) structure at the end of a table file
//! that locates the index block, so a reader can find everything else
//! starting from the file length alone.

use crate::error::{Error, Result};
use crate::sstable::{FOOTER_SIZE, FORMAT_VERSION, MAGIC_NUMBER};

/// Encoded size of a [`BlockHandle`]
pub const BLOCK_HANDLE_SIZE: usize = 16;

/// BlockHandle represents a pointer to a block in the table file.
///
/// `size` covers the whole physical block, trailer included.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockHandle {
    /// Offset of the block in the file
    pub offset: u64,
    /// Size of the block in bytes
    pub size: u64,
}

impl BlockHandle {
    /// Create a new BlockHandle
    pub fn new(offset: u64, size: u64) -> Self {
        Self { offset, size }
    }

    /// Encode the BlockHandle to bytes (16 bytes: 8 for offset + 8 for size)
    pub fn encode(&self) -> [u8; BLOCK_HANDLE_SIZE] {
        let mut buf = [0u8; BLOCK_HANDLE_SIZE];
        buf[..8].copy_from_slice(&self.offset.to_le_bytes());
        buf[8..].copy_from_slice(&self.size.to_le_bytes());
        buf
    }

    /// Decode a BlockHandle from exactly 16 bytes
    pub fn decode(data: &[u8]) -> Result<Self> {
        if data.len() != BLOCK_HANDLE_SIZE {
            return Err(Error::corruption(format!(
                "BlockHandle must be {} bytes, got {}",
                BLOCK_HANDLE_SIZE,
                data.len()
            )));
        }

        let mut offset = [0u8; 8];
        let mut size = [0u8; 8];
        offset.copy_from_slice(&data[0..8]);
        size.copy_from_slice(&data[8..16]);

        Ok(Self { offset: u64::from_le_bytes(offset), size: u64::from_le_bytes(size) })
    }

    /// Get the end offset of this block, or `None` on overflow
    pub fn end_offset(&self) -> Option<u64> {
        self.offset.checked_add(self.size)
    }
}

/// Footer is the last 32 bytes of a table file.
///
/// Format:
/// ```text
/// [index_handle: 16 bytes]
/// [format_version: 4 bytes]
/// [reserved: 4 bytes]
/// [magic: 8 bytes]
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Footer {
    /// Handle to the index block
    pub index_handle: BlockHandle,
}

impl Footer {
    /// Create a new Footer
    pub fn new(index_handle: BlockHandle) -> Self {
        Self { index_handle }
    }

    /// Encode the footer to bytes (32 bytes)
    pub fn encode(&self) -> [u8; FOOTER_SIZE] {
        let mut buf = [0u8; FOOTER_SIZE];
        buf[0..16].copy_from_slice(&self.index_handle.encode());
        buf[16..20].copy_from_slice(&FORMAT_VERSION.to_le_bytes());
        // 20..24 reserved, left zero
        buf[24..32].copy_from_slice(&MAGIC_NUMBER.to_le_bytes());
        buf
    }

    /// Decode a footer from bytes
    pub fn decode(data: &[u8]) -> Result<Self> {
        if data.len() != FOOTER_SIZE {
            return Err(Error::invalid_format(format!(
                "Footer size mismatch: expected {}, got {}",
                FOOTER_SIZE,
                data.len()
            )));
        }

        let mut magic = [0u8; 8];
        magic.copy_from_slice(&data[24..32]);
        let magic = u64::from_le_bytes(magic);
        if magic != MAGIC_NUMBER {
            return Err(Error::invalid_format(format!(
                "Invalid table magic number: expected {:#x}, got {:#x}",
                MAGIC_NUMBER, magic
            )));
        }

        let version = u32::from_le_bytes([data[16], data[17], data[18], data[19]]);
        if version != FORMAT_VERSION {
            return Err(Error::invalid_format(format!(
                "Unsupported table format version {}",
                version
            )));
        }

        let index_handle = BlockHandle::decode(&data[0..16])?;
        Ok(Self { index_handle })
    }
}
