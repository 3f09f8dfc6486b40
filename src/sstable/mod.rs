//! SSTable (Sorted String Table) implementation.
//!
//! A table is an immutable, sorted file of key-value records. It is written
//! once, in key order, and can then be opened for point lookups and ordered
//! scans by any number of readers.
//!
//! ## File Format
//!
//! ```text
//! [Data Block 1]
//! [Data Block 2]
//! ...
//! [Data Block N]
//! [Index Block]     // One entry per data block
//! [Footer: 32B]     // Points to the index block
//! ```
//!
//! ## Block Format
//!
//! Data and index blocks share one encoding (see [`block`]):
//! - Key-value entries, each `key_len | value_len | key | value`
//! - An offset array for binary search, then the entry count
//! - A trailer of one compression tag byte and a CRC32 over payload and tag
//!
//! ## Index Format
//!
//! The index block contains entries that map keys to data blocks:
//! - Key: The last key in the block
//! - Value: Offset and size of the block

pub mod block;
pub mod compression;
pub mod footer;
pub mod index;
pub mod iterator;
pub mod reader;
pub mod writer;

pub use block::{Block, BlockBuilder, BlockCodec, BlockIterator, BlockKind};
pub use footer::{BlockHandle, Footer};
pub use index::{IndexBlockBuilder, IndexEntry, TableIndex};
pub use iterator::{Entries, TableIterator};
pub use reader::TableReader;
pub use writer::TableWriter;

// Re-export CompressionType from config
pub use crate::config::CompressionType;

/// Footer size in bytes (fixed)
pub const FOOTER_SIZE: usize = 32;

/// Size of the per-block trailer: compression tag (1) + CRC32 (4)
pub const BLOCK_TRAILER_SIZE: usize = 5;

/// Magic number for table files ("AITABLE1" in little-endian)
pub const MAGIC_NUMBER: u64 = 0x3145_4c42_4154_4941;

/// On-disk format version written into the footer
pub const FORMAT_VERSION: u32 = 1;
