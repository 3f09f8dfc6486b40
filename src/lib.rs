//! # aitable - An Immutable Sorted Table Engine
//!
//! aitable writes and reads SSTables: immutable files of key-value records
//! sorted by key, in the style of LevelDB tables. A table is built once, in
//! a single pass with keys in strictly increasing order, and can then be
//! opened read-only any number of times, concurrently if need be.
//!
//! ## Architecture
//!
//! The engine consists of several key components:
//!
//! - **Block Codec**: Encodes sorted records into checksummed blocks
//! - **Compression**: Optional Snappy/LZ4 compression per block
//! - **Table Writer**: Packs records into blocks, then writes index and footer
//! - **Table Index**: Maps a key to the one block that may hold it
//! - **Table Reader**: Validates a table and serves `get` and `find`
//! - **Iterator**: Ordered cursor across block boundaries
//!
//! Storage is reached only through the [`fs`] traits, so tables can live on
//! disk ([`fs::DiskFileSystem`]) or in memory ([`fs::MemFileSystem`]).
//!
//! ## Example Usage
//!
//! ```rust
//! use aitable::fs::{FileSystem, MemFileSystem};
//! use aitable::{Options, TableReader, TableWriter};
//!
//! # fn main() -> Result<(), aitable::Error> {
//! let fs = MemFileSystem::new();
//!
//! // Build a table, keys in increasing order
//! let mut writer = TableWriter::new(fs.create("fruit.sst")?, Options::default())?;
//! writer.set(b"apple", b"red")?;
//! writer.set(b"banana", b"yellow")?;
//! writer.set(b"cherry", b"red")?;
//! writer.close()?;
//!
//! // Point lookups
//! let reader = TableReader::open(fs.open("fruit.sst")?, Options::default())?;
//! assert_eq!(reader.get(b"banana")?, b"yellow");
//! assert!(reader.get(b"durian").unwrap_err().is_not_found());
//!
//! // Range scan from "b"
//! let mut iter = reader.find(b"b")?;
//! while iter.advance()? {
//!     println!("{:?} => {:?}", iter.key(), iter.value());
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

// Module declarations
pub mod config;
pub mod error;
pub mod fs;
pub mod sstable;

// Re-exports
pub use config::{CompressionType, Options};
pub use error::{Error, Result};
pub use fs::{FileSystem, Readable, Writable};
pub use sstable::{Entries, TableIterator, TableReader, TableWriter};
