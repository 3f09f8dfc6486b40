//! Configuration options for table writers and readers.

/// Default target size of a data block before compression (4KB).
pub const DEFAULT_BLOCK_SIZE: usize = 4096;

/// Options consumed by [`TableWriter`](crate::TableWriter) and
/// [`TableReader`](crate::TableReader).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    /// Compression applied to each block when writing.
    /// Readers decode whatever compression a block was written with.
    /// Default: `CompressionType::default()`
    pub compression: CompressionType,

    /// Target uncompressed size of a data block (in bytes).
    /// A single record larger than this still gets a block of its own.
    /// Default: 4KB
    pub block_size: usize,

    /// Verify block checksums when reading.
    /// Default: true
    pub verify_checksums: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            compression: CompressionType::default(),
            block_size: DEFAULT_BLOCK_SIZE,
            verify_checksums: true,
        }
    }
}

/// Compression algorithms supported for table blocks.
///
/// The discriminant is the tag byte stored in each block trailer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CompressionType {
    /// No compression.
    None = 0,

    /// Snappy compression (fast, moderate compression ratio).
    #[cfg(feature = "snappy")]
    Snappy = 1,

    /// LZ4 compression (very fast, lower compression ratio).
    #[cfg(feature = "lz4-compression")]
    Lz4 = 2,
}

impl CompressionType {
    /// Convert from the tag byte. Returns `None` for unknown or
    /// compiled-out codecs.
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(CompressionType::None),
            #[cfg(feature = "snappy")]
            1 => Some(CompressionType::Snappy),
            #[cfg(feature = "lz4-compression")]
            2 => Some(CompressionType::Lz4),
            _ => None,
        }
    }

    /// Human readable codec name
    pub fn name(self) -> &'static str {
        match self {
            CompressionType::None => "none",
            #[cfg(feature = "snappy")]
            CompressionType::Snappy => "snappy",
            #[cfg(feature = "lz4-compression")]
            CompressionType::Lz4 => "lz4",
        }
    }
}

impl Default for CompressionType {
    fn default() -> Self {
        #[cfg(feature = "snappy")]
        return CompressionType::Snappy;

        #[cfg(not(feature = "snappy"))]
        CompressionType::None
    }
}

impl Options {
    /// Creates a new Options with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the compression algorithm.
    pub fn compression(mut self, compression: CompressionType) -> Self {
        self.compression = compression;
        self
    }

    /// Sets the target block size.
    pub fn block_size(mut self, size: usize) -> Self {
        self.block_size = size;
        self
    }

    /// Enables or disables checksum verification on read.
    pub fn verify_checksums(mut self, value: bool) -> Self {
        self.verify_checksums = value;
        self
    }

    /// Validates the options and returns an error if any are invalid.
    pub fn validate(&self) -> crate::Result<()> {
        if self.block_size == 0 {
            return Err(crate::Error::invalid_argument("block_size must be > 0"));
        }
        if self.block_size > u32::MAX as usize {
            return Err(crate::Error::invalid_argument("block_size must fit in 32 bits"));
        }
        Ok(())
    }
}
