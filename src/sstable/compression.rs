//! Per-block compression.
//!
//! Every codec here is deterministic: the same input always yields the same
//! output, so two tables built from the same records with the same options
//! are byte-identical.

use crate::config::CompressionType;
use crate::error::{Error, Result};

/// Compress raw block contents with `compression`.
pub fn compress(compression: CompressionType, raw: &[u8]) -> Result<Vec<u8>> {
    match compression {
        CompressionType::None => Ok(raw.to_vec()),
        #[cfg(feature = "snappy")]
        CompressionType::Snappy => snap::raw::Encoder::new()
            .compress_vec(raw)
            .map_err(|e| compression_failed("snappy compression failed", e)),
        #[cfg(feature = "lz4-compression")]
        CompressionType::Lz4 => lz4::block::compress(raw, None, true)
            .map_err(|e| compression_failed("lz4 compression failed", e)),
    }
}

/// Decompress a block payload that was tagged with `compression`.
pub fn decompress(compression: CompressionType, payload: &[u8]) -> Result<Vec<u8>> {
    match compression {
        CompressionType::None => Ok(payload.to_vec()),
        #[cfg(feature = "snappy")]
        CompressionType::Snappy => {
            let len = snap::raw::decompress_len(payload)
                .map_err(|e| Error::corruption(format!("snappy header: {}", e)))?;
            check_expansion(payload.len(), len, SNAPPY_MAX_EXPANSION)?;
            snap::raw::Decoder::new()
                .decompress_vec(payload)
                .map_err(|e| Error::corruption(format!("snappy decompression failed: {}", e)))
        }
        #[cfg(feature = "lz4-compression")]
        CompressionType::Lz4 => {
            if payload.len() < 4 {
                return Err(Error::corruption("lz4 payload missing size prefix"));
            }
            let len = i32::from_le_bytes([payload[0], payload[1], payload[2], payload[3]]);
            let len = usize::try_from(len)
                .map_err(|_| Error::corruption(format!("lz4 negative size prefix {}", len)))?;
            check_expansion(payload.len(), len, LZ4_MAX_EXPANSION)?;
            lz4::block::decompress(payload, None)
                .map_err(|e| Error::corruption(format!("lz4 decompression failed: {}", e)))
        }
    }
}

/// Resolve a stored tag byte to a codec this build can decode.
pub fn codec_for_tag(tag: u8) -> Result<CompressionType> {
    CompressionType::from_u8(tag).ok_or_else(|| match tag {
        1 => Error::Unsupported("snappy block but the `snappy` feature is disabled".into()),
        2 => Error::Unsupported("lz4 block but the `lz4-compression` feature is disabled".into()),
        _ => Error::corruption(format!("unknown compression tag {}", tag)),
    })
}

/// Whether a compressed payload saves enough to be worth storing.
///
/// Requires at least a 12.5% reduction; otherwise the raw contents are kept.
pub fn worth_compressing(raw_len: usize, compressed_len: usize) -> bool {
    compressed_len < raw_len - raw_len / 8
}

// Upper bounds on output/input ratio for well-formed payloads. A corrupt
// length header beyond these is rejected before anything is allocated.
#[cfg(feature = "snappy")]
const SNAPPY_MAX_EXPANSION: usize = 32;
#[cfg(feature = "lz4-compression")]
const LZ4_MAX_EXPANSION: usize = 256;

#[cfg(any(feature = "snappy", feature = "lz4-compression"))]
fn check_expansion(payload_len: usize, claimed: usize, ratio: usize) -> Result<()> {
    if claimed > payload_len.saturating_mul(ratio).saturating_add(64) {
        return Err(Error::corruption(format!(
            "decompressed size {} implausible for {}-byte payload",
            claimed, payload_len
        )));
    }
    Ok(())
}

#[cfg(any(feature = "snappy", feature = "lz4-compression"))]
fn compression_failed(context: &str, err: impl std::fmt::Display) -> Error {
    Error::invalid_argument(format!("{}: {}", context, err))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<u8> {
        b"abcdefgh".repeat(64)
    }

    #[test]
    fn test_none_is_identity() {
        let raw = sample();
        assert_eq!(compress(CompressionType::None, &raw).unwrap(), raw);
        assert_eq!(decompress(CompressionType::None, &raw).unwrap(), raw);
    }

    #[test]
    fn test_default_codec_roundtrip_and_deterministic() {
        let codec = CompressionType::default();
        let raw = sample();
        let a = compress(codec, &raw).unwrap();
        let b = compress(codec, &raw).unwrap();
        assert_eq!(a, b);
        assert_eq!(decompress(codec, &a).unwrap(), raw);
    }

    #[cfg(feature = "snappy")]
    #[test]
    fn test_snappy_shrinks_repetitive_input() {
        let raw = sample();
        let compressed = compress(CompressionType::Snappy, &raw).unwrap();
        assert!(worth_compressing(raw.len(), compressed.len()));
    }

    #[cfg(feature = "snappy")]
    #[test]
    fn test_snappy_rejects_garbage() {
        let err = decompress(CompressionType::Snappy, &[0xff, 0xff, 0xff, 0xff, 0xff]).unwrap_err();
        assert!(err.is_corruption());
    }

    #[cfg(feature = "lz4-compression")]
    #[test]
    fn test_lz4_roundtrip() {
        let raw = sample();
        let compressed = compress(CompressionType::Lz4, &raw).unwrap();
        assert_eq!(decompress(CompressionType::Lz4, &compressed).unwrap(), raw);
    }

    #[test]
    fn test_codec_for_tag() {
        assert_eq!(codec_for_tag(0).unwrap(), CompressionType::None);
        assert!(codec_for_tag(9).unwrap_err().is_corruption());
        #[cfg(not(feature = "lz4-compression"))]
        assert!(matches!(codec_for_tag(2), Err(Error::Unsupported(_))));
    }

    #[test]
    fn test_worth_compressing() {
        assert!(worth_compressing(800, 699));
        assert!(!worth_compressing(800, 700));
        assert!(!worth_compressing(0, 0));
    }
}
