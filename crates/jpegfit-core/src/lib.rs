//! jpegfit core - target-size JPEG compression
//!
//! This crate provides the image handling behind jpegfit:
//! decoding (including camera RAW previews), normalization to RGB,
//! JPEG encoding, the quality search that fits an image under a byte
//! ceiling, and bulk conversion to JPEG.

pub mod compress;
pub mod convert;
pub mod decode;
pub mod encode;

pub use compress::{
    compress_to_bytes, compress_to_file, CancelToken, CompressError, CompressOptions, Compressed,
    CompressionOutcome, QualityBounds,
};
pub use decode::{decode_image, decode_path, DecodedImage};
pub use encode::{JpegQualityEncoder, QualityEncoder};

/// Bytes in one megabyte as the CLI counts them.
pub const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Convert a size in megabytes to whole bytes, rounding down.
///
/// Returns `None` for values that aren't finite and positive or that round
/// down to zero bytes.
pub fn megabytes_to_bytes(megabytes: f64) -> Option<u64> {
    if !megabytes.is_finite() || megabytes <= 0.0 {
        return None;
    }
    let bytes = (megabytes * BYTES_PER_MB).floor();
    (bytes >= 1.0 && bytes <= u64::MAX as f64).then_some(bytes as u64)
}
