//! Target-size compression.
//!
//! Given an RGB image and a byte ceiling, bisect the encoder's quality range
//! for the highest quality whose output still fits, then keep that encoding.
//!
//! # Algorithm
//!
//! ```text
//! low, high = bounds; best = None
//! while low <= high:
//!     mid = (low + high) / 2
//!     if size(encode(mid)) <= target: best = mid; low = mid + 1
//!     else:                           high = mid - 1
//! ```
//!
//! A range of `n` qualities takes at most `floor(log2(n)) + 1` probes, which
//! is 7 for the default 5..=95. Ties count as fitting.
//!
//! # Examples
//!
//! ```ignore
//! use jpegfit_core::compress::{compress_to_file, CompressOptions};
//! use jpegfit_core::decode::decode_path;
//! use jpegfit_core::encode::JpegQualityEncoder;
//!
//! let image = decode_path("photo.png".as_ref())?;
//! let outcome = compress_to_file(
//!     &image,
//!     1024 * 1024,
//!     &CompressOptions::default(),
//!     JpegQualityEncoder,
//!     "photo_compressed.jpg".as_ref(),
//! )?;
//! ```

mod bounds;
mod error;
mod probe;
mod search;

pub use bounds::{QualityBounds, MAX_QUALITY, MIN_QUALITY};
pub use error::CompressError;
pub use probe::probe_path_for;
pub use search::{
    compress_to_bytes, compress_to_file, CancelToken, CompressOptions, Compressed,
    CompressionOutcome,
};
