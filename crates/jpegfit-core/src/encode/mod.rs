//! Image encoding for jpegfit.
//!
//! [`QualityEncoder`] is the seam the target-size search is written against;
//! [`JpegQualityEncoder`] is the production implementation.

mod jpeg;

pub use jpeg::{encode_jpeg, EncodeError, JpegQualityEncoder, QualityEncoder};
