//! JPEG encoding at a given quality.
//!
//! Backed by the `image` crate's baseline JPEG encoder. The encoder is
//! deterministic for a fixed (image, quality) pair, which the target-size
//! search relies on when it re-encodes the winning quality.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::{ExtendedColorType, ImageEncoder};
use thiserror::Error;

use crate::decode::DecodedImage;

#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("cannot encode {actual} bytes as a {expected}-byte RGB image")]
    InvalidPixelData { expected: usize, actual: usize },

    #[error("cannot encode an empty {width}x{height} image")]
    InvalidDimensions { width: u32, height: u32 },

    /// Failure reported by the underlying codec.
    #[error("JPEG encoding failed: {0}")]
    EncodingFailed(String),
}

/// Something that can turn an RGB image into bytes at an integer quality.
///
/// Implementations must be deterministic: the same image and quality must
/// produce the same bytes. Larger quality values are expected to produce
/// output that is no smaller than lower ones.
pub trait QualityEncoder {
    fn encode(&self, image: &DecodedImage, quality: u8) -> Result<Vec<u8>, EncodeError>;
}

/// Baseline JPEG via the `image` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct JpegQualityEncoder;

impl QualityEncoder for JpegQualityEncoder {
    fn encode(&self, image: &DecodedImage, quality: u8) -> Result<Vec<u8>, EncodeError> {
        encode_jpeg(&image.pixels, image.width, image.height, quality)
    }
}

impl<E: QualityEncoder + ?Sized> QualityEncoder for &E {
    fn encode(&self, image: &DecodedImage, quality: u8) -> Result<Vec<u8>, EncodeError> {
        (**self).encode(image, quality)
    }
}

/// Encode RGB pixel data to JPEG bytes.
///
/// # Arguments
///
/// * `pixels` - RGB pixel data (3 bytes per pixel, row-major order)
/// * `width` - Image width in pixels
/// * `height` - Image height in pixels
/// * `quality` - JPEG quality, clamped to 1-100
pub fn encode_jpeg(
    pixels: &[u8],
    width: u32,
    height: u32,
    quality: u8,
) -> Result<Vec<u8>, EncodeError> {
    if width == 0 || height == 0 {
        return Err(EncodeError::InvalidDimensions { width, height });
    }

    let expected = (width as usize) * (height as usize) * 3;
    if pixels.len() != expected {
        return Err(EncodeError::InvalidPixelData {
            expected,
            actual: pixels.len(),
        });
    }

    let mut buffer = Cursor::new(Vec::with_capacity(expected / 8));
    JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100))
        .write_image(pixels, width, height, ExtendedColorType::Rgb8)
        .map_err(|e| EncodeError::EncodingFailed(e.to_string()))?;

    Ok(buffer.into_inner())
}
