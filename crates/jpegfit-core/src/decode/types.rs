//! Decoded pixel buffers and decode errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("unrecognized or unsupported image format")]
    InvalidFormat,

    #[error("image data is corrupted or truncated: {0}")]
    CorruptedFile(String),

    #[error("image dimensions {width}x{height} are empty")]
    InvalidDimensions { width: u32, height: u32 },

    /// Buffer length is not `width * height * 3`.
    #[error("pixel buffer holds {actual} bytes, {expected} expected for RGB")]
    InvalidPixelData { expected: usize, actual: usize },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// A RAW file with no usable embedded JPEG.
    #[error("no embedded JPEG preview found")]
    NoPreview,
}

/// EXIF `Orientation` tag. Values outside 1..=8 read as [`Orientation::Normal`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Orientation {
    #[default]
    Normal,
    FlipHorizontal,
    Rotate180,
    FlipVertical,
    /// Mirrored across the top-left to bottom-right diagonal.
    Transpose,
    Rotate90CW,
    /// Mirrored across the top-right to bottom-left diagonal.
    Transverse,
    Rotate270CW,
}

impl From<u32> for Orientation {
    fn from(tag: u32) -> Self {
        match tag {
            2 => Self::FlipHorizontal,
            3 => Self::Rotate180,
            4 => Self::FlipVertical,
            5 => Self::Transpose,
            6 => Self::Rotate90CW,
            7 => Self::Transverse,
            8 => Self::Rotate270CW,
            _ => Self::Normal,
        }
    }
}

/// A decoded image with 3-channel RGB pixel data.
///
/// This is the normalized form every encoder and the target-size search
/// operate on. Producing one from any other color mode goes through
/// [`super::normalize_rgb`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    /// Row-major, 3 bytes per pixel.
    pub pixels: Vec<u8>,
}

impl DecodedImage {
    /// The buffer is not checked here; call [`DecodedImage::validate`] before
    /// handing untrusted data to an encoder.
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        Self {
            width,
            height,
            pixels,
        }
    }

    pub fn from_rgb_image(img: image::RgbImage) -> Self {
        let (width, height) = img.dimensions();
        Self {
            width,
            height,
            pixels: img.into_raw(),
        }
    }

    /// Expected length of the pixel buffer for these dimensions.
    pub fn expected_len(&self) -> usize {
        (self.width as usize) * (self.height as usize) * 3
    }

    /// Check that the dimensions are non-zero and the buffer holds exactly
    /// `width * height * 3` bytes.
    pub fn validate(&self) -> Result<(), DecodeError> {
        if self.width == 0 || self.height == 0 {
            return Err(DecodeError::InvalidDimensions {
                width: self.width,
                height: self.height,
            });
        }
        let expected = self.expected_len();
        if self.pixels.len() != expected {
            return Err(DecodeError::InvalidPixelData {
                expected,
                actual: self.pixels.len(),
            });
        }
        Ok(())
    }
}
