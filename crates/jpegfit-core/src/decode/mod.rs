//! Image decoding for jpegfit.
//!
//! This module provides functionality for:
//! - Decoding common raster formats (JPEG, PNG, WebP, BMP, TIFF, GIF)
//! - Applying EXIF orientation
//! - Normalizing any color mode to 3-channel RGB
//! - Decoding camera RAW files through their embedded JPEG preview
//!
//! Everything downstream (encoders, the target-size search) works on the
//! normalized [`DecodedImage`].

mod raster;
mod raw_preview;
mod types;

pub use raster::{decode_image, decode_path, normalize_rgb};
pub use raw_preview::{decode_raw_preview, extract_raw_preview, is_raw_path, RAW_EXTENSIONS};
pub use types::{DecodeError, DecodedImage};
