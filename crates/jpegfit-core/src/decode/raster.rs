//! Decoding of common raster formats with EXIF orientation handling and
//! normalization to RGB.

use std::io::Cursor;
use std::path::Path;

use exif::{In, Reader, Tag};
use image::{DynamicImage, ImageReader};
use tracing::instrument;

use super::raw_preview::{decode_raw_preview, is_raw_path};
use super::types::Orientation;
use super::{DecodeError, DecodedImage};

/// Decode an image from bytes, applying EXIF orientation correction.
///
/// The format is sniffed from the content, so any format enabled on the
/// `image` crate is accepted. The result is always normalized to RGB.
///
/// # Errors
///
/// Returns `DecodeError::InvalidFormat` if the format is not recognized.
/// Returns `DecodeError::CorruptedFile` if decoding fails part way.
pub fn decode_image(bytes: &[u8]) -> Result<DecodedImage, DecodeError> {
    let orientation = extract_orientation(bytes);
    let img = decode_dynamic(bytes)?;
    Ok(normalize_rgb(apply_orientation(img, orientation)))
}

/// Read and decode an image file.
///
/// Camera RAW files (recognized by extension) are decoded through their
/// embedded JPEG preview; everything else goes through [`decode_image`].
#[instrument(level = "debug", skip_all, fields(path = %path.display()))]
pub fn decode_path(path: &Path) -> Result<DecodedImage, DecodeError> {
    let bytes = std::fs::read(path)?;
    if is_raw_path(path) {
        decode_raw_preview(&bytes)
    } else {
        decode_image(&bytes)
    }
}

/// Convert any color mode to 3-channel RGB8.
///
/// Alpha is discarded and high bit-depth samples are scaled down. An image
/// that is already RGB8 is moved through without copying.
pub fn normalize_rgb(img: DynamicImage) -> DecodedImage {
    let rgb = match img {
        DynamicImage::ImageRgb8(rgb) => rgb,
        other => other.into_rgb8(),
    };
    DecodedImage::from_rgb_image(rgb)
}

fn decode_dynamic(bytes: &[u8]) -> Result<DynamicImage, DecodeError> {
    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| DecodeError::CorruptedFile(e.to_string()))?;

    if reader.format().is_none() {
        return Err(DecodeError::InvalidFormat);
    }

    reader
        .decode()
        .map_err(|e| DecodeError::CorruptedFile(e.to_string()))
}

/// EXIF orientation of `bytes`, `Normal` when there is no EXIF block or tag.
fn extract_orientation(bytes: &[u8]) -> Orientation {
    let mut cursor = Cursor::new(bytes);
    Reader::new()
        .read_from_container(&mut cursor)
        .ok()
        .and_then(|exif| {
            exif.get_field(Tag::Orientation, In::PRIMARY)
                .and_then(|field| field.value.get_uint(0))
        })
        .map(Orientation::from)
        .unwrap_or_default()
}

fn apply_orientation(img: DynamicImage, orientation: Orientation) -> DynamicImage {
    match orientation {
        Orientation::Normal => img,
        Orientation::FlipHorizontal => img.fliph(),
        Orientation::Rotate180 => img.rotate180(),
        Orientation::FlipVertical => img.flipv(),
        Orientation::Transpose => img.rotate90().fliph(),
        Orientation::Rotate90CW => img.rotate90(),
        Orientation::Transverse => img.rotate270().fliph(),
        Orientation::Rotate270CW => img.rotate270(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba, RgbaImage};

    fn encode_as(img: &DynamicImage, format: ImageFormat) -> Vec<u8> {
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, format).unwrap();
        out.into_inner()
    }

    fn two_pixel_strip() -> DynamicImage {
        let pixels = vec![
            255, 0, 0, // Red (left)
            0, 255, 0, // Green (right)
        ];
        DynamicImage::ImageRgb8(image::RgbImage::from_raw(2, 1, pixels).unwrap())
    }

    #[test]
    fn test_decode_png_rgba_drops_alpha() {
        let mut rgba = RgbaImage::new(3, 2);
        rgba.put_pixel(0, 0, Rgba([200, 100, 50, 0]));
        let png = encode_as(&DynamicImage::ImageRgba8(rgba), ImageFormat::Png);

        let img = decode_image(&png).unwrap();
        assert_eq!((img.width, img.height), (3, 2));
        assert_eq!(img.pixels.len(), 3 * 2 * 3);
        assert_eq!(&img.pixels[0..3], &[200, 100, 50]);
    }

    #[test]
    fn test_decode_grayscale_expands_to_rgb() {
        let gray = DynamicImage::ImageLuma8(image::GrayImage::from_pixel(4, 4, image::Luma([77])));
        let png = encode_as(&gray, ImageFormat::Png);

        let img = decode_image(&png).unwrap();
        assert!(img.validate().is_ok());
        assert!(img.pixels.iter().all(|&v| v == 77));
    }

    #[test]
    fn test_decode_unknown_format() {
        let result = decode_image(&[0x00, 0x01, 0x02, 0x03]);
        assert!(matches!(result, Err(DecodeError::InvalidFormat)));
    }

    #[test]
    fn test_decode_empty_bytes() {
        assert!(decode_image(&[]).is_err());
    }

    #[test]
    fn test_decode_truncated_png() {
        let png = encode_as(&two_pixel_strip(), ImageFormat::Png);
        let result = decode_image(&png[..png.len() / 2]);
        assert!(matches!(result, Err(DecodeError::CorruptedFile(_))));
    }

    #[test]
    fn test_orientation_without_exif() {
        let png = encode_as(&two_pixel_strip(), ImageFormat::Png);
        assert_eq!(extract_orientation(&png), Orientation::Normal);
        assert_eq!(extract_orientation(&[0x00, 0x01]), Orientation::Normal);
    }

    #[test]
    fn test_normalize_rgb_is_idempotent() {
        let once = normalize_rgb(two_pixel_strip());
        let rgb = image::RgbImage::from_raw(once.width, once.height, once.pixels.clone()).unwrap();
        let twice = normalize_rgb(DynamicImage::ImageRgb8(rgb));
        assert_eq!(once, twice);
    }

    #[test]
    fn test_normalize_rgb16() {
        let img = DynamicImage::ImageRgb16(image::ImageBuffer::from_pixel(
            1,
            1,
            image::Rgb([u16::MAX, 0, u16::MAX]),
        ));
        let rgb = normalize_rgb(img);
        assert_eq!(rgb.pixels, vec![255, 0, 255]);
    }

    #[test]
    fn test_apply_orientation_rotate90_swaps_dimensions() {
        let rotated = apply_orientation(two_pixel_strip(), Orientation::Rotate90CW).into_rgb8();
        assert_eq!(rotated.dimensions(), (1, 2));
    }

    #[test]
    fn test_apply_orientation_flip_horizontal() {
        let flipped = apply_orientation(two_pixel_strip(), Orientation::FlipHorizontal).into_rgb8();
        assert_eq!(flipped.get_pixel(0, 0).0, [0, 255, 0]);
        assert_eq!(flipped.get_pixel(1, 0).0, [255, 0, 0]);
    }

    #[test]
    fn test_decode_path_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("strip.png");
        std::fs::write(&path, encode_as(&two_pixel_strip(), ImageFormat::Png)).unwrap();

        let img = decode_path(&path).unwrap();
        assert_eq!((img.width, img.height), (2, 1));
    }

    #[test]
    fn test_decode_path_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = decode_path(&dir.path().join("nope.jpg"));
        assert!(matches!(result, Err(DecodeError::Io(_))));
    }
}
