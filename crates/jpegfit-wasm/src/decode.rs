//! Decoding bindings.

use crate::types::JsDecodedImage;
use jpegfit_core::decode;
use wasm_bindgen::prelude::*;

/// Decode JPEG, PNG, WebP, BMP, TIFF or GIF bytes to RGB, applying EXIF
/// orientation.
///
/// ```typescript
/// const image = decode_image(new Uint8Array(await file.arrayBuffer()));
/// console.log(`Decoded ${image.width}x${image.height}`);
/// ```
#[wasm_bindgen]
pub fn decode_image(bytes: &[u8]) -> Result<JsDecodedImage, JsValue> {
    decode::decode_image(bytes)
        .map(JsDecodedImage::from_decoded)
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Decode the embedded JPEG preview of a camera RAW file.
#[wasm_bindgen]
pub fn decode_raw_preview(bytes: &[u8]) -> Result<JsDecodedImage, JsValue> {
    decode::decode_raw_preview(bytes)
        .map(JsDecodedImage::from_decoded)
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn test_decode_image_roundtrips_encoded_jpeg() {
        let jpeg = jpegfit_core::encode::encode_jpeg(&[90u8; 16 * 8 * 3], 16, 8, 90).unwrap();
        let image = decode_image(&jpeg).unwrap();
        assert_eq!(image.width(), 16);
        assert_eq!(image.height(), 8);
        assert_eq!(image.byte_length(), 16 * 8 * 3);
    }

    #[wasm_bindgen_test]
    fn test_decode_image_rejects_garbage() {
        assert!(decode_image(&[0, 1, 2, 3]).is_err());
    }

    #[wasm_bindgen_test]
    fn test_decode_raw_preview_without_preview() {
        assert!(decode_raw_preview(&[0u8; 64]).is_err());
    }
}
