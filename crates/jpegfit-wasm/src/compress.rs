//! Target-size compression bindings.
//!
//! ```typescript
//! import { compress_to_target } from '@jpegfit/wasm';
//!
//! const result = compress_to_target(bytes, 1024 * 1024, 5, 95);
//! if (result.status === 'compressed') {
//!   download(new Blob([result.bytes], { type: 'image/jpeg' }));
//! } else {
//!   console.warn(`Smallest encode is ${result.smallestSizeBytes} bytes`);
//! }
//! ```

use jpegfit_core::compress::{compress_to_bytes, CompressOptions, QualityBounds};
use jpegfit_core::decode::decode_image;
use jpegfit_core::encode::JpegQualityEncoder;
use wasm_bindgen::prelude::*;

use crate::types::JsCompressResult;

/// Decode `bytes` and find the highest quality in `min_quality..=max_quality`
/// whose JPEG fits in `target_size_bytes`.
///
/// An unreachable target is a normal result with `status: "unreachable"`.
/// Decode failures and invalid arguments throw.
#[wasm_bindgen]
pub fn compress_to_target(
    bytes: &[u8],
    target_size_bytes: u32,
    min_quality: u8,
    max_quality: u8,
) -> Result<JsValue, JsValue> {
    let result = compress_source(bytes, u64::from(target_size_bytes), min_quality, max_quality)
        .map_err(|e| JsValue::from_str(&e))?;
    serde_wasm_bindgen::to_value(&result).map_err(|e| JsValue::from_str(&e.to_string()))
}

fn compress_source(
    bytes: &[u8],
    target_size_bytes: u64,
    min_quality: u8,
    max_quality: u8,
) -> Result<JsCompressResult, String> {
    let bounds = QualityBounds::new(min_quality, max_quality).map_err(|e| e.to_string())?;
    let image = decode_image(bytes).map_err(|e| e.to_string())?;
    let options = CompressOptions::with_bounds(bounds);

    compress_to_bytes(&image, target_size_bytes, &options, JpegQualityEncoder)
        .map(JsCompressResult::from)
        .map_err(|e| e.to_string())
}
