//! JavaScript-facing wrapper types.

use jpegfit_core::decode::DecodedImage;
use jpegfit_core::CompressionOutcome;
use serde::{Serialize, Serializer};
use wasm_bindgen::prelude::*;

/// A decoded RGB image held in WASM memory.
///
/// `pixels()` copies the buffer out to a `Uint8Array`; keep the image on the
/// WASM side when it is only going to be passed back in.
#[wasm_bindgen]
pub struct JsDecodedImage {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

#[wasm_bindgen]
impl JsDecodedImage {
    /// Wrap RGB pixel data (3 bytes per pixel, row-major).
    #[wasm_bindgen(constructor)]
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> JsDecodedImage {
        JsDecodedImage {
            width,
            height,
            pixels,
        }
    }

    #[wasm_bindgen(getter)]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[wasm_bindgen(getter)]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[wasm_bindgen(getter)]
    pub fn byte_length(&self) -> usize {
        self.pixels.len()
    }

    pub fn pixels(&self) -> Vec<u8> {
        self.pixels.clone()
    }
}

impl JsDecodedImage {
    pub(crate) fn from_decoded(img: DecodedImage) -> Self {
        Self {
            width: img.width,
            height: img.height,
            pixels: img.pixels,
        }
    }
}

/// Result of `compress_to_target`, serialized to a plain JS object.
///
/// `status` is `"compressed"` or `"unreachable"`. Only a compressed result
/// carries `quality`, `sizeBytes` and `bytes`; an unreachable one carries
/// `smallestSizeBytes` instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JsCompressResult {
    pub status: &'static str,
    pub probes: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub smallest_size_bytes: Option<u64>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "bytes_as_typed_array"
    )]
    pub bytes: Option<Vec<u8>>,
}

/// Serialize through `serialize_bytes` so JS receives a `Uint8Array` rather
/// than an array of numbers.
fn bytes_as_typed_array<S: Serializer>(bytes: &Option<Vec<u8>>, s: S) -> Result<S::Ok, S::Error> {
    match bytes {
        Some(bytes) => s.serialize_bytes(bytes),
        None => s.serialize_none(),
    }
}

impl From<CompressionOutcome<Vec<u8>>> for JsCompressResult {
    fn from(outcome: CompressionOutcome<Vec<u8>>) -> Self {
        match outcome {
            CompressionOutcome::Compressed(done) => Self {
                status: "compressed",
                probes: done.probes,
                quality: Some(done.quality),
                size_bytes: Some(done.size_bytes),
                smallest_size_bytes: None,
                bytes: Some(done.output),
            },
            CompressionOutcome::TargetUnreachable {
                probes,
                smallest_size_bytes,
            } => Self {
                status: "unreachable",
                probes,
                quality: None,
                size_bytes: None,
                smallest_size_bytes: Some(smallest_size_bytes),
                bytes: None,
            },
        }
    }
}
