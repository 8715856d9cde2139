//! jpegfit WASM - browser bindings for target-size JPEG compression
//!
//! - `compress` - fit an image under a byte ceiling
//! - `decode` - decode raster images and RAW previews
//! - `encode` - fixed-quality JPEG encoding
//! - `types` - JS-facing wrapper types
//!
//! ```typescript
//! import init, { compress_to_target } from '@jpegfit/wasm';
//!
//! await init();
//! const bytes = new Uint8Array(await file.arrayBuffer());
//! const result = compress_to_target(bytes, 500 * 1024, 5, 95);
//! ```

use wasm_bindgen::prelude::*;

mod compress;
mod decode;
mod encode;
mod types;

pub use compress::compress_to_target;
pub use decode::{decode_image, decode_raw_preview};
pub use encode::encode_jpeg;
pub use types::{JsCompressResult, JsDecodedImage};

#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
