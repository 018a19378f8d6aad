//! WASM-compatible wrapper types for transcode output.

use atelier_core::TranscodeResult;
use wasm_bindgen::prelude::*;

/// The output of a transcode, as seen from JavaScript.
///
/// # Memory Management
///
/// The encoded bytes live in WASM memory. `bytes()` copies them into a fresh
/// `Uint8Array`, so call it once and hand the array to the upload.
#[wasm_bindgen]
pub struct JsTranscodeResult {
    bytes: Vec<u8>,
    was_resized: bool,
    width: u32,
    height: u32,
    content_type: &'static str,
}

#[wasm_bindgen]
impl JsTranscodeResult {
    /// Encoded WebP bytes as a `Uint8Array` (copied).
    pub fn bytes(&self) -> Vec<u8> {
        self.bytes.clone()
    }

    /// Whether the image was scaled down
    #[wasm_bindgen(getter, js_name = wasResized)]
    pub fn was_resized(&self) -> bool {
        self.was_resized
    }

    /// Output width in pixels
    #[wasm_bindgen(getter)]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Output height in pixels
    #[wasm_bindgen(getter)]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// MIME type for the upload, always `image/webp`
    #[wasm_bindgen(getter, js_name = contentType)]
    pub fn content_type(&self) -> String {
        self.content_type.to_string()
    }

    /// Size of the encoded output in bytes
    #[wasm_bindgen(getter, js_name = byteLength)]
    pub fn byte_length(&self) -> usize {
        self.bytes.len()
    }
}

impl From<TranscodeResult> for JsTranscodeResult {
    fn from(result: TranscodeResult) -> Self {
        let content_type = result.content_type();
        Self {
            bytes: result.bytes,
            was_resized: result.was_resized,
            width: result.width,
            height: result.height,
            content_type,
        }
    }
}
