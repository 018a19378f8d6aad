//! Atelier WASM - WebAssembly bindings for Atelier
//!
//! This crate exposes the atelier-core transcoder to the portfolio's
//! TypeScript front end.
//!
//! # Module Structure
//!
//! - `transcode` - Async image -> WebP transcoding
//! - `types` - WASM-compatible wrapper for the transcode result
//! - `delivery` - URL and object-name helpers for storage uploads
//!
//! # Usage
//!
//! ```typescript
//! import init, { transcode, object_name } from '@atelier/wasm';
//!
//! // Initialize WASM module (must call first)
//! await init();
//!
//! const bytes = new Uint8Array(await file.arrayBuffer());
//! const result = await transcode(bytes, { maxDimension: 1000 });
//! console.log(`Encoded ${result.width}x${result.height}, ${result.byteLength} bytes`);
//! await bucket.upload(object_name('commission'), result.bytes());
//! ```

use wasm_bindgen::prelude::*;

mod delivery;
mod transcode;
mod types;

pub use delivery::{object_name, optimized_url};
pub use transcode::{transcode, transcode_preset};
pub use types::JsTranscodeResult;

/// Initialize the WASM module (called automatically on load)
#[wasm_bindgen(start)]
pub fn init() {}

/// Get the version of the WASM module
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// Content type of every transcode output
#[wasm_bindgen]
pub fn content_type() -> String {
    atelier_core::WEBP_CONTENT_TYPE.to_string()
}
