//! Delivery helper bindings.
//!
//! ```typescript
//! import { optimized_url, object_name } from '@atelier/wasm';
//!
//! img.src = optimized_url(piece.imageUrl);          // width 800, quality 85
//! const key = object_name('avatar');                // "avatar-1700000000000.webp"
//! ```

use atelier_core::delivery::{self, DeliveryParams};
use wasm_bindgen::prelude::*;

/// Rewrite a storage URL to request a resized WebP rendition.
///
/// Missing `quality` and `width` default to 85 and 800. URLs not served by
/// the storage backend are returned unchanged.
#[wasm_bindgen]
pub fn optimized_url(url: &str, quality: Option<u8>, width: Option<u32>) -> String {
    delivery::optimized_url(url, &params(quality, width))
}

/// Object key for a fresh upload, timestamped with `Date.now()`.
#[wasm_bindgen]
pub fn object_name(prefix: &str) -> String {
    delivery::object_name(prefix, js_sys::Date::now() as u64)
}

fn params(quality: Option<u8>, width: Option<u32>) -> DeliveryParams {
    let defaults = DeliveryParams::default();
    DeliveryParams {
        quality: quality.unwrap_or(defaults.quality),
        width: width.unwrap_or(defaults.width),
        ..defaults
    }
}
