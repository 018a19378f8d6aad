//! Transcode bindings.
//!
//! The browser build has no threads, so the shared transcoder runs inline on
//! the calling task. Both functions return a `Promise`.
//!
//! # Example
//!
//! ```typescript
//! import { transcode, transcode_preset } from '@atelier/wasm';
//!
//! const bytes = new Uint8Array(await file.arrayBuffer());
//! const result = await transcode(bytes, { maxDimension: 2048, quality: 0.82 });
//! await storage.upload(key, result.bytes(), { contentType: result.contentType });
//!
//! const avatar = await transcode_preset(bytes, 'avatar');
//! ```

use atelier_core::{TranscodeError, TranscodeOptions};
use wasm_bindgen::prelude::*;

use crate::types::JsTranscodeResult;

/// Transcode an image to WebP.
///
/// # Arguments
///
/// * `bytes` - Encoded source image (JPEG, PNG, WebP or GIF)
/// * `options` - `{ maxDimension?, quality?, crop? }`, or `undefined` for defaults
///
/// # Errors
///
/// Rejects with an `Error` whose message is suitable for display, e.g.
/// `"File too large. Maximum size is 25MB."`.
#[wasm_bindgen]
pub async fn transcode(bytes: Vec<u8>, options: JsValue) -> Result<JsTranscodeResult, JsValue> {
    let options = parse_options(options)?;
    run(bytes, options).await
}

/// Transcode with a named preset: `"gallery"`, `"commission"` or `"avatar"`.
#[wasm_bindgen]
pub async fn transcode_preset(
    bytes: Vec<u8>,
    preset: String,
) -> Result<JsTranscodeResult, JsValue> {
    let options = preset_options(&preset).map_err(|message| js_error(&message))?;
    run(bytes, options).await
}

async fn run(bytes: Vec<u8>, options: TranscodeOptions) -> Result<JsTranscodeResult, JsValue> {
    atelier_core::transcode(bytes, options)
        .await
        .map(JsTranscodeResult::from)
        .map_err(to_js_error)
}

fn parse_options(options: JsValue) -> Result<TranscodeOptions, JsValue> {
    if options.is_undefined() || options.is_null() {
        return Ok(TranscodeOptions::default());
    }
    serde_wasm_bindgen::from_value(options).map_err(|e| js_error(&e.to_string()))
}

pub(crate) fn preset_options(name: &str) -> Result<TranscodeOptions, String> {
    match name {
        "gallery" => Ok(TranscodeOptions::gallery()),
        "commission" => Ok(TranscodeOptions::commission()),
        "avatar" => Ok(TranscodeOptions::avatar()),
        other => Err(format!("Unknown transcode preset: {other}")),
    }
}

fn to_js_error(err: TranscodeError) -> JsValue {
    let message = err.to_string();
    web_sys::console::error_1(&JsValue::from_str(&message));
    js_error(&message)
}

fn js_error(message: &str) -> JsValue {
    js_sys::Error::new(message).into()
}
