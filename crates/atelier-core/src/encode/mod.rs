//! Image encoding for Atelier uploads.
//!
//! This module provides functionality for:
//! - Drawing a bitmap onto an exactly sized surface with a smoothing filter
//! - Encoding that surface to WebP with a configurable quality
//!
//! # Examples
//!
//! ```ignore
//! use atelier_core::decode::{Bitmap, FilterType};
//! use atelier_core::encode::{encode_webp, WebpQuality};
//!
//! let bitmap = Bitmap::new(100, 100, vec![128u8; 100 * 100 * 4]);
//! let quality = WebpQuality::from_unit(0.82);
//! let webp = encode_webp(&bitmap, 50, 50, quality, FilterType::Lanczos3).unwrap();
//! println!("Encoded {} bytes", webp.len());
//! ```

mod webp;

pub use webp::{encode_webp, EncodeError, WebpQuality, DEFAULT_QUALITY};
