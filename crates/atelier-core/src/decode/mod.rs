//! Image decoding and resize planning.
//!
//! This module provides:
//! - The [`Decode`] adapter trait and its `image`-backed implementation
//! - EXIF orientation handling so planning sees the upright image
//! - The resize policy that bounds output dimensions
//!
//! # Examples
//!
//! ```ignore
//! use atelier_core::decode::{decode_image, plan_resize};
//!
//! let bytes = std::fs::read("photo.jpg").unwrap();
//! let bitmap = decode_image(&bytes).unwrap();
//! let plan = plan_resize(bitmap.width, bitmap.height, 2048);
//! println!("{}x{} -> {}x{}", bitmap.width, bitmap.height, plan.width, plan.height);
//! ```

mod adapter;
mod resize;
mod types;

pub use adapter::{decode_image, extract_orientation, Decode, ImageDecoder};
pub use resize::{plan_resize, plan_resize_with, ResizePlan, Rounding};
pub use types::{Bitmap, DecodeError, FilterType, Orientation, CHANNELS};
