//! Geometric transforms applied between decode and encode.
//!
//! # Coordinate System
//!
//! - Crop coordinates are normalized (0.0 to 1.0) relative to the upright
//!   image, after EXIF orientation has been applied
//! - Origin is top-left corner

mod crop;

pub use crop::{apply_crop, CropRegion};
