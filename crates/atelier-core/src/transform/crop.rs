//! Image cropping using normalized coordinates.
//!
//! Crop parameters are in the range 0.0 to 1.0, independent of the actual
//! image dimensions, so a region chosen on a scaled preview applies
//! unchanged to the full-resolution upload.

use serde::{Deserialize, Serialize};

use crate::decode::{Bitmap, CHANNELS};

/// A crop rectangle in normalized coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CropRegion {
    /// Left edge (0.0 to 1.0).
    pub left: f64,
    /// Top edge (0.0 to 1.0).
    pub top: f64,
    /// Width relative to the image width (0.0 to 1.0).
    pub width: f64,
    /// Height relative to the image height (0.0 to 1.0).
    pub height: f64,
}

impl CropRegion {
    /// The whole image.
    pub const FULL: CropRegion = CropRegion {
        left: 0.0,
        top: 0.0,
        width: 1.0,
        height: 1.0,
    };

    /// Create a new region.
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// A centered square for an image of `image_width x image_height`.
    ///
    /// The side is `fraction` of the image width, shrunk to the image height
    /// when that is smaller. This is the default avatar framing.
    pub fn centered_square(image_width: u32, image_height: u32, fraction: f64) -> Self {
        if image_width == 0 || image_height == 0 {
            return Self::FULL;
        }
        let (w, h) = (f64::from(image_width), f64::from(image_height));
        let side = (w * fraction.clamp(0.0, 1.0)).min(h);

        let width = side / w;
        let height = side / h;
        Self {
            left: (1.0 - width) / 2.0,
            top: (1.0 - height) / 2.0,
            width,
            height,
        }
    }

    /// Whether this region covers the entire image.
    pub fn is_full(&self) -> bool {
        self.left <= 0.0 && self.top <= 0.0 && self.width >= 1.0 && self.height >= 1.0
    }

    /// Reject regions that cannot select any pixels.
    pub fn validate(&self) -> Result<(), String> {
        let values = [self.left, self.top, self.width, self.height];
        if values.iter().any(|v| !v.is_finite()) {
            return Err("crop values must be finite".to_string());
        }
        if self.width <= 0.0 || self.height <= 0.0 {
            return Err(format!(
                "crop size must be positive, got {}x{}",
                self.width, self.height
            ));
        }
        if self.left >= 1.0 || self.top >= 1.0 {
            return Err(format!(
                "crop origin ({}, {}) lies outside the image",
                self.left, self.top
            ));
        }
        Ok(())
    }
}

impl Default for CropRegion {
    fn default() -> Self {
        Self::FULL
    }
}

/// Apply a normalized crop to a bitmap.
///
/// # Behavior
///
/// - Coordinates extending beyond the image are clamped
/// - Minimum output dimension is 1x1 pixels
/// - A full region returns a copy of the original bitmap
pub fn apply_crop(bitmap: &Bitmap, region: &CropRegion) -> Bitmap {
    if region.is_full() {
        return bitmap.clone();
    }

    let src_w = f64::from(bitmap.width);
    let src_h = f64::from(bitmap.height);

    let px_left = ((region.left.clamp(0.0, 1.0) * src_w).round() as u32)
        .min(bitmap.width.saturating_sub(1));
    let px_top = ((region.top.clamp(0.0, 1.0) * src_h).round() as u32)
        .min(bitmap.height.saturating_sub(1));
    let px_width = (region.width.clamp(0.0, 1.0) * src_w).round() as u32;
    let px_height = (region.height.clamp(0.0, 1.0) * src_h).round() as u32;

    let out_width = (px_left + px_width)
        .min(bitmap.width)
        .saturating_sub(px_left)
        .max(1);
    let out_height = (px_top + px_height)
        .min(bitmap.height)
        .saturating_sub(px_top)
        .max(1);

    let src_stride = bitmap.width as usize * CHANNELS;
    let row_len = out_width as usize * CHANNELS;
    let mut pixels = Vec::with_capacity(row_len * out_height as usize);

    for y in px_top..px_top + out_height {
        let start = y as usize * src_stride + px_left as usize * CHANNELS;
        pixels.extend_from_slice(&bitmap.pixels[start..start + row_len]);
    }

    Bitmap::new(out_width, out_height, pixels)
}


// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod proptests {
    use super::*;
    use crate::test_fixtures::gradient_bitmap;
    use proptest::prelude::*;

    fn region_strategy() -> impl Strategy<Value = CropRegion> {
        (0.0f64..=1.0, 0.0f64..=1.0, 0.0f64..=1.0, 0.0f64..=1.0)
            .prop_map(|(l, t, w, h)| CropRegion::new(l, t, w, h))
    }

    proptest! {
        /// Property: Output is non-empty, bounded by the input, and consistent.
        #[test]
        fn prop_output_well_formed(
            (width, height) in (1u32..=64, 1u32..=64),
            region in region_strategy(),
        ) {
            let bmp = gradient_bitmap(width, height);
            let out = apply_crop(&bmp, &region);

            prop_assert!(out.width >= 1 && out.height >= 1);
            prop_assert!(out.width <= width && out.height <= height);
            prop_assert_eq!(out.pixels.len(), (out.width * out.height) as usize * CHANNELS);
        }

        /// Property: Centered squares are square and fit the image.
        #[test]
        fn prop_centered_square_is_square(
            (width, height) in (2u32..=2000, 2u32..=2000),
            fraction in 0.1f64..=1.0,
        ) {
            let region = CropRegion::centered_square(width, height, fraction);
            let side_w = region.width * f64::from(width);
            let side_h = region.height * f64::from(height);

            prop_assert!((side_w - side_h).abs() < 1e-6);
            prop_assert!(region.left >= -1e-9 && region.top >= -1e-9);
            prop_assert!(region.left + region.width <= 1.0 + 1e-9);
            prop_assert!(region.top + region.height <= 1.0 + 1e-9);
        }
    }
}
