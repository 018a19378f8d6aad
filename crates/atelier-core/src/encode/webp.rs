//! WebP encoding for uploads.
//!
//! The bitmap is drawn onto a surface of exactly the target size with a
//! smoothing filter, then serialized with the pure-Rust WebP encoder from
//! the `image` crate. That encoder only writes lossless VP8L, so quality
//! below 100% is applied by quantizing the RGB channels first: fewer
//! distinct colors compress into a smaller lossless stream. Alpha is never
//! quantized.

use image::codecs::webp::WebPEncoder;
use image::{ExtendedColorType, RgbaImage};
use thiserror::Error;

use crate::decode::{Bitmap, FilterType, CHANNELS};

/// Default upload quality on the `[0, 1]` scale.
pub const DEFAULT_QUALITY: f32 = 0.82;

/// Errors that can occur during WebP encoding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    /// Pixel data length doesn't match the bitmap dimensions
    #[error("Invalid pixel data: expected {expected} bytes (width * height * 4), got {actual}")]
    InvalidPixelData { expected: usize, actual: usize },

    /// Target width or height is zero
    #[error("Invalid dimensions: width ({width}) and height ({height}) must be non-zero")]
    InvalidDimensions { width: u32, height: u32 },

    /// The encoder reported a failure
    #[error("WebP encoding failed: {0}")]
    EncodingFailed(String),

    /// The encoder returned without writing anything
    #[error("WebP conversion produced no output")]
    EmptyOutput,
}

/// Quality on the 1-100 scale the quantizer works in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct WebpQuality(u8);

impl WebpQuality {
    /// Lossless output; no quantization.
    pub const LOSSLESS: WebpQuality = WebpQuality(100);

    /// Map a `[0, 1]` quality onto 1-100. Out-of-range values are clamped and
    /// NaN is treated as the default quality.
    pub fn from_unit(quality: f32) -> Self {
        let quality = if quality.is_nan() {
            DEFAULT_QUALITY
        } else {
            quality.clamp(0.0, 1.0)
        };
        WebpQuality(((quality * 100.0).round() as u8).max(1))
    }

    /// The 1-100 percentage.
    pub fn percent(self) -> u8 {
        self.0
    }

    /// Whether this quality skips quantization entirely.
    pub fn is_lossless(self) -> bool {
        self.0 >= 100
    }

    /// Number of levels each RGB channel is reduced to.
    ///
    /// Biased toward finer palettes at high quality while keeping low
    /// qualities coarse.
    pub fn channel_levels(self) -> u16 {
        if self.is_lossless() {
            return 256;
        }
        let normalized = f32::from(self.0) / 100.0;
        let levels = 2.0 + normalized * normalized * 254.0;
        levels.round().clamp(2.0, 256.0) as u16
    }
}

impl Default for WebpQuality {
    fn default() -> Self {
        WebpQuality::from_unit(DEFAULT_QUALITY)
    }
}

/// Draw `bitmap` onto a `target_width x target_height` surface and encode it
/// as WebP.
///
/// # Arguments
///
/// * `bitmap` - Decoded RGBA source
/// * `target_width` - Output width in pixels
/// * `target_height` - Output height in pixels
/// * `quality` - Output quality
/// * `filter` - Smoothing filter used when the size changes
///
/// # Errors
///
/// Returns `EncodeError::InvalidDimensions` for a zero target,
/// `EncodeError::InvalidPixelData` for a bitmap whose buffer does not match
/// its dimensions, and `EncodeError::EmptyOutput` if nothing was written.
///
/// The surface is a local owned buffer dropped before return on every path.
pub fn encode_webp(
    bitmap: &Bitmap,
    target_width: u32,
    target_height: u32,
    quality: WebpQuality,
    filter: FilterType,
) -> Result<Vec<u8>, EncodeError> {
    if target_width == 0 || target_height == 0 {
        return Err(EncodeError::InvalidDimensions {
            width: target_width,
            height: target_height,
        });
    }

    let expected = bitmap.width as usize * bitmap.height as usize * CHANNELS;
    if bitmap.pixels.len() != expected || bitmap.is_empty() {
        return Err(EncodeError::InvalidPixelData {
            expected,
            actual: bitmap.pixels.len(),
        });
    }

    let mut surface = draw_surface(bitmap, target_width, target_height, filter)?;

    if !quality.is_lossless() {
        quantize_rgb(&mut surface, quality);
    }

    let mut output = Vec::new();
    WebPEncoder::new_lossless(&mut output)
        .encode(
            surface.as_raw(),
            target_width,
            target_height,
            ExtendedColorType::Rgba8,
        )
        .map_err(|e| EncodeError::EncodingFailed(e.to_string()))?;

    non_empty(output)
}

/// Allocate the output surface and draw the bitmap into it.
fn draw_surface(
    bitmap: &Bitmap,
    width: u32,
    height: u32,
    filter: FilterType,
) -> Result<RgbaImage, EncodeError> {
    if bitmap.width == width && bitmap.height == height {
        return RgbaImage::from_raw(width, height, bitmap.pixels.clone()).ok_or(
            EncodeError::InvalidPixelData {
                expected: width as usize * height as usize * CHANNELS,
                actual: bitmap.pixels.len(),
            },
        );
    }

    let view = bitmap
        .as_rgba_view()
        .ok_or(EncodeError::InvalidPixelData {
            expected: bitmap.width as usize * bitmap.height as usize * CHANNELS,
            actual: bitmap.pixels.len(),
        })?;

    Ok(image::imageops::resize(
        &view,
        width,
        height,
        filter.to_image_filter(),
    ))
}

/// Reduce each RGB channel to `quality.channel_levels()` evenly spaced values.
fn quantize_rgb(data: &mut [u8], quality: WebpQuality) {
    let levels = quality.channel_levels();
    if levels >= 256 {
        return;
    }
    let step = 255.0 / (f32::from(levels) - 1.0);
    for pixel in data.chunks_exact_mut(CHANNELS) {
        for channel in pixel.iter_mut().take(3) {
            let bucket = (f32::from(*channel) / step).round();
            *channel = (bucket * step).round().clamp(0.0, 255.0) as u8;
        }
    }
}

fn non_empty(output: Vec<u8>) -> Result<Vec<u8>, EncodeError> {
    if output.is_empty() {
        Err(EncodeError::EmptyOutput)
    } else {
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::gradient_bitmap;

    fn is_webp(bytes: &[u8]) -> bool {
        bytes.len() > 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP"
    }

    fn encode_lanczos(bmp: &Bitmap, width: u32, height: u32, quality: WebpQuality) -> Vec<u8> {
        encode_webp(bmp, width, height, quality, FilterType::Lanczos3).unwrap()
    }

    fn decode_webp(bytes: &[u8]) -> image::RgbaImage {
        image::load_from_memory_with_format(bytes, image::ImageFormat::WebP)
            .unwrap()
            .into_rgba8()
    }

    #[test]
    fn test_quality_from_unit() {
        assert_eq!(WebpQuality::from_unit(0.82).percent(), 82);
        assert_eq!(WebpQuality::from_unit(1.0).percent(), 100);
        assert_eq!(WebpQuality::from_unit(0.0).percent(), 1);
        assert_eq!(WebpQuality::from_unit(7.5).percent(), 100);
        assert_eq!(WebpQuality::from_unit(f32::NAN).percent(), 82);
        assert_eq!(WebpQuality::default().percent(), 82);
    }

    #[test]
    fn test_channel_levels() {
        assert_eq!(WebpQuality::LOSSLESS.channel_levels(), 256);
        assert_eq!(WebpQuality::from_unit(0.01).channel_levels(), 2);
        assert!(WebpQuality::from_unit(0.95).channel_levels() > 200);
    }

    #[test]
    fn test_encode_same_size() {
        let bmp = gradient_bitmap(32, 24);
        let webp = encode_lanczos(&bmp, 32, 24, WebpQuality::default());

        assert!(is_webp(&webp));
        assert_eq!(decode_webp(&webp).dimensions(), (32, 24));
    }

    #[test]
    fn test_encode_scales_to_target() {
        let bmp = gradient_bitmap(120, 80);
        let quality = WebpQuality::default();
        let webp = encode_webp(&bmp, 60, 40, quality, FilterType::Bilinear).unwrap();

        assert_eq!(decode_webp(&webp).dimensions(), (60, 40));
    }

    #[test]
    fn test_lossless_round_trip_preserves_pixels() {
        let bmp = gradient_bitmap(16, 16);
        let webp = encode_lanczos(&bmp, 16, 16, WebpQuality::LOSSLESS);

        assert_eq!(decode_webp(&webp).into_raw(), bmp.pixels);
    }

    #[test]
    fn test_alpha_survives_quantization() {
        let mut bmp = gradient_bitmap(4, 4);
        bmp.pixels[3] = 17;
        let webp = encode_lanczos(&bmp, 4, 4, WebpQuality::from_unit(0.2));

        assert_eq!(decode_webp(&webp).get_pixel(0, 0).0[3], 17);
    }

    #[test]
    fn test_lower_quality_shrinks_output() {
        let bmp = gradient_bitmap(96, 96);
        let high = encode_lanczos(&bmp, 96, 96, WebpQuality::LOSSLESS);
        let low = encode_lanczos(&bmp, 96, 96, WebpQuality::from_unit(0.1));

        assert!(
            low.len() < high.len(),
            "reduced quality should shrink WebP payload ({} -> {})",
            high.len(),
            low.len()
        );
    }

    #[test]
    fn test_zero_target_rejected() {
        let bmp = gradient_bitmap(4, 4);
        let result = encode_webp(&bmp, 0, 4, WebpQuality::default(), FilterType::Lanczos3);
        assert!(matches!(result, Err(EncodeError::InvalidDimensions { .. })));
    }

    #[test]
    fn test_mismatched_pixels_rejected() {
        let bmp = Bitmap {
            width: 10,
            height: 10,
            pixels: vec![0u8; 10 * 9 * 4],
        };
        let result = encode_webp(&bmp, 5, 5, WebpQuality::default(), FilterType::Lanczos3);
        assert_eq!(
            result,
            Err(EncodeError::InvalidPixelData {
                expected: 400,
                actual: 360
            })
        );
    }

    #[test]
    fn test_empty_output_is_an_error() {
        assert_eq!(non_empty(Vec::new()), Err(EncodeError::EmptyOutput));
        assert_eq!(non_empty(vec![1]), Ok(vec![1]));
    }

    #[test]
    fn test_quantize_snaps_to_levels() {
        let mut data = vec![10, 128, 250, 200];
        quantize_rgb(&mut data, WebpQuality::from_unit(0.01));

        // Two levels: everything lands on 0 or 255, alpha untouched.
        assert_eq!(data, vec![0, 255, 255, 200]);
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod proptests {
    use super::*;
    use crate::test_fixtures::gradient_bitmap;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        /// Property: Same bitmap, size and quality always give identical bytes.
        #[test]
        fn prop_deterministic_output(
            (width, height) in (1u32..=24, 1u32..=24),
            (target_w, target_h) in (1u32..=24, 1u32..=24),
            quality in 0.0f32..=1.0,
        ) {
            let bmp = gradient_bitmap(width, height);
            let q = WebpQuality::from_unit(quality);

            let first = encode_webp(&bmp, target_w, target_h, q, FilterType::Lanczos3);
            let second = encode_webp(&bmp, target_w, target_h, q, FilterType::Lanczos3);

            prop_assert!(first.is_ok() && second.is_ok());
            let (first, second) = (first.unwrap(), second.unwrap());
            prop_assert_eq!(first.len(), second.len());
            prop_assert_eq!(first, second, "encoder output is not deterministic");
        }

        /// Property: Output always decodes back at the requested size.
        #[test]
        fn prop_output_matches_target(
            (width, height) in (1u32..=32, 1u32..=32),
            (target_w, target_h) in (1u32..=32, 1u32..=32),
        ) {
            let bmp = gradient_bitmap(width, height);
            let webp = encode_webp(
                &bmp,
                target_w,
                target_h,
                WebpQuality::default(),
                FilterType::Bilinear,
            );

            prop_assert!(webp.is_ok());
            let decoded = image::load_from_memory(&webp.unwrap()).unwrap();
            prop_assert_eq!((decoded.width(), decoded.height()), (target_w, target_h));
        }

        /// Property: Quantization never moves a channel by more than half a step.
        #[test]
        fn prop_quantization_error_bounded(
            value in any::<u8>(),
            percent in 1u8..=99,
        ) {
            let quality = WebpQuality(percent);
            let step = 255.0 / (f32::from(quality.channel_levels()) - 1.0);
            let mut data = vec![value, value, value, 255];
            quantize_rgb(&mut data, quality);

            prop_assert!((f32::from(data[0]) - f32::from(value)).abs() <= step / 2.0 + 1.0);
            prop_assert_eq!(data[3], 255);
        }
    }
}
