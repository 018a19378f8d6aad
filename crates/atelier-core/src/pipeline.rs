//! The decode -> crop -> resize -> encode pipeline.
//!
//! Both execution modes call [`Pipeline::run`]; the only difference between
//! them is which thread it runs on.

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use tracing::debug;

use crate::config::ResolvedOptions;
use crate::decode::{plan_resize_with, Decode, FilterType, ImageDecoder, Rounding};
use crate::encode::encode_webp;
use crate::error::TranscodeError;
use crate::transform::apply_crop;

/// MIME type of every transcode output.
pub const WEBP_CONTENT_TYPE: &str = "image/webp";

/// One unit of transcoding work.
#[derive(Debug, Clone)]
pub struct TranscodeRequest {
    /// Encoded input bytes.
    pub source: Bytes,
    /// Validated output settings.
    pub options: ResolvedOptions,
}

/// The encoded output of one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscodeResult {
    /// WebP bytes.
    pub bytes: Vec<u8>,
    /// Whether the output is smaller than the (cropped) source.
    pub was_resized: bool,
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
}

impl TranscodeResult {
    /// MIME type for uploading the bytes.
    pub fn content_type(&self) -> &'static str {
        WEBP_CONTENT_TYPE
    }
}

/// Stateless transcoding pipeline shared by every execution path.
#[derive(Clone)]
pub struct Pipeline {
    decoder: Arc<dyn Decode>,
    filter: FilterType,
    rounding: Rounding,
}

impl Pipeline {
    /// Create a pipeline around `decoder`.
    pub fn new(decoder: Arc<dyn Decode>, filter: FilterType, rounding: Rounding) -> Self {
        Self {
            decoder,
            filter,
            rounding,
        }
    }

    /// Run one request to completion on the current thread.
    ///
    /// The decoded bitmap, any cropped copy and the encoder surface are all
    /// owned by this call and dropped before it returns.
    pub fn run(&self, request: &TranscodeRequest) -> Result<TranscodeResult, TranscodeError> {
        let options = &request.options;
        let mut bitmap = self.decoder.decode(&request.source)?;

        if let Some(crop) = options.crop {
            let region = crop.region_for(bitmap.width, bitmap.height);
            if !region.is_full() {
                bitmap = apply_crop(&bitmap, &region);
            }
        }

        let plan = plan_resize_with(
            bitmap.width,
            bitmap.height,
            options.max_dimension,
            self.rounding,
        );
        debug!(
            source_pixels = bitmap.pixel_count(),
            width = plan.width,
            height = plan.height,
            was_resized = plan.was_resized,
            "planned output size"
        );
        let bytes = encode_webp(
            &bitmap,
            plan.width,
            plan.height,
            options.quality,
            self.filter,
        )?;

        Ok(TranscodeResult {
            bytes,
            was_resized: plan.was_resized,
            width: plan.width,
            height: plan.height,
        })
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(
            Arc::new(ImageDecoder),
            FilterType::default(),
            Rounding::default(),
        )
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("filter", &self.filter)
            .field("rounding", &self.rounding)
            .finish_non_exhaustive()
    }
}
