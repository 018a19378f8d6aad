//! Transcoder configuration and per-call options.
//!
//! [`TranscoderConfig`] is fixed for the lifetime of a [`Transcoder`]; it
//! holds the size ceiling, the default output bounds and the resampling
//! choices. [`TranscodeOptions`] overrides the output bounds per call.
//!
//! Both deserialize from camelCase so the same shapes can come from a JS
//! object or a JSON/TOML settings file.
//!
//! [`Transcoder`]: crate::Transcoder

use serde::{Deserialize, Serialize};

use crate::decode::{FilterType, Rounding};
use crate::dispatch::ExecutionMode;
use crate::encode::{WebpQuality, DEFAULT_QUALITY};
use crate::error::TranscodeError;
use crate::guard::DEFAULT_MAX_INPUT_BYTES;
use crate::transform::CropRegion;

/// Default longest output edge in pixels.
pub const DEFAULT_MAX_DIMENSION: u32 = 2048;

/// Longest edge for commission tier artwork.
pub const COMMISSION_MAX_DIMENSION: u32 = 1000;

/// Edge length of profile avatars.
pub const AVATAR_DIMENSION: u32 = 500;

/// Quality used for avatars.
pub const AVATAR_QUALITY: f32 = 0.95;

/// Share of the image width the default avatar crop covers.
pub const AVATAR_CROP_FRACTION: f64 = 0.8;

/// Settings shared by every transcode a [`Transcoder`](crate::Transcoder) runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TranscoderConfig {
    /// Inputs longer than this are rejected before decoding.
    pub max_input_bytes: u64,
    /// Longest output edge when the call does not specify one.
    pub max_dimension: u32,
    /// Output quality in `[0, 1]` when the call does not specify one.
    pub quality: f32,
    /// Smoothing filter used when scaling down.
    pub filter: FilterType,
    /// Rounding rule for the scaled side.
    pub rounding: Rounding,
    /// Force an execution mode instead of detecting one.
    pub execution: Option<ExecutionMode>,
}

impl Default for TranscoderConfig {
    fn default() -> Self {
        Self {
            max_input_bytes: DEFAULT_MAX_INPUT_BYTES,
            max_dimension: DEFAULT_MAX_DIMENSION,
            quality: DEFAULT_QUALITY,
            filter: FilterType::default(),
            rounding: Rounding::default(),
            execution: None,
        }
    }
}

impl TranscoderConfig {
    /// Check the defaults are usable.
    pub fn validate(&self) -> Result<(), TranscodeError> {
        check_max_dimension(self.max_dimension)?;
        check_quality(self.quality)?;
        Ok(())
    }

    /// The execution mode this config resolves to on this platform.
    pub fn execution_mode(&self) -> ExecutionMode {
        self.execution.unwrap_or_else(ExecutionMode::detect)
    }
}

/// How to crop the decoded image before resizing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Crop {
    /// An explicit normalized region.
    Region(CropRegion),
    /// A centered square sized from the decoded dimensions.
    CenteredSquare {
        /// Share of the image width the square covers.
        fraction: f64,
    },
}

impl Crop {
    /// Resolve against decoded dimensions.
    pub fn region_for(&self, width: u32, height: u32) -> CropRegion {
        match *self {
            Crop::Region(region) => region,
            Crop::CenteredSquare { fraction } => {
                CropRegion::centered_square(width, height, fraction)
            }
        }
    }

    fn validate(&self) -> Result<(), TranscodeError> {
        match self {
            Crop::Region(region) => region.validate().map_err(TranscodeError::InvalidOptions),
            Crop::CenteredSquare { fraction } => {
                if fraction.is_finite() && *fraction > 0.0 && *fraction <= 1.0 {
                    Ok(())
                } else {
                    Err(TranscodeError::InvalidOptions(format!(
                        "crop fraction must be in (0, 1], got {fraction}"
                    )))
                }
            }
        }
    }
}

/// Per-call overrides. Unset fields fall back to the [`TranscoderConfig`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TranscodeOptions {
    /// Longest output edge in pixels.
    pub max_dimension: Option<u32>,
    /// Output quality in `[0, 1]`.
    pub quality: Option<f32>,
    /// Crop applied after decode, before resizing.
    pub crop: Option<Crop>,
}

impl TranscodeOptions {
    /// Gallery artwork: 2048 px, quality 0.82.
    pub fn gallery() -> Self {
        Self {
            max_dimension: Some(DEFAULT_MAX_DIMENSION),
            quality: Some(DEFAULT_QUALITY),
            crop: None,
        }
    }

    /// Commission tier artwork: 1000 px, quality 0.82.
    pub fn commission() -> Self {
        Self {
            max_dimension: Some(COMMISSION_MAX_DIMENSION),
            quality: Some(DEFAULT_QUALITY),
            crop: None,
        }
    }

    /// Profile avatar: centered square crop, 500 px, quality 0.95.
    pub fn avatar() -> Self {
        Self {
            max_dimension: Some(AVATAR_DIMENSION),
            quality: Some(AVATAR_QUALITY),
            crop: Some(Crop::CenteredSquare {
                fraction: AVATAR_CROP_FRACTION,
            }),
        }
    }

    /// Set the longest output edge.
    pub fn with_max_dimension(mut self, max_dimension: u32) -> Self {
        self.max_dimension = Some(max_dimension);
        self
    }

    /// Set the output quality.
    pub fn with_quality(mut self, quality: f32) -> Self {
        self.quality = Some(quality);
        self
    }

    /// Set the crop.
    pub fn with_crop(mut self, crop: Crop) -> Self {
        self.crop = Some(crop);
        self
    }

    /// Merge with `config` defaults and validate.
    pub fn resolve(&self, config: &TranscoderConfig) -> Result<ResolvedOptions, TranscodeError> {
        let max_dimension = self.max_dimension.unwrap_or(config.max_dimension);
        let quality = self.quality.unwrap_or(config.quality);

        check_max_dimension(max_dimension)?;
        check_quality(quality)?;
        if let Some(crop) = &self.crop {
            crop.validate()?;
        }

        Ok(ResolvedOptions {
            max_dimension,
            quality: WebpQuality::from_unit(quality),
            crop: self.crop,
        })
    }
}

/// Options after defaults are applied and values checked.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedOptions {
    /// Longest output edge in pixels, at least 1.
    pub max_dimension: u32,
    /// Output quality.
    pub quality: WebpQuality,
    /// Crop applied after decode.
    pub crop: Option<Crop>,
}

fn check_max_dimension(max_dimension: u32) -> Result<(), TranscodeError> {
    if max_dimension == 0 {
        return Err(TranscodeError::InvalidOptions(
            "max dimension must be positive".to_string(),
        ));
    }
    Ok(())
}

fn check_quality(quality: f32) -> Result<(), TranscodeError> {
    if !(0.0..=1.0).contains(&quality) {
        return Err(TranscodeError::InvalidOptions(format!(
            "quality must be in [0, 1], got {quality}"
        )));
    }
    Ok(())
}
