//! Atelier Core - Image transcoding library
//!
//! This crate turns user-supplied images into size-bounded, web-optimized
//! WebP for the Atelier portfolio: size guard, decode, optional crop,
//! aspect-preserving downscale and quality-controlled encode.
//!
//! Work runs either inline or on a background context (see [`dispatch`]),
//! with identical results either way.
//!
//! ```ignore
//! use atelier_core::{Transcoder, TranscodeOptions};
//!
//! let transcoder = Transcoder::default();
//! let result = transcoder.transcode(upload, TranscodeOptions::avatar()).await?;
//! storage.put(&object_name("avatar", now_ms), result.bytes, result.content_type());
//! ```

pub mod config;
pub mod decode;
pub mod delivery;
pub mod dispatch;
pub mod encode;
pub mod error;
pub mod guard;
pub mod pipeline;
pub mod transform;

#[cfg(test)]
mod test_fixtures;

use std::io::Read;
use std::sync::{Arc, OnceLock};

use bytes::Bytes;
use tracing::debug;

pub use config::{Crop, TranscodeOptions, TranscoderConfig};
pub use decode::{Decode, DecodeError, FilterType, ImageDecoder, Rounding};
pub use delivery::{object_name, optimized_url, DeliveryParams};
pub use dispatch::{Dispatcher, ExecutionMode};
pub use encode::EncodeError;
pub use error::{Result, TranscodeError};
pub use guard::{SizeError, SizeGuard};
pub use pipeline::{TranscodeResult, WEBP_CONTENT_TYPE};
pub use transform::CropRegion;

use pipeline::{Pipeline, TranscodeRequest};

/// Image transcoder: the entry point of the crate.
#[derive(Debug)]
pub struct Transcoder {
    config: TranscoderConfig,
    guard: SizeGuard,
    dispatcher: Dispatcher,
}

impl Transcoder {
    /// Create a transcoder with the stock decoder.
    pub fn new(config: TranscoderConfig) -> Result<Self> {
        Self::builder().config(config).build()
    }

    /// Start building a transcoder.
    pub fn builder() -> TranscoderBuilder {
        TranscoderBuilder::default()
    }

    /// Transcode `source` to WebP.
    ///
    /// The size check runs before anything else; an oversized input is
    /// rejected without being decoded.
    pub async fn transcode(
        &self,
        source: impl Into<Bytes>,
        options: TranscodeOptions,
    ) -> Result<TranscodeResult> {
        let source = source.into();
        self.guard.validate(&source)?;
        let options = options.resolve(&self.config)?;

        debug!(
            bytes = source.len(),
            max_dimension = options.max_dimension,
            quality = options.quality.percent(),
            "transcoding image"
        );
        self.dispatcher
            .run(TranscodeRequest { source, options })
            .await
    }

    /// Transcode everything `reader` yields.
    ///
    /// Reads at most one byte past the ceiling, so an oversized stream is
    /// rejected without being buffered in full.
    pub async fn transcode_reader<R: Read>(
        &self,
        reader: R,
        options: TranscodeOptions,
    ) -> Result<TranscodeResult> {
        let limit = self.guard.max_bytes().saturating_add(1);
        let mut source = Vec::new();
        reader
            .take(limit)
            .read_to_end(&mut source)
            .map_err(|e| DecodeError::Io(e.to_string()))?;

        self.transcode(source, options).await
    }

    /// Settings this transcoder was built with.
    pub fn config(&self) -> &TranscoderConfig {
        &self.config
    }

    /// Where transcodes run.
    pub fn mode(&self) -> ExecutionMode {
        self.dispatcher.mode()
    }

    /// Background jobs submitted but not yet settled.
    pub fn pending_jobs(&self) -> usize {
        self.dispatcher.pending_jobs()
    }

    /// How many background contexts have been started.
    pub fn contexts_started(&self) -> u64 {
        self.dispatcher.contexts_started()
    }
}

impl Default for Transcoder {
    fn default() -> Self {
        let config = TranscoderConfig::default();
        let guard = SizeGuard::new(config.max_input_bytes);
        let pipeline = Pipeline::default();
        let dispatcher = Dispatcher::new(pipeline, config.execution_mode());
        Self {
            config,
            guard,
            dispatcher,
        }
    }
}

/// Builder for [`Transcoder`].
#[derive(Default)]
pub struct TranscoderBuilder {
    config: TranscoderConfig,
    decoder: Option<Arc<dyn Decode>>,
}

impl TranscoderBuilder {
    /// Use `config` instead of the defaults.
    pub fn config(mut self, config: TranscoderConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the decode adapter.
    pub fn decoder(mut self, decoder: Arc<dyn Decode>) -> Self {
        self.decoder = Some(decoder);
        self
    }

    /// Force an execution mode.
    pub fn execution(mut self, mode: ExecutionMode) -> Self {
        self.config.execution = Some(mode);
        self
    }

    /// Validate the config and build.
    pub fn build(self) -> Result<Transcoder> {
        self.config.validate()?;

        let decoder = self.decoder.unwrap_or_else(|| Arc::new(ImageDecoder));
        let pipeline = Pipeline::new(decoder, self.config.filter, self.config.rounding);
        let dispatcher = Dispatcher::new(pipeline, self.config.execution_mode());

        Ok(Transcoder {
            guard: SizeGuard::new(self.config.max_input_bytes),
            config: self.config,
            dispatcher,
        })
    }
}

/// Process-wide transcoder with default settings.
///
/// Its background context is started on first use and reused afterwards.
pub fn shared() -> &'static Transcoder {
    static SHARED: OnceLock<Transcoder> = OnceLock::new();
    SHARED.get_or_init(Transcoder::default)
}

/// Transcode with the [`shared`] transcoder.
pub async fn transcode(
    source: impl Into<Bytes>,
    options: TranscodeOptions,
) -> Result<TranscodeResult> {
    shared().transcode(source, options).await
}
