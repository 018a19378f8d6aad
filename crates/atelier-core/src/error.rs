//! Error types for transcoding.

use thiserror::Error;

use crate::decode::DecodeError;
use crate::encode::EncodeError;
use crate::guard::SizeError;

/// Result type alias for transcode operations.
pub type Result<T> = std::result::Result<T, TranscodeError>;

/// Everything a transcode can fail with.
///
/// Inline and background execution report the same variants for the same
/// input. Every variant is `Clone + Send` so it can cross the worker channel.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TranscodeError {
    /// Input exceeded the byte ceiling; nothing was decoded
    #[error(transparent)]
    Size(#[from] SizeError),

    /// Options were out of range
    #[error("Invalid transcode options: {0}")]
    InvalidOptions(String),

    /// Input is not a decodable raster image
    #[error("Failed to load image for conversion: {0}")]
    Decode(#[from] DecodeError),

    /// Serialization failed or produced nothing
    #[error(transparent)]
    Encode(#[from] EncodeError),

    /// The background context died or could not be started
    #[error("Background transcoder failed: {0}")]
    ContextFailure(String),
}

impl TranscodeError {
    /// Whether the caller can reasonably try again with the same input.
    ///
    /// Only a context failure is transient; every other variant is a
    /// property of the input or options.
    pub fn is_retryable(&self) -> bool {
        matches!(self, TranscodeError::ContextFailure(_))
    }
}
