//! Error taxonomy for the processing pipeline

use std::fmt;
use thiserror::Error;

/// Result type alias using `AudioError`
pub type Result<T> = std::result::Result<T, AudioError>;

/// Errors raised by pipeline stages and their collaborators
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AudioError {
    /// Input bytes are not a recognized, complete audio container
    #[error("Decode error: {0}")]
    Decode(String),

    /// Invalid parameter or numerically invalid filter/transform design
    #[error("Transform error: {0}")]
    Transform(String),

    /// Output configuration the encoder cannot honor
    #[error("Encode error: {0}")]
    Encode(String),

    /// Network or extraction failure reported by the ingestion collaborator
    #[error("Source unavailable: {0}")]
    SourceUnavailable(String),

    /// Cancellation observed at a stage boundary
    #[error("Processing cancelled")]
    Cancelled,

    /// Configuration could not be loaded or is inconsistent
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Coarse error classification for callers that branch on kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Decode,
    Transform,
    Encode,
    SourceUnavailable,
    Cancelled,
    Config,
}

impl AudioError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AudioError::Decode(_) => ErrorKind::Decode,
            AudioError::Transform(_) => ErrorKind::Transform,
            AudioError::Encode(_) => ErrorKind::Encode,
            AudioError::SourceUnavailable(_) => ErrorKind::SourceUnavailable,
            AudioError::Cancelled => ErrorKind::Cancelled,
            AudioError::Config(_) => ErrorKind::Config,
        }
    }

    /// Only ingestion failures are worth retrying; the core never retries itself.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AudioError::SourceUnavailable(_))
    }
}

impl From<symphonia::core::errors::Error> for AudioError {
    fn from(err: symphonia::core::errors::Error) -> Self {
        AudioError::Decode(err.to_string())
    }
}

impl From<hound::Error> for AudioError {
    fn from(err: hound::Error) -> Self {
        AudioError::Encode(err.to_string())
    }
}

impl From<realfft::FftError> for AudioError {
    fn from(err: realfft::FftError) -> Self {
        AudioError::Transform(format!("FFT failed: {}", err))
    }
}

impl From<serde_json::Error> for AudioError {
    fn from(err: serde_json::Error) -> Self {
        AudioError::Config(err.to_string())
    }
}

impl From<std::io::Error> for AudioError {
    fn from(err: std::io::Error) -> Self {
        AudioError::Config(err.to_string())
    }
}

/// Pipeline stage identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Decode,
    Stretch,
    BassBoost,
    Encode,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Decode => "decode",
            Stage::Stretch => "time-stretch",
            Stage::BassBoost => "bass boost",
            Stage::Encode => "encode",
        };
        f.write_str(name)
    }
}

/// First failure of a pipeline run, tagged with the stage that produced it
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{stage} stage failed: {error}")]
pub struct PipelineError {
    pub stage: Stage,
    #[source]
    pub error: AudioError,
}

impl PipelineError {
    pub fn new(stage: Stage, error: AudioError) -> Self {
        Self { stage, error }
    }

    pub fn kind(&self) -> ErrorKind {
        self.error.kind()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_only_source_errors_are_retryable() {
        assert!(AudioError::SourceUnavailable("timeout".into()).is_retryable());
        assert!(!AudioError::Decode("bad header".into()).is_retryable());
        assert!(!AudioError::Transform("tempo".into()).is_retryable());
        assert!(!AudioError::Encode("channels".into()).is_retryable());
        assert!(!AudioError::Cancelled.is_retryable());
    }

    #[test]
    fn test_pipeline_error_carries_stage_and_source() {
        let err = PipelineError::new(Stage::Stretch, AudioError::Transform("empty buffer".into()));

        assert_eq!(err.kind(), ErrorKind::Transform);
        assert_eq!(err.to_string(), "time-stretch stage failed: Transform error: empty buffer");
        assert!(err.source().is_some());
    }
}
