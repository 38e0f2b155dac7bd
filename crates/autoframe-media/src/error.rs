//! Error types for media operations.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur during media processing.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("FFmpeg not found in PATH")]
    FfmpegNotFound,

    #[error("FFprobe not found in PATH")]
    FfprobeNotFound,

    #[error("FFmpeg command failed: {message}")]
    FfmpegFailed {
        message: String,
        stderr: Option<String>,
        exit_code: Option<i32>,
    },

    #[error("FFprobe command failed: {message}")]
    FfprobeFailed {
        message: String,
        stderr: Option<String>,
    },

    #[error("Invalid crop geometry: source is {width}x{height}")]
    InvalidGeometry { width: u32, height: u32 },

    #[error("Face detector unavailable: {0}")]
    DetectorUnavailable(String),

    #[error("Could not open source {path}: {reason}")]
    SourceOpen { path: PathBuf, reason: String },

    #[error("Could not open sink {path}: {reason}")]
    SinkOpen { path: PathBuf, reason: String },

    #[error("Audio extraction failed: {0}")]
    AudioExtraction(String),

    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Invalid video file: {0}")]
    InvalidVideo(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl MediaError {
    /// Create an FFmpeg failure error.
    pub fn ffmpeg_failed(
        message: impl Into<String>,
        stderr: Option<String>,
        exit_code: Option<i32>,
    ) -> Self {
        Self::FfmpegFailed {
            message: message.into(),
            stderr,
            exit_code,
        }
    }

    /// Create a source-open error.
    pub fn source_open(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::SourceOpen {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a sink-open error.
    pub fn sink_open(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::SinkOpen {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a detector-unavailable error.
    pub fn detector_unavailable(message: impl Into<String>) -> Self {
        Self::DetectorUnavailable(message.into())
    }

    /// Create an audio extraction error.
    pub fn audio_extraction(message: impl Into<String>) -> Self {
        Self::AudioExtraction(message.into())
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Whether this failure aborts the whole job.
    ///
    /// Audio extraction problems are recoverable: the caller downgrades
    /// speaker mode to face mode and continues.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, MediaError::AudioExtraction(_))
    }
}
