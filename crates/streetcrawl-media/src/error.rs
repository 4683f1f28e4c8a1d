//! Error types for media operations.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur while assembling, composing or encoding frames.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("FFmpeg not found in PATH")]
    FfmpegNotFound,

    #[error("ImageMagick convert not found in PATH")]
    ConvertNotFound,

    #[error("Encoding failed: {message}")]
    EncodingFailed {
        message: String,
        stderr: Option<String>,
        exit_code: Option<i32>,
    },

    #[error("Composition failed: {message}")]
    CompositionFailed {
        message: String,
        stderr: Option<String>,
    },

    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Frame sequence is empty")]
    EmptySequence,

    #[error("Invalid frame sequence: {0}")]
    InvalidSequence(String),

    #[error("Operation timed out after {0} seconds")]
    Timeout(u64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl MediaError {
    /// Create an encoding failure error.
    pub fn encoding_failed(
        message: impl Into<String>,
        stderr: Option<String>,
        exit_code: Option<i32>,
    ) -> Self {
        Self::EncodingFailed {
            message: message.into(),
            stderr,
            exit_code,
        }
    }

    /// Create a composition failure error.
    pub fn composition_failed(message: impl Into<String>, stderr: Option<String>) -> Self {
        Self::CompositionFailed {
            message: message.into(),
            stderr,
        }
    }

    pub fn invalid_sequence(message: impl Into<String>) -> Self {
        Self::InvalidSequence(message.into())
    }
}
