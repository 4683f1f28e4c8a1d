//! Error types for itinerary operations.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for itinerary operations.
pub type ItineraryResult<T> = Result<T, ItineraryError>;

/// Structural errors. These are fatal and raised to the caller; per-row
/// provider failures are recorded on the rows instead.
#[derive(Debug, Error)]
pub enum ItineraryError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("At least 2 points are needed to compute headings, got {found}")]
    InsufficientPoints { found: usize },

    #[error("Invalid grid: {0}")]
    InvalidGrid(String),

    #[error("Corrupt itinerary file {path}: {reason}")]
    CorruptItinerary { path: PathBuf, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ItineraryError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn invalid_grid(msg: impl Into<String>) -> Self {
        Self::InvalidGrid(msg.into())
    }

    pub fn corrupt(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::CorruptItinerary {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
