//! Crawl error types.

use thiserror::Error;

pub type CrawlResult<T> = Result<T, CrawlError>;

#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Capture failed: {0}")]
    CaptureFailed(String),

    #[error("Itinerary error: {0}")]
    Itinerary(#[from] streetcrawl_itinerary::ItineraryError),

    #[error("Media error: {0}")]
    Media(#[from] streetcrawl_media::MediaError),

    #[error("Provider error: {0}")]
    Provider(#[from] streetcrawl_provider::ProviderError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CrawlError {
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn capture_failed(msg: impl Into<String>) -> Self {
        Self::CaptureFailed(msg.into())
    }
}
