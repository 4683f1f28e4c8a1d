//! Provider error types.

use thiserror::Error;

use streetcrawl_models::ProviderFailure;

/// Result type for provider operations.
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Errors that can occur while talking to the imagery provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid API key: {0}")]
    InvalidKey(String),

    #[error("Rate limited by provider")]
    RateLimited { retry_after_ms: Option<u64> },

    #[error("Server error {0}: {1}")]
    ServerError(u16, String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ProviderError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn request_failed(msg: impl Into<String>) -> Self {
        Self::RequestFailed(msg.into())
    }

    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }

    /// Map an unsuccessful HTTP status to an error.
    pub fn from_http_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            401 | 403 => Self::InvalidKey(message),
            429 => Self::RateLimited {
                retry_after_ms: None,
            },
            500..=599 => Self::ServerError(status, message),
            _ => Self::RequestFailed(format!("HTTP {}: {}", status, message)),
        }
    }

    /// HTTP status this error corresponds to, for metrics.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            Self::InvalidKey(_) => Some(403),
            Self::RateLimited { .. } => Some(429),
            Self::ServerError(status, _) => Some(*status),
            Self::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Check if error is retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Network(_) | Self::RateLimited { .. } | Self::ServerError(..)
        )
    }

    pub fn retry_after_ms(&self) -> Option<u64> {
        match self {
            Self::RateLimited { retry_after_ms } => *retry_after_ms,
            _ => None,
        }
    }

    /// Collapse into the per-row failure recorded on an itinerary.
    pub fn to_failure(&self) -> ProviderFailure {
        match self {
            Self::RateLimited { .. } => ProviderFailure::RateLimited,
            Self::InvalidKey(msg) => ProviderFailure::invalid_key(msg.clone()),
            other => ProviderFailure::network(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_http_status() {
        assert!(matches!(
            ProviderError::from_http_status(429, "slow down"),
            ProviderError::RateLimited { .. }
        ));
        assert!(matches!(
            ProviderError::from_http_status(403, "denied"),
            ProviderError::InvalidKey(_)
        ));
        assert!(matches!(
            ProviderError::from_http_status(503, "unavailable"),
            ProviderError::ServerError(503, _)
        ));
        assert!(matches!(
            ProviderError::from_http_status(400, "bad"),
            ProviderError::RequestFailed(_)
        ));
    }

    #[test]
    fn test_retryable() {
        assert!(ProviderError::from_http_status(500, "x").is_retryable());
        assert!(ProviderError::from_http_status(429, "x").is_retryable());
        assert!(!ProviderError::from_http_status(401, "x").is_retryable());
        assert!(!ProviderError::invalid_response("x").is_retryable());
    }

    #[test]
    fn test_to_failure() {
        assert_eq!(
            ProviderError::from_http_status(429, "x").to_failure(),
            ProviderFailure::RateLimited
        );
        assert_eq!(
            ProviderError::from_http_status(401, "bad key").to_failure(),
            ProviderFailure::InvalidKey("bad key".to_string())
        );
        assert!(matches!(
            ProviderError::from_http_status(502, "gateway").to_failure(),
            ProviderFailure::Network(_)
        ));
    }
}
