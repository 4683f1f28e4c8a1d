//! Provider metadata and failure types.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::waypoint::PanoStatus;

/// Metadata returned by the imagery provider for one location query.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub struct PanoMetadata {
    /// Provider status for the query
    pub status: PanoStatus,
    /// Copyright line of the resolved imagery
    #[serde(default)]
    pub copyright: String,
    /// Capture date (e.g. "2019-05")
    #[serde(default)]
    pub date: String,
    /// Panorama identity
    #[serde(default)]
    pub pano_id: String,
}

impl PanoMetadata {
    /// Metadata for a query that resolved to nothing.
    pub fn unresolved(status: PanoStatus) -> Self {
        Self {
            status,
            ..Default::default()
        }
    }
}

/// Failure of a provider call, recorded per row rather than raised.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderFailure {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Rate limited by provider")]
    RateLimited,

    #[error("Invalid API key: {0}")]
    InvalidKey(String),
}

impl ProviderFailure {
    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }

    pub fn invalid_key(msg: impl Into<String>) -> Self {
        Self::InvalidKey(msg.into())
    }
}
