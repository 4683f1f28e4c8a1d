//! Itinerary waypoint models.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::metadata::{PanoMetadata, ProviderFailure};
use crate::LatLon;

/// Imagery status of a waypoint, as reported by the provider.
///
/// Wire names follow the Street View metadata API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
pub enum PanoStatus {
    /// Not probed yet
    #[default]
    #[serde(rename = "UNKNOWN")]
    Unknown,
    /// Imagery is available
    #[serde(rename = "OK")]
    Ok,
    /// Request was denied (bad or restricted key)
    #[serde(rename = "REQUEST_DENIED")]
    Denied,
    /// Location could not be resolved
    #[serde(rename = "NOT_FOUND")]
    NotFound,
    /// No imagery near the location
    #[serde(rename = "ZERO_RESULTS")]
    ZeroResults,
    /// Quota exhausted while probing
    #[serde(rename = "OVER_QUERY_LIMIT")]
    RateLimited,
    /// Malformed request parameters
    #[serde(rename = "INVALID_REQUEST")]
    InvalidRequest,
    /// Provider or network failure
    #[serde(rename = "UNKNOWN_ERROR")]
    Error,
}

impl PanoStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PanoStatus::Unknown => "UNKNOWN",
            PanoStatus::Ok => "OK",
            PanoStatus::Denied => "REQUEST_DENIED",
            PanoStatus::NotFound => "NOT_FOUND",
            PanoStatus::ZeroResults => "ZERO_RESULTS",
            PanoStatus::RateLimited => "OVER_QUERY_LIMIT",
            PanoStatus::InvalidRequest => "INVALID_REQUEST",
            PanoStatus::Error => "UNKNOWN_ERROR",
        }
    }

    /// Parse a provider status string. Unrecognized values map to `Error`.
    pub fn from_provider(status: &str) -> Self {
        match status {
            "OK" => PanoStatus::Ok,
            "REQUEST_DENIED" => PanoStatus::Denied,
            "NOT_FOUND" => PanoStatus::NotFound,
            "ZERO_RESULTS" => PanoStatus::ZeroResults,
            "OVER_QUERY_LIMIT" => PanoStatus::RateLimited,
            "INVALID_REQUEST" => PanoStatus::InvalidRequest,
            _ => PanoStatus::Error,
        }
    }

    /// Check if the row has been resolved by a probe.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, PanoStatus::Unknown)
    }
}

impl fmt::Display for PanoStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<&ProviderFailure> for PanoStatus {
    fn from(failure: &ProviderFailure) -> Self {
        match failure {
            ProviderFailure::Network(_) => PanoStatus::Error,
            ProviderFailure::RateLimited => PanoStatus::RateLimited,
            ProviderFailure::InvalidKey(_) => PanoStatus::Denied,
        }
    }
}

/// One row of an itinerary: a camera vantage point and its imagery status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Waypoint {
    /// Position in the itinerary (dense, 0-based once finalized)
    pub index: usize,

    /// Latitude in degrees
    pub lat: f64,

    /// Longitude in degrees
    pub lon: f64,

    /// Camera heading in degrees from true north, [0, 360)
    pub heading: f64,

    /// Provider status
    #[serde(default)]
    pub status: PanoStatus,

    /// Imagery copyright line
    #[serde(default)]
    pub copyright: String,

    /// Capture date as reported by the provider (e.g. "2019-05")
    #[serde(default)]
    pub date: String,

    /// Provider panorama identity (empty when unknown)
    #[serde(default)]
    pub pano_id: String,

    /// Single image downloaded
    #[serde(default)]
    pub downloaded_single: bool,

    /// Grid composite downloaded
    #[serde(default)]
    pub downloaded_grid: bool,
}

impl Waypoint {
    /// Create an unprobed waypoint.
    pub fn new(index: usize, point: LatLon, heading: f64) -> Self {
        Self {
            index,
            lat: point.lat,
            lon: point.lon,
            heading,
            status: PanoStatus::Unknown,
            copyright: String::new(),
            date: String::new(),
            pano_id: String::new(),
            downloaded_single: false,
            downloaded_grid: false,
        }
    }

    /// Location of this waypoint.
    pub fn location(&self) -> LatLon {
        LatLon::new(self.lat, self.lon)
    }

    /// Overwrite the provider fields from a successful probe.
    pub fn apply_metadata(&mut self, metadata: PanoMetadata) {
        self.status = metadata.status;
        self.copyright = metadata.copyright;
        self.date = metadata.date;
        self.pano_id = metadata.pano_id;
    }

    /// Record a failed probe. Identity fields are cleared so a stale
    /// pano id cannot survive the failure.
    pub fn apply_failure(&mut self, failure: &ProviderFailure) {
        self.status = PanoStatus::from(failure);
        self.copyright.clear();
        self.date.clear();
        self.pano_id.clear();
    }
}
