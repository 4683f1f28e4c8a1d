//! Shared data models for streetcrawl.
//!
//! This crate provides Serde-serializable types for:
//! - Routes and geographic points
//! - Itinerary waypoints and their imagery status
//! - Provider metadata and per-row failures
//! - Camera and video encoding settings
//! - Captured frames and gapless frame sequences

pub mod camera;
pub mod encoding;
pub mod frame;
pub mod itinerary;
pub mod metadata;
pub mod route;
pub mod waypoint;

// Re-export common types
pub use camera::CameraSettings;
pub use encoding::VideoEncodingConfig;
pub use frame::{CapturedFrame, FrameSequence, SequencedFrame};
pub use itinerary::Itinerary;
pub use metadata::{PanoMetadata, ProviderFailure};
pub use route::Route;
pub use waypoint::{PanoStatus, Waypoint};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Valid latitude range in degrees.
pub const MIN_LAT: f64 = -90.0;
pub const MAX_LAT: f64 = 90.0;
/// Valid longitude range in degrees.
pub const MIN_LON: f64 = -180.0;
pub const MAX_LON: f64 = 180.0;

/// A geographic point in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct LatLon {
    /// Latitude (-90.0 to 90.0)
    pub lat: f64,
    /// Longitude (-180.0 to 180.0)
    pub lon: f64,
}

impl LatLon {
    /// Create a new point.
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Check if the point is finite and within the valid coordinate ranges.
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && (MIN_LAT..=MAX_LAT).contains(&self.lat)
            && (MIN_LON..=MAX_LON).contains(&self.lon)
    }
}

impl From<(f64, f64)> for LatLon {
    fn from((lat, lon): (f64, f64)) -> Self {
        Self { lat, lon }
    }
}

impl fmt::Display for LatLon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.lat, self.lon)
    }
}
