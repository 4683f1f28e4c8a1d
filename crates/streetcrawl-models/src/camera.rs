//! Camera request settings for the imagery provider.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Default image size for single captures (provider maximum is 640x640)
pub const DEFAULT_PICSIZE: &str = "640x320";
/// Image size for grid panels
pub const GRID_PICSIZE: &str = "640x640";
/// Default horizontal field of view in degrees
pub const DEFAULT_FOV: f64 = 90.0;
/// Default camera pitch in degrees
pub const DEFAULT_PITCH: f64 = 0.0;
/// Default search radius in meters
pub const DEFAULT_RADIUS: u32 = 5;

/// Camera parameters sent with every metadata and image request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CameraSettings {
    /// Image size as "WIDTHxHEIGHT"
    #[serde(default = "default_picsize")]
    pub size: String,

    /// Field of view (zoom), 0-120 degrees
    #[serde(default = "default_fov")]
    pub fov: f64,

    /// Up/down angle relative to the vehicle, -90 to 90 degrees
    #[serde(default = "default_pitch")]
    pub pitch: f64,

    /// Search radius for the nearest panorama, in meters
    #[serde(default = "default_radius")]
    pub radius: u32,

    /// Restrict results to outdoor imagery
    #[serde(default = "default_outdoor_only")]
    pub outdoor_only: bool,
}

fn default_picsize() -> String {
    DEFAULT_PICSIZE.to_string()
}
fn default_fov() -> f64 {
    DEFAULT_FOV
}
fn default_pitch() -> f64 {
    DEFAULT_PITCH
}
fn default_radius() -> u32 {
    DEFAULT_RADIUS
}
fn default_outdoor_only() -> bool {
    true
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            size: DEFAULT_PICSIZE.to_string(),
            fov: DEFAULT_FOV,
            pitch: DEFAULT_PITCH,
            radius: DEFAULT_RADIUS,
            outdoor_only: true,
        }
    }
}

impl CameraSettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Settings for one zoomed-in panel of a grid capture.
    pub fn for_grid_panel(fov: f64, pitch: f64) -> Self {
        Self {
            size: GRID_PICSIZE.to_string(),
            fov,
            pitch,
            ..Default::default()
        }
    }

    /// Returns new settings with a different image size.
    pub fn with_size(mut self, size: impl Into<String>) -> Self {
        self.size = size.into();
        self
    }

    /// Returns new settings with a different pitch.
    pub fn with_pitch(mut self, pitch: f64) -> Self {
        self.pitch = pitch;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let camera = CameraSettings::default();
        assert_eq!(camera.size, "640x320");
        assert_eq!(camera.radius, 5);
        assert!(camera.outdoor_only);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let camera: CameraSettings = serde_json::from_str(r#"{"fov": 30}"#).unwrap();
        assert_eq!(camera.fov, 30.0);
        assert_eq!(camera.size, DEFAULT_PICSIZE);
        assert!(camera.outdoor_only);
    }

    #[test]
    fn test_grid_panel_settings() {
        let camera = CameraSettings::for_grid_panel(30.0, 15.0);
        assert_eq!(camera.size, GRID_PICSIZE);
        assert_eq!(camera.pitch, 15.0);
    }
}
