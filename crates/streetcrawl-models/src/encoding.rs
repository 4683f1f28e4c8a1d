//! Video encoding configuration for frame sequences.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Default video codec (H.264)
pub const DEFAULT_VIDEO_CODEC: &str = "libx264";
/// Default CRF (Constant Rate Factor)
pub const DEFAULT_CRF: u8 = 23;
/// Default pixel format, widely playable
pub const DEFAULT_PIXEL_FORMAT: &str = "yuv420p";
/// Frames per second read from the image sequence
pub const DEFAULT_INPUT_FRAME_RATE: u32 = 1;
/// Frame size passed to the image2 demuxer
pub const DEFAULT_FRAME_SIZE: &str = "640x640";
/// Output frame rate when interpolating between frames
pub const DEFAULT_OUTPUT_FPS: u32 = 30;
/// Scene-change score above which frames are not blended
pub const DEFAULT_SCENE_THRESHOLD: u8 = 5;

/// Encoding configuration for turning a frame sequence into a video.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct VideoEncodingConfig {
    /// Video codec (e.g., "libx264")
    #[serde(default = "default_video_codec")]
    pub codec: String,

    /// Constant Rate Factor (quality, 0-51, lower is better)
    #[serde(default = "default_crf")]
    pub crf: u8,

    /// Output pixel format
    #[serde(default = "default_pixel_format")]
    pub pixel_format: String,

    /// Frame size of the input images
    #[serde(default = "default_frame_size")]
    pub frame_size: String,

    /// Blend frames up to this output rate; `None` keeps the input rate
    #[serde(default = "default_interpolate_fps")]
    pub interpolate_fps: Option<u32>,

    /// Scene-change threshold for the interpolation filter
    #[serde(default = "default_scene_threshold")]
    pub scene_threshold: u8,

    /// Additional FFmpeg output arguments
    #[serde(default)]
    pub extra_args: Vec<String>,
}

fn default_video_codec() -> String {
    DEFAULT_VIDEO_CODEC.to_string()
}
fn default_crf() -> u8 {
    DEFAULT_CRF
}
fn default_pixel_format() -> String {
    DEFAULT_PIXEL_FORMAT.to_string()
}
fn default_frame_size() -> String {
    DEFAULT_FRAME_SIZE.to_string()
}
fn default_interpolate_fps() -> Option<u32> {
    Some(DEFAULT_OUTPUT_FPS)
}
fn default_scene_threshold() -> u8 {
    DEFAULT_SCENE_THRESHOLD
}

impl Default for VideoEncodingConfig {
    fn default() -> Self {
        Self {
            codec: DEFAULT_VIDEO_CODEC.to_string(),
            crf: DEFAULT_CRF,
            pixel_format: DEFAULT_PIXEL_FORMAT.to_string(),
            frame_size: DEFAULT_FRAME_SIZE.to_string(),
            interpolate_fps: Some(DEFAULT_OUTPUT_FPS),
            scene_threshold: DEFAULT_SCENE_THRESHOLD,
            extra_args: Vec::new(),
        }
    }
}

impl VideoEncodingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Plain slideshow: frames glued together at the input rate.
    pub fn slideshow() -> Self {
        Self {
            interpolate_fps: None,
            ..Default::default()
        }
    }

    /// Returns a new config with updated CRF.
    pub fn with_crf(mut self, crf: u8) -> Self {
        self.crf = crf;
        self
    }

    /// The `framerate` filter expression, if interpolation is enabled.
    pub fn interpolation_filter(&self) -> Option<String> {
        self.interpolate_fps.map(|fps| {
            format!(
                "framerate=fps={}:interp_start=1:interp_end=254:scene={}",
                fps, self.scene_threshold
            )
        })
    }

    /// Convert to FFmpeg output arguments.
    pub fn to_ffmpeg_args(&self) -> Vec<String> {
        let mut args = vec![
            "-vcodec".to_string(),
            self.codec.clone(),
            "-crf".to_string(),
            self.crf.to_string(),
            "-pix_fmt".to_string(),
            self.pixel_format.clone(),
        ];

        if let Some(filter) = self.interpolation_filter() {
            args.extend_from_slice(&["-vf".to_string(), filter]);
        }

        args.extend(self.extra_args.clone());

        args
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = VideoEncodingConfig::default();
        assert_eq!(config.codec, "libx264");
        assert_eq!(config.crf, 23);
        assert_eq!(config.interpolate_fps, Some(30));
    }

    #[test]
    fn test_ffmpeg_args() {
        let args = VideoEncodingConfig::default().to_ffmpeg_args();
        assert!(args.contains(&"-vcodec".to_string()));
        assert!(args.contains(&"yuv420p".to_string()));
        assert!(args.contains(
            &"framerate=fps=30:interp_start=1:interp_end=254:scene=5".to_string()
        ));
    }

    #[test]
    fn test_slideshow_has_no_filter() {
        let args = VideoEncodingConfig::slideshow().with_crf(18).to_ffmpeg_args();
        assert!(!args.contains(&"-vf".to_string()));
        assert!(args.contains(&"18".to_string()));
    }
}
