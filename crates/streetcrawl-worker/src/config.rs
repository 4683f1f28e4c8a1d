//! Crawl configuration.

use std::path::PathBuf;

use streetcrawl_itinerary::{GridLayout, PathPolicy, PathProcessor};
use streetcrawl_models::{CameraSettings, VideoEncodingConfig};

use crate::error::{CrawlError, CrawlResult};

pub const DEFAULT_PHOTO_DIR: &str = "./photos/";
pub const DEFAULT_VIDEO_DIR: &str = "./videos/";
pub const DEFAULT_LINEUP_DIR: &str = "./movie_lineup/";
pub const DEFAULT_PHOTO_EXT: &str = "jpg";

/// Crawl configuration.
#[derive(Debug, Clone)]
pub struct CrawlConfig {
    /// Where captured images and composites are written
    pub photo_dir: PathBuf,
    /// Where encoded videos are written
    pub video_dir: PathBuf,
    /// Where lined-up frame sequences are written
    pub lineup_dir: PathBuf,
    /// Image file extension, without the dot
    pub photo_ext: String,
    /// Acceptance and turn-expansion policy for path processing
    pub path_policy: PathPolicy,
    /// Camera used for metadata probes and single captures
    pub camera: CameraSettings,
    /// Panel layout for grid captures
    pub grid: GridLayout,
    pub encoding: VideoEncodingConfig,
    /// FFmpeg timeout in seconds
    pub ffmpeg_timeout_secs: Option<u64>,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            photo_dir: PathBuf::from(DEFAULT_PHOTO_DIR),
            video_dir: PathBuf::from(DEFAULT_VIDEO_DIR),
            lineup_dir: PathBuf::from(DEFAULT_LINEUP_DIR),
            photo_ext: DEFAULT_PHOTO_EXT.to_string(),
            path_policy: PathPolicy::default(),
            camera: CameraSettings::default(),
            grid: GridLayout::default(),
            encoding: VideoEncodingConfig::default(),
            ffmpeg_timeout_secs: None,
        }
    }
}

impl CrawlConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create config from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let parse_f64 = |key: &str, default: f64| {
            lookup(key)
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(default)
        };

        let path_policy = PathPolicy::default()
            .with_provider_copyright(
                lookup("STREETCRAWL_PROVIDER_COPYRIGHT")
                    .unwrap_or(defaults.path_policy.provider_copyright.clone()),
            )
            .with_turn_threshold(parse_f64(
                "STREETCRAWL_TURN_THRESHOLD",
                defaults.path_policy.turn_threshold_deg,
            ))
            .with_turn_step(parse_f64(
                "STREETCRAWL_TURN_STEP",
                defaults.path_policy.turn_step_deg,
            ));

        Self {
            photo_dir: lookup("STREETCRAWL_PHOTO_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.photo_dir),
            video_dir: lookup("STREETCRAWL_VIDEO_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.video_dir),
            lineup_dir: lookup("STREETCRAWL_LINEUP_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.lineup_dir),
            photo_ext: lookup("STREETCRAWL_PHOTO_EXT")
                .map(|ext| ext.trim_start_matches('.').to_string())
                .unwrap_or(defaults.photo_ext),
            path_policy,
            ffmpeg_timeout_secs: lookup("STREETCRAWL_FFMPEG_TIMEOUT")
                .and_then(|s| s.parse().ok()),
            ..defaults
        }
    }

    /// Check settings that would otherwise fail halfway through a run.
    pub fn validate(&self) -> CrawlResult<()> {
        if self.photo_ext.is_empty() {
            return Err(CrawlError::config_error("photo extension cannot be empty"));
        }
        self.grid.validate()?;
        PathProcessor::new(self.path_policy.clone())?;
        Ok(())
    }
}
