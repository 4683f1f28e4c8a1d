//! Video encoding of gapless frame sequences.

use std::path::Path;
use std::time::Instant;

use async_trait::async_trait;
use tokio::fs;
use tracing::{debug, info};

use streetcrawl_models::{FrameSequence, VideoEncodingConfig};

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};

/// Turns a frame sequence into a video file.
#[async_trait]
pub trait FrameEncoder: Send + Sync {
    async fn encode(
        &self,
        sequence: &FrameSequence,
        frame_rate: u32,
        output: &Path,
    ) -> MediaResult<()>;
}

/// Encoder backed by the `ffmpeg` CLI and its `image2` demuxer.
#[derive(Debug, Clone, Default)]
pub struct FfmpegEncoder {
    config: VideoEncodingConfig,
    runner: FfmpegRunner,
}

impl FfmpegEncoder {
    pub fn new(config: VideoEncodingConfig) -> Self {
        Self {
            config,
            runner: FfmpegRunner::new(),
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.runner = self.runner.with_timeout(secs);
        self
    }

    pub fn config(&self) -> &VideoEncodingConfig {
        &self.config
    }

    /// Build the FFmpeg invocation for a sequence.
    pub fn build_command(
        &self,
        sequence: &FrameSequence,
        frame_rate: u32,
        output: &Path,
    ) -> MediaResult<FfmpegCommand> {
        if sequence.is_empty() {
            return Err(MediaError::EmptySequence);
        }
        if !sequence.is_contiguous() {
            return Err(MediaError::invalid_sequence(
                "frame numbers must run 0..n without gaps",
            ));
        }
        if frame_rate == 0 {
            return Err(MediaError::invalid_sequence("frame rate must be positive"));
        }

        Ok(FfmpegCommand::new(sequence.input_pattern(), output)
            .image_sequence(frame_rate, &self.config.frame_size)
            .encode_with(self.config.to_ffmpeg_args()))
    }
}

#[async_trait]
impl FrameEncoder for FfmpegEncoder {
    async fn encode(
        &self,
        sequence: &FrameSequence,
        frame_rate: u32,
        output: &Path,
    ) -> MediaResult<()> {
        let cmd = self.build_command(sequence, frame_rate, output)?;

        for path in sequence.paths() {
            if !fs::try_exists(path).await? {
                return Err(MediaError::FileNotFound(path.to_path_buf()));
            }
        }
        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }

        info!(
            frames = sequence.len(),
            frame_rate,
            output = %output.display(),
            "Encoding frame sequence"
        );
        let start = Instant::now();

        self.runner
            .run_with_progress(&cmd, |progress| {
                debug!(frame = progress.frame, speed = progress.speed, "Encoding progress");
            })
            .await?;

        info!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Encoded {}",
            output.display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use streetcrawl_models::SequencedFrame;

    fn sequence(numbers: &[usize]) -> FrameSequence {
        let mut seq = FrameSequence::new("lineup", "route", "jpg");
        for &n in numbers {
            let path = seq.frame_path(n);
            seq.frames.push(SequencedFrame {
                number: n,
                original_number: n * 2,
                source: PathBuf::from(format!("photos/route_{}.jpg", n * 2)),
                path,
            });
        }
        seq
    }

    #[test]
    fn test_command_matches_interpolated_slideshow() {
        let encoder = FfmpegEncoder::default();
        let cmd = encoder
            .build_command(&sequence(&[0, 1, 2]), 1, Path::new("videos/route.mp4"))
            .unwrap();
        let args = cmd.to_args().join(" ");

        let pattern = Path::new("lineup").join("route%d.jpg");
        assert!(args.contains(&format!(
            "-f image2 -r 1 -s 640x640 -i {}",
            pattern.display()
        )));
        assert!(args.contains("-vcodec libx264 -crf 23 -pix_fmt yuv420p"));
        assert!(args.contains("-vf framerate=fps=30:interp_start=1:interp_end=254:scene=5"));
        assert!(args.ends_with("videos/route.mp4"));
    }

    #[test]
    fn test_slideshow_has_no_filter() {
        let encoder = FfmpegEncoder::new(VideoEncodingConfig::slideshow());
        let cmd = encoder
            .build_command(&sequence(&[0]), 2, Path::new("out.mp4"))
            .unwrap();
        let args = cmd.to_args();
        assert!(!args.contains(&"-vf".to_string()));
        assert!(args.contains(&"2".to_string()));
    }

    #[test]
    fn test_rejects_unusable_sequences() {
        let encoder = FfmpegEncoder::default();
        let out = Path::new("out.mp4");

        assert!(matches!(
            encoder.build_command(&sequence(&[]), 1, out),
            Err(MediaError::EmptySequence)
        ));
        assert!(matches!(
            encoder.build_command(&sequence(&[0, 2]), 1, out),
            Err(MediaError::InvalidSequence(_))
        ));
        assert!(encoder.build_command(&sequence(&[0]), 0, out).is_err());
    }

    #[tokio::test]
    async fn test_missing_frame_is_reported_before_running() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut seq = FrameSequence::new(dir.path(), "route", "jpg");
        let path = seq.frame_path(0);
        seq.frames.push(SequencedFrame {
            number: 0,
            original_number: 0,
            source: dir.path().join("route_0.jpg"),
            path,
        });

        let result = FfmpegEncoder::default()
            .encode(&seq, 1, &dir.path().join("out.mp4"))
            .await;

        assert!(matches!(result, Err(MediaError::FileNotFound(_))));
    }
}
