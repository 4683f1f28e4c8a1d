//! FFmpeg command builder and runner.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tracing::{debug, warn};

use crate::error::{MediaError, MediaResult};
use crate::progress::{is_progress_line, parse_progress_line, FfmpegProgress};

/// Number of diagnostic stderr lines kept for error reports.
const STDERR_TAIL_LINES: usize = 20;

/// One FFmpeg invocation: `ffmpeg -y [demuxer args] -i <input> [encoder args] <destination>`.
#[derive(Debug, Clone)]
pub struct FfmpegCommand {
    input: PathBuf,
    destination: PathBuf,
    demuxer: Vec<String>,
    encoder: Vec<String>,
    verbosity: &'static str,
}

impl FfmpegCommand {
    pub fn new(input: impl Into<PathBuf>, destination: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            destination: destination.into(),
            demuxer: Vec::new(),
            encoder: Vec::new(),
            verbosity: "error",
        }
    }

    /// Read `input` as a numbered `image2` sequence at `frame_rate` fps,
    /// scaled to `frame_size`.
    pub fn image_sequence(mut self, frame_rate: u32, frame_size: &str) -> Self {
        self.demuxer.extend([
            "-f".to_string(),
            "image2".to_string(),
            "-r".to_string(),
            frame_rate.to_string(),
            "-s".to_string(),
            frame_size.to_string(),
        ]);
        self
    }

    /// Append encoder arguments, placed between the input and the destination.
    pub fn encode_with<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.encoder.extend(args.into_iter().map(Into::into));
        self
    }

    /// FFmpeg `-v` level; `error` unless changed.
    pub fn verbosity(mut self, level: &'static str) -> Self {
        self.verbosity = level;
        self
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }

    /// Full argument list. Progress is always reported on stderr.
    pub fn to_args(&self) -> Vec<String> {
        let head = ["-y", "-v", self.verbosity, "-progress", "pipe:2"]
            .into_iter()
            .map(String::from);
        let input = ["-i".to_string(), self.input.display().to_string()];

        head.chain(self.demuxer.iter().cloned())
            .chain(input)
            .chain(self.encoder.iter().cloned())
            .chain(std::iter::once(self.destination.display().to_string()))
            .collect()
    }
}

/// Last few non-progress stderr lines, attached to failures.
#[derive(Debug, Default)]
struct StderrTail(VecDeque<String>);

impl StderrTail {
    fn push(&mut self, line: String) {
        if self.0.len() == STDERR_TAIL_LINES {
            self.0.pop_front();
        }
        self.0.push_back(line);
    }

    fn into_text(self) -> Option<String> {
        (!self.0.is_empty()).then(|| Vec::from(self.0).join("\n"))
    }
}

/// Spawns FFmpeg, forwards progress and enforces an optional timeout.
#[derive(Debug, Clone, Default)]
pub struct FfmpegRunner {
    timeout: Option<Duration>,
}

impl FfmpegRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Kill FFmpeg if it runs longer than `secs`.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout = Some(Duration::from_secs(secs));
        self
    }

    pub async fn run(&self, cmd: &FfmpegCommand) -> MediaResult<()> {
        self.run_with_progress(cmd, |_| {}).await
    }

    pub async fn run_with_progress<F>(&self, cmd: &FfmpegCommand, on_progress: F) -> MediaResult<()>
    where
        F: Fn(FfmpegProgress) + Send + 'static,
    {
        let ffmpeg = check_ffmpeg()?;
        let args = cmd.to_args();
        debug!("ffmpeg {}", args.join(" "));

        let mut child = Command::new(ffmpeg)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let Some(stderr) = child.stderr.take() else {
            return Err(MediaError::encoding_failed("FFmpeg stderr not captured", None, None));
        };

        let reader = tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            let mut state = FfmpegProgress::default();
            let mut tail = StderrTail::default();

            while let Ok(Some(line)) = lines.next_line().await {
                if is_progress_line(&line) {
                    if let Some(update) = parse_progress_line(&line, &mut state) {
                        on_progress(update);
                    }
                } else if !line.trim().is_empty() {
                    tail.push(line);
                }
            }
            tail
        });

        let exit = self.wait(&mut child).await;
        let tail = reader.await.unwrap_or_default();

        match exit? {
            status if status.success() => Ok(()),
            status => Err(MediaError::encoding_failed(
                format!("FFmpeg exited with {}", status),
                tail.into_text(),
                status.code(),
            )),
        }
    }

    async fn wait(&self, child: &mut Child) -> MediaResult<ExitStatus> {
        let Some(limit) = self.timeout else {
            return Ok(child.wait().await?);
        };

        let waited = tokio::time::timeout(limit, child.wait()).await;
        match waited {
            Ok(status) => Ok(status?),
            Err(_) => {
                warn!(timeout_secs = limit.as_secs(), "FFmpeg timed out, killing it");
                let _ = child.kill().await;
                Err(MediaError::Timeout(limit.as_secs()))
            }
        }
    }
}

/// Check if FFmpeg is available.
pub fn check_ffmpeg() -> MediaResult<PathBuf> {
    which::which("ffmpeg").map_err(|_| MediaError::FfmpegNotFound)
}
