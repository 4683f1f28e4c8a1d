//! Captured frames and gapless frame sequences.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// A captured image file tagged with the frame number embedded in its name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapturedFrame {
    /// Embedded frame number (may be sparse or duplicated)
    pub number: usize,
    /// File location
    pub path: PathBuf,
}

impl CapturedFrame {
    pub fn new(number: usize, path: impl Into<PathBuf>) -> Self {
        Self {
            number,
            path: path.into(),
        }
    }
}

/// A frame after renumbering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequencedFrame {
    /// Contiguous 0-based position in the sequence
    pub number: usize,
    /// Frame number the file carried before renumbering
    pub original_number: usize,
    /// File the frame was taken from
    pub source: PathBuf,
    /// Renumbered file
    pub path: PathBuf,
}

/// Contiguously numbered frames ready for a fixed frame-rate encoder.
///
/// Files are named `{stem}{n}.{extension}` inside `directory`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameSequence {
    pub directory: PathBuf,
    pub stem: String,
    pub extension: String,
    pub frames: Vec<SequencedFrame>,
}

impl FrameSequence {
    /// Create an empty sequence rooted at `directory`.
    pub fn new(
        directory: impl Into<PathBuf>,
        stem: impl Into<String>,
        extension: impl Into<String>,
    ) -> Self {
        Self {
            directory: directory.into(),
            stem: stem.into(),
            extension: extension.into(),
            frames: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Path of the `n`th frame in this sequence.
    pub fn frame_path(&self, n: usize) -> PathBuf {
        self.directory
            .join(format!("{}{}.{}", self.stem, n, self.extension))
    }

    /// Input pattern for FFmpeg's `image2` demuxer.
    pub fn input_pattern(&self) -> PathBuf {
        self.directory
            .join(format!("{}%d.{}", self.stem, self.extension))
    }

    /// Frame paths in sequence order.
    pub fn paths(&self) -> Vec<&Path> {
        self.frames.iter().map(|f| f.path.as_path()).collect()
    }

    /// Check numbering is 0..len with no gaps.
    pub fn is_contiguous(&self) -> bool {
        self.frames.iter().enumerate().all(|(i, f)| f.number == i)
    }
}
