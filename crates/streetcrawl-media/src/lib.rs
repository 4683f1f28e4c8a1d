//! Post-capture media processing.
//!
//! This crate provides:
//! - Frame scanning and gapless renumbering (`SequenceAssembler`)
//! - Byte-level frame comparison
//! - Grid composition through ImageMagick
//! - Type-safe FFmpeg command building with progress parsing
//! - Image-sequence video encoding

pub mod command;
pub mod compare;
pub mod compose;
pub mod encode;
pub mod error;
pub mod fs_utils;
pub mod progress;
pub mod sequence;

pub use command::{check_ffmpeg, FfmpegCommand, FfmpegRunner};
pub use compare::{ByteComparator, FrameComparator};
pub use compose::{check_convert, ConvertCompositor, GridCompositor, DEFAULT_PANEL_CROP};
pub use encode::{FfmpegEncoder, FrameEncoder};
pub use error::{MediaError, MediaResult};
pub use fs_utils::{transfer_file, TransferMode};
pub use progress::{FfmpegProgress, ProgressCallback};
pub use sequence::{
    parse_frame_number, remove_sequenced_frames, scan_frames, SequenceAssembler, SequencePlan,
};
