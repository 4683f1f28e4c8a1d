//! Frame sequence assembly.
//!
//! Captured frames carry the itinerary row number in their file name, so a
//! capture run leaves gaps (rows without imagery) and repeats (neighbouring
//! rows that resolved to the same panorama). FFmpeg's `image2` demuxer
//! needs `0..n` with no gaps, so frames are sorted, consecutive repeats are
//! dropped, and the survivors are renumbered.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, info};

use streetcrawl_models::{CapturedFrame, FrameSequence, SequencedFrame};

use crate::compare::FrameComparator;
use crate::error::MediaResult;
use crate::fs_utils::{transfer_file, TransferMode};

/// Frames to keep, in output order, and the repeats that were dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SequencePlan {
    pub retained: Vec<CapturedFrame>,
    pub dropped: Vec<CapturedFrame>,
}

/// Extract the frame number from a file name of the form
/// `{stem}_{n}.{ext}` or `{stem}{n}.{ext}`.
pub fn parse_frame_number(file_name: &str, stem: &str, extension: &str) -> Option<usize> {
    let middle = file_name
        .strip_prefix(stem)?
        .strip_suffix(extension)?
        .strip_suffix('.')?;
    let digits = middle.strip_prefix('_').unwrap_or(middle);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// List the captured frames for `stem` in `dir`, in no particular order.
/// Files that match the stem but carry no frame number are skipped.
pub async fn scan_frames(
    dir: impl AsRef<Path>,
    stem: &str,
    extension: &str,
) -> MediaResult<Vec<CapturedFrame>> {
    let dir = dir.as_ref();
    let mut entries = fs::read_dir(dir).await?;
    let mut frames = Vec::new();

    while let Some(entry) = entries.next_entry().await? {
        if !entry.file_type().await?.is_file() {
            continue;
        }
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        if !name.starts_with(stem) {
            continue;
        }
        match parse_frame_number(name, stem, extension) {
            Some(number) => frames.push(CapturedFrame::new(number, entry.path())),
            None => debug!("Skipping {} (no frame number)", name),
        }
    }

    debug!("Found {} frames for '{}' in {}", frames.len(), stem, dir.display());
    Ok(frames)
}

/// Whether `file_name` is a renumbered `{stem}{n}.{ext}` frame, as written
/// by [`SequenceAssembler::materialize`].
fn is_sequenced_name(file_name: &str, stem: &str, extension: &str) -> bool {
    file_name
        .strip_prefix(stem)
        .is_some_and(|rest| !rest.starts_with('_'))
        && parse_frame_number(file_name, stem, extension).is_some()
}

/// Delete `{stem}{n}.{ext}` frames in `dir` left over from an earlier
/// lineup, except the paths in `keep`. Returns the number removed.
pub async fn remove_sequenced_frames(
    dir: impl AsRef<Path>,
    stem: &str,
    extension: &str,
    keep: &HashSet<PathBuf>,
) -> MediaResult<usize> {
    let dir = dir.as_ref();
    let mut entries = match fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(e.into()),
    };

    let mut removed = 0;
    while let Some(entry) = entries.next_entry().await? {
        if !entry.file_type().await?.is_file() {
            continue;
        }
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        let path = entry.path();
        if is_sequenced_name(name, stem, extension) && !keep.contains(&path) {
            fs::remove_file(&path).await?;
            removed += 1;
        }
    }

    if removed > 0 {
        debug!("Removed {} stale frames for '{}' from {}", removed, stem, dir.display());
    }
    Ok(removed)
}

/// Collapses captured frames into a gapless sequence.
#[derive(Debug, Clone)]
pub struct SequenceAssembler<C> {
    comparator: C,
}

impl<C: FrameComparator> SequenceAssembler<C> {
    pub fn new(comparator: C) -> Self {
        Self { comparator }
    }

    /// Sort by frame number and drop frames identical to the last kept one.
    ///
    /// The sort is stable, so frames sharing a number keep their input
    /// order. Each frame is compared with the most recently *retained*
    /// frame, not its direct predecessor.
    pub async fn plan(&self, mut frames: Vec<CapturedFrame>) -> MediaResult<SequencePlan> {
        frames.sort_by_key(|f| f.number);

        let mut plan = SequencePlan::default();
        for frame in frames {
            let repeat = match plan.retained.last() {
                Some(baseline) => {
                    self.comparator
                        .files_equal(&baseline.path, &frame.path)
                        .await?
                }
                None => false,
            };

            if repeat {
                debug!(number = frame.number, "Dropping repeated frame");
                plan.dropped.push(frame);
            } else {
                plan.retained.push(frame);
            }
        }

        Ok(plan)
    }

    /// Write the retained frames as `{stem}{i}.{extension}` for `i = 0..`.
    ///
    /// Frames from an earlier lineup in `out_dir` are removed first, so the
    /// directory holds exactly the returned sequence.
    pub async fn materialize(
        &self,
        plan: &SequencePlan,
        out_dir: impl AsRef<Path>,
        stem: &str,
        extension: &str,
        mode: TransferMode,
    ) -> MediaResult<FrameSequence> {
        let out_dir = out_dir.as_ref();
        fs::create_dir_all(out_dir).await?;

        let sources: HashSet<PathBuf> = plan
            .retained
            .iter()
            .chain(&plan.dropped)
            .map(|f| f.path.clone())
            .collect();
        remove_sequenced_frames(out_dir, stem, extension, &sources).await?;

        let mut sequence = FrameSequence::new(out_dir, stem, extension);
        for (number, frame) in plan.retained.iter().enumerate() {
            let path = sequence.frame_path(number);
            transfer_file(&frame.path, &path, mode).await?;
            debug!(
                "{:?} {} -> {}",
                mode,
                frame.path.display(),
                path.display()
            );
            sequence.frames.push(SequencedFrame {
                number,
                original_number: frame.number,
                source: frame.path.clone(),
                path,
            });
        }

        Ok(sequence)
    }

    /// Plan and materialize in one step.
    pub async fn assemble(
        &self,
        frames: Vec<CapturedFrame>,
        out_dir: impl AsRef<Path>,
        stem: &str,
        extension: &str,
        mode: TransferMode,
    ) -> MediaResult<FrameSequence> {
        let captured = frames.len();
        let plan = self.plan(frames).await?;
        let sequence = self
            .materialize(&plan, out_dir, stem, extension, mode)
            .await?;

        info!(
            captured,
            retained = sequence.len(),
            dropped = plan.dropped.len(),
            "Lined up frame sequence '{}'",
            stem
        );
        Ok(sequence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compare::ByteComparator;
    use tempfile::TempDir;

    async fn capture(dir: &Path, name: &str, bytes: &[u8]) -> std::path::PathBuf {
        let path = dir.join(name);
        fs::write(&path, bytes).await.unwrap();
        path
    }

    #[test]
    fn test_parse_frame_number() {
        assert_eq!(parse_frame_number("route_12.jpg", "route", "jpg"), Some(12));
        assert_eq!(parse_frame_number("route7.jpg", "route", "jpg"), Some(7));
        assert_eq!(parse_frame_number("route_x.jpg", "route", "jpg"), None);
        assert_eq!(parse_frame_number("route3_1.jpg", "route", "jpg"), None);
        assert_eq!(parse_frame_number("route_3.png", "route", "jpg"), None);
        assert_eq!(parse_frame_number("other_3.jpg", "route", "jpg"), None);
        assert_eq!(parse_frame_number("route_.jpg", "route", "jpg"), None);
    }

    #[tokio::test]
    async fn test_scan_frames_filters_by_stem_and_number() {
        let dir = TempDir::new().unwrap();
        capture(dir.path(), "route_0.jpg", b"a").await;
        capture(dir.path(), "route_10.jpg", b"b").await;
        capture(dir.path(), "route_notes.jpg", b"c").await;
        capture(dir.path(), "composite-route-0.jpg", b"d").await;
        capture(dir.path(), "route_2.json", b"{}").await;

        let mut frames = scan_frames(dir.path(), "route", "jpg").await.unwrap();
        frames.sort_by_key(|f| f.number);

        let numbers: Vec<usize> = frames.iter().map(|f| f.number).collect();
        assert_eq!(numbers, vec![0, 10]);
    }

    #[tokio::test]
    async fn test_sparse_duplicated_frames_become_gapless() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("photos");
        fs::create_dir_all(&src).await.unwrap();

        // Frame 2 was captured twice with identical content
        let frames = vec![
            CapturedFrame::new(5, capture(&src, "route_5.jpg", b"five").await),
            CapturedFrame::new(2, capture(&src, "route_2.jpg", b"two").await),
            CapturedFrame::new(0, capture(&src, "route_0.jpg", b"zero").await),
            CapturedFrame::new(2, capture(&src, "route_2b.jpg", b"two").await),
        ];

        let assembler = SequenceAssembler::new(ByteComparator);
        let out = dir.path().join("lineup");
        let seq = assembler
            .assemble(frames, &out, "route", "jpg", TransferMode::Copy)
            .await
            .unwrap();

        assert_eq!(seq.len(), 3);
        assert!(seq.is_contiguous());
        let originals: Vec<usize> = seq.frames.iter().map(|f| f.original_number).collect();
        assert_eq!(originals, vec![0, 2, 5]);
        assert_eq!(fs::read(seq.frame_path(1)).await.unwrap(), b"two");
        assert_eq!(fs::read(seq.frame_path(2)).await.unwrap(), b"five");
        assert!(src.join("route_5.jpg").exists());
    }

    #[tokio::test]
    async fn test_compares_against_last_retained_frame() {
        let dir = TempDir::new().unwrap();
        // a, a, a collapses to one frame; b differs and is kept
        let frames = vec![
            CapturedFrame::new(0, capture(dir.path(), "f_0.jpg", b"a").await),
            CapturedFrame::new(1, capture(dir.path(), "f_1.jpg", b"a").await),
            CapturedFrame::new(2, capture(dir.path(), "f_2.jpg", b"a").await),
            CapturedFrame::new(3, capture(dir.path(), "f_3.jpg", b"b").await),
            CapturedFrame::new(4, capture(dir.path(), "f_4.jpg", b"a").await),
        ];

        let plan = SequenceAssembler::new(ByteComparator)
            .plan(frames)
            .await
            .unwrap();

        let kept: Vec<usize> = plan.retained.iter().map(|f| f.number).collect();
        assert_eq!(kept, vec![0, 3, 4]);
        assert_eq!(plan.dropped.len(), 2);
    }

    #[tokio::test]
    async fn test_relineup_replaces_previous_frames() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("photos");
        let out = dir.path().join("lineup");
        fs::create_dir_all(&src).await.unwrap();
        fs::create_dir_all(&out).await.unwrap();
        capture(&out, "r_notes.jpg", b"keep").await;

        let mut frames = Vec::new();
        for (n, body) in [(0, "a"), (1, "b"), (2, "c"), (3, "d")] {
            let name = format!("r_{}.jpg", n);
            frames.push(CapturedFrame::new(n, capture(&src, &name, body.as_bytes()).await));
        }
        let assembler = SequenceAssembler::new(ByteComparator);
        let first = assembler
            .assemble(frames.clone(), &out, "r", "jpg", TransferMode::Copy)
            .await
            .unwrap();
        assert_eq!(first.len(), 4);

        // Drop the two middle frames and line up again
        let kept = vec![frames[0].clone(), frames[3].clone()];
        let second = assembler
            .assemble(kept, &out, "r", "jpg", TransferMode::Copy)
            .await
            .unwrap();
        assert_eq!(second.len(), 2);

        let on_disk = scan_frames(&out, "r", "jpg").await.unwrap();
        assert_eq!(on_disk.len(), 2);
        assert_eq!(fs::read(second.frame_path(1)).await.unwrap(), b"d");
        assert!(!out.join("r2.jpg").exists());
        assert!(out.join("r_notes.jpg").exists());
    }

    #[tokio::test]
    async fn test_remove_sequenced_frames_keeps_sources() {
        let dir = TempDir::new().unwrap();
        let source = capture(dir.path(), "r5.jpg", b"src").await;
        capture(dir.path(), "r0.jpg", b"old").await;
        capture(dir.path(), "r_1.jpg", b"capture").await;
        capture(dir.path(), "r1_0.jpg", b"panel").await;

        let keep = HashSet::from([source.clone()]);
        let removed = remove_sequenced_frames(dir.path(), "r", "jpg", &keep)
            .await
            .unwrap();

        assert_eq!(removed, 1);
        assert!(source.exists());
        assert!(!dir.path().join("r0.jpg").exists());
        assert!(dir.path().join("r_1.jpg").exists());
        assert!(dir.path().join("r1_0.jpg").exists());

        let missing = remove_sequenced_frames(dir.path().join("absent"), "r", "jpg", &keep)
            .await
            .unwrap();
        assert_eq!(missing, 0);
    }

    #[tokio::test]
    async fn test_move_mode_and_empty_input() {
        let dir = TempDir::new().unwrap();
        let src = capture(dir.path(), "r_3.jpg", b"x").await;
        let assembler = SequenceAssembler::new(ByteComparator);

        let seq = assembler
            .assemble(
                vec![CapturedFrame::new(3, &src)],
                dir.path().join("out"),
                "r",
                "jpg",
                TransferMode::Move,
            )
            .await
            .unwrap();
        assert!(!src.exists());
        assert!(seq.frame_path(0).exists());

        let empty = assembler.plan(Vec::new()).await.unwrap();
        assert!(empty.retained.is_empty());
    }
}
