//! Filesystem helpers for moving frames between directories.
//!
//! Moves first try a rename and fall back to copy-and-delete when the
//! destination is on another filesystem (EXDEV).

use std::path::Path;
use tokio::fs;

use crate::error::{MediaError, MediaResult};

/// How frames are carried into their renumbered location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransferMode {
    /// Leave the captured file in place
    #[default]
    Copy,
    /// Remove the captured file
    Move,
}

/// Copy or move `src` to `dst`, creating the destination directory.
pub async fn transfer_file(
    src: impl AsRef<Path>,
    dst: impl AsRef<Path>,
    mode: TransferMode,
) -> MediaResult<()> {
    let (src, dst) = (src.as_ref(), dst.as_ref());
    if src == dst {
        return Ok(());
    }
    if !fs::try_exists(src).await? {
        return Err(MediaError::FileNotFound(src.to_path_buf()));
    }

    match mode {
        TransferMode::Copy => copy_file(src, dst).await,
        TransferMode::Move => move_file(src, dst).await,
    }
}

/// Copy a file, creating the destination directory if needed.
pub async fn copy_file(src: impl AsRef<Path>, dst: impl AsRef<Path>) -> MediaResult<()> {
    let (src, dst) = (src.as_ref(), dst.as_ref());
    ensure_parent(dst).await?;
    fs::copy(src, dst).await?;
    Ok(())
}

/// Move a file from `src` to `dst`, handling cross-device moves.
pub async fn move_file(src: impl AsRef<Path>, dst: impl AsRef<Path>) -> MediaResult<()> {
    let (src, dst) = (src.as_ref(), dst.as_ref());
    ensure_parent(dst).await?;

    match fs::rename(src, dst).await {
        Ok(()) => Ok(()),
        Err(e) if is_cross_device_error(&e) => {
            tracing::debug!(
                "Cross-device rename, falling back to copy+delete: {} -> {}",
                src.display(),
                dst.display()
            );
            copy_and_delete(src, dst).await
        }
        Err(e) => Err(MediaError::from(e)),
    }
}

async fn ensure_parent(path: &Path) -> MediaResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await?;
    }
    Ok(())
}

/// EXDEV is error code 18 on Linux/macOS.
fn is_cross_device_error(e: &std::io::Error) -> bool {
    e.raw_os_error() == Some(18)
}

/// Copy to a temp file beside `dst`, rename it into place, then delete `src`.
async fn copy_and_delete(src: &Path, dst: &Path) -> MediaResult<()> {
    let tmp_dst = dst.with_extension("tmp");

    fs::copy(src, &tmp_dst).await?;

    if let Err(e) = fs::rename(&tmp_dst, dst).await {
        let _ = fs::remove_file(&tmp_dst).await;
        return Err(MediaError::from(e));
    }

    // Source removal is best effort; the frame is already in place
    if let Err(e) = fs::remove_file(src).await {
        tracing::warn!(
            "Failed to remove source after cross-device move: {}: {}",
            src.display(),
            e
        );
    }

    Ok(())
}
