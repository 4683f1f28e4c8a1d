//! Grid composition with ImageMagick.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::fs;
use tokio::process::Command;
use tracing::debug;

use crate::error::{MediaError, MediaResult};

/// Crop applied to each panel before stitching.
pub const DEFAULT_PANEL_CROP: &str = "640x640+0+0";

/// Stitches grid panels into one image. `rows` holds panel paths grouped by
/// grid row, top row first.
#[async_trait]
pub trait GridCompositor: Send + Sync {
    async fn compose(&self, rows: &[Vec<PathBuf>], crop: &str, output: &Path) -> MediaResult<()>;
}

/// Compositor backed by ImageMagick's `convert`.
#[derive(Debug, Clone, Default)]
pub struct ConvertCompositor;

impl ConvertCompositor {
    pub fn new() -> Self {
        Self
    }

    /// Arguments for `convert`: each row is appended horizontally inside
    /// its own image stack, then the rows are appended vertically.
    pub fn build_args(rows: &[Vec<PathBuf>], crop: &str, output: &Path) -> MediaResult<Vec<String>> {
        if rows.is_empty() || rows.iter().any(|row| row.is_empty()) {
            return Err(MediaError::composition_failed("grid has an empty row", None));
        }

        let mut args = Vec::new();
        for row in rows {
            args.push("(".to_string());
            for panel in row {
                args.push(panel.to_string_lossy().to_string());
                args.push("-crop".to_string());
                args.push(crop.to_string());
            }
            args.push("+append".to_string());
            args.push(")".to_string());
        }
        args.push("-append".to_string());
        args.push(output.to_string_lossy().to_string());
        Ok(args)
    }
}

#[async_trait]
impl GridCompositor for ConvertCompositor {
    async fn compose(&self, rows: &[Vec<PathBuf>], crop: &str, output: &Path) -> MediaResult<()> {
        let args = Self::build_args(rows, crop, output)?;

        for panel in rows.iter().flatten() {
            if !fs::try_exists(panel).await? {
                return Err(MediaError::FileNotFound(panel.clone()));
            }
        }

        let convert = check_convert()?;
        debug!("Running convert {}", args.join(" "));

        let result = Command::new(convert)
            .args(&args)
            .stdin(Stdio::null())
            .output()
            .await?;

        if result.status.success() {
            Ok(())
        } else {
            let stderr = String::from_utf8_lossy(&result.stderr).trim().to_string();
            Err(MediaError::composition_failed(
                format!("convert exited with {}", result.status),
                (!stderr.is_empty()).then_some(stderr),
            ))
        }
    }
}

/// Check if ImageMagick's `convert` is available.
pub fn check_convert() -> MediaResult<PathBuf> {
    which::which("convert").map_err(|_| MediaError::ConvertNotFound)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_args_layout() {
        let rows = vec![
            vec![PathBuf::from("p/a_0.jpg"), PathBuf::from("p/a_1.jpg")],
            vec![PathBuf::from("p/a_2.jpg"), PathBuf::from("p/a_3.jpg")],
        ];

        let args =
            ConvertCompositor::build_args(&rows, DEFAULT_PANEL_CROP, Path::new("p/composite.jpg"))
                .unwrap();

        assert_eq!(
            args[..9],
            [
                "(",
                "p/a_0.jpg",
                "-crop",
                "640x640+0+0",
                "p/a_1.jpg",
                "-crop",
                "640x640+0+0",
                "+append",
                ")"
            ]
        );
        assert_eq!(args[9], "(");
        assert_eq!(args[args.len() - 2], "-append");
        assert_eq!(args[args.len() - 1], "p/composite.jpg");
    }

    #[test]
    fn test_empty_grid_is_rejected() {
        assert!(ConvertCompositor::build_args(&[], "1x1+0+0", Path::new("o.jpg")).is_err());
        assert!(ConvertCompositor::build_args(&[vec![]], "1x1+0+0", Path::new("o.jpg")).is_err());
    }

    #[tokio::test]
    async fn test_missing_panel() {
        let dir = tempfile::TempDir::new().unwrap();
        let rows = vec![vec![dir.path().join("missing.jpg")]];

        let result = ConvertCompositor::new()
            .compose(&rows, DEFAULT_PANEL_CROP, &dir.path().join("out.jpg"))
            .await;

        assert!(matches!(result, Err(MediaError::FileNotFound(_))));
    }
}
