//! Image capture over an itinerary.
//!
//! Single capture fetches one image per row at the row heading. Grid capture
//! fetches a `columns x rows` panel set per row and stitches it into a
//! composite. Both are resumable: rows already marked as downloaded are
//! skipped unless a redownload is requested, and files already on disk are
//! never fetched twice.

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, info, warn};

use streetcrawl_itinerary::GridLayout;
use streetcrawl_media::{GridCompositor, DEFAULT_PANEL_CROP};
use streetcrawl_models::{CameraSettings, Itinerary, Waypoint};
use streetcrawl_provider::{ImageOracle, ImageQuery};

use crate::error::{CrawlError, CrawlResult};

/// File naming for captured images under one photo directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoLayout {
    pub photo_dir: PathBuf,
    pub stem: String,
    pub extension: String,
}

impl PhotoLayout {
    pub fn new(photo_dir: impl Into<PathBuf>, stem: &str, extension: &str) -> Self {
        Self {
            photo_dir: photo_dir.into(),
            stem: stem.to_string(),
            extension: extension.trim_start_matches('.').to_string(),
        }
    }

    /// `{stem}_{index}.{ext}`
    pub fn single_path(&self, index: usize) -> PathBuf {
        self.photo_dir
            .join(format!("{}_{}.{}", self.stem, index, self.extension))
    }

    /// `{stem}{index}_{panel}.{ext}`
    pub fn panel_path(&self, index: usize, panel: usize) -> PathBuf {
        self.photo_dir
            .join(format!("{}{}_{}.{}", self.stem, index, panel, self.extension))
    }

    /// `composite-{stem}-{index}.{ext}`
    pub fn composite_path(&self, index: usize) -> PathBuf {
        self.photo_dir
            .join(format!("composite-{}-{}.{}", self.stem, index, self.extension))
    }
}

/// Which rows to capture and whether to redo finished ones.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaptureOptions {
    /// Restrict capture to these rows; all rows when `None`
    pub indices: Option<Vec<usize>>,
    pub redownload: bool,
}

impl CaptureOptions {
    pub fn with_indices(mut self, indices: Vec<usize>) -> Self {
        self.indices = Some(indices);
        self
    }

    pub fn with_redownload(mut self, redownload: bool) -> Self {
        self.redownload = redownload;
        self
    }

    /// Requested rows, checked against the itinerary before any fetch.
    fn resolve(&self, itinerary: &Itinerary) -> CrawlResult<Vec<usize>> {
        let Some(indices) = &self.indices else {
            return Ok(itinerary.indices());
        };
        if let Some(missing) = indices.iter().find(|i| !itinerary.contains(**i)) {
            return Err(CrawlError::capture_failed(format!(
                "row {} is not in the itinerary ({} rows)",
                missing,
                itinerary.len()
            )));
        }
        Ok(indices.clone())
    }
}

/// What happened to one requested row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureOutcome {
    /// At least one image was fetched
    Downloaded,
    /// Every file was already on disk; the row is now marked downloaded
    AlreadyOnDisk,
    /// Row was marked downloaded and no redownload was requested
    Skipped,
    /// Fetch or composition failed; the row stays unmarked
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowCapture {
    pub index: usize,
    pub outcome: CaptureOutcome,
}

/// Per-row results of a capture run, in request order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaptureReport {
    pub rows: Vec<RowCapture>,
}

impl CaptureReport {
    pub fn downloaded(&self) -> usize {
        self.count(|o| matches!(o, CaptureOutcome::Downloaded))
    }

    pub fn already_on_disk(&self) -> usize {
        self.count(|o| matches!(o, CaptureOutcome::AlreadyOnDisk))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, CaptureOutcome::Skipped))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, CaptureOutcome::Failed(_)))
    }

    fn count(&self, pred: impl Fn(&CaptureOutcome) -> bool) -> usize {
        self.rows.iter().filter(|r| pred(&r.outcome)).count()
    }

    fn push(&mut self, index: usize, outcome: CaptureOutcome) {
        self.rows.push(RowCapture { index, outcome });
    }
}

/// Whether `path` holds a non-empty image from an earlier run.
async fn has_cached_image(path: &Path) -> bool {
    match fs::metadata(path).await {
        Ok(metadata) => metadata.is_file() && metadata.len() > 0,
        Err(_) => false,
    }
}

/// Fetch `query` into `path` unless a non-empty file is already there.
/// Returns whether a fetch happened.
///
/// The image is written to `{path}.tmp` and renamed into place, so an
/// interrupted capture never leaves a partial file under the final name.
async fn fetch_to<O: ImageOracle + ?Sized>(
    oracle: &O,
    query: &ImageQuery,
    path: &Path,
) -> CrawlResult<bool> {
    if has_cached_image(path).await {
        debug!("{} exists, not fetching", path.display());
        return Ok(false);
    }

    let bytes = oracle.fetch_image(query).await?;
    if bytes.is_empty() {
        return Err(CrawlError::capture_failed(format!(
            "empty image for {}",
            path.display()
        )));
    }

    let tmp = path.with_extension("tmp");
    fs::write(&tmp, bytes).await?;
    if let Err(e) = fs::rename(&tmp, path).await {
        let _ = fs::remove_file(&tmp).await;
        return Err(e.into());
    }
    debug!("Saved {}", path.display());
    Ok(true)
}

/// One image per row at the row heading.
pub struct SingleCapture<'a, O: ImageOracle + ?Sized> {
    oracle: &'a O,
    layout: PhotoLayout,
    camera: CameraSettings,
}

impl<'a, O: ImageOracle + ?Sized> SingleCapture<'a, O> {
    pub fn new(oracle: &'a O, layout: PhotoLayout) -> Self {
        Self {
            oracle,
            layout,
            camera: CameraSettings::default(),
        }
    }

    pub fn with_camera(mut self, camera: CameraSettings) -> Self {
        self.camera = camera;
        self
    }

    pub async fn run(
        &self,
        itinerary: &mut Itinerary,
        options: &CaptureOptions,
    ) -> CrawlResult<CaptureReport> {
        let indices = options.resolve(itinerary)?;
        fs::create_dir_all(&self.layout.photo_dir).await?;

        let mut report = CaptureReport::default();
        for index in indices {
            let Some(row) = itinerary.get_mut(index) else {
                continue;
            };
            if row.downloaded_single && !options.redownload {
                report.push(index, CaptureOutcome::Skipped);
                continue;
            }

            let query = ImageQuery::new(row.location(), row.heading, self.camera.clone());
            let path = self.layout.single_path(index);
            let outcome = match fetch_to(self.oracle, &query, &path).await {
                Ok(fetched) => {
                    row.downloaded_single = true;
                    if fetched {
                        CaptureOutcome::Downloaded
                    } else {
                        CaptureOutcome::AlreadyOnDisk
                    }
                }
                Err(e) => {
                    warn!(index, "Image capture failed: {}", e);
                    CaptureOutcome::Failed(e.to_string())
                }
            };
            report.push(index, outcome);
        }

        info!(
            "Single capture finished: {} downloaded, {} on disk, {} skipped, {} failed",
            report.downloaded(),
            report.already_on_disk(),
            report.skipped(),
            report.failed()
        );
        Ok(report)
    }
}

/// Zoomed-in panel grid per row, stitched into one composite image.
pub struct GridCapture<'a, O: ImageOracle + ?Sized, C: GridCompositor + ?Sized> {
    oracle: &'a O,
    compositor: &'a C,
    layout: PhotoLayout,
    grid: GridLayout,
    crop: String,
}

impl<'a, O, C> GridCapture<'a, O, C>
where
    O: ImageOracle + ?Sized,
    C: GridCompositor + ?Sized,
{
    pub fn new(oracle: &'a O, compositor: &'a C, layout: PhotoLayout, grid: GridLayout) -> Self {
        Self {
            oracle,
            compositor,
            layout,
            grid,
            crop: DEFAULT_PANEL_CROP.to_string(),
        }
    }

    pub fn with_crop(mut self, crop: impl Into<String>) -> Self {
        self.crop = crop.into();
        self
    }

    pub async fn run(
        &self,
        itinerary: &mut Itinerary,
        options: &CaptureOptions,
    ) -> CrawlResult<CaptureReport> {
        self.grid.validate()?;
        let indices = options.resolve(itinerary)?;
        fs::create_dir_all(&self.layout.photo_dir).await?;

        let mut report = CaptureReport::default();
        for index in indices {
            let Some(row) = itinerary.get_mut(index) else {
                continue;
            };
            if row.downloaded_grid && !options.redownload {
                report.push(index, CaptureOutcome::Skipped);
                continue;
            }

            let outcome = match self.capture_row(row).await {
                Ok(true) => CaptureOutcome::Downloaded,
                Ok(false) => CaptureOutcome::AlreadyOnDisk,
                Err(e) => {
                    warn!(index, "Grid capture failed: {}", e);
                    CaptureOutcome::Failed(e.to_string())
                }
            };
            report.push(index, outcome);
        }

        info!(
            "Grid capture finished: {} downloaded, {} on disk, {} skipped, {} failed",
            report.downloaded(),
            report.already_on_disk(),
            report.skipped(),
            report.failed()
        );
        Ok(report)
    }

    /// Fetch missing panels, then compose. Returns whether any panel was
    /// fetched.
    async fn capture_row(&self, row: &mut Waypoint) -> CrawlResult<bool> {
        let panels = self.grid.panels(row.heading)?;

        let mut fetched_any = false;
        for panel in &panels {
            let query = ImageQuery::new(
                row.location(),
                panel.heading,
                CameraSettings::for_grid_panel(self.grid.fov, panel.pitch),
            );
            let path = self.layout.panel_path(row.index, panel.index);
            fetched_any |= fetch_to(self.oracle, &query, &path).await?;
        }

        let rows: Vec<Vec<PathBuf>> = self
            .grid
            .rows_of_indices()
            .into_iter()
            .map(|panel_row| {
                panel_row
                    .into_iter()
                    .map(|p| self.layout.panel_path(row.index, p))
                    .collect()
            })
            .collect();
        let composite = self.layout.composite_path(row.index);
        self.compositor.compose(&rows, &self.crop, &composite).await?;

        row.downloaded_grid = true;
        Ok(fetched_any)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use streetcrawl_media::MediaResult;
    use streetcrawl_models::LatLon;
    use streetcrawl_provider::{ProviderError, ProviderResult};
    use tempfile::TempDir;

    /// Records queries and fails for one heading.
    #[derive(Default)]
    struct StubImages {
        queries: Mutex<Vec<ImageQuery>>,
        fail_heading: Option<f64>,
        empty_heading: Option<f64>,
    }

    #[async_trait]
    impl ImageOracle for StubImages {
        async fn fetch_image(&self, query: &ImageQuery) -> ProviderResult<Vec<u8>> {
            self.queries.lock().unwrap().push(query.clone());
            if self.fail_heading == Some(query.heading) {
                return Err(ProviderError::RateLimited {
                    retry_after_ms: None,
                });
            }
            if self.empty_heading == Some(query.heading) {
                return Ok(Vec::new());
            }
            Ok(format!("img@{}", query.heading).into_bytes())
        }
    }

    /// Writes the row layout it was asked to compose.
    #[derive(Default)]
    struct StubCompositor {
        calls: Mutex<Vec<Vec<Vec<PathBuf>>>>,
    }

    #[async_trait]
    impl GridCompositor for StubCompositor {
        async fn compose(&self, rows: &[Vec<PathBuf>], _crop: &str, output: &Path) -> MediaResult<()> {
            self.calls.lock().unwrap().push(rows.to_vec());
            fs::write(output, b"composite").await?;
            Ok(())
        }
    }

    fn itinerary() -> Itinerary {
        Itinerary::from_ordered(vec![
            Waypoint::new(0, LatLon::new(0.0, 0.0), 90.0),
            Waypoint::new(1, LatLon::new(0.0, 0.001), 90.0),
            Waypoint::new(2, LatLon::new(0.0, 0.002), 180.0),
        ])
    }

    #[test]
    fn test_photo_layout_names() {
        let layout = PhotoLayout::new("/p", "route", ".jpg");
        assert_eq!(layout.single_path(3), PathBuf::from("/p/route_3.jpg"));
        assert_eq!(layout.panel_path(3, 5), PathBuf::from("/p/route3_5.jpg"));
        assert_eq!(layout.composite_path(3), PathBuf::from("/p/composite-route-3.jpg"));
    }

    #[tokio::test]
    async fn test_single_capture_marks_rows_and_skips_existing() {
        let dir = TempDir::new().unwrap();
        let layout = PhotoLayout::new(dir.path(), "trip", "jpg");
        std::fs::write(layout.single_path(1), b"old").unwrap();

        let oracle = StubImages::default();
        let mut itin = itinerary();
        let capture = SingleCapture::new(&oracle, layout.clone());

        let report = capture.run(&mut itin, &CaptureOptions::default()).await.unwrap();

        assert_eq!(report.downloaded(), 2);
        assert_eq!(report.already_on_disk(), 1);
        assert_eq!(oracle.queries.lock().unwrap().len(), 2);
        assert!(itin.iter().all(|r| r.downloaded_single));
        assert_eq!(std::fs::read(layout.single_path(1)).unwrap(), b"old");
        assert_eq!(std::fs::read(layout.single_path(2)).unwrap(), b"img@180");

        // Second pass does nothing
        let again = capture.run(&mut itin, &CaptureOptions::default()).await.unwrap();
        assert_eq!(again.skipped(), 3);
        assert_eq!(oracle.queries.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_single_capture_failure_leaves_row_unmarked() {
        let dir = TempDir::new().unwrap();
        let oracle = StubImages {
            fail_heading: Some(180.0),
            ..Default::default()
        };
        let mut itin = itinerary();
        let options = CaptureOptions::default().with_indices(vec![2, 0]);

        let report = SingleCapture::new(&oracle, PhotoLayout::new(dir.path(), "trip", "jpg"))
            .run(&mut itin, &options)
            .await
            .unwrap();

        assert_eq!(report.rows[0].index, 2);
        assert!(matches!(report.rows[0].outcome, CaptureOutcome::Failed(_)));
        assert_eq!(report.rows[1].outcome, CaptureOutcome::Downloaded);
        assert!(!itin.get(2).unwrap().downloaded_single);
        assert!(!itin.get(1).unwrap().downloaded_single);
    }

    #[tokio::test]
    async fn test_empty_file_is_refetched() {
        let dir = TempDir::new().unwrap();
        let layout = PhotoLayout::new(dir.path(), "trip", "jpg");
        // Left behind by an interrupted run
        std::fs::write(layout.single_path(0), b"").unwrap();

        let oracle = StubImages::default();
        let mut itin = itinerary();
        let options = CaptureOptions::default().with_indices(vec![0]);
        let report = SingleCapture::new(&oracle, layout.clone())
            .run(&mut itin, &options)
            .await
            .unwrap();

        assert_eq!(report.rows[0].outcome, CaptureOutcome::Downloaded);
        assert_eq!(std::fs::read(layout.single_path(0)).unwrap(), b"img@90");
        assert!(!layout.single_path(0).with_extension("tmp").exists());
    }

    #[tokio::test]
    async fn test_empty_image_is_a_row_failure() {
        let dir = TempDir::new().unwrap();
        let layout = PhotoLayout::new(dir.path(), "trip", "jpg");
        let oracle = StubImages {
            empty_heading: Some(180.0),
            ..Default::default()
        };
        let mut itin = itinerary();

        let report = SingleCapture::new(&oracle, layout.clone())
            .run(&mut itin, &CaptureOptions::default())
            .await
            .unwrap();

        assert_eq!(report.downloaded(), 2);
        assert_eq!(report.failed(), 1);
        assert!(!itin.get(2).unwrap().downloaded_single);
        assert!(!layout.single_path(2).exists());
    }

    #[tokio::test]
    async fn test_unknown_index_is_rejected_before_fetching() {
        let dir = TempDir::new().unwrap();
        let oracle = StubImages::default();
        let mut itin = itinerary();
        let options = CaptureOptions::default().with_indices(vec![0, 7]);

        let result = SingleCapture::new(&oracle, PhotoLayout::new(dir.path(), "trip", "jpg"))
            .run(&mut itin, &options)
            .await;

        assert!(matches!(result, Err(CrawlError::CaptureFailed(_))));
        assert!(oracle.queries.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_grid_capture_fetches_panels_and_composes() {
        let dir = TempDir::new().unwrap();
        let layout = PhotoLayout::new(dir.path(), "trip", "jpg");
        let oracle = StubImages::default();
        let compositor = StubCompositor::default();
        let grid = GridLayout::new(2, 2, 30.0, 30.0, 15.0).unwrap();
        let mut itin = itinerary();
        let options = CaptureOptions::default().with_indices(vec![1]);

        let report = GridCapture::new(&oracle, &compositor, layout.clone(), grid)
            .run(&mut itin, &options)
            .await
            .unwrap();

        assert_eq!(report.downloaded(), 1);
        assert!(itin.get(1).unwrap().downloaded_grid);
        assert!(!itin.get(0).unwrap().downloaded_grid);

        let queries = oracle.queries.lock().unwrap();
        let headings: Vec<f64> = queries.iter().map(|q| q.heading).collect();
        assert_eq!(headings, vec![75.0, 105.0, 75.0, 105.0]);
        assert_eq!(queries[0].camera.pitch, 30.0);
        assert_eq!(queries[2].camera.pitch, 0.0);
        assert_eq!(queries[0].camera.size, "640x640");
        assert_eq!(queries[0].camera.fov, 30.0);

        let calls = compositor.calls.lock().unwrap();
        assert_eq!(
            calls[0],
            vec![
                vec![layout.panel_path(1, 0), layout.panel_path(1, 1)],
                vec![layout.panel_path(1, 2), layout.panel_path(1, 3)],
            ]
        );
        assert!(layout.composite_path(1).exists());
    }
}
