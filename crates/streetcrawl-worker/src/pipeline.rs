//! Command handlers.
//!
//! Each step reads its input from disk, runs one stage and writes its result
//! back, so a crawl can be stopped and resumed between any two steps.

use std::path::{Path, PathBuf};

use tracing::info;

use streetcrawl_itinerary::{
    densify, store, ItineraryBuilder, ItineraryProbe, MetadataOracle, PathProcessor, PathSummary,
    ProbeReport,
};
use streetcrawl_media::{
    scan_frames, ByteComparator, FrameEncoder, GridCompositor, MediaError, SequenceAssembler,
    TransferMode,
};
use streetcrawl_models::{FrameSequence, Itinerary, Route, SequencedFrame};
use streetcrawl_provider::ImageOracle;

use crate::capture::{CaptureOptions, CaptureReport, GridCapture, PhotoLayout, SingleCapture};
use crate::config::CrawlConfig;
use crate::error::CrawlResult;

/// Route file to a fresh itinerary. With `hop_meters`, route segments are
/// first densified to roughly that spacing.
pub async fn plan(
    route_path: &Path,
    output: &Path,
    lookahead: usize,
    hop_meters: Option<f64>,
) -> CrawlResult<Itinerary> {
    let points = store::load_points(route_path).await?;
    let points = match hop_meters {
        Some(hop) => densify(
            &Route {
                name: String::new(),
                points,
            },
            hop,
        )?,
        None => points,
    };

    let itinerary = ItineraryBuilder::new()
        .with_lookahead(lookahead)
        .build(&points)?;
    store::save(&itinerary, output).await?;

    info!("Planned {} rows into {}", itinerary.len(), output.display());
    Ok(itinerary)
}

/// Probe rows of a stored itinerary and write it back. All rows when
/// `indices` is empty.
pub async fn probe_file<O: MetadataOracle + ?Sized>(
    config: &CrawlConfig,
    oracle: &O,
    input: &Path,
    output: &Path,
    indices: &[usize],
    redo: bool,
) -> CrawlResult<ProbeReport> {
    let mut itinerary = store::load(input).await?;
    let indices = if indices.is_empty() {
        itinerary.indices()
    } else {
        indices.to_vec()
    };

    let report = ItineraryProbe::new(oracle)
        .with_camera(config.camera.clone())
        .probe(&mut itinerary, &indices, redo)
        .await?;
    store::save(&itinerary, output).await?;
    Ok(report)
}

/// Finalize a probed itinerary: dedup, filter and expand turns.
pub async fn process_file(
    config: &CrawlConfig,
    input: &Path,
    output: &Path,
) -> CrawlResult<PathSummary> {
    let itinerary = store::load(input).await?;
    let processor = PathProcessor::new(config.path_policy.clone())?;
    let (finalized, summary) = processor.process_with_summary(&itinerary);
    store::save(&finalized, output).await?;

    info!(
        input_rows = summary.input_rows,
        output_rows = summary.output_rows,
        turns = summary.turns,
        "Processed itinerary into {}",
        output.display()
    );
    Ok(summary)
}

/// Single-image capture; download flags are saved back to `input`.
pub async fn capture_file<O: ImageOracle + ?Sized>(
    config: &CrawlConfig,
    oracle: &O,
    input: &Path,
    stem: &str,
    options: &CaptureOptions,
) -> CrawlResult<CaptureReport> {
    let mut itinerary = store::load(input).await?;
    let layout = PhotoLayout::new(&config.photo_dir, stem, &config.photo_ext);

    let report = SingleCapture::new(oracle, layout)
        .with_camera(config.camera.clone())
        .run(&mut itinerary, options)
        .await?;
    store::save(&itinerary, input).await?;
    Ok(report)
}

/// Grid capture; download flags are saved back to `input`.
pub async fn capture_grid_file<O, C>(
    config: &CrawlConfig,
    oracle: &O,
    compositor: &C,
    input: &Path,
    stem: &str,
    options: &CaptureOptions,
) -> CrawlResult<CaptureReport>
where
    O: ImageOracle + ?Sized,
    C: GridCompositor + ?Sized,
{
    let mut itinerary = store::load(input).await?;
    let layout = PhotoLayout::new(&config.photo_dir, stem, &config.photo_ext);

    let report = GridCapture::new(oracle, compositor, layout, config.grid)
        .run(&mut itinerary, options)
        .await?;
    store::save(&itinerary, input).await?;
    Ok(report)
}

/// Collapse the captured `{stem}_{n}` frames into a gapless sequence under
/// `out_dir`.
pub async fn lineup(
    config: &CrawlConfig,
    stem: &str,
    out_dir: &Path,
    mode: TransferMode,
) -> CrawlResult<FrameSequence> {
    let frames = scan_frames(&config.photo_dir, stem, &config.photo_ext).await?;
    if frames.is_empty() {
        return Err(MediaError::EmptySequence.into());
    }

    let sequence = SequenceAssembler::new(ByteComparator)
        .assemble(frames, out_dir, stem, &config.photo_ext, mode)
        .await?;
    Ok(sequence)
}

/// Read back a lined-up sequence from disk.
pub async fn load_sequence(
    config: &CrawlConfig,
    frames_dir: &Path,
    stem: &str,
) -> CrawlResult<FrameSequence> {
    let mut frames = scan_frames(frames_dir, stem, &config.photo_ext).await?;
    frames.sort_by_key(|f| f.number);

    let mut sequence = FrameSequence::new(frames_dir, stem, &config.photo_ext);
    sequence.frames = frames
        .into_iter()
        .map(|f| SequencedFrame {
            number: f.number,
            original_number: f.number,
            source: f.path.clone(),
            path: f.path,
        })
        .collect();
    Ok(sequence)
}

/// Encode a lined-up sequence. Defaults the output to
/// `{video_dir}/{stem}.mp4`.
pub async fn encode<E: FrameEncoder + ?Sized>(
    config: &CrawlConfig,
    encoder: &E,
    frames_dir: &Path,
    stem: &str,
    frame_rate: u32,
    output: Option<PathBuf>,
) -> CrawlResult<PathBuf> {
    let sequence = load_sequence(config, frames_dir, stem).await?;
    let output = output.unwrap_or_else(|| config.video_dir.join(format!("{}.mp4", stem)));

    encoder.encode(&sequence, frame_rate, &output).await?;

    info!(frames = sequence.len(), "Encoded {}", output.display());
    Ok(output)
}
