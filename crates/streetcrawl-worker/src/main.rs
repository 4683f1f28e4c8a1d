//! streetcrawl binary.

use anyhow::Context;
use clap::Parser;
use tracing::{info, Instrument};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use streetcrawl_itinerary::GridLayout;
use streetcrawl_media::{ConvertCompositor, FfmpegEncoder, TransferMode};
use streetcrawl_provider::StreetViewClient;
use streetcrawl_worker::cli::{Cli, Commands};
use streetcrawl_worker::{pipeline, CrawlConfig, CrawlLogger};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Colored output for dev, JSON for production
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::from_default_env().add_directive("streetcrawl=info".parse()?);

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }

    let cli = Cli::parse();

    let mut config = CrawlConfig::from_env();
    if let Some(dir) = cli.photo_dir {
        config.photo_dir = dir;
    }
    if let Some(ext) = cli.ext {
        config.photo_ext = ext.trim_start_matches('.').to_string();
    }

    let logger = CrawlLogger::new(command_name(&cli.command));
    let span = logger.create_span();
    logger.log_start(&format!("{:?}", cli.command));

    let result = run(cli.command, config, &logger).instrument(span).await;
    match &result {
        Ok(()) => logger.log_completion("done"),
        Err(e) => logger.log_error(&format!("{:#}", e)),
    }
    result
}

fn command_name(command: &Commands) -> &'static str {
    match command {
        Commands::Plan { .. } => "plan",
        Commands::Probe { .. } => "probe",
        Commands::Process { .. } => "process",
        Commands::Capture { .. } => "capture",
        Commands::CaptureGrid { .. } => "capture_grid",
        Commands::Lineup { .. } => "lineup",
        Commands::Encode { .. } => "encode",
    }
}

async fn run(command: Commands, mut config: CrawlConfig, logger: &CrawlLogger) -> anyhow::Result<()> {
    match command {
        Commands::Plan {
            route,
            output,
            lookahead,
            hop,
        } => {
            let itinerary = pipeline::plan(&route, &output, lookahead, hop).await?;
            logger.log_progress(&format!("{} rows planned", itinerary.len()));
        }

        Commands::Probe {
            itinerary,
            output,
            rows,
            redo,
        } => {
            config.validate()?;
            let client = StreetViewClient::from_env().context("creating Street View client")?;
            let output = output.unwrap_or_else(|| itinerary.clone());
            let report =
                pipeline::probe_file(&config, &client, &itinerary, &output, &rows.indices, redo)
                    .await?;
            if report.failed() > 0 {
                logger.log_warning(&format!(
                    "{} rows failed; re-run with --redo to retry them",
                    report.failed()
                ));
            }
        }

        Commands::Process { itinerary, output } => {
            config.validate()?;
            let summary = pipeline::process_file(&config, &itinerary, &output).await?;
            logger.log_progress(&format!(
                "{} rows in, {} rejected, {} duplicates, {} rows out",
                summary.input_rows, summary.rejected, summary.duplicates_dropped, summary.output_rows
            ));
        }

        Commands::Capture {
            itinerary,
            stem,
            rows,
            redownload,
        } => {
            let client = StreetViewClient::from_env().context("creating Street View client")?;
            let options = rows.capture_options(redownload);
            let report =
                pipeline::capture_file(&config, &client, &itinerary, &stem, &options).await?;
            if report.failed() > 0 {
                logger.log_warning(&format!("{} rows failed to download", report.failed()));
            }
        }

        Commands::CaptureGrid {
            itinerary,
            stem,
            rows,
            redownload,
            columns,
            grid_rows,
            fov,
            fov_step,
            pitch,
        } => {
            let defaults = config.grid;
            config.grid = GridLayout::new(
                columns.unwrap_or(defaults.columns),
                grid_rows.unwrap_or(defaults.rows),
                fov.unwrap_or(defaults.fov),
                fov_step.unwrap_or(defaults.fov_step),
                pitch.unwrap_or(defaults.pitch),
            )?;
            config.validate()?;

            let client = StreetViewClient::from_env().context("creating Street View client")?;
            let compositor = ConvertCompositor::new();
            let options = rows.capture_options(redownload);
            let report = pipeline::capture_grid_file(
                &config,
                &client,
                &compositor,
                &itinerary,
                &stem,
                &options,
            )
            .await?;
            if report.failed() > 0 {
                logger.log_warning(&format!("{} rows failed to capture", report.failed()));
            }
        }

        Commands::Lineup {
            stem,
            out_dir,
            move_files,
        } => {
            let out_dir = out_dir.unwrap_or_else(|| config.lineup_dir.clone());
            let mode = if move_files {
                TransferMode::Move
            } else {
                TransferMode::Copy
            };
            let sequence = pipeline::lineup(&config, &stem, &out_dir, mode).await?;
            info!("{} frames lined up in {}", sequence.len(), out_dir.display());
        }

        Commands::Encode {
            stem,
            frames_dir,
            output,
            rate,
            no_interpolate,
        } => {
            let mut encoding = config.encoding.clone();
            if no_interpolate {
                encoding.interpolate_fps = None;
            }
            let mut encoder = FfmpegEncoder::new(encoding);
            if let Some(secs) = config.ffmpeg_timeout_secs {
                encoder = encoder.with_timeout(secs);
            }

            let frames_dir = frames_dir.unwrap_or_else(|| config.lineup_dir.clone());
            let path = pipeline::encode(&config, &encoder, &frames_dir, &stem, rate, output).await?;
            logger.log_progress(&format!("wrote {}", path.display()));
        }
    }

    Ok(())
}
