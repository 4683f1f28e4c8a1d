//! Command-line interface.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::capture::CaptureOptions;

/// streetcrawl - turn a route into Street View imagery and video
#[derive(Parser, Debug)]
#[command(name = "streetcrawl")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Override the photo directory
    #[arg(long, global = true)]
    pub photo_dir: Option<PathBuf>,

    /// Override the photo file extension
    #[arg(long, global = true)]
    pub ext: Option<String>,
}

/// Row selection shared by probing and capture.
#[derive(Args, Debug, Clone, Default)]
pub struct RowSelection {
    /// Only these rows (comma separated); all rows when omitted
    #[arg(short, long, value_delimiter = ',')]
    pub indices: Vec<usize>,
}

impl RowSelection {
    pub fn capture_options(&self, redownload: bool) -> CaptureOptions {
        let options = CaptureOptions::default().with_redownload(redownload);
        if self.indices.is_empty() {
            options
        } else {
            options.with_indices(self.indices.clone())
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build an itinerary from a route file
    Plan {
        /// Route file: `[[lat, lon], ...]` or `{"name": .., "points": [..]}`
        route: PathBuf,

        /// Itinerary output file
        #[arg(short, long)]
        output: PathBuf,

        /// Rows ahead used to aim the camera
        #[arg(long, default_value = "1")]
        lookahead: usize,

        /// Densify the route to roughly this spacing in meters
        #[arg(long)]
        hop: Option<f64>,
    },

    /// Look up panorama metadata for itinerary rows
    Probe {
        itinerary: PathBuf,

        /// Write here instead of updating the input
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        rows: RowSelection,

        /// Probe rows that already have a status
        #[arg(long)]
        redo: bool,
    },

    /// Dedup, filter and expand turns of a probed itinerary
    Process {
        itinerary: PathBuf,

        #[arg(short, long)]
        output: PathBuf,
    },

    /// Download one image per row
    Capture {
        itinerary: PathBuf,

        /// File stem for the images
        #[arg(short, long)]
        stem: String,

        #[command(flatten)]
        rows: RowSelection,

        /// Fetch rows already marked as downloaded
        #[arg(long)]
        redownload: bool,
    },

    /// Download a zoomed-in panel grid per row and compose it
    CaptureGrid {
        itinerary: PathBuf,

        #[arg(short, long)]
        stem: String,

        #[command(flatten)]
        rows: RowSelection,

        #[arg(long)]
        redownload: bool,

        /// Panel columns
        #[arg(long)]
        columns: Option<usize>,

        /// Panel rows
        #[arg(long)]
        grid_rows: Option<usize>,

        /// Field of view of each panel
        #[arg(long)]
        fov: Option<f64>,

        /// Angle between neighbouring panels
        #[arg(long)]
        fov_step: Option<f64>,

        /// Pitch at the vertical centre of the grid
        #[arg(long, allow_hyphen_values = true)]
        pitch: Option<f64>,
    },

    /// Renumber captured frames into a gapless sequence
    Lineup {
        #[arg(short, long)]
        stem: String,

        /// Output directory
        #[arg(short, long)]
        out_dir: Option<PathBuf>,

        /// Move files instead of copying them
        #[arg(long = "move")]
        move_files: bool,
    },

    /// Encode a lined-up sequence into a video
    Encode {
        #[arg(short, long)]
        stem: String,

        /// Directory holding the lined-up frames
        #[arg(long)]
        frames_dir: Option<PathBuf>,

        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Input frame rate
        #[arg(short, long, default_value = "1")]
        rate: u32,

        /// Skip motion interpolation
        #[arg(long)]
        no_interpolate: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_capture_grid() {
        let cli = Cli::parse_from([
            "streetcrawl",
            "capture-grid",
            "final.json",
            "--stem",
            "bridge",
            "--indices",
            "3,5",
            "--pitch",
            "-10",
            "--ext",
            "png",
        ]);

        assert_eq!(cli.ext.as_deref(), Some("png"));
        match cli.command {
            Commands::CaptureGrid {
                stem, rows, pitch, ..
            } => {
                assert_eq!(stem, "bridge");
                assert_eq!(rows.indices, vec![3, 5]);
                assert_eq!(pitch, Some(-10.0));
                assert_eq!(
                    rows.capture_options(false).indices,
                    Some(vec![3, 5])
                );
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_plan_defaults() {
        let cli = Cli::parse_from(["streetcrawl", "plan", "route.json", "-o", "it.json"]);
        match cli.command {
            Commands::Plan {
                lookahead, hop, ..
            } => {
                assert_eq!(lookahead, 1);
                assert!(hop.is_none());
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}
