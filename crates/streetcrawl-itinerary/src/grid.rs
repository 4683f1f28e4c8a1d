//! Grid ("tableau") panel planning.
//!
//! A grid capture replaces one wide shot with `columns x rows` zoomed-in
//! panels around the row heading, which are later stitched into a single
//! composite image.

use serde::{Deserialize, Serialize};

use crate::error::{ItineraryError, ItineraryResult};
use crate::geo::normalize_heading;

pub const DEFAULT_GRID_COLUMNS: usize = 4;
pub const DEFAULT_GRID_ROWS: usize = 2;
pub const DEFAULT_GRID_FOV: f64 = 30.0;
pub const DEFAULT_GRID_FOV_STEP: f64 = 30.0;
pub const DEFAULT_GRID_PITCH: f64 = 15.0;

/// Shape and angular spacing of a panel grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridLayout {
    pub columns: usize,
    pub rows: usize,
    /// Field of view of each panel
    pub fov: f64,
    /// Angle between neighbouring panels, horizontally and vertically
    pub fov_step: f64,
    /// Pitch at the vertical centre of the grid
    pub pitch: f64,
}

impl Default for GridLayout {
    fn default() -> Self {
        Self {
            columns: DEFAULT_GRID_COLUMNS,
            rows: DEFAULT_GRID_ROWS,
            fov: DEFAULT_GRID_FOV,
            fov_step: DEFAULT_GRID_FOV_STEP,
            pitch: DEFAULT_GRID_PITCH,
        }
    }
}

/// One panel of a grid, in absolute camera angles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridPanel {
    /// `row * columns + column`
    pub index: usize,
    pub row: usize,
    pub column: usize,
    pub heading: f64,
    pub pitch: f64,
}

impl GridLayout {
    /// Create a validated layout.
    pub fn new(columns: usize, rows: usize, fov: f64, fov_step: f64, pitch: f64) -> ItineraryResult<Self> {
        let layout = Self {
            columns,
            rows,
            fov,
            fov_step,
            pitch,
        };
        layout.validate()?;
        Ok(layout)
    }

    pub fn validate(&self) -> ItineraryResult<()> {
        if self.columns == 0 || self.rows == 0 {
            return Err(ItineraryError::invalid_grid(format!(
                "grid must have at least one column and row, got {}x{}",
                self.columns, self.rows
            )));
        }
        if !self.fov.is_finite() || self.fov <= 0.0 {
            return Err(ItineraryError::invalid_grid(format!(
                "panel fov must be positive, got {}",
                self.fov
            )));
        }
        if !self.fov_step.is_finite() || !self.pitch.is_finite() {
            return Err(ItineraryError::invalid_grid("fov step and pitch must be finite"));
        }
        Ok(())
    }

    pub fn panel_count(&self) -> usize {
        self.columns * self.rows
    }

    /// Panels around `heading`, row-major from the top-left panel.
    /// The top row looks highest.
    pub fn panels(&self, heading: f64) -> ItineraryResult<Vec<GridPanel>> {
        self.validate()?;

        let half_cols = (self.columns as f64 - 1.0) / 2.0;
        let half_rows = (self.rows as f64 - 1.0) / 2.0;

        let mut panels = Vec::with_capacity(self.panel_count());
        for row in 0..self.rows {
            let pitch = ((self.rows - 1 - row) as f64 - half_rows) * self.fov_step + self.pitch;
            for column in 0..self.columns {
                let offset = (column as f64 - half_cols) * self.fov_step;
                panels.push(GridPanel {
                    index: row * self.columns + column,
                    row,
                    column,
                    heading: normalize_heading(heading + offset),
                    pitch,
                });
            }
        }
        Ok(panels)
    }

    /// Panel indices grouped by grid row, top row first.
    pub fn rows_of_indices(&self) -> Vec<Vec<usize>> {
        (0..self.rows)
            .map(|row| (0..self.columns).map(|c| row * self.columns + c).collect())
            .collect()
    }
}
