//! Route to itinerary conversion.

use tracing::debug;

use streetcrawl_models::{Itinerary, LatLon, Waypoint};

use crate::error::{ItineraryError, ItineraryResult};
use crate::geo::{bearing, ensure_valid};

/// Builds an itinerary whose camera headings point along the route.
#[derive(Debug, Clone)]
pub struct ItineraryBuilder {
    /// Each row looks towards the point this many positions ahead
    lookahead: usize,
}

impl Default for ItineraryBuilder {
    fn default() -> Self {
        Self { lookahead: 1 }
    }
}

impl ItineraryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Orient each camera towards the Nth next point instead of the next one.
    pub fn with_lookahead(mut self, lookahead: usize) -> Self {
        self.lookahead = lookahead;
        self
    }

    /// Create one unprobed row per point.
    ///
    /// Rows without a point `lookahead` positions ahead reuse the previous
    /// row's heading, so the final row always carries the heading of the
    /// row before it.
    pub fn build(&self, points: &[LatLon]) -> ItineraryResult<Itinerary> {
        if points.len() < 2 {
            return Err(ItineraryError::InsufficientPoints {
                found: points.len(),
            });
        }
        if self.lookahead == 0 || self.lookahead >= points.len() {
            return Err(ItineraryError::invalid_input(format!(
                "lookahead must be between 1 and {}, got {}",
                points.len() - 1,
                self.lookahead
            )));
        }
        for point in points {
            ensure_valid(*point)?;
        }

        let headings = points.iter().enumerate().try_fold(
            Vec::with_capacity(points.len()),
            |mut headings: Vec<f64>, (i, point)| {
                let heading = match points.get(i + self.lookahead) {
                    Some(target) => bearing(*point, *target)?,
                    None => headings.last().copied().ok_or_else(|| {
                        ItineraryError::invalid_input("no heading to carry forward")
                    })?,
                };
                headings.push(heading);
                Ok::<_, ItineraryError>(headings)
            },
        )?;

        debug!(
            "Built itinerary with {} rows (lookahead {})",
            points.len(),
            self.lookahead
        );

        Ok(Itinerary::from_ordered(
            points
                .iter()
                .zip(headings)
                .enumerate()
                .map(|(index, (point, heading))| Waypoint::new(index, *point, heading)),
        ))
    }
}

/// Build an itinerary with the default lookahead of one point.
pub fn build(points: &[LatLon]) -> ItineraryResult<Itinerary> {
    ItineraryBuilder::new().build(points)
}
