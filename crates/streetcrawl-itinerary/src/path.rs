//! Path post-processing: dedup, acceptance filter and turn expansion.
//!
//! A probed itinerary usually contains several queries that resolved to the
//! same panorama, rows without usable imagery, and abrupt heading changes at
//! corners. [`PathProcessor`] turns it into a clean, dense itinerary where
//! every sharp turn is replaced by a stationary pan, one heading step at a
//! time.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use streetcrawl_models::{Itinerary, PanoStatus, Waypoint};

use crate::error::{ItineraryError, ItineraryResult};
use crate::geo::{check_turn_step, sweep};

/// Default copyright marker of accepted imagery.
pub const DEFAULT_PROVIDER_COPYRIGHT: &str = "Google";

/// Default heading change (degrees) above which a transition is a turn.
pub const DEFAULT_TURN_THRESHOLD_DEG: f64 = 5.0;

/// Default heading step (degrees) between synthetic pan rows.
pub const DEFAULT_TURN_STEP_DEG: f64 = 1.0;

// Synthetic rows sit strictly between two anchors, inside this span.
const FIRST_SLOT: f64 = 0.01;
const LAST_SLOT: f64 = 0.99;

fn default_provider_copyright() -> String {
    DEFAULT_PROVIDER_COPYRIGHT.to_string()
}

fn default_turn_threshold() -> f64 {
    DEFAULT_TURN_THRESHOLD_DEG
}

fn default_turn_step() -> f64 {
    DEFAULT_TURN_STEP_DEG
}

/// Acceptance and turn policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathPolicy {
    /// Rows are kept only if their copyright contains this string
    #[serde(default = "default_provider_copyright")]
    pub provider_copyright: String,

    #[serde(default = "default_turn_threshold")]
    pub turn_threshold_deg: f64,

    #[serde(default = "default_turn_step")]
    pub turn_step_deg: f64,
}

impl Default for PathPolicy {
    fn default() -> Self {
        Self {
            provider_copyright: default_provider_copyright(),
            turn_threshold_deg: default_turn_threshold(),
            turn_step_deg: default_turn_step(),
        }
    }
}

impl PathPolicy {
    pub fn with_provider_copyright(mut self, copyright: impl Into<String>) -> Self {
        self.provider_copyright = copyright.into();
        self
    }

    pub fn with_turn_threshold(mut self, degrees: f64) -> Self {
        self.turn_threshold_deg = degrees;
        self
    }

    pub fn with_turn_step(mut self, degrees: f64) -> Self {
        self.turn_step_deg = degrees;
        self
    }

    fn accepts(&self, row: &Waypoint) -> bool {
        row.status == PanoStatus::Ok && row.copyright.contains(&self.provider_copyright)
    }
}

/// Row counts for one processing pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PathSummary {
    pub input_rows: usize,
    pub duplicates_dropped: usize,
    pub rejected: usize,
    pub turns: usize,
    pub synthetic_rows: usize,
    pub output_rows: usize,
}

/// Produces finalized itineraries from probed ones.
#[derive(Debug, Clone)]
pub struct PathProcessor {
    policy: PathPolicy,
}

impl PathProcessor {
    /// Create a processor, rejecting policies that cannot produce a sweep.
    pub fn new(policy: PathPolicy) -> ItineraryResult<Self> {
        check_turn_step(policy.turn_step_deg)?;
        if !policy.turn_threshold_deg.is_finite() || policy.turn_threshold_deg < 0.0 {
            return Err(ItineraryError::invalid_input(format!(
                "turn threshold must be non-negative, got {}",
                policy.turn_threshold_deg
            )));
        }
        Ok(Self { policy })
    }

    pub fn policy(&self) -> &PathPolicy {
        &self.policy
    }

    /// Build the finalized itinerary. The input is left untouched.
    pub fn process(&self, itinerary: &Itinerary) -> Itinerary {
        self.process_with_summary(itinerary).0
    }

    pub fn process_with_summary(&self, itinerary: &Itinerary) -> (Itinerary, PathSummary) {
        let mut summary = PathSummary {
            input_rows: itinerary.len(),
            ..Default::default()
        };

        let unique = dedup_by_pano(itinerary.rows());
        summary.duplicates_dropped = itinerary.len() - unique.len();

        let accepted: Vec<Waypoint> = unique
            .into_iter()
            .filter(|row| self.policy.accepts(row))
            .cloned()
            .collect();
        summary.rejected = itinerary.len() - summary.duplicates_dropped - accepted.len();
        let accepted = Itinerary::from_ordered(accepted);

        let (finalized, turns, synthetic) = self.expand_turns(accepted);
        summary.turns = turns;
        summary.synthetic_rows = synthetic;
        summary.output_rows = finalized.len();

        info!(
            input = summary.input_rows,
            duplicates = summary.duplicates_dropped,
            rejected = summary.rejected,
            turns = summary.turns,
            synthetic = summary.synthetic_rows,
            output = summary.output_rows,
            "Processed itinerary path"
        );

        (finalized, summary)
    }

    /// Insert pan rows at every sharp turn. Returns the finalized itinerary,
    /// the number of turns and the number of synthetic rows.
    fn expand_turns(&self, accepted: Itinerary) -> (Itinerary, usize, usize) {
        let rows = accepted.into_rows();
        if rows.len() < 2 {
            return (Itinerary::from_ordered(rows), 0, 0);
        }

        let mut keyed: Vec<(f64, Waypoint)> = Vec::with_capacity(rows.len());
        let mut turns = 0;

        for (i, pair) in rows.windows(2).enumerate() {
            let (from, to) = (&pair[0], &pair[1]);
            let delta = to.heading - from.heading;
            if delta.abs() <= self.policy.turn_threshold_deg {
                continue;
            }
            turns += 1;

            let headings = sweep(from.heading, to.heading, self.policy.turn_step_deg);
            let inner = match headings.len() {
                0..=2 => &headings[..0],
                n => &headings[1..n - 1],
            };
            debug!(
                row = i,
                from = from.heading,
                to = to.heading,
                synthetic = inner.len(),
                "Expanding turn"
            );

            for (slot, heading) in slots(inner.len()).zip(inner) {
                let mut pan = from.clone();
                pan.heading = *heading;
                keyed.push((i as f64 + slot, pan));
            }
        }

        let synthetic = keyed.len();
        keyed.extend(rows.into_iter().enumerate().map(|(i, row)| (i as f64, row)));
        // Stable: equal keys keep insertion order
        keyed.sort_by(|a, b| a.0.total_cmp(&b.0));

        (
            Itinerary::from_ordered(keyed.into_iter().map(|(_, row)| row)),
            turns,
            synthetic,
        )
    }
}

/// Keep the lowest-index row of every panorama, in input order. Rows
/// without a pano id are never merged.
fn dedup_by_pano(rows: &[Waypoint]) -> Vec<&Waypoint> {
    let mut owner: HashMap<&str, usize> = HashMap::new();
    for (pos, row) in rows.iter().enumerate() {
        if row.pano_id.is_empty() {
            continue;
        }
        owner
            .entry(row.pano_id.as_str())
            .and_modify(|kept| {
                if row.index < rows[*kept].index {
                    *kept = pos;
                }
            })
            .or_insert(pos);
    }

    rows.iter()
        .enumerate()
        .filter(|(pos, row)| row.pano_id.is_empty() || owner.get(row.pano_id.as_str()) == Some(pos))
        .map(|(_, row)| row)
        .collect()
}

/// Evenly spaced fractional offsets in `[FIRST_SLOT, LAST_SLOT]`.
fn slots(n: usize) -> impl Iterator<Item = f64> {
    (0..n).map(move |k| {
        if n == 1 {
            FIRST_SLOT
        } else {
            FIRST_SLOT + (LAST_SLOT - FIRST_SLOT) * k as f64 / (n - 1) as f64
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use streetcrawl_models::LatLon;

    fn accepted(index: usize, pano: &str, heading: f64) -> Waypoint {
        let mut row = Waypoint::new(index, LatLon::new(0.0, index as f64 * 0.001), heading);
        row.status = PanoStatus::Ok;
        row.copyright = "© 2019 Google".to_string();
        row.date = "2019-05".to_string();
        row.pano_id = pano.to_string();
        row
    }

    fn processor() -> PathProcessor {
        PathProcessor::new(PathPolicy::default()).unwrap()
    }

    #[test]
    fn test_dedup_keeps_lowest_index() {
        let rows: Vec<Waypoint> = (0..8)
            .map(|i| {
                let pano = match i {
                    3 | 7 => "X".to_string(),
                    _ => format!("p{}", i),
                };
                accepted(i, &pano, 90.0)
            })
            .collect();
        let itinerary = Itinerary::from_ordered(rows);

        let (out, summary) = processor().process_with_summary(&itinerary);

        assert_eq!(summary.duplicates_dropped, 1);
        let x_rows: Vec<&Waypoint> = out.iter().filter(|r| r.pano_id == "X").collect();
        assert_eq!(x_rows.len(), 1);
        // Original row 3 has lon 0.003 and lands at position 3
        assert_eq!(x_rows[0].index, 3);
        assert_eq!(x_rows[0].lon, 3.0 * 0.001);
    }

    #[test]
    fn test_dedup_prefers_index_over_position() {
        let rows = vec![accepted(7, "X", 0.0), accepted(3, "X", 0.0)];
        let kept = dedup_by_pano(&rows);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].index, 3);
    }

    #[test]
    fn test_empty_pano_ids_are_not_merged() {
        let rows = vec![accepted(0, "", 0.0), accepted(1, "", 0.0)];
        assert_eq!(dedup_by_pano(&rows).len(), 2);
    }

    #[test]
    fn test_filter_rejects_status_and_copyright() {
        let mut denied = accepted(1, "b", 0.0);
        denied.status = PanoStatus::ZeroResults;
        let mut foreign = accepted(2, "c", 0.0);
        foreign.copyright = "© Someone Else".to_string();
        let itinerary = Itinerary::from_ordered(vec![
            accepted(0, "a", 0.0),
            denied,
            foreign,
            accepted(3, "d", 0.0),
        ]);

        let (out, summary) = processor().process_with_summary(&itinerary);

        assert_eq!(summary.rejected, 2);
        assert_eq!(out.indices(), vec![0, 1]);
        assert_eq!(out.get(1).unwrap().pano_id, "d");
    }

    #[test]
    fn test_custom_provider_copyright() {
        let mut row = accepted(0, "a", 0.0);
        row.copyright = "© Mapillary".to_string();
        let itinerary = Itinerary::from_ordered(vec![row]);

        let processor =
            PathProcessor::new(PathPolicy::default().with_provider_copyright("Mapillary"))
                .unwrap();

        assert_eq!(processor.process(&itinerary).len(), 1);
        assert!(self::processor().process(&itinerary).is_empty());
    }

    #[test]
    fn test_turn_expansion_inserts_pan_rows() {
        let itinerary = Itinerary::from_ordered(vec![
            accepted(0, "a", 0.0),
            accepted(1, "b", 0.0),
            accepted(2, "c", 30.0),
        ]);

        let (out, summary) = processor().process_with_summary(&itinerary);

        assert_eq!(summary.turns, 1);
        assert_eq!(summary.synthetic_rows, 28);
        assert_eq!(out.len(), 31);
        assert_eq!(out.indices(), (0..31).collect::<Vec<_>>());
        assert!(out.is_dense());

        // Pan rows copy row 1 except for the heading
        let anchor = out.get(1).unwrap();
        assert_eq!(anchor.pano_id, "b");
        for pan in &out.rows()[2..30] {
            assert_eq!(pan.pano_id, "b");
            assert_eq!(pan.lon, anchor.lon);
            assert!(pan.heading > 0.0 && pan.heading < 30.0);
        }
        let headings: Vec<f64> = out.iter().map(|r| r.heading).collect();
        assert!(headings[1..30].windows(2).all(|w| w[0] < w[1]));
        assert_eq!(out.get(30).unwrap().pano_id, "c");
    }

    #[test]
    fn test_turn_across_north_pans_the_short_way() {
        let itinerary = Itinerary::from_ordered(vec![
            accepted(0, "a", 350.0),
            accepted(1, "b", 10.0),
        ]);

        let out = processor().process(&itinerary);

        assert_eq!(out.get(0).unwrap().heading, 350.0);
        assert_eq!(out.get(out.len() - 1).unwrap().heading, 10.0);
        for pan in &out.rows()[1..out.len() - 1] {
            assert!(pan.heading > 349.0 || pan.heading < 11.0, "{}", pan.heading);
        }
    }

    #[test]
    fn test_small_heading_changes_are_not_turns() {
        let itinerary = Itinerary::from_ordered(vec![
            accepted(0, "a", 90.0),
            accepted(1, "b", 95.0),
            accepted(2, "c", 91.0),
        ]);

        let (out, summary) = processor().process_with_summary(&itinerary);

        assert_eq!(summary.turns, 0);
        assert_eq!(out.len(), 3);
    }

    #[test]
    fn test_process_leaves_input_untouched() {
        let itinerary = Itinerary::from_ordered(vec![
            accepted(0, "a", 0.0),
            accepted(1, "a", 90.0),
            accepted(2, "c", 180.0),
        ]);
        let before = itinerary.clone();

        let _ = processor().process(&itinerary);

        assert_eq!(itinerary, before);
    }

    #[test]
    fn test_single_or_empty_input() {
        let single = Itinerary::from_ordered(vec![accepted(4, "a", 0.0)]);
        let out = processor().process(&single);
        assert_eq!(out.indices(), vec![0]);

        assert!(processor().process(&Itinerary::new()).is_empty());
    }

    #[test]
    fn test_rejects_bad_policy() {
        assert!(PathProcessor::new(PathPolicy::default().with_turn_step(0.0)).is_err());
        assert!(matches!(
            PathProcessor::new(PathPolicy::default().with_turn_step(1e-12)),
            Err(ItineraryError::InvalidInput(_))
        ));
        assert!(PathProcessor::new(PathPolicy::default().with_turn_threshold(f64::NAN)).is_err());
    }

    #[test]
    fn test_slots_are_strictly_inside() {
        let keys: Vec<f64> = slots(5).collect();
        assert_eq!(keys.len(), 5);
        assert!((keys[0] - 0.01).abs() < 1e-12);
        assert!((keys[4] - 0.99).abs() < 1e-12);
        assert_eq!(slots(1).collect::<Vec<_>>(), vec![0.01]);
    }
}
