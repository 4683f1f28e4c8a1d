//! Spherical geometry helpers.
//!
//! Distances use the haversine formula on a spherical Earth. Interpolation
//! is linear in latitude and longitude independently, which is accurate
//! enough for the short hops between neighbouring camera positions.

use streetcrawl_models::{LatLon, Route};

use crate::error::{ItineraryError, ItineraryResult};

/// Mean Earth radius used for distances, in meters.
pub const EARTH_RADIUS_M: f64 = 6_367_000.0;

/// Smallest accepted pan step, in degrees.
pub const MIN_TURN_STEP_DEG: f64 = 1e-3;

/// Most points a single `Spacing::Hop` segment may produce.
pub const MAX_SEGMENT_POINTS: usize = 1_000_000;

/// How to space interpolated points between two endpoints.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Spacing {
    /// Exactly this many points, endpoints included
    Count(usize),
    /// Enough points that consecutive ones are at most this many meters apart
    Hop(f64),
}

/// Great-circle distance between two points, in meters.
pub fn distance(a: LatLon, b: LatLon) -> f64 {
    let (lat1, lon1) = (a.lat.to_radians(), a.lon.to_radians());
    let (lat2, lon2) = (b.lat.to_radians(), b.lon.to_radians());

    let dlat = lat2 - lat1;
    let dlon = lon2 - lon1;
    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);

    // Clamp guards asin against rounding just above 1.0 for antipodal points
    2.0 * h.sqrt().min(1.0).asin() * EARTH_RADIUS_M
}

/// Initial compass bearing from `a` towards `b`, in degrees [0, 360).
pub fn bearing(a: LatLon, b: LatLon) -> ItineraryResult<f64> {
    ensure_valid(a)?;
    ensure_valid(b)?;

    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let dlon = (b.lon - a.lon).to_radians();

    let x = dlon.sin() * lat2.cos();
    let y = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * dlon.cos();

    Ok(normalize_heading(x.atan2(y).to_degrees()))
}

/// Wrap any finite angle into [0, 360).
pub fn normalize_heading(heading: f64) -> f64 {
    let wrapped = heading.rem_euclid(360.0);
    // rem_euclid can round tiny negative inputs up to exactly 360.0
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

/// Points on the straight lat/lon line from `a` to `b`.
///
/// The first point equals `a` and the last equals `b`. `Spacing::Count(0)`
/// yields no points and `Spacing::Count(1)` yields only `a`.
pub fn interpolate(a: LatLon, b: LatLon, spacing: Spacing) -> ItineraryResult<Vec<LatLon>> {
    ensure_valid(a)?;
    ensure_valid(b)?;

    let count = match spacing {
        Spacing::Count(n) => n,
        Spacing::Hop(meters) => {
            if !meters.is_finite() || meters <= 0.0 {
                return Err(ItineraryError::invalid_input(format!(
                    "hop distance must be positive, got {}",
                    meters
                )));
            }
            let needed = (distance(a, b) / meters).ceil();
            if needed > MAX_SEGMENT_POINTS as f64 {
                return Err(ItineraryError::invalid_input(format!(
                    "hop of {} m needs {} points for one segment, limit is {}",
                    meters, needed, MAX_SEGMENT_POINTS
                )));
            }
            (needed as usize).max(2)
        }
    };

    let lats = linspace(a.lat, b.lat, count);
    let lons = linspace(a.lon, b.lon, count);

    Ok(lats
        .into_iter()
        .zip(lons)
        .map(|(lat, lon)| LatLon::new(lat, lon))
        .collect())
}

/// Headings for a stationary pan from `h1` to `h2`, in steps of at most
/// `step` degrees.
///
/// Always turns the shorter way round. When the forward delta is exactly
/// 180 degrees the pan goes counter-clockwise. Both endpoints are included;
/// equal headings yield a single value.
pub fn turn_headings(h1: f64, h2: f64, step: f64) -> ItineraryResult<Vec<f64>> {
    check_turn_step(step)?;
    if !h1.is_finite() || !h2.is_finite() {
        return Err(ItineraryError::invalid_input("headings must be finite"));
    }
    Ok(sweep(h1, h2, step))
}

/// Reject pan steps that are not finite or below [`MIN_TURN_STEP_DEG`].
pub fn check_turn_step(step: f64) -> ItineraryResult<()> {
    if !step.is_finite() || step < MIN_TURN_STEP_DEG {
        return Err(ItineraryError::invalid_input(format!(
            "turn step must be at least {} degrees, got {}",
            MIN_TURN_STEP_DEG, step
        )));
    }
    Ok(())
}

/// Unchecked core of [`turn_headings`]; `step` must pass [`check_turn_step`].
pub(crate) fn sweep(h1: f64, h2: f64, step: f64) -> Vec<f64> {
    let mut start = normalize_heading(h1);
    let mut end = normalize_heading(h2);

    if start == end {
        return vec![start];
    }

    if end < start {
        end += 360.0;
    }
    let clockwise = end - start < 180.0;
    if !clockwise {
        start += 360.0;
    }

    let count = (((start - end).abs() / step).ceil() as usize).max(2);

    linspace(start, end, count)
        .into_iter()
        .map(normalize_heading)
        .collect()
}

/// Drop points identical to their predecessor.
pub fn dedup_consecutive(points: &[LatLon]) -> Vec<LatLon> {
    let mut out: Vec<LatLon> = Vec::with_capacity(points.len());
    for point in points {
        if out.last() != Some(point) {
            out.push(*point);
        }
    }
    out
}

/// Interpolate every leg of a route so consecutive points are at most
/// `hop_meters` apart. Shared leg endpoints appear once.
pub fn densify(route: &Route, hop_meters: f64) -> ItineraryResult<Vec<LatLon>> {
    if let Some(bad) = route.first_invalid() {
        return Err(ItineraryError::invalid_input(format!(
            "route point {} is not a valid coordinate: {}",
            bad, route.points[bad]
        )));
    }
    if route.points.len() < 2 {
        return Ok(route.points.clone());
    }

    let mut dense: Vec<LatLon> = Vec::new();
    for leg in route.points.windows(2) {
        let points = interpolate(leg[0], leg[1], Spacing::Hop(hop_meters))?;
        let skip = usize::from(!dense.is_empty());
        dense.extend(points.into_iter().skip(skip));
    }

    Ok(dedup_consecutive(&dense))
}

pub(crate) fn ensure_valid(point: LatLon) -> ItineraryResult<()> {
    if point.is_valid() {
        Ok(())
    } else {
        Err(ItineraryError::invalid_input(format!(
            "malformed coordinate ({}, {})",
            point.lat, point.lon
        )))
    }
}

/// `n` evenly spaced values from `start` to `end`, both inclusive.
fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let span = end - start;
            let last = (n - 1) as f64;
            (0..n)
                .map(|i| {
                    if i == n - 1 {
                        end
                    } else {
                        start + span * (i as f64 / last)
                    }
                })
                .collect()
        }
    }
}
