//! Itinerary persistence as a JSON table.

use std::path::Path;

use tokio::fs;
use tracing::debug;

use streetcrawl_models::{Itinerary, LatLon, Route};

use crate::error::{ItineraryError, ItineraryResult};

/// Write an itinerary as a pretty-printed JSON array, creating parent
/// directories as needed.
pub async fn save(itinerary: &Itinerary, path: impl AsRef<Path>) -> ItineraryResult<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await?;
    }

    let json = serde_json::to_string_pretty(itinerary)?;
    fs::write(path, json).await?;

    debug!("Saved {} rows to {}", itinerary.len(), path.display());
    Ok(())
}

/// Read an itinerary and check that its indices are dense and ordered.
pub async fn load(path: impl AsRef<Path>) -> ItineraryResult<Itinerary> {
    let path = path.as_ref();
    let data = fs::read(path).await?;

    let itinerary: Itinerary = serde_json::from_slice(&data)
        .map_err(|e| ItineraryError::corrupt(path, e.to_string()))?;

    if !itinerary.is_dense() {
        return Err(ItineraryError::corrupt(
            path,
            "row indices are not a dense 0-based sequence",
        ));
    }
    if let Some(row) = itinerary.iter().find(|row| !row.location().is_valid()) {
        return Err(ItineraryError::corrupt(
            path,
            format!("row {} has invalid coordinates", row.index),
        ));
    }

    debug!("Loaded {} rows from {}", itinerary.len(), path.display());
    Ok(itinerary)
}

/// Read route points from a JSON file holding either `[[lat, lon], ...]` or
/// a `Route` object.
pub async fn load_points(path: impl AsRef<Path>) -> ItineraryResult<Vec<LatLon>> {
    let path = path.as_ref();
    let data = fs::read(path).await?;

    if let Ok(pairs) = serde_json::from_slice::<Vec<(f64, f64)>>(&data) {
        return Ok(pairs.into_iter().map(LatLon::from).collect());
    }
    let route: Route = serde_json::from_slice(&data)
        .map_err(|e| ItineraryError::corrupt(path, e.to_string()))?;
    Ok(route.points)
}
