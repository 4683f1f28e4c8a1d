//! Itinerary enrichment with provider metadata.
//!
//! The probe walks the requested rows in order and asks a
//! [`MetadataOracle`] what imagery exists at each row's location and
//! heading. Oracle failures are recorded on the row itself (as its status)
//! and never abort the batch. Only an unknown row index is fatal, and that
//! is checked before any oracle call is made.

use async_trait::async_trait;
use tracing::{debug, info, warn};

use streetcrawl_models::{
    CameraSettings, Itinerary, LatLon, PanoMetadata, PanoStatus, ProviderFailure,
};

use crate::error::{ItineraryError, ItineraryResult};

/// One metadata lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct MetadataQuery {
    pub location: LatLon,
    pub heading: f64,
    pub camera: CameraSettings,
}

/// Source of provider metadata for a location.
#[async_trait]
pub trait MetadataOracle: Send + Sync {
    async fn fetch_metadata(&self, query: &MetadataQuery)
        -> Result<PanoMetadata, ProviderFailure>;
}

/// What happened to one requested row.
#[derive(Debug, Clone, PartialEq)]
pub enum ProbeOutcome {
    /// Oracle answered; the row now carries this status
    Resolved(PanoStatus),
    /// Oracle call failed; the failure is recorded as the row status
    Failed(ProviderFailure),
    /// Row was already resolved and no redo was requested
    Skipped(PanoStatus),
}

#[derive(Debug, Clone, PartialEq)]
pub struct RowProbe {
    pub index: usize,
    pub outcome: ProbeOutcome,
}

/// Per-row results of a probe batch, in request order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProbeReport {
    pub rows: Vec<RowProbe>,
}

impl ProbeReport {
    pub fn resolved(&self) -> usize {
        self.count(|o| matches!(o, ProbeOutcome::Resolved(_)))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, ProbeOutcome::Failed(_)))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, ProbeOutcome::Skipped(_)))
    }

    fn count(&self, pred: impl Fn(&ProbeOutcome) -> bool) -> usize {
        self.rows.iter().filter(|r| pred(&r.outcome)).count()
    }
}

/// Probes itinerary rows through a metadata oracle.
pub struct ItineraryProbe<'a, O: MetadataOracle + ?Sized> {
    oracle: &'a O,
    camera: CameraSettings,
}

impl<'a, O: MetadataOracle + ?Sized> ItineraryProbe<'a, O> {
    pub fn new(oracle: &'a O) -> Self {
        Self {
            oracle,
            camera: CameraSettings::default(),
        }
    }

    /// Use these camera settings for every query.
    pub fn with_camera(mut self, camera: CameraSettings) -> Self {
        self.camera = camera;
        self
    }

    /// Probe the given rows. Rows already resolved are left alone unless
    /// `redo` is set.
    pub async fn probe(
        &self,
        itinerary: &mut Itinerary,
        indices: &[usize],
        redo: bool,
    ) -> ItineraryResult<ProbeReport> {
        if let Some(missing) = indices.iter().find(|i| !itinerary.contains(**i)) {
            return Err(ItineraryError::invalid_input(format!(
                "row {} is not in the itinerary ({} rows)",
                missing,
                itinerary.len()
            )));
        }

        let mut report = ProbeReport::default();

        for &index in indices {
            let Some(row) = itinerary.get_mut(index) else {
                continue;
            };

            if row.status.is_terminal() && !redo {
                debug!(index, status = %row.status, "Row already probed, skipping");
                report.rows.push(RowProbe {
                    index,
                    outcome: ProbeOutcome::Skipped(row.status),
                });
                continue;
            }

            let query = MetadataQuery {
                location: row.location(),
                heading: row.heading,
                camera: self.camera.clone(),
            };

            let outcome = match self.oracle.fetch_metadata(&query).await {
                Ok(metadata) => {
                    debug!(index, status = %metadata.status, pano_id = %metadata.pano_id, "Probed row");
                    let status = metadata.status;
                    row.apply_metadata(metadata);
                    ProbeOutcome::Resolved(status)
                }
                Err(failure) => {
                    warn!(index, "Metadata lookup failed: {}", failure);
                    row.apply_failure(&failure);
                    ProbeOutcome::Failed(failure)
                }
            };

            report.rows.push(RowProbe { index, outcome });
        }

        info!(
            "Probe finished: {} resolved, {} failed, {} skipped",
            report.resolved(),
            report.failed(),
            report.skipped()
        );

        Ok(report)
    }
}

/// Probe rows with default camera settings.
pub async fn probe<O: MetadataOracle + ?Sized>(
    itinerary: &mut Itinerary,
    indices: &[usize],
    oracle: &O,
    redo: bool,
) -> ItineraryResult<ProbeReport> {
    ItineraryProbe::new(oracle)
        .probe(itinerary, indices, redo)
        .await
}
