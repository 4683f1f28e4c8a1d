//! Itinerary construction and resequencing.
//!
//! This crate provides:
//! - Spherical geometry helpers (distance, bearing, interpolation, turn sweeps)
//! - Route to itinerary conversion with computed camera headings
//! - Metadata probing through an injected oracle
//! - Path processing: pano dedup, acceptance filter, turn expansion
//! - Grid panel planning and JSON persistence

pub mod builder;
pub mod error;
pub mod geo;
pub mod grid;
pub mod path;
pub mod probe;
pub mod store;

pub use builder::{build, ItineraryBuilder};
pub use error::{ItineraryError, ItineraryResult};
pub use geo::{bearing, densify, distance, interpolate, turn_headings, Spacing};
pub use grid::{GridLayout, GridPanel};
pub use path::{PathPolicy, PathProcessor, PathSummary};
pub use probe::{probe, ItineraryProbe, MetadataOracle, MetadataQuery, ProbeOutcome, ProbeReport};
