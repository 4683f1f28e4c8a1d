//! Street View Static API client.
//!
//! Implements the metadata and image oracles used by the itinerary probe and
//! the capture loop, with retry, tracing and metrics.

pub mod client;
pub mod error;
pub mod metrics;
pub mod retry;
pub mod types;
pub mod url;

pub use client::{ImageOracle, StreetViewClient, StreetViewConfig};
pub use error::{ProviderError, ProviderResult};
pub use retry::RetryConfig;
pub use types::{ImageQuery, MetadataResponse};
