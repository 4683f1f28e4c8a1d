//! Provider request metrics.
//!
//! Counters and histograms are emitted through the `metrics` facade; installing
//! an exporter is left to the embedding binary.

use std::time::Duration;

use metrics::{counter, histogram};

pub mod names {
    /// Requests by operation and HTTP status.
    pub const REQUESTS_TOTAL: &str = "streetview_requests_total";

    /// Retries by operation.
    pub const RETRIES_TOTAL: &str = "streetview_retries_total";

    /// End-to-end latency by operation, retries included.
    pub const LATENCY_SECONDS: &str = "streetview_latency_seconds";

    /// Image payload bytes downloaded.
    pub const IMAGE_BYTES_TOTAL: &str = "streetview_image_bytes_total";
}

/// Provider endpoint a request was made against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Metadata,
    Image,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Metadata => "metadata",
            Operation::Image => "image",
        }
    }
}

pub fn record_request(operation: Operation, status: u16, latency: Duration) {
    counter!(
        names::REQUESTS_TOTAL,
        "operation" => operation.as_str(),
        "status" => status.to_string()
    )
    .increment(1);

    histogram!(names::LATENCY_SECONDS, "operation" => operation.as_str())
        .record(latency.as_secs_f64());
}

pub fn record_retry(operation: &str) {
    counter!(names::RETRIES_TOTAL, "operation" => operation.to_string()).increment(1);
}

pub fn record_image_bytes(len: usize) {
    counter!(names::IMAGE_BYTES_TOTAL).increment(len as u64);
}
