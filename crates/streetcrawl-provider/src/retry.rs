//! Retries for transient Street View failures.
//!
//! Network errors, HTTP 429 and 5xx responses are retried with capped
//! exponential backoff. A server-provided `Retry-After` wins over the
//! computed backoff but is still capped.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tracing::{info_span, warn, Instrument};

use crate::error::{ProviderError, ProviderResult};
use crate::metrics::record_retry;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    /// Attempts after the first call
    pub max_retries: u32,
    /// First backoff step in milliseconds, doubled on every attempt
    pub base_delay_ms: u64,
    /// Ceiling for any single wait in milliseconds
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay_ms: 250,
            max_delay_ms: 5000,
        }
    }
}

impl RetryConfig {
    /// `STREETVIEW_RETRIES`, `STREETVIEW_RETRY_BASE_MS` and
    /// `STREETVIEW_RETRY_MAX_MS`, falling back to the defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_retries: env_or("STREETVIEW_RETRIES", defaults.max_retries),
            base_delay_ms: env_or("STREETVIEW_RETRY_BASE_MS", defaults.base_delay_ms),
            max_delay_ms: env_or("STREETVIEW_RETRY_MAX_MS", defaults.max_delay_ms),
        }
    }

    /// Fail on the first error.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Default::default()
        }
    }

    /// Wait before retry number `attempt` (0-based). Half of the doubled
    /// step is fixed and half is jittered, bounded by
    /// `[base_delay_ms, max_delay_ms]`.
    pub fn backoff(&self, attempt: u32, retry_after_ms: Option<u64>) -> Duration {
        let ceiling = self.max_delay_ms.max(self.base_delay_ms);
        if let Some(requested) = retry_after_ms {
            return Duration::from_millis(requested.min(ceiling));
        }

        let step = self
            .base_delay_ms
            .saturating_mul(1u64 << attempt.min(32))
            .min(ceiling);
        let half = step / 2;
        let ms = half + (half as f64 * jitter_fraction()) as u64;
        Duration::from_millis(ms.clamp(self.base_delay_ms, ceiling))
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

/// Pseudo-random value in [0, 1) from the clock's sub-second part.
fn jitter_fraction() -> f64 {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.subsec_nanos())
        .unwrap_or(0);
    f64::from(nanos % 1000) / 1000.0
}

/// Run `op` until it succeeds, fails permanently or runs out of retries.
pub async fn with_retry<T, F, Fut>(config: &RetryConfig, operation: &str, op: F) -> ProviderResult<T>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = ProviderResult<T>>,
{
    let mut retries = 0;
    loop {
        let attempt = info_span!("streetview_attempt", operation, attempt = retries + 1);
        let err: ProviderError = match op().instrument(attempt).await {
            Ok(value) => return Ok(value),
            Err(e) => e,
        };

        if !err.is_retryable() || retries >= config.max_retries {
            return Err(err);
        }

        let delay = config.backoff(retries, err.retry_after_ms());
        warn!(
            operation,
            retry = retries + 1,
            delay_ms = delay.as_millis() as u64,
            "Street View request failed, retrying: {}",
            err
        );
        record_retry(operation);
        tokio::time::sleep(delay).await;
        retries += 1;
    }
}
