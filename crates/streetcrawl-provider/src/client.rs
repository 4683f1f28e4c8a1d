//! Street View Static API client.
//!
//! - HTTP client tuning (pooling, timeouts)
//! - Exponential backoff with jitter on transient failures
//! - Observability (tracing spans, metrics)

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tracing::{debug, info_span, Instrument};
use url::Url;

use streetcrawl_itinerary::{MetadataOracle, MetadataQuery};
use streetcrawl_models::{PanoMetadata, ProviderFailure};

use crate::error::{ProviderError, ProviderResult};
use crate::metrics::{record_image_bytes, record_request, Operation};
use crate::retry::{with_retry, RetryConfig};
use crate::types::{ImageQuery, MetadataResponse};
use crate::url::{build_url, query_params, redact, DEFAULT_BASE_URL, IMAGE_PATH, METADATA_PATH};

/// Client configuration.
#[derive(Debug, Clone)]
pub struct StreetViewConfig {
    pub api_key: String,
    /// Scheme and host, e.g. `https://maps.googleapis.com`
    pub base_url: String,
    pub timeout: Duration,
    pub connect_timeout: Duration,
    pub retry: RetryConfig,
}

impl StreetViewConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(5),
            retry: RetryConfig::default(),
        }
    }

    /// Create config from environment variables.
    pub fn from_env() -> ProviderResult<Self> {
        let api_key = std::env::var("STREETVIEW_API_KEY")
            .map_err(|_| ProviderError::config("STREETVIEW_API_KEY must be set"))?;
        if api_key.trim().is_empty() {
            return Err(ProviderError::config("STREETVIEW_API_KEY cannot be empty"));
        }

        let timeout_secs: u64 = std::env::var("STREETVIEW_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(30);

        Ok(Self {
            api_key,
            base_url: std::env::var("STREETVIEW_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            timeout: Duration::from_secs(timeout_secs),
            connect_timeout: Duration::from_secs(5),
            retry: RetryConfig::from_env(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }
}

/// Street View Static API client.
#[derive(Debug, Clone)]
pub struct StreetViewClient {
    http: Client,
    config: StreetViewConfig,
}

impl StreetViewClient {
    pub fn new(config: StreetViewConfig) -> ProviderResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(4)
            .user_agent(concat!("streetcrawl/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(ProviderError::Network)?;

        Ok(Self { http, config })
    }

    pub fn from_env() -> ProviderResult<Self> {
        Self::new(StreetViewConfig::from_env()?)
    }

    pub fn config(&self) -> &StreetViewConfig {
        &self.config
    }

    /// Look up the panorama serving a query.
    pub async fn metadata(&self, query: &MetadataQuery) -> ProviderResult<PanoMetadata> {
        let params = query_params(query.location, query.heading, &query.camera);
        let url = build_url(&self.config.base_url, METADATA_PATH, &params, &self.config.api_key)?;

        let (http, url) = (&self.http, &url);
        self.execute(Operation::Metadata, move || async move {
            let response = http.get(url.clone()).send().await?;
            let response = Self::check_status(response, url).await?;
            let body: MetadataResponse = response.json().await?;
            body.into_metadata()
        })
        .await
    }

    /// Download the image for a query.
    pub async fn image(&self, query: &ImageQuery) -> ProviderResult<Vec<u8>> {
        let params = query_params(query.location, query.heading, &query.camera);
        let url = build_url(&self.config.base_url, IMAGE_PATH, &params, &self.config.api_key)?;

        let (http, url) = (&self.http, &url);
        self.execute(Operation::Image, move || async move {
            let response = http.get(url.clone()).send().await?;
            let response = Self::check_status(response, url).await?;
            let bytes = response.bytes().await?;
            if bytes.is_empty() {
                return Err(ProviderError::invalid_response("empty image body"));
            }
            record_image_bytes(bytes.len());
            Ok(bytes.to_vec())
        })
        .await
    }

    /// Run a request with retry, tracing and metrics.
    async fn execute<T, F, Fut>(&self, operation: Operation, op: F) -> ProviderResult<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = ProviderResult<T>>,
    {
        let span = info_span!("streetview_request", operation = operation.as_str());

        let start = Instant::now();
        let result = with_retry(&self.config.retry, operation.as_str(), op)
            .instrument(span)
            .await;

        // Transport failures have no HTTP status; count them as 0
        let status = match &result {
            Ok(_) => 200,
            Err(e) => e.http_status().unwrap_or(0),
        };
        record_request(operation, status, start.elapsed());

        result
    }

    async fn check_status(response: reqwest::Response, url: &Url) -> ProviderResult<reqwest::Response> {
        let status = response.status();
        debug!(status = status.as_u16(), "GET {}", redact(url));

        if status == StatusCode::OK {
            return Ok(response);
        }

        let retry_after_ms = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(|secs| secs * 1000);
        let body = response.text().await.unwrap_or_default();

        match ProviderError::from_http_status(status.as_u16(), body) {
            ProviderError::RateLimited { .. } => Err(ProviderError::RateLimited { retry_after_ms }),
            other => Err(other),
        }
    }
}

/// Source of imagery for a location and heading.
#[async_trait]
pub trait ImageOracle: Send + Sync {
    async fn fetch_image(&self, query: &ImageQuery) -> ProviderResult<Vec<u8>>;
}

#[async_trait]
impl ImageOracle for StreetViewClient {
    async fn fetch_image(&self, query: &ImageQuery) -> ProviderResult<Vec<u8>> {
        self.image(query).await
    }
}

#[async_trait]
impl MetadataOracle for StreetViewClient {
    async fn fetch_metadata(&self, query: &MetadataQuery) -> Result<PanoMetadata, ProviderFailure> {
        self.metadata(query).await.map_err(|e| e.to_failure())
    }
}
