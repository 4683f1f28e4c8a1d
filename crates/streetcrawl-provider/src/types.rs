//! Street View API wire types.

use serde::Deserialize;

use streetcrawl_models::{CameraSettings, LatLon, PanoMetadata, PanoStatus};

use crate::error::{ProviderError, ProviderResult};

/// One image request.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageQuery {
    pub location: LatLon,
    pub heading: f64,
    pub camera: CameraSettings,
}

impl ImageQuery {
    pub fn new(location: LatLon, heading: f64, camera: CameraSettings) -> Self {
        Self {
            location,
            heading,
            camera,
        }
    }
}

/// Location of the resolved panorama.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct ResponseLocation {
    pub lat: f64,
    pub lng: f64,
}

/// Body of a metadata response.
#[derive(Debug, Clone, Deserialize)]
pub struct MetadataResponse {
    pub status: String,
    #[serde(default)]
    pub copyright: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub pano_id: String,
    #[serde(default)]
    pub location: Option<ResponseLocation>,
    #[serde(default)]
    pub error_message: Option<String>,
}

impl MetadataResponse {
    /// Convert to row metadata. Quota and key problems become errors so the
    /// caller can retry or report them; every other status is a result.
    pub fn into_metadata(self) -> ProviderResult<PanoMetadata> {
        match (self.status.as_str(), self.error_message) {
            ("OVER_QUERY_LIMIT", _) => Err(ProviderError::RateLimited {
                retry_after_ms: None,
            }),
            ("REQUEST_DENIED", Some(message)) => Err(ProviderError::InvalidKey(message)),
            (status, _) => Ok(PanoMetadata {
                status: PanoStatus::from_provider(status),
                copyright: self.copyright,
                date: self.date,
                pano_id: self.pano_id,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> MetadataResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_ok_response() {
        let metadata = parse(
            r#"{
                "copyright": "© Google",
                "date": "2019-05",
                "location": {"lat": 46.41, "lng": 10.01},
                "pano_id": "F:abc123",
                "status": "OK"
            }"#,
        )
        .into_metadata()
        .unwrap();

        assert_eq!(metadata.status, PanoStatus::Ok);
        assert_eq!(metadata.pano_id, "F:abc123");
        assert_eq!(metadata.date, "2019-05");
    }

    #[test]
    fn test_zero_results_is_a_result() {
        let metadata = parse(r#"{"status": "ZERO_RESULTS"}"#)
            .into_metadata()
            .unwrap();
        assert_eq!(metadata, PanoMetadata::unresolved(PanoStatus::ZeroResults));
    }

    #[test]
    fn test_quota_and_key_errors() {
        assert!(matches!(
            parse(r#"{"status": "OVER_QUERY_LIMIT"}"#).into_metadata(),
            Err(ProviderError::RateLimited { .. })
        ));
        assert!(matches!(
            parse(r#"{"status": "REQUEST_DENIED", "error_message": "The provided API key is invalid."}"#)
                .into_metadata(),
            Err(ProviderError::InvalidKey(_))
        ));
        let denied = parse(r#"{"status": "REQUEST_DENIED"}"#).into_metadata().unwrap();
        assert_eq!(denied.status, PanoStatus::Denied);
    }
}
