//! Request URL construction.

use url::Url;

use streetcrawl_models::{CameraSettings, LatLon};

use crate::error::{ProviderError, ProviderResult};

pub const DEFAULT_BASE_URL: &str = "https://maps.googleapis.com";
pub const IMAGE_PATH: &str = "/maps/api/streetview";
pub const METADATA_PATH: &str = "/maps/api/streetview/metadata";

/// Query parameters shared by image and metadata requests, without the key.
pub fn query_params(location: LatLon, heading: f64, camera: &CameraSettings) -> Vec<(&'static str, String)> {
    let mut params = vec![
        ("size", camera.size.clone()),
        ("location", location.to_string()),
        ("heading", heading.to_string()),
        ("pitch", camera.pitch.to_string()),
        ("fov", camera.fov.to_string()),
    ];
    if camera.outdoor_only {
        params.push(("source", "outdoor".to_string()));
    }
    params.push(("radius", camera.radius.to_string()));
    params
}

/// Full request URL for `path` under `base`.
pub fn build_url(
    base: &str,
    path: &str,
    params: &[(&'static str, String)],
    api_key: &str,
) -> ProviderResult<Url> {
    let mut url = Url::parse(&format!("{}{}", base.trim_end_matches('/'), path))
        .map_err(|e| ProviderError::config(format!("invalid base URL '{}': {}", base, e)))?;
    {
        let mut query = url.query_pairs_mut();
        for (name, value) in params {
            query.append_pair(name, value);
        }
        query.append_pair("key", api_key);
    }
    Ok(url)
}

/// URL with the API key masked, for logs.
pub fn redact(url: &Url) -> String {
    let mut masked = url.clone();
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| {
            let v = if k == "key" { "***".to_string() } else { v.into_owned() };
            (k.into_owned(), v)
        })
        .collect();
    masked.query_pairs_mut().clear().extend_pairs(pairs);
    masked.to_string()
}
