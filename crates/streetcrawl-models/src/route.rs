//! Route models.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::LatLon;

/// Ordered endpoints describing the intended path before densification.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct Route {
    /// Route name, used as the default file stem for captured imagery
    #[serde(default)]
    pub name: String,

    /// Ordered endpoints
    pub points: Vec<LatLon>,
}

impl Route {
    /// Create a route from raw `(lat, lon)` pairs.
    pub fn from_pairs(name: impl Into<String>, pairs: &[(f64, f64)]) -> Self {
        Self {
            name: name.into(),
            points: pairs.iter().copied().map(LatLon::from).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Index of the first malformed point, if any.
    pub fn first_invalid(&self) -> Option<usize> {
        self.points.iter().position(|p| !p.is_valid())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_from_pairs() {
        let route = Route::from_pairs("loop", &[(0.0, 0.0), (0.0, 1.0)]);
        assert_eq!(route.len(), 2);
        assert_eq!(route.points[1], LatLon::new(0.0, 1.0));
        assert_eq!(route.first_invalid(), None);
    }

    #[test]
    fn test_route_json_shape() {
        let route: Route =
            serde_json::from_str(r#"{"points":[{"lat":1.0,"lon":2.0},{"lat":95.0,"lon":2.0}]}"#)
                .unwrap();
        assert!(route.name.is_empty());
        assert_eq!(route.first_invalid(), Some(1));
    }
}
