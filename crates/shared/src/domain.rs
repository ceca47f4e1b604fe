use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Mean Earth radius (IUGG), used for great-circle distances.
pub const EARTH_RADIUS_METERS: f64 = 6_371_008.8;

/// Opaque identifier of a place under review.
///
/// The backend may use string or integer ids; the served JSON type is kept
/// so a correction echoes the id back exactly as it was served.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PlaceId {
    Int(i64),
    Text(String),
}

impl From<i64> for PlaceId {
    fn from(value: i64) -> Self {
        PlaceId::Int(value)
    }
}

impl From<&str> for PlaceId {
    fn from(value: &str) -> Self {
        PlaceId::Text(value.to_string())
    }
}

impl From<String> for PlaceId {
    fn from(value: String) -> Self {
        PlaceId::Text(value)
    }
}

impl std::fmt::Display for PlaceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlaceId::Int(id) => write!(f, "{id}"),
            PlaceId::Text(id) => f.write_str(id),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum GeoPointError {
    #[error("latitude {0} is outside [-90, 90]")]
    Latitude(f64),
    #[error("longitude {0} is outside [-180, 180]")]
    Longitude(f64),
}

/// A WGS84 latitude/longitude pair in degrees.
///
/// Values are range-checked on construction and never change afterwards; a
/// moved marker produces a new `GeoPoint`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    latitude: f64,
    longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, GeoPointError> {
        // NaN fails both range checks.
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(GeoPointError::Latitude(latitude));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(GeoPointError::Longitude(longitude));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Builds a point by clamping each component into range; NaN becomes 0.
    pub fn clamped(latitude: f64, longitude: f64) -> Self {
        let clamp = |value: f64, limit: f64| {
            if value.is_nan() {
                0.0
            } else {
                value.clamp(-limit, limit)
            }
        };
        Self {
            latitude: clamp(latitude, 90.0),
            longitude: clamp(longitude, 180.0),
        }
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Haversine distance to `other` in metres.
    pub fn distance_meters(&self, other: &GeoPoint) -> f64 {
        let lat1 = self.latitude.to_radians();
        let lat2 = other.latitude.to_radians();
        let d_lat = lat2 - lat1;
        let d_lon = (other.longitude - self.longitude).to_radians();

        let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_METERS * a.sqrt().min(1.0).asin()
    }
}

impl std::fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.6}, {:.6})", self.latitude, self.longitude)
    }
}

/// A point of interest awaiting review, as reported by the backend.
#[derive(Debug, Clone, PartialEq)]
pub struct Place {
    pub id: PlaceId,
    pub name: String,
    pub category: String,
    pub location: GeoPoint,
}
