use serde::{Deserialize, Serialize};

use crate::domain::{GeoPoint, GeoPointError, Place, PlaceId};

/// Body of `GET /place/next`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NextPlaceResponse {
    pub id: PlaceId,
    pub name: String,
    pub category: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl TryFrom<NextPlaceResponse> for Place {
    type Error = GeoPointError;

    fn try_from(value: NextPlaceResponse) -> Result<Self, Self::Error> {
        Ok(Place {
            location: GeoPoint::new(value.latitude, value.longitude)?,
            id: value.id,
            name: value.name,
            category: value.category,
        })
    }
}

/// Body of `POST /place/verify`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerifyRequest {
    pub id: PlaceId,
    pub correct_lat: f64,
    pub correct_lon: f64,
}

impl VerifyRequest {
    pub fn new(id: PlaceId, corrected: GeoPoint) -> Self {
        Self {
            id,
            correct_lat: corrected.latitude(),
            correct_lon: corrected.longitude(),
        }
    }
}

/// Acknowledgement of `POST /place/verify`. Only the status code is part of
/// the contract, so every field is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VerifyResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<PlaceId>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_place_body_converts_into_place() {
        let body: NextPlaceResponse = serde_json::from_str(
            r#"{"id":"08f2a","name":"Cafe","category":"food","latitude":40.0,"longitude":-73.0}"#,
        )
        .expect("decode");
        let place = Place::try_from(body).expect("valid place");

        assert_eq!(place.id, PlaceId::from("08f2a"));
        assert_eq!(place.name, "Cafe");
        assert_eq!(place.location.latitude(), 40.0);
        assert_eq!(place.location.longitude(), -73.0);
    }

    #[test]
    fn next_place_with_swapped_axes_is_rejected() {
        let body = NextPlaceResponse {
            id: PlaceId::from("x"),
            name: "Swapped".to_string(),
            category: "misc".to_string(),
            latitude: -122.4,
            longitude: 37.8,
        };
        assert!(Place::try_from(body).is_err());
    }

    #[test]
    fn verify_request_uses_backend_field_names() {
        let point = GeoPoint::new(40.001, -73.001).expect("point");
        let body = serde_json::to_value(VerifyRequest::new(PlaceId::from("1"), point))
            .expect("encode");
        assert_eq!(
            body,
            serde_json::json!({"id": "1", "correct_lat": 40.001, "correct_lon": -73.001})
        );
    }
}
