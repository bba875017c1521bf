use serde::Serialize;

use crate::cancel::CancelToken;
use crate::geo::Coordinates;
use crate::place::Place;
use crate::AppResult;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LatLng {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Circle {
    pub center: LatLng,
    pub radius: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationRestriction {
    pub circle: Circle,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NearbyQuery {
    pub included_types: Vec<String>,
    pub max_result_count: u32,
    pub location_restriction: LocationRestriction,
}

/// Body of one `searchNearby` call. A follow-up page carries only the token.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum NearbyRequest {
    Initial(NearbyQuery),
    Page {
        #[serde(rename = "pageToken")]
        page_token: String,
    },
}

impl NearbyRequest {
    pub fn initial(center: Coordinates, radius_m: f64, included_types: &[String], page_size: u32) -> Self {
        Self::Initial(NearbyQuery {
            included_types: included_types.to_vec(),
            max_result_count: page_size,
            location_restriction: LocationRestriction {
                circle: Circle {
                    center: LatLng {
                        latitude: center.latitude,
                        longitude: center.longitude,
                    },
                    radius: radius_m,
                },
            },
        })
    }

    pub fn page(token: impl Into<String>) -> Self {
        Self::Page { page_token: token.into() }
    }
}

/// One page of already-normalised places.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlacesPage {
    pub places: Vec<Place>,
    pub next_page_token: Option<String>,
}

/// Seam to the external places API. Implementations must return
/// `AppError::Cancelled` promptly once `cancel` fires.
pub trait PlacesTransport: Send + Sync {
    fn search_nearby(&self, request: &NearbyRequest, cancel: &CancelToken) -> AppResult<PlacesPage>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_body_shape() {
        let req = NearbyRequest::initial(
            Coordinates::new(37.5, 127.0),
            1110.0,
            &["restaurant".to_string(), "cafe".to_string()],
            20,
        );
        let body = serde_json::to_value(&req).unwrap();
        assert_eq!(body["includedTypes"], serde_json::json!(["restaurant", "cafe"]));
        assert_eq!(body["maxResultCount"], 20);
        assert_eq!(body["locationRestriction"]["circle"]["radius"], 1110.0);
        assert_eq!(body["locationRestriction"]["circle"]["center"]["latitude"], 37.5);
    }

    #[test]
    fn test_page_body_only_has_token() {
        let body = serde_json::to_value(NearbyRequest::page("tok")).unwrap();
        assert_eq!(body, serde_json::json!({"pageToken": "tok"}));
    }
}
