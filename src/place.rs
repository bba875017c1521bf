//! Place records: the local shape and the places-API wire shape.
//!
//! Wire records are deserialized leniently (every field optional) and then
//! normalised; a record that cannot be placed on the map is dropped rather
//! than propagated into UI state.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::constants::PLACES_PHOTO_MAX_WIDTH_PX;
use crate::geo::Coordinates;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub id: String,
    pub name: String,
    pub address: Option<String>,
    pub rating: Option<f64>,
    pub user_ratings_total: Option<u32>,
    pub lat: f64,
    pub lng: f64,
    #[serde(default)]
    pub types: Vec<String>,
    pub photo_uri: Option<String>,
    pub primary_type: Option<String>,
    pub primary_type_display_name: Option<String>,
    pub icon_background_color: Option<String>,
    pub icon_uri: Option<String>,
}

impl Place {
    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.lat, self.lng)
    }

    /// Label for the category chip: display name, else first raw type.
    pub fn category_label(&self) -> Option<&str> {
        self.primary_type_display_name
            .as_deref()
            .or_else(|| self.types.first().map(String::as_str))
    }
}

// ── Wire shape ──

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LocalizedText {
    pub text: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawLocation {
    pub latitude: Option<Value>,
    pub longitude: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawPhoto {
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPlace {
    pub id: Option<String>,
    pub display_name: Option<LocalizedText>,
    pub location: Option<RawLocation>,
    #[serde(default)]
    pub types: Vec<String>,
    pub short_formatted_address: Option<String>,
    pub rating: Option<Value>,
    pub user_rating_count: Option<Value>,
    #[serde(default)]
    pub photos: Vec<RawPhoto>,
    pub icon_mask_base_uri: Option<String>,
    pub icon_background_color: Option<String>,
    pub primary_type: Option<String>,
    pub primary_type_display_name: Option<LocalizedText>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPlacesPage {
    #[serde(default)]
    pub places: Vec<RawPlace>,
    pub next_page_token: Option<String>,
}

fn photo_uri(photo_base: &str, photo_name: Option<&str>, api_key: &str) -> Option<String> {
    let name = photo_name.filter(|n| !n.is_empty())?;
    Some(format!(
        "{}/{}/media?maxWidthPx={}&key={}",
        photo_base, name, PLACES_PHOTO_MAX_WIDTH_PX, api_key
    ))
}

impl RawPlace {
    /// Validate and convert into a `Place`. Returns `None` when the record has
    /// no id or no usable coordinates.
    pub fn normalize(self, photo_base: &str, api_key: &str) -> Option<Place> {
        let id = self.id.filter(|id| !id.trim().is_empty())?;
        let location = self.location?;
        let lat = location.latitude.as_ref().and_then(Value::as_f64)?;
        let lng = location.longitude.as_ref().and_then(Value::as_f64)?;
        if !Coordinates::new(lat, lng).is_valid() {
            return None;
        }

        let name = self
            .display_name
            .and_then(|d| d.text)
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| "Unknown".to_string());

        Some(Place {
            id,
            name,
            address: self.short_formatted_address,
            rating: self.rating.as_ref().and_then(Value::as_f64),
            user_ratings_total: self
                .user_rating_count
                .as_ref()
                .and_then(Value::as_u64)
                .map(|n| n.min(u32::MAX as u64) as u32),
            lat,
            lng,
            types: self.types,
            photo_uri: photo_uri(
                photo_base,
                self.photos.first().and_then(|p| p.name.as_deref()),
                api_key,
            ),
            primary_type: self.primary_type,
            primary_type_display_name: self.primary_type_display_name.and_then(|d| d.text),
            icon_background_color: self.icon_background_color,
            icon_uri: self.icon_mask_base_uri.map(|base| format!("{}.png", base)),
        })
    }
}
