//! HTTP adapter for the places `searchNearby` endpoint.

use std::time::Duration;

use crate::cancel::{run_cancellable, CancelToken};
use crate::config::PlacesConfig;
use crate::constants::{truncate_safe, PLACES_FIELD_MASK};
use crate::place::RawPlacesPage;
use crate::{AppError, AppResult};

use super::transport::{NearbyRequest, PlacesPage, PlacesTransport};

pub struct GooglePlacesClient {
    endpoint: String,
    photo_endpoint: String,
    api_key: String,
    timeout: Duration,
}

impl GooglePlacesClient {
    pub fn new(config: &PlacesConfig) -> Self {
        Self {
            endpoint: config.endpoint.clone(),
            photo_endpoint: config.photo_endpoint.clone(),
            api_key: config.api_key.trim().to_string(),
            timeout: config.request_timeout(),
        }
    }

    pub fn field_mask() -> String {
        PLACES_FIELD_MASK.join(",")
    }
}

fn map_ureq_error(e: ureq::Error) -> AppError {
    match e {
        ureq::Error::Timeout(t) => AppError::Timeout(format!("places request: {}", t)),
        other => AppError::Network(format!("places request failed: {}", other)),
    }
}

/// Blocking POST; runs on the worker spawned by `run_cancellable`.
fn post_search(endpoint: String, api_key: String, timeout: Duration, body: Vec<u8>) -> AppResult<RawPlacesPage> {
    let mut response = ureq::post(&endpoint)
        .header("Content-Type", "application/json")
        .header("X-Goog-Api-Key", &api_key)
        .header("X-Goog-FieldMask", &GooglePlacesClient::field_mask())
        .config()
        .timeout_global(Some(timeout))
        .http_status_as_error(false)
        .build()
        .send(body.as_slice())
        .map_err(map_ureq_error)?;

    let status = response.status();
    let text = response
        .body_mut()
        .read_to_string()
        .map_err(map_ureq_error)?;

    if !status.is_success() {
        return Err(AppError::Network(format!(
            "places API returned {}: {}",
            status.as_u16(),
            truncate_safe(&text, 200)
        )));
    }

    Ok(serde_json::from_str(&text)?)
}

impl PlacesTransport for GooglePlacesClient {
    fn search_nearby(&self, request: &NearbyRequest, cancel: &CancelToken) -> AppResult<PlacesPage> {
        if self.api_key.is_empty() {
            return Err(AppError::Network("places API key is not configured".into()));
        }

        let body = serde_json::to_vec(request)?;
        let endpoint = self.endpoint.clone();
        let api_key = self.api_key.clone();
        let timeout = self.timeout;

        let raw = run_cancellable(cancel, move || post_search(endpoint, api_key, timeout, body))?;

        let total = raw.places.len();
        let places: Vec<_> = raw
            .places
            .into_iter()
            .filter_map(|p| p.normalize(&self.photo_endpoint, &self.api_key))
            .collect();
        if places.len() < total {
            tracing::debug!(dropped = total - places.len(), "Dropped malformed place records");
        }

        Ok(PlacesPage {
            places,
            next_page_token: raw.next_page_token.filter(|t| !t.is_empty()),
        })
    }
}
