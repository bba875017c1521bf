//! Runtime configuration, loaded from `{data_dir}/config.json`.
//!
//! Every section is `#[serde(default)]` so a partial file only overrides
//! the keys it names. A missing or unreadable file yields the defaults.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::storage::path_utils;
use crate::{AppError, AppResult};

/// Environment variables checked, in order, for the places API key.
pub const API_KEY_ENV_VARS: &[&str] = &["EATING_MEETING_PLACES_API_KEY", "GOOGLE_PLACES_API_KEY"];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PlacesConfig {
    pub endpoint: String,
    pub photo_endpoint: String,
    /// Empty means "not configured"; searches then fall back to seeds.
    pub api_key: String,
    pub page_size: u32,
    pub max_results: usize,
    pub page_delay_ms: u64,
    pub min_radius_m: f64,
    pub max_radius_m: f64,
    pub included_types: Vec<String>,
    pub request_timeout_secs: u64,
}

impl Default for PlacesConfig {
    fn default() -> Self {
        Self {
            endpoint: PLACES_ENDPOINT.to_string(),
            photo_endpoint: PLACES_PHOTO_ENDPOINT.to_string(),
            api_key: String::new(),
            page_size: PLACES_PAGE_SIZE,
            max_results: PLACES_MAX_RESULTS,
            page_delay_ms: PLACES_PAGE_DELAY_MS,
            min_radius_m: PLACES_MIN_RADIUS_M,
            max_radius_m: PLACES_MAX_RADIUS_M,
            included_types: vec!["restaurant".into(), "cafe".into()],
            request_timeout_secs: PLACES_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl PlacesConfig {
    pub fn page_delay(&self) -> Duration {
        Duration::from_millis(self.page_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn has_api_key(&self) -> bool {
        !self.api_key.trim().is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MapConfig {
    pub display_cap: usize,
    pub max_search_radius_km: f64,
    pub default_delta: f64,
    pub cluster_delta_threshold: f64,
    pub programmatic_scroll_window_ms: u64,
    pub marker_animation_window_ms: u64,
    pub scroll_retry_delay_ms: u64,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            display_cap: MAP_DISPLAY_CAP,
            max_search_radius_km: MAX_SEARCH_RADIUS_KM,
            default_delta: DEFAULT_DELTA,
            cluster_delta_threshold: CLUSTER_DELTA_THRESHOLD,
            programmatic_scroll_window_ms: PROGRAMMATIC_SCROLL_WINDOW_MS,
            marker_animation_window_ms: MARKER_ANIMATION_WINDOW_MS,
            scroll_retry_delay_ms: SCROLL_RETRY_DELAY_MS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AuthConfig {
    pub storage_key: String,
    pub session_timeout_ms: u64,
    pub profile_timeout_ms: u64,
    pub local_sign_out_timeout_ms: u64,
    pub global_sign_out_timeout_ms: u64,
    pub profile_retries: u32,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            storage_key: AUTH_STORAGE_KEY.to_string(),
            session_timeout_ms: SESSION_FETCH_TIMEOUT_MS,
            profile_timeout_ms: PROFILE_FETCH_TIMEOUT_MS,
            local_sign_out_timeout_ms: LOCAL_SIGN_OUT_TIMEOUT_MS,
            global_sign_out_timeout_ms: GLOBAL_SIGN_OUT_TIMEOUT_MS,
            profile_retries: PROFILE_FETCH_RETRIES,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CommunityConfig {
    pub default_max_distance_km: f64,
    pub page_limit: usize,
}

impl Default for CommunityConfig {
    fn default() -> Self {
        Self {
            default_max_distance_km: COMMUNITY_MAX_DISTANCE_KM,
            page_limit: COMMUNITY_PAGE_LIMIT,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub places: PlacesConfig,
    pub map: MapConfig,
    pub auth: AuthConfig,
    pub community: CommunityConfig,
}

impl AppConfig {
    /// Load from `{data_dir}/config.json`, then apply environment overrides.
    pub fn load() -> Self {
        let mut cfg = Self::load_from(&path_utils::config_path());
        cfg.apply_env(|k| std::env::var(k).ok());
        cfg
    }

    pub fn load_from(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "Invalid config, using defaults"
                );
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    pub fn save_to(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
            .map_err(|e| AppError::Config(format!("Failed to write {}: {}", path.display(), e)))
    }

    /// The first non-empty variable from `API_KEY_ENV_VARS` wins over the file.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        for var in API_KEY_ENV_VARS {
            if let Some(key) = lookup(var).filter(|k| !k.trim().is_empty()) {
                tracing::debug!(var = *var, "Places API key taken from environment");
                self.places.api_key = key;
                return;
            }
        }
    }
}
