// === Places search ===
pub const PLACES_ENDPOINT: &str = "https://places.googleapis.com/v1/places:searchNearby";
pub const PLACES_PHOTO_ENDPOINT: &str = "https://places.googleapis.com/v1";
pub const PLACES_PAGE_SIZE: u32 = 20;
pub const PLACES_MAX_RESULTS: usize = 200;
pub const PLACES_PAGE_DELAY_MS: u64 = 1_200;      // next_page_token needs time to become valid
pub const PLACES_MIN_RADIUS_M: f64 = 200.0;
pub const PLACES_MAX_RADIUS_M: f64 = 10_000.0;
pub const PLACES_REQUEST_TIMEOUT_SECS: u64 = 10;
pub const PLACES_PHOTO_MAX_WIDTH_PX: u32 = 400;
pub const PLACES_FIELD_MASK: &[&str] = &[
    "places.id",
    "places.displayName",
    "places.location",
    "places.types",
    "places.shortFormattedAddress",
    "places.rating",
    "places.userRatingCount",
    "places.photos",
    "places.iconMaskBaseUri",
    "places.iconBackgroundColor",
    "places.primaryType",
    "places.primaryTypeDisplayName",
];
pub const METERS_PER_DEGREE_LAT: f64 = 111_000.0;

// === Map screen ===
pub const MAP_DISPLAY_CAP: usize = 300;
pub const MAX_SEARCH_RADIUS_KM: f64 = 10.0;
pub const DEFAULT_DELTA: f64 = 0.02;
pub const CLUSTER_DELTA_THRESHOLD: f64 = 0.015;
pub const MIN_REGION_DELTA: f64 = 0.0005;        // ~55 m
pub const PROGRAMMATIC_SCROLL_WINDOW_MS: u64 = 600;
pub const MARKER_ANIMATION_WINDOW_MS: u64 = 750;
pub const CAMERA_ANIMATION_MS: u64 = 500;
pub const FIT_ALL_ANIMATION_MS: u64 = 800;
pub const SCROLL_RETRY_DELAY_MS: u64 = 100;
pub const BOUNDS_SNAP_ANIMATION_MS: u64 = 160;
/// Snap back only when the camera drifted past these.
pub const BOUNDS_SNAP_CENTER_EPS: f64 = 0.0008;
pub const BOUNDS_SNAP_DELTA_EPS: f64 = 0.002;

/// Service area (South Korea). The camera never leaves it.
pub const BOUNDS_MIN_LAT: f64 = 33.0;
pub const BOUNDS_MAX_LAT: f64 = 38.9;
pub const BOUNDS_MIN_LNG: f64 = 124.0;
pub const BOUNDS_MAX_LNG: f64 = 132.0;

// === Auth ===
pub const AUTH_STORAGE_KEY: &str = "sb-eatingmeeting-auth";
pub const LEGACY_AUTH_STORAGE_KEY: &str = "supabase.auth.token";
pub const SESSION_FETCH_TIMEOUT_MS: u64 = 5_000;
pub const PROFILE_FETCH_TIMEOUT_MS: u64 = 5_000;
pub const LOCAL_SIGN_OUT_TIMEOUT_MS: u64 = 2_500;
pub const GLOBAL_SIGN_OUT_TIMEOUT_MS: u64 = 4_000;
pub const PROFILE_FETCH_RETRIES: u32 = 1;
pub const FALLBACK_DISPLAY_NAME: &str = "밥친구";

// === Content limits ===
pub const DISPLAY_NAME_MIN_CHARS: usize = 2;
pub const DISPLAY_NAME_MAX_CHARS: usize = 50;
pub const BIO_MAX_CHARS: usize = 200;
pub const MESSAGE_MAX_CHARS: usize = 2_000;
pub const MAX_PHOTOS_PER_USER: usize = 6;
pub const GATHERING_MIN_PARTICIPANTS: u32 = 2;
pub const GATHERING_MAX_PARTICIPANTS: u32 = 20;

// === Community ===
pub const COMMUNITY_MAX_DISTANCE_KM: f64 = 10.0;
pub const COMMUNITY_PAGE_LIMIT: usize = 50;

// === SQLite Tuning ===
pub const SQLITE_BUSY_TIMEOUT_MS: u32 = 5_000;

// === Cancellation ===
pub const CANCEL_POLL_MS: u64 = 25;

/// Truncate a string to at most `max_bytes` without splitting a UTF-8 char.
pub fn truncate_safe(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}
