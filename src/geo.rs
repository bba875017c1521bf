//! Geometry helpers for distances, viewport regions and service-area clamping.
//!
//! Distances are great-circle (haversine) on a spherical earth of radius
//! 6 371 km. Regions follow the map convention: a center plus the visible
//! latitude/longitude span ("delta").

use serde::{Deserialize, Serialize};

use crate::constants::{
    BOUNDS_MAX_LAT, BOUNDS_MAX_LNG, BOUNDS_MIN_LAT, BOUNDS_MIN_LNG, METERS_PER_DEGREE_LAT,
    MIN_REGION_DELTA,
};

const EARTH_RADIUS_KM: f64 = 6_371.0;
const REGION_EPSILON: f64 = 0.0001;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }

    /// Round to two decimals (~1 km) before sharing a user's position.
    pub fn obscured(&self) -> Self {
        Self {
            latitude: (self.latitude * 100.0).round() / 100.0,
            longitude: (self.longitude * 100.0).round() / 100.0,
        }
    }
}

/// Visible map viewport.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub latitude: f64,
    pub longitude: f64,
    pub latitude_delta: f64,
    pub longitude_delta: f64,
}

impl Region {
    pub fn centered(center: Coordinates, delta: f64) -> Self {
        Self {
            latitude: center.latitude,
            longitude: center.longitude,
            latitude_delta: delta,
            longitude_delta: delta,
        }
    }

    pub fn center(&self) -> Coordinates {
        Coordinates::new(self.latitude, self.longitude)
    }

    pub fn approx_eq(&self, other: &Region) -> bool {
        (self.latitude - other.latitude).abs() < REGION_EPSILON
            && (self.longitude - other.longitude).abs() < REGION_EPSILON
            && (self.latitude_delta - other.latitude_delta).abs() < REGION_EPSILON
            && (self.longitude_delta - other.longitude_delta).abs() < REGION_EPSILON
    }
}

/// Great-circle distance in kilometres.
pub fn distance_km(a: &Coordinates, b: &Coordinates) -> f64 {
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + (d_lon / 2.0).sin().powi(2) * lat1.cos() * lat2.cos();
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_KM * c
}

/// Coarse distance label for user cards.
pub fn format_distance(distance_km: f64) -> String {
    if distance_km < 0.5 {
        "바로 근처".to_string()
    } else if distance_km < 1.0 {
        "1km 미만".to_string()
    } else if distance_km < 10.0 {
        format!("약 {}km", distance_km.round() as i64)
    } else {
        "10km 이상".to_string()
    }
}

/// Search circle for a viewport: half the visible latitude span in metres,
/// clamped to `[min_m, max_m]` and rounded.
pub fn region_to_center_radius(region: &Region, min_m: f64, max_m: f64) -> (Coordinates, f64) {
    let meters = (region.latitude_delta * METERS_PER_DEGREE_LAT / 2.0).clamp(min_m, max_m);
    (region.center(), meters.round())
}

/// Region showing roughly `radius_km` around `center`.
pub fn region_for_radius(center: Coordinates, radius_km: f64) -> Region {
    let latitude_delta = radius_km / 111.0;
    let longitude_delta = radius_km / (111.0 * center.latitude.to_radians().cos());
    Region {
        latitude: center.latitude,
        longitude: center.longitude,
        latitude_delta,
        longitude_delta,
    }
}

/// Smallest region containing every point, padded by 50% with a 0.01 floor.
pub fn fit_points_region(points: &[Coordinates]) -> Option<Region> {
    let first = points.first()?;
    let (mut min_lat, mut max_lat) = (first.latitude, first.latitude);
    let (mut min_lng, mut max_lng) = (first.longitude, first.longitude);
    for p in &points[1..] {
        min_lat = min_lat.min(p.latitude);
        max_lat = max_lat.max(p.latitude);
        min_lng = min_lng.min(p.longitude);
        max_lng = max_lng.max(p.longitude);
    }
    Some(Region {
        latitude: (min_lat + max_lat) / 2.0,
        longitude: (min_lng + max_lng) / 2.0,
        latitude_delta: ((max_lat - min_lat) * 1.5).max(0.01),
        longitude_delta: ((max_lng - min_lng) * 1.5).max(0.01),
    })
}

fn max_lat_delta() -> f64 {
    (BOUNDS_MAX_LAT - BOUNDS_MIN_LAT - 0.2).max(0.5)
}

fn max_lng_delta() -> f64 {
    (BOUNDS_MAX_LNG - BOUNDS_MIN_LNG - 0.2).max(0.5)
}

/// Keep a camera region inside the service area: deltas are clamped first,
/// then the center is pulled in so the whole viewport stays within bounds.
pub fn constrain_region(region: &Region) -> Region {
    let latitude_delta = region.latitude_delta.clamp(MIN_REGION_DELTA, max_lat_delta());
    let longitude_delta = region.longitude_delta.clamp(MIN_REGION_DELTA, max_lng_delta());
    let lat_min = BOUNDS_MIN_LAT + latitude_delta / 2.0;
    let lat_max = BOUNDS_MAX_LAT - latitude_delta / 2.0;
    let lng_min = BOUNDS_MIN_LNG + longitude_delta / 2.0;
    let lng_max = BOUNDS_MAX_LNG - longitude_delta / 2.0;
    Region {
        latitude: region.latitude.clamp(lat_min, lat_max),
        longitude: region.longitude.clamp(lng_min, lng_max),
        latitude_delta,
        longitude_delta,
    }
}

/// Looser clamp for "show everything": only the center is bounded and the
/// deltas are capped, so every marker stays visible.
pub fn constrain_fit_region(region: &Region) -> Region {
    Region {
        latitude: region.latitude.clamp(BOUNDS_MIN_LAT, BOUNDS_MAX_LAT),
        longitude: region.longitude.clamp(BOUNDS_MIN_LNG, BOUNDS_MAX_LNG),
        latitude_delta: region.latitude_delta.min(max_lat_delta()),
        longitude_delta: region.longitude_delta.min(max_lng_delta()),
    }
}
