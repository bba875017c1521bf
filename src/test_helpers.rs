//! Shared test utilities: builders, DB setup, time helpers.
//!
//! Available only under `#[cfg(test)]`.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use crate::backend::Backend;
use crate::gathering::{Gathering, GatheringDraft};
use crate::place::Place;
use crate::profile::{BudgetRange, Photo, Profile};
use crate::slot::{Slot, SlotDraft};
use crate::storage::SqliteBackend;
use crate::time_utils;

// ============================================================================
// PlaceBuilder
// ============================================================================

pub struct PlaceBuilder {
    place: Place,
}

impl PlaceBuilder {
    pub fn new(id: &str) -> Self {
        Self {
            place: Place {
                id: id.to_string(),
                name: format!("Place {}", id),
                address: None,
                rating: None,
                user_ratings_total: None,
                lat: 37.5665,
                lng: 126.9780,
                types: vec!["restaurant".to_string()],
                photo_uri: None,
                primary_type: Some("restaurant".to_string()),
                primary_type_display_name: None,
                icon_background_color: None,
                icon_uri: None,
            },
        }
    }

    pub fn name(mut self, name: &str) -> Self {
        self.place.name = name.to_string();
        self
    }

    pub fn at(mut self, lat: f64, lng: f64) -> Self {
        self.place.lat = lat;
        self.place.lng = lng;
        self
    }

    pub fn address(mut self, a: &str) -> Self {
        self.place.address = Some(a.to_string());
        self
    }

    pub fn build(self) -> Place {
        self.place
    }
}

/// `n` places `p0..p{n-1}` strung west to east near Seoul city hall.
pub fn places_row(n: usize) -> Vec<Place> {
    (0..n)
        .map(|i| PlaceBuilder::new(&format!("p{}", i)).at(37.5665, 126.97 + i as f64 * 0.001).build())
        .collect()
}

// ============================================================================
// ProfileBuilder
// ============================================================================

pub struct ProfileBuilder {
    profile: Profile,
}

impl ProfileBuilder {
    pub fn new(id: &str) -> Self {
        Self {
            profile: Profile::new(id, &format!("user-{}", id)),
        }
    }

    pub fn name(mut self, name: &str) -> Self {
        self.profile.display_name = name.to_string();
        self
    }

    pub fn at(mut self, lat: f64, lng: f64) -> Self {
        self.profile.approx_lat = Some(lat);
        self.profile.approx_lng = Some(lng);
        self
    }

    pub fn budget(mut self, b: BudgetRange) -> Self {
        self.profile.budget_range = b;
        self
    }

    pub fn diet_tags(mut self, tags: &[&str]) -> Self {
        self.profile.diet_tags = tags.iter().map(|t| t.to_string()).collect();
        self
    }

    pub fn build(self) -> Profile {
        self.profile
    }
}

pub fn photo(user_id: &str, id: &str, is_primary: bool) -> Photo {
    Photo {
        id: id.to_string(),
        user_id: user_id.to_string(),
        url: format!("https://cdn.example/{}/{}.jpg", user_id, id),
        is_primary,
        created_at: time_utils::now(),
    }
}

pub fn slot_draft(place_name: &str) -> SlotDraft {
    SlotDraft {
        place_name: place_name.to_string(),
        place_category: Some("한식".to_string()),
        place_address: None,
        starts_at: hours_ahead(3),
        notes: String::new(),
    }
}

pub fn slot_in(thread_id: &str, proposer: &str) -> Slot {
    Slot::from_draft(thread_id, proposer, slot_draft("을지면옥"))
}

pub fn gathering_draft(title: &str, max: u32) -> GatheringDraft {
    GatheringDraft {
        title: title.to_string(),
        description: String::new(),
        scheduled_at: hours_ahead(24),
        max_participants: max,
    }
}

pub fn gathering_at(place_id: &str, host: &str) -> Gathering {
    let place = PlaceBuilder::new(place_id).build();
    Gathering::from_draft(host, &place, gathering_draft("점심 번개", 4))
}

// ============================================================================
// Time helpers
// ============================================================================

pub fn hours_ago(h: i64) -> DateTime<Utc> {
    Utc::now() - Duration::hours(h)
}

pub fn hours_ahead(h: i64) -> DateTime<Utc> {
    Utc::now() + Duration::hours(h)
}

// ============================================================================
// DB setup helpers
// ============================================================================

use rusqlite::Connection;
use crate::storage::migrations;

/// Create an in-memory local DB with all migrations applied.
pub fn setup_local_db() -> Connection {
    let conn = Connection::open(":memory:").unwrap();
    conn.execute_batch("PRAGMA foreign_keys=ON;").unwrap();
    migrations::migrate_local_db(&conn).unwrap();
    conn
}

/// In-memory backend with a profile for each of `users`.
pub fn setup_backend(users: &[&str]) -> Arc<SqliteBackend> {
    let backend = Arc::new(SqliteBackend::new(setup_local_db()));
    for id in users {
        backend.upsert_profile(&ProfileBuilder::new(id).name(id).build()).unwrap();
    }
    backend
}
