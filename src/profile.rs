use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::FALLBACK_DISPLAY_NAME;
use crate::geo::Coordinates;
use crate::time_utils;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum BudgetRange {
    Low,
    #[default]
    Medium,
    High,
}

impl BudgetRange {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    /// Lenient decode for stored rows: anything unknown is `Medium`.
    pub fn parse_lenient(s: &str) -> Self {
        s.parse().unwrap_or_default()
    }
}

impl std::fmt::Display for BudgetRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for BudgetRange {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            _ => Err(format!("Unknown budget range: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Photo {
    pub id: String,
    pub user_id: String,
    pub url: String,
    pub is_primary: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Profile {
    pub id: String,
    pub display_name: String,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub diet_tags: Vec<String>,
    #[serde(default)]
    pub budget_range: BudgetRange,
    #[serde(default)]
    pub time_slots: Vec<String>,
    pub approx_lat: Option<f64>,
    pub approx_lng: Option<f64>,
    pub push_token: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    pub fn new(id: &str, display_name: &str) -> Self {
        let now = time_utils::now();
        Self {
            id: id.to_string(),
            display_name: display_name.to_string(),
            bio: String::new(),
            diet_tags: Vec::new(),
            budget_range: BudgetRange::Medium,
            time_slots: Vec::new(),
            approx_lat: None,
            approx_lng: None,
            push_token: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn location(&self) -> Option<Coordinates> {
        match (self.approx_lat, self.approx_lng) {
            (Some(lat), Some(lng)) => Some(Coordinates::new(lat, lng)),
            _ => None,
        }
    }

    /// Minimal local profile used when the remote one cannot be loaded.
    /// Name comes from session metadata, then the e-mail local part.
    pub fn fallback(user_id: &str, metadata_name: Option<&str>, email: Option<&str>) -> Self {
        let name = metadata_name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string)
            .or_else(|| {
                email
                    .and_then(|e| e.split('@').next())
                    .filter(|local| !local.is_empty())
                    .map(str::to_string)
            })
            .unwrap_or_else(|| FALLBACK_DISPLAY_NAME.to_string());
        Self::new(user_id, &name)
    }
}

/// Profile plus photos, as rendered on cards and the profile screen.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProfileWithPhotos {
    pub profile: Profile,
    pub photos: Vec<Photo>,
}

impl ProfileWithPhotos {
    pub fn primary_photo(&self) -> Option<&Photo> {
        primary_photo(&self.photos)
    }
}

/// The photo flagged primary, else the first one.
pub fn primary_photo(photos: &[Photo]) -> Option<&Photo> {
    photos.iter().find(|p| p.is_primary).or_else(|| photos.first())
}

/// `blocker_id` no longer sees `blocked_id` on the community screen.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Block {
    pub id: String,
    pub blocker_id: String,
    pub blocked_id: String,
    pub created_at: DateTime<Utc>,
}

impl Block {
    pub fn new(blocker_id: &str, blocked_id: &str) -> Self {
        Self {
            id: crate::id_gen::block_id(),
            blocker_id: blocker_id.to_string(),
            blocked_id: blocked_id.to_string(),
            created_at: time_utils::now(),
        }
    }
}

/// Partial update applied by `update_profile`. `None` leaves a field as is.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileEdit {
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub diet_tags: Option<Vec<String>>,
    pub budget_range: Option<BudgetRange>,
    pub time_slots: Option<Vec<String>>,
    pub location: Option<Coordinates>,
    pub push_token: Option<String>,
}

impl ProfileEdit {
    pub fn apply(&self, profile: &mut Profile) {
        if let Some(name) = &self.display_name {
            profile.display_name = name.trim().to_string();
        }
        if let Some(bio) = &self.bio {
            profile.bio = bio.clone();
        }
        if let Some(tags) = &self.diet_tags {
            profile.diet_tags = tags.clone();
        }
        if let Some(budget) = self.budget_range {
            profile.budget_range = budget;
        }
        if let Some(slots) = &self.time_slots {
            profile.time_slots = slots.clone();
        }
        if let Some(loc) = self.location {
            let loc = loc.obscured();
            profile.approx_lat = Some(loc.latitude);
            profile.approx_lng = Some(loc.longitude);
        }
        if let Some(token) = &self.push_token {
            profile.push_token = Some(token.clone());
        }
    }
}
