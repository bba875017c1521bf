use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::place::Place;
use crate::time_utils;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum GatheringStatus {
    #[default]
    Open,
    Full,
    Cancelled,
    Completed,
}

impl GatheringStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Full => "full",
            Self::Cancelled => "cancelled",
            Self::Completed => "completed",
        }
    }
}

impl std::fmt::Display for GatheringStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for GatheringStatus {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(Self::Open),
            "full" => Ok(Self::Full),
            "cancelled" => Ok(Self::Cancelled),
            "completed" => Ok(Self::Completed),
            _ => Err(format!("Unknown gathering status: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ParticipantStatus {
    #[default]
    Joined,
    Left,
}

impl ParticipantStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Joined => "joined",
            Self::Left => "left",
        }
    }
}

impl std::str::FromStr for ParticipantStatus {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "joined" => Ok(Self::Joined),
            "left" => Ok(Self::Left),
            _ => Err(format!("Unknown participant status: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Gathering {
    pub id: String,
    pub place_id: String,
    pub place_name: String,
    pub place_address: Option<String>,
    pub place_photo_url: Option<String>,
    pub place_lat: Option<f64>,
    pub place_lng: Option<f64>,
    pub host_id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub scheduled_at: DateTime<Utc>,
    pub max_participants: u32,
    pub status: GatheringStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GatheringParticipant {
    pub id: String,
    pub gathering_id: String,
    pub user_id: String,
    pub status: ParticipantStatus,
    pub is_host: bool,
    pub joined_at: DateTime<Utc>,
}

impl GatheringParticipant {
    pub fn new(gathering_id: &str, user_id: &str, is_host: bool) -> Self {
        Self {
            id: crate::id_gen::participant_id(),
            gathering_id: gathering_id.to_string(),
            user_id: user_id.to_string(),
            status: ParticipantStatus::Joined,
            is_host,
            joined_at: time_utils::now(),
        }
    }
}

/// Gathering plus its joined head count and linked group thread.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GatheringView {
    pub gathering: Gathering,
    pub current_participants: u32,
    pub thread_id: Option<String>,
}

impl GatheringView {
    pub fn is_full(&self) -> bool {
        self.current_participants >= self.gathering.max_participants
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatheringDraft {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub scheduled_at: DateTime<Utc>,
    pub max_participants: u32,
}

impl Gathering {
    pub fn from_draft(host_id: &str, place: &Place, draft: GatheringDraft) -> Self {
        Self {
            id: crate::id_gen::gathering_id(),
            place_id: place.id.clone(),
            place_name: place.name.clone(),
            place_address: place.address.clone(),
            place_photo_url: place.photo_uri.clone(),
            place_lat: Some(place.lat),
            place_lng: Some(place.lng),
            host_id: host_id.to_string(),
            title: draft.title.trim().to_string(),
            description: draft.description,
            scheduled_at: time_utils::at_column_precision(draft.scheduled_at),
            max_participants: draft.max_participants,
            status: GatheringStatus::Open,
            created_at: time_utils::now(),
        }
    }
}

pub fn started_text(title: &str) -> String {
    format!("{} 모임이 시작되었습니다!", title)
}

pub fn joined_text(name: &str) -> String {
    format!("{}님이 참여했습니다.", name)
}

pub fn left_text(name: &str) -> String {
    format!("{}님이 나갔습니다.", name)
}

pub const CANCELLED_TEXT: &str = "모임이 취소되었습니다.";
