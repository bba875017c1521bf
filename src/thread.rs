use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::profile::Profile;
use crate::time_utils;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum MemberRole {
    Admin,
    #[default]
    Member,
}

impl MemberRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Member => "member",
        }
    }
}

impl std::fmt::Display for MemberRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MemberRole {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "member" => Ok(Self::Member),
            _ => Err(format!("Unknown member role: {}", s)),
        }
    }
}

/// A conversation: one-to-one DM, or the group thread of a gathering.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Thread {
    pub id: String,
    pub is_group: bool,
    pub gathering_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Thread {
    pub fn new_direct() -> Self {
        let now = time_utils::now();
        Self {
            id: crate::id_gen::thread_id(),
            is_group: false,
            gathering_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn new_group(gathering_id: &str) -> Self {
        Self {
            is_group: true,
            gathering_id: Some(gathering_id.to_string()),
            ..Self::new_direct()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Member {
    pub id: String,
    pub thread_id: String,
    pub user_id: String,
    pub role: MemberRole,
    pub last_read: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Member {
    pub fn new(thread_id: &str, user_id: &str, role: MemberRole) -> Self {
        Self {
            id: crate::id_gen::member_id(),
            thread_id: thread_id.to_string(),
            user_id: user_id.to_string(),
            role,
            last_read: None,
            created_at: time_utils::now(),
        }
    }
}

/// Thread row enriched with the profiles of everyone in it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ThreadSummary {
    pub thread: Thread,
    pub participants: Vec<Profile>,
}

impl ThreadSummary {
    /// Participants other than `me`; for a DM this is the counterpart.
    pub fn others<'a>(&'a self, me: &'a str) -> impl Iterator<Item = &'a Profile> + 'a {
        self.participants.iter().filter(move |p| p.id != me)
    }
}
