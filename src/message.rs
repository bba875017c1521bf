use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::time_utils;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    #[default]
    User,
    /// Generated by a state change (proposal, gathering); rendered centered.
    System,
    Proposal,
}

impl MessageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::System => "system",
            Self::Proposal => "proposal",
        }
    }
}

impl std::fmt::Display for MessageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MessageKind {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "system" => Ok(Self::System),
            "proposal" => Ok(Self::Proposal),
            _ => Err(format!("Unknown message kind: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub id: String,
    pub thread_id: String,
    pub sender_id: String,
    pub text: Option<String>,
    pub image_url: Option<String>,
    pub kind: MessageKind,
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn user(thread_id: &str, sender_id: &str, text: &str, image_url: Option<&str>) -> Self {
        Self {
            id: crate::id_gen::message_id(),
            thread_id: thread_id.to_string(),
            sender_id: sender_id.to_string(),
            text: Some(text.to_string()),
            image_url: image_url.map(str::to_string),
            kind: MessageKind::User,
            created_at: time_utils::now(),
        }
    }

    /// System line attributed to the user whose action caused it.
    pub fn system(thread_id: &str, actor_id: &str, text: &str) -> Self {
        Self {
            kind: MessageKind::System,
            image_url: None,
            ..Self::user(thread_id, actor_id, text, None)
        }
    }

    pub fn is_system(&self) -> bool {
        self.kind == MessageKind::System
    }
}
