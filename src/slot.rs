//! Meeting proposals ("slots") and their status machine.
//!
//! `proposed` is the only non-terminal state. Every transition out of it
//! goes through [`guard`], which checks who is acting before anything is
//! written.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::time_utils;
use crate::{AppError, AppResult};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SlotStatus {
    #[default]
    Proposed,
    Accepted,
    Declined,
    Canceled,
}

impl SlotStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Proposed => "proposed",
            Self::Accepted => "accepted",
            Self::Declined => "declined",
            Self::Canceled => "canceled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Proposed)
    }
}

impl std::fmt::Display for SlotStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SlotStatus {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "proposed" => Ok(Self::Proposed),
            "accepted" => Ok(Self::Accepted),
            "declined" => Ok(Self::Declined),
            // older rows spell it with two l's
            "canceled" | "cancelled" => Ok(Self::Canceled),
            _ => Err(format!("Unknown slot status: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotAction {
    Accept,
    Decline,
    Cancel,
}

impl SlotAction {
    pub fn target(&self) -> SlotStatus {
        match self {
            Self::Accept => SlotStatus::Accepted,
            Self::Decline => SlotStatus::Declined,
            Self::Cancel => SlotStatus::Canceled,
        }
    }

    /// System line posted after the status write succeeds.
    pub fn system_text(&self) -> &'static str {
        match self {
            Self::Accept => "식사 제안을 수락했습니다.",
            Self::Decline => "식사 제안을 거절했습니다.",
            Self::Cancel => "식사 제안을 취소했습니다.",
        }
    }
}

pub fn proposal_text(place_name: &str) -> String {
    format!("{}에서 식사를 제안했습니다.", place_name)
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Slot {
    pub id: String,
    pub thread_id: String,
    pub place_name: String,
    pub place_category: Option<String>,
    pub place_address: Option<String>,
    pub proposer_id: String,
    pub starts_at: DateTime<Utc>,
    #[serde(default)]
    pub notes: String,
    pub status: SlotStatus,
    pub created_at: DateTime<Utc>,
}

/// What the proposer fills in on the proposal sheet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotDraft {
    pub place_name: String,
    pub place_category: Option<String>,
    pub place_address: Option<String>,
    pub starts_at: DateTime<Utc>,
    #[serde(default)]
    pub notes: String,
}

impl Slot {
    pub fn from_draft(thread_id: &str, proposer_id: &str, draft: SlotDraft) -> Self {
        Self {
            id: crate::id_gen::slot_id(),
            thread_id: thread_id.to_string(),
            place_name: draft.place_name,
            place_category: draft.place_category,
            place_address: draft.place_address,
            proposer_id: proposer_id.to_string(),
            starts_at: time_utils::at_column_precision(draft.starts_at),
            notes: draft.notes,
            status: SlotStatus::Proposed,
            created_at: time_utils::now(),
        }
    }
}

/// Check that `actor` may apply `action` to `slot`, returning the target
/// status. `actor_is_member` is membership of the slot's thread.
pub fn guard(slot: &Slot, action: SlotAction, actor: &str, actor_is_member: bool) -> AppResult<SlotStatus> {
    if slot.status.is_terminal() {
        return Err(AppError::Guard(format!(
            "slot {} is already {}",
            crate::id_gen::short(&slot.id),
            slot.status
        )));
    }
    match action {
        SlotAction::Accept | SlotAction::Decline => {
            if !actor_is_member {
                return Err(AppError::Guard("only thread members can respond".into()));
            }
            if actor == slot.proposer_id {
                return Err(AppError::Guard("proposer cannot respond to own proposal".into()));
            }
        }
        SlotAction::Cancel => {
            if actor != slot.proposer_id {
                return Err(AppError::Guard("only the proposer can cancel".into()));
            }
        }
    }
    Ok(action.target())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn slot() -> Slot {
        Slot::from_draft(
            "t1",
            "alice",
            SlotDraft {
                place_name: "을지면옥".into(),
                place_category: Some("한식당".into()),
                place_address: None,
                starts_at: Utc::now() + Duration::hours(3),
                notes: String::new(),
            },
        )
    }

    #[test]
    fn test_member_can_accept_or_decline() {
        let s = slot();
        assert_eq!(guard(&s, SlotAction::Accept, "bob", true).unwrap(), SlotStatus::Accepted);
        assert_eq!(guard(&s, SlotAction::Decline, "bob", true).unwrap(), SlotStatus::Declined);
    }

    #[test]
    fn test_proposer_cannot_respond() {
        let s = slot();
        assert!(matches!(guard(&s, SlotAction::Accept, "alice", true), Err(AppError::Guard(_))));
    }

    #[test]
    fn test_non_member_cannot_respond() {
        let s = slot();
        assert!(guard(&s, SlotAction::Decline, "mallory", false).is_err());
    }

    #[test]
    fn test_only_proposer_cancels() {
        let s = slot();
        assert!(guard(&s, SlotAction::Cancel, "bob", true).is_err());
        assert_eq!(guard(&s, SlotAction::Cancel, "alice", true).unwrap(), SlotStatus::Canceled);
    }

    #[test]
    fn test_terminal_states_refuse_everything() {
        for status in [SlotStatus::Accepted, SlotStatus::Declined, SlotStatus::Canceled] {
            let mut s = slot();
            s.status = status;
            assert!(guard(&s, SlotAction::Cancel, "alice", true).is_err());
            assert!(guard(&s, SlotAction::Accept, "bob", true).is_err());
        }
    }

    #[test]
    fn test_status_parse_accepts_legacy_spelling() {
        assert_eq!("cancelled".parse::<SlotStatus>().unwrap(), SlotStatus::Canceled);
        assert_eq!(proposal_text("을지면옥"), "을지면옥에서 식사를 제안했습니다.");
    }
}
