//! Open group meals at a place, each with its own group thread.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::backend::Backend;
use crate::confirm::{CancelGathering, Confirmed};
use crate::constants::{GATHERING_MAX_PARTICIPANTS, GATHERING_MIN_PARTICIPANTS};
use crate::gathering::{
    self, Gathering, GatheringDraft, GatheringParticipant, GatheringStatus, GatheringView, ParticipantStatus,
};
use crate::id_gen::short;
use crate::message::Message;
use crate::place::Place;
use crate::thread::{Member, MemberRole, Thread};
use crate::validation::{validate_meeting_time, validate_title};
use crate::{AppError, AppResult};

pub struct GatheringService {
    backend: Arc<dyn Backend>,
}

impl GatheringService {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self { backend }
    }

    fn require(&self, gathering_id: &str) -> AppResult<Gathering> {
        self.backend
            .get_gathering(gathering_id)?
            .ok_or_else(|| AppError::NotFound(format!("gathering {}", short(gathering_id))))
    }

    fn joined_count(&self, gathering_id: &str) -> AppResult<u32> {
        let n = self
            .backend
            .participants(gathering_id)?
            .iter()
            .filter(|p| p.status == ParticipantStatus::Joined)
            .count();
        Ok(n as u32)
    }

    fn display_name(&self, user_id: &str) -> AppResult<Option<String>> {
        Ok(self.backend.get_profile(user_id)?.map(|p| p.display_name))
    }

    fn post_system(&self, thread_id: &str, actor_id: &str, text: &str) {
        if let Err(e) = self.backend.insert_message(&Message::system(thread_id, actor_id, text)) {
            tracing::warn!(thread = %short(thread_id), error = %e, "Gathering system message failed");
        }
    }

    pub fn view(&self, gathering: Gathering) -> AppResult<GatheringView> {
        let current_participants = self.joined_count(&gathering.id)?;
        let thread_id = self.backend.thread_for_gathering(&gathering.id)?.map(|t| t.id);
        Ok(GatheringView {
            gathering,
            current_participants,
            thread_id,
        })
    }

    /// Gathering, host participant, linked group thread with the host as
    /// admin, and the opening system line. Returns the view.
    pub fn create_gathering(
        &self,
        host_id: &str,
        place: &Place,
        draft: GatheringDraft,
        now: &DateTime<Utc>,
    ) -> AppResult<GatheringView> {
        validate_title(&draft.title)?;
        validate_meeting_time(&draft.scheduled_at, now)?;
        if !(GATHERING_MIN_PARTICIPANTS..=GATHERING_MAX_PARTICIPANTS).contains(&draft.max_participants) {
            return Err(AppError::Validation(format!(
                "인원은 {}명에서 {}명 사이로 설정해주세요.",
                GATHERING_MIN_PARTICIPANTS, GATHERING_MAX_PARTICIPANTS
            )));
        }

        let gathering = Gathering::from_draft(host_id, place, draft);
        self.backend
            .insert_gathering(&gathering, &GatheringParticipant::new(&gathering.id, host_id, true))?;

        let thread = Thread::new_group(&gathering.id);
        self.backend
            .insert_thread(&thread, &[Member::new(&thread.id, host_id, MemberRole::Admin)])?;
        self.post_system(&thread.id, host_id, &gathering::started_text(&gathering.title));

        tracing::info!(gathering = %short(&gathering.id), place = %place.name, "Gathering created");
        Ok(GatheringView {
            gathering,
            current_participants: 1,
            thread_id: Some(thread.id),
        })
    }

    pub fn join_gathering(&self, user_id: &str, gathering_id: &str) -> AppResult<GatheringView> {
        let mut gathering = self.require(gathering_id)?;
        if gathering.status != GatheringStatus::Open {
            return Err(AppError::Conflict("모집이 마감된 모임이에요.".into()));
        }
        let count = self.joined_count(gathering_id)?;
        if count >= gathering.max_participants {
            return Err(AppError::Conflict("모임 인원이 가득 찼어요.".into()));
        }

        let existing = self
            .backend
            .participants(gathering_id)?
            .into_iter()
            .find(|p| p.user_id == user_id);
        if existing.as_ref().is_some_and(|p| p.status == ParticipantStatus::Joined) {
            return Err(AppError::Conflict("이미 참여한 모임이에요.".into()));
        }
        let is_host = existing.as_ref().is_some_and(|p| p.is_host);
        self.backend
            .upsert_participant(&GatheringParticipant::new(gathering_id, user_id, is_host))?;

        let count = count + 1;
        if count >= gathering.max_participants {
            self.backend.update_gathering_status(gathering_id, GatheringStatus::Full)?;
            gathering.status = GatheringStatus::Full;
        }

        let thread = self.backend.thread_for_gathering(gathering_id)?;
        if let Some(thread) = &thread {
            let role = if is_host { MemberRole::Admin } else { MemberRole::Member };
            self.backend.add_member(&Member::new(&thread.id, user_id, role))?;
            if let Some(name) = self.display_name(user_id)? {
                self.post_system(&thread.id, user_id, &gathering::joined_text(&name));
            }
        }

        tracing::info!(gathering = %short(gathering_id), user = %short(user_id), count, "Joined gathering");
        Ok(GatheringView {
            gathering,
            current_participants: count,
            thread_id: thread.map(|t| t.id),
        })
    }

    pub fn leave_gathering(&self, user_id: &str, gathering_id: &str) -> AppResult<()> {
        let gathering = self.require(gathering_id)?;
        if gathering.host_id == user_id {
            return Err(AppError::Guard("host cannot leave; cancel the gathering instead".into()));
        }
        if !matches!(gathering.status, GatheringStatus::Open | GatheringStatus::Full) {
            return Err(AppError::Guard(format!("gathering is {}", gathering.status)));
        }
        let participant = self
            .backend
            .participants(gathering_id)?
            .into_iter()
            .find(|p| p.user_id == user_id && p.status == ParticipantStatus::Joined)
            .ok_or_else(|| AppError::Guard("not currently participating".into()))?;

        self.backend.upsert_participant(&GatheringParticipant {
            status: ParticipantStatus::Left,
            ..participant
        })?;
        if gathering.status == GatheringStatus::Full {
            self.backend.update_gathering_status(gathering_id, GatheringStatus::Open)?;
        }

        if let Some(thread) = self.backend.thread_for_gathering(gathering_id)? {
            self.backend.remove_member(&thread.id, user_id)?;
            if let Some(name) = self.display_name(user_id)? {
                self.post_system(&thread.id, user_id, &gathering::left_text(&name));
            }
        }
        tracing::info!(gathering = %short(gathering_id), user = %short(user_id), "Left gathering");
        Ok(())
    }

    pub fn cancel_gathering(&self, host_id: &str, confirmed: Confirmed<CancelGathering>) -> AppResult<()> {
        let gathering_id = confirmed.into_inner().gathering_id;
        let gathering = self.require(&gathering_id)?;
        if gathering.host_id != host_id {
            return Err(AppError::Guard("only the host can cancel".into()));
        }
        if gathering.status == GatheringStatus::Cancelled {
            return Err(AppError::Guard("gathering already cancelled".into()));
        }

        self.backend
            .update_gathering_status(&gathering_id, GatheringStatus::Cancelled)?;
        if let Some(thread) = self.backend.thread_for_gathering(&gathering_id)? {
            self.post_system(&thread.id, host_id, gathering::CANCELLED_TEXT);
        }
        tracing::info!(gathering = %short(&gathering_id), "Gathering cancelled");
        Ok(())
    }

    /// Open gatherings at a place, soonest first.
    pub fn place_gatherings(&self, place_id: &str) -> AppResult<Vec<GatheringView>> {
        self.backend
            .open_gatherings_for_place(place_id)?
            .into_iter()
            .map(|g| self.view(g))
            .collect()
    }

    /// Hosted or joined, not cancelled, soonest first.
    pub fn my_gatherings(&self, user_id: &str) -> AppResult<Vec<GatheringView>> {
        self.backend
            .gatherings_for_user(user_id)?
            .into_iter()
            .filter(|g| g.status != GatheringStatus::Cancelled)
            .map(|g| self.view(g))
            .collect()
    }
}
