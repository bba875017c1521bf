//! Threads, messages and meeting proposals.
//!
//! Proposal transitions write the slot status first (compare-and-set from
//! `proposed`) and only then post the system line. The two writes are not
//! atomic: a failed message write is logged and the receipt says so.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::backend::{Backend, Subscription};
use crate::confirm::{CancelProposal, Confirmed};
use crate::id_gen::short;
use crate::message::Message;
use crate::slot::{self, Slot, SlotAction, SlotDraft, SlotStatus};
use crate::thread::{Thread, ThreadSummary};
use crate::validation::{validate_meeting_time, validate_message};
use crate::{AppError, AppResult};

/// Result of a proposal write. `message` is `None` when the status changed
/// but the system line could not be posted.
#[derive(Debug, Clone, PartialEq)]
pub struct ProposalReceipt {
    pub slot: Slot,
    pub message: Option<Message>,
}

pub struct ChatService {
    backend: Arc<dyn Backend>,
}

impl ChatService {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self { backend }
    }

    fn is_member(&self, thread_id: &str, user_id: &str) -> AppResult<bool> {
        Ok(self
            .backend
            .members(thread_id)?
            .iter()
            .any(|m| m.user_id == user_id))
    }

    fn require_member(&self, thread_id: &str, user_id: &str) -> AppResult<()> {
        if self.is_member(thread_id, user_id)? {
            Ok(())
        } else {
            Err(AppError::Unauthorized(format!(
                "{} is not a member of thread {}",
                short(user_id),
                short(thread_id)
            )))
        }
    }

    // ── Threads ──

    /// Threads `user_id` belongs to, newest activity first, with participants.
    pub fn load_threads(&self, user_id: &str) -> AppResult<Vec<ThreadSummary>> {
        let threads = self.backend.threads_for_user(user_id)?;
        let mut out = Vec::with_capacity(threads.len());
        for thread in threads {
            let ids: Vec<String> = self
                .backend
                .members(&thread.id)?
                .into_iter()
                .map(|m| m.user_id)
                .collect();
            let participants = self.backend.get_profiles(&ids)?;
            out.push(ThreadSummary { thread, participants });
        }
        Ok(out)
    }

    /// The DM between `me` and `other`, created on first use.
    pub fn create_or_open_dm(&self, me: &str, other: &str) -> AppResult<Thread> {
        if me == other {
            return Err(AppError::Validation("자기 자신과는 대화할 수 없어요.".into()));
        }
        let (thread, created) = self.backend.open_direct_thread(me, other)?;
        if created {
            tracing::info!(thread = %short(&thread.id), "Direct thread created");
        } else {
            tracing::debug!(thread = %short(&thread.id), "Reusing direct thread");
        }
        Ok(thread)
    }

    // ── Messages ──

    /// Oldest first.
    pub fn load_messages(&self, thread_id: &str) -> AppResult<Vec<Message>> {
        self.backend.list_messages(thread_id)
    }

    pub fn send_message(
        &self,
        sender_id: &str,
        thread_id: &str,
        text: &str,
        image_url: Option<&str>,
    ) -> AppResult<Message> {
        validate_message(text)?;
        self.require_member(thread_id, sender_id)?;
        let message = Message::user(thread_id, sender_id, text.trim(), image_url);
        self.backend.insert_message(&message)?;
        Ok(message)
    }

    pub fn subscribe(&self, thread_id: &str) -> AppResult<Subscription> {
        self.backend.subscribe(thread_id)
    }

    /// Post a system line; failures are logged, not propagated.
    fn post_system(&self, thread_id: &str, actor_id: &str, text: &str) -> Option<Message> {
        let message = Message::system(thread_id, actor_id, text);
        match self.backend.insert_message(&message) {
            Ok(()) => Some(message),
            Err(e) => {
                tracing::warn!(
                    thread = %short(thread_id),
                    error = %e,
                    "System message failed after a successful write"
                );
                None
            }
        }
    }

    // ── Proposals ──

    pub fn load_proposals(&self, thread_id: &str) -> AppResult<Vec<Slot>> {
        self.backend.list_slots(thread_id)
    }

    pub fn create_proposal(
        &self,
        proposer_id: &str,
        thread_id: &str,
        draft: SlotDraft,
        now: &DateTime<Utc>,
    ) -> AppResult<ProposalReceipt> {
        validate_meeting_time(&draft.starts_at, now)?;
        if draft.place_name.trim().is_empty() {
            return Err(AppError::Validation("식당을 선택해주세요.".into()));
        }
        self.require_member(thread_id, proposer_id)?;

        let slot = Slot::from_draft(thread_id, proposer_id, draft);
        self.backend.insert_slot(&slot)?;
        tracing::info!(slot = %short(&slot.id), thread = %short(thread_id), "Proposal created");

        let message = self.post_system(thread_id, proposer_id, &slot::proposal_text(&slot.place_name));
        Ok(ProposalReceipt { slot, message })
    }

    pub fn accept_proposal(&self, actor_id: &str, slot_id: &str) -> AppResult<ProposalReceipt> {
        self.transition(actor_id, slot_id, SlotAction::Accept)
    }

    pub fn decline_proposal(&self, actor_id: &str, slot_id: &str) -> AppResult<ProposalReceipt> {
        self.transition(actor_id, slot_id, SlotAction::Decline)
    }

    pub fn cancel_proposal(&self, actor_id: &str, confirmed: Confirmed<CancelProposal>) -> AppResult<ProposalReceipt> {
        self.transition(actor_id, &confirmed.action().slot_id, SlotAction::Cancel)
    }

    fn transition(&self, actor_id: &str, slot_id: &str, action: SlotAction) -> AppResult<ProposalReceipt> {
        let current = self
            .backend
            .get_slot(slot_id)?
            .ok_or_else(|| AppError::NotFound(format!("slot {}", short(slot_id))))?;
        let is_member = self.is_member(&current.thread_id, actor_id)?;
        let target = slot::guard(&current, action, actor_id, is_member)?;

        if !self.backend.update_slot_status(slot_id, SlotStatus::Proposed, target)? {
            // another client resolved it between our read and write
            return Err(AppError::Guard(format!("slot {} is no longer proposed", short(slot_id))));
        }
        tracing::info!(slot = %short(slot_id), status = %target, "Proposal resolved");

        let slot = Slot { status: target, ..current };
        let message = self.post_system(&slot.thread_id, actor_id, action.system_text());
        Ok(ProposalReceipt { slot, message })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::ChangeEvent;
    use crate::confirm::PendingConfirmation;
    use crate::message::MessageKind;
    use crate::test_helpers::{setup_backend, slot_draft};
    use chrono::Duration;

    fn service(users: &[&str]) -> ChatService {
        ChatService::new(setup_backend(users))
    }

    fn cancel(slot_id: &str) -> Confirmed<CancelProposal> {
        PendingConfirmation::new(CancelProposal { slot_id: slot_id.to_string() }).confirm()
    }

    fn system_texts(chat: &ChatService, thread_id: &str) -> Vec<String> {
        chat.load_messages(thread_id)
            .unwrap()
            .into_iter()
            .filter(|m| m.kind == MessageKind::System)
            .filter_map(|m| m.text)
            .collect()
    }

    #[test]
    fn test_dm_is_created_once() {
        let chat = service(&["alice", "bob"]);
        let first = chat.create_or_open_dm("alice", "bob").unwrap();
        let second = chat.create_or_open_dm("bob", "alice").unwrap();
        assert_eq!(first.id, second.id);
        assert!(!first.is_group);
        assert_eq!(chat.load_threads("alice").unwrap().len(), 1);
    }

    #[test]
    fn test_concurrent_dm_opens_return_one_thread() {
        use std::sync::Barrier;

        for _ in 0..20 {
            let chat = Arc::new(service(&["alice", "bob"]));
            let barrier = Arc::new(Barrier::new(2));
            let handles: Vec<_> = [("alice", "bob"), ("bob", "alice")]
                .into_iter()
                .map(|(me, other)| {
                    let chat = Arc::clone(&chat);
                    let barrier = Arc::clone(&barrier);
                    std::thread::spawn(move || {
                        barrier.wait();
                        chat.create_or_open_dm(me, other).unwrap().id
                    })
                })
                .collect();
            let ids: Vec<String> = handles.into_iter().map(|h| h.join().unwrap()).collect();
            assert_eq!(ids[0], ids[1]);
            assert_eq!(chat.load_threads("bob").unwrap().len(), 1);
        }
    }

    #[test]
    fn test_dm_with_self_is_rejected() {
        let chat = service(&["alice"]);
        assert!(matches!(chat.create_or_open_dm("alice", "alice"), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_load_threads_includes_participants() {
        let chat = service(&["alice", "bob", "carol"]);
        let t1 = chat.create_or_open_dm("alice", "bob").unwrap();
        let t2 = chat.create_or_open_dm("alice", "carol").unwrap();
        std::thread::sleep(std::time::Duration::from_millis(2));
        chat.send_message("alice", &t1.id, "내일 점심?", None).unwrap();

        let threads = chat.load_threads("alice").unwrap();
        assert_eq!(threads[0].thread.id, t1.id);
        assert_eq!(threads[1].thread.id, t2.id);
        let others: Vec<_> = threads[0].others("alice").map(|p| p.id.clone()).collect();
        assert_eq!(others, vec!["bob".to_string()]);
    }

    #[test]
    fn test_send_message_validates_before_writing() {
        let chat = service(&["alice", "bob", "eve"]);
        let t = chat.create_or_open_dm("alice", "bob").unwrap();
        assert!(matches!(chat.send_message("alice", &t.id, "   ", None), Err(AppError::Validation(_))));
        assert!(matches!(chat.send_message("eve", &t.id, "hi", None), Err(AppError::Unauthorized(_))));
        assert!(chat.load_messages(&t.id).unwrap().is_empty());

        let sent = chat.send_message("alice", &t.id, " 안녕 ", Some("https://img/1.jpg")).unwrap();
        assert_eq!(sent.text.as_deref(), Some("안녕"));
        assert_eq!(chat.load_messages(&t.id).unwrap(), vec![sent]);
    }

    #[test]
    fn test_create_proposal_posts_one_system_line() {
        let chat = service(&["alice", "bob"]);
        let t = chat.create_or_open_dm("alice", "bob").unwrap();
        let receipt = chat.create_proposal("alice", &t.id, slot_draft("을지면옥"), &Utc::now()).unwrap();
        assert_eq!(receipt.slot.status, SlotStatus::Proposed);
        assert!(receipt.message.is_some());
        assert_eq!(chat.load_proposals(&t.id).unwrap(), vec![receipt.slot.clone()]);
        assert_eq!(system_texts(&chat, &t.id), vec!["을지면옥에서 식사를 제안했습니다.".to_string()]);
    }

    #[test]
    fn test_create_proposal_in_past_is_rejected() {
        let chat = service(&["alice", "bob"]);
        let t = chat.create_or_open_dm("alice", "bob").unwrap();
        let mut draft = slot_draft("을지면옥");
        draft.starts_at = Utc::now() - Duration::minutes(5);
        let err = chat.create_proposal("alice", &t.id, draft, &Utc::now()).unwrap_err();
        assert_eq!(err.user_message(), "식사 시간은 미래로 설정해야 합니다.");
        assert!(chat.load_proposals(&t.id).unwrap().is_empty());
    }

    #[test]
    fn test_accept_by_counterpart() {
        let chat = service(&["alice", "bob"]);
        let t = chat.create_or_open_dm("alice", "bob").unwrap();
        let slot = chat.create_proposal("alice", &t.id, slot_draft("을지면옥"), &Utc::now()).unwrap().slot;

        assert!(matches!(chat.accept_proposal("alice", &slot.id), Err(AppError::Guard(_))));
        let receipt = chat.accept_proposal("bob", &slot.id).unwrap();
        assert_eq!(receipt.slot.status, SlotStatus::Accepted);
        assert_eq!(receipt.message.unwrap().sender_id, "bob");

        // terminal: nothing else applies
        assert!(chat.decline_proposal("bob", &slot.id).is_err());
        assert!(chat.cancel_proposal("alice", cancel(&slot.id)).is_err());
        assert_eq!(system_texts(&chat, &t.id).len(), 2);
    }

    #[test]
    fn test_cancel_twice_is_guard_violation() {
        let chat = service(&["alice", "bob"]);
        let t = chat.create_or_open_dm("alice", "bob").unwrap();
        let slot = chat.create_proposal("alice", &t.id, slot_draft("을지면옥"), &Utc::now()).unwrap().slot;

        assert!(chat.cancel_proposal("bob", cancel(&slot.id)).is_err());
        let receipt = chat.cancel_proposal("alice", cancel(&slot.id)).unwrap();
        assert_eq!(receipt.slot.status, SlotStatus::Canceled);
        assert!(matches!(chat.cancel_proposal("alice", cancel(&slot.id)), Err(AppError::Guard(_))));

        let cancels: Vec<_> = system_texts(&chat, &t.id)
            .into_iter()
            .filter(|t| t == "식사 제안을 취소했습니다.")
            .collect();
        assert_eq!(cancels.len(), 1);
    }

    #[test]
    fn test_failed_system_line_yields_none() {
        let chat = service(&["alice"]);
        // no such thread: the FK rejects the insert
        assert!(chat.post_system("missing", "alice", "식사 제안을 수락했습니다.").is_none());
    }

    #[test]
    fn test_subscription_sees_proposal_flow() {
        let chat = service(&["alice", "bob"]);
        let t = chat.create_or_open_dm("alice", "bob").unwrap();
        let sub = chat.subscribe(&t.id).unwrap();
        let slot = chat.create_proposal("alice", &t.id, slot_draft("우래옥"), &Utc::now()).unwrap().slot;
        chat.decline_proposal("bob", &slot.id).unwrap();

        let events = sub.drain();
        let slot_events = events.iter().filter(|e| matches!(e, ChangeEvent::SlotChanged(_))).count();
        let msg_events = events.iter().filter(|e| matches!(e, ChangeEvent::MessageInserted(_))).count();
        assert_eq!(slot_events, 2);
        assert_eq!(msg_events, 2);
    }
}
