//! Chat screen state: thread list, per-thread messages and proposals, and
//! one realtime subscription per open thread.

use std::collections::HashMap;

use crate::backend::{ChangeEvent, Subscription};
use crate::message::Message;
use crate::services::ChatService;
use crate::slot::Slot;
use crate::thread::ThreadSummary;
use crate::AppResult;

#[derive(Debug, Default)]
pub struct ChatStore {
    threads: Vec<ThreadSummary>,
    messages: HashMap<String, Vec<Message>>,
    proposals: HashMap<String, Vec<Slot>>,
    subscriptions: HashMap<String, Subscription>,
}

impl ChatStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn threads(&self) -> &[ThreadSummary] {
        &self.threads
    }

    pub fn set_threads(&mut self, threads: Vec<ThreadSummary>) {
        self.threads = threads;
    }

    pub fn messages(&self, thread_id: &str) -> &[Message] {
        self.messages.get(thread_id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn set_messages(&mut self, thread_id: &str, messages: Vec<Message>) {
        self.messages.insert(thread_id.to_string(), messages);
    }

    /// Newest first.
    pub fn proposals(&self, thread_id: &str) -> &[Slot] {
        self.proposals.get(thread_id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn set_proposals(&mut self, thread_id: &str, proposals: Vec<Slot>) {
        self.proposals.insert(thread_id.to_string(), proposals);
    }

    /// Add a message we wrote ourselves. The realtime echo is deduplicated.
    pub fn push_message(&mut self, message: Message) {
        self.apply(ChangeEvent::MessageInserted(message));
    }

    pub fn upsert_proposal(&mut self, slot: Slot) {
        self.apply(ChangeEvent::SlotChanged(slot));
    }

    pub fn apply(&mut self, event: ChangeEvent) {
        match event {
            ChangeEvent::MessageInserted(message) => {
                let list = self.messages.entry(message.thread_id.clone()).or_default();
                if !list.iter().any(|m| m.id == message.id) {
                    list.push(message);
                }
            }
            ChangeEvent::SlotChanged(slot) => {
                let list = self.proposals.entry(slot.thread_id.clone()).or_default();
                match list.iter_mut().find(|s| s.id == slot.id) {
                    Some(existing) => *existing = slot,
                    None => list.insert(0, slot),
                }
            }
        }
    }

    // ── Realtime ──

    /// Subscribe to `thread_id` once. Returns false if already subscribed.
    pub fn subscribe(&mut self, chat: &ChatService, thread_id: &str) -> AppResult<bool> {
        if self.subscriptions.contains_key(thread_id) {
            return Ok(false);
        }
        let sub = chat.subscribe(thread_id)?;
        tracing::debug!(thread = %crate::id_gen::short(thread_id), sub = sub.id(), "Subscribed to thread");
        self.subscriptions.insert(thread_id.to_string(), sub);
        Ok(true)
    }

    pub fn unsubscribe(&mut self, thread_id: &str) {
        self.subscriptions.remove(thread_id);
    }

    /// Apply everything delivered since the last poll. Returns the number
    /// of events applied.
    pub fn poll(&mut self) -> usize {
        let events: Vec<ChangeEvent> = self.subscriptions.values().flat_map(Subscription::drain).collect();
        let n = events.len();
        for event in events {
            self.apply(event);
        }
        n
    }

    pub fn subscription_count(&self) -> usize {
        self.subscriptions.len()
    }

    /// Drop every subscription.
    pub fn cleanup(&mut self) {
        if !self.subscriptions.is_empty() {
            tracing::debug!(count = self.subscriptions.len(), "Dropping chat subscriptions");
        }
        self.subscriptions.clear();
    }

    /// Drop subscriptions and all cached data.
    pub fn reset(&mut self) {
        self.cleanup();
        self.threads.clear();
        self.messages.clear();
        self.proposals.clear();
    }
}
