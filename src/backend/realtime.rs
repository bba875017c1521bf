//! Per-thread change notification.
//!
//! Writers publish after a successful commit; each subscriber owns an mpsc
//! receiver. Dropping a `Subscription` unsubscribes: its sender fails on the
//! next publish and is pruned.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Mutex;
use std::time::Duration;

use crate::message::Message;
use crate::slot::Slot;

#[derive(Debug, Clone, PartialEq)]
pub enum ChangeEvent {
    MessageInserted(Message),
    SlotChanged(Slot),
}

impl ChangeEvent {
    pub fn thread_id(&self) -> &str {
        match self {
            Self::MessageInserted(m) => &m.thread_id,
            Self::SlotChanged(s) => &s.thread_id,
        }
    }
}

pub struct Subscription {
    id: u64,
    thread_id: String,
    rx: Receiver<ChangeEvent>,
}

impl Subscription {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn thread_id(&self) -> &str {
        &self.thread_id
    }

    /// Everything published since the last drain, without blocking.
    pub fn drain(&self) -> Vec<ChangeEvent> {
        self.rx.try_iter().collect()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<ChangeEvent> {
        self.rx.recv_timeout(timeout).ok()
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("thread_id", &self.thread_id)
            .finish()
    }
}

#[derive(Default)]
pub struct ChangeHub {
    next_id: AtomicU64,
    senders: Mutex<HashMap<String, Vec<(u64, Sender<ChangeEvent>)>>>,
}

impl ChangeHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, thread_id: &str) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let (tx, rx) = mpsc::channel();
        let mut senders = self.senders.lock().unwrap_or_else(|p| p.into_inner());
        senders.entry(thread_id.to_string()).or_default().push((id, tx));
        tracing::debug!(thread = %crate::id_gen::short(thread_id), sub = id, "Realtime subscribed");
        Subscription {
            id,
            thread_id: thread_id.to_string(),
            rx,
        }
    }

    pub fn publish(&self, event: ChangeEvent) {
        let mut senders = self.senders.lock().unwrap_or_else(|p| p.into_inner());
        let thread_id = event.thread_id().to_string();
        if let Some(list) = senders.get_mut(&thread_id) {
            list.retain(|(_, tx)| tx.send(event.clone()).is_ok());
            if list.is_empty() {
                senders.remove(&thread_id);
            }
        }
    }

    pub fn subscriber_count(&self, thread_id: &str) -> usize {
        let senders = self.senders.lock().unwrap_or_else(|p| p.into_inner());
        senders.get(thread_id).map_or(0, Vec::len)
    }
}
