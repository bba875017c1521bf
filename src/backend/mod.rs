//! The hosted backend as seen by the client: a relational store with
//! per-thread change notification, plus the auth service.

pub mod auth;
pub mod realtime;

pub use auth::{AuthApi, AuthSession, SignOutScope, VaultAuth};
pub use realtime::{ChangeEvent, ChangeHub, Subscription};

use crate::gathering::{Gathering, GatheringParticipant, GatheringStatus};
use crate::message::Message;
use crate::profile::{Block, Photo, Profile};
use crate::slot::{Slot, SlotStatus};
use crate::thread::{Member, Thread};
use crate::AppResult;

/// Data access used by the services. List methods return rows in the
/// order the screens render them.
pub trait Backend: Send + Sync {
    // ── Profiles ──
    fn get_profile(&self, user_id: &str) -> AppResult<Option<Profile>>;
    fn get_profiles(&self, user_ids: &[String]) -> AppResult<Vec<Profile>>;
    fn upsert_profile(&self, profile: &Profile) -> AppResult<()>;
    /// Profiles with coordinates, excluding `exclude_user`, at most `limit`.
    fn profiles_with_location(&self, exclude_user: &str, limit: usize) -> AppResult<Vec<Profile>>;

    // ── Photos ──
    /// Oldest first.
    fn list_photos(&self, user_id: &str) -> AppResult<Vec<Photo>>;
    fn insert_photo(&self, photo: &Photo) -> AppResult<()>;
    /// Flag `photo_id` primary and every other photo of the user not primary,
    /// in one write.
    fn set_primary_photo(&self, user_id: &str, photo_id: &str) -> AppResult<()>;
    fn delete_photo(&self, user_id: &str, photo_id: &str) -> AppResult<bool>;

    // ── Threads & members ──
    fn insert_thread(&self, thread: &Thread, members: &[Member]) -> AppResult<()>;
    fn get_thread(&self, thread_id: &str) -> AppResult<Option<Thread>>;
    /// Newest `updated_at` first.
    fn threads_for_user(&self, user_id: &str) -> AppResult<Vec<Thread>>;
    /// The non-group thread whose members are exactly `{user_a, user_b}`,
    /// created with both memberships when absent. Lookup and insert are one
    /// atomic step. The flag is true when the thread was created.
    fn open_direct_thread(&self, user_a: &str, user_b: &str) -> AppResult<(Thread, bool)>;
    fn thread_for_gathering(&self, gathering_id: &str) -> AppResult<Option<Thread>>;
    fn members(&self, thread_id: &str) -> AppResult<Vec<Member>>;
    fn add_member(&self, member: &Member) -> AppResult<()>;
    fn remove_member(&self, thread_id: &str, user_id: &str) -> AppResult<()>;

    // ── Messages ──
    /// Also bumps the thread's `updated_at` and notifies subscribers.
    fn insert_message(&self, message: &Message) -> AppResult<()>;
    /// Oldest first.
    fn list_messages(&self, thread_id: &str) -> AppResult<Vec<Message>>;

    // ── Slots ──
    fn insert_slot(&self, slot: &Slot) -> AppResult<()>;
    fn get_slot(&self, slot_id: &str) -> AppResult<Option<Slot>>;
    fn list_slots(&self, thread_id: &str) -> AppResult<Vec<Slot>>;
    /// Compare-and-set. Returns false when the stored status was not `from`.
    fn update_slot_status(&self, slot_id: &str, from: SlotStatus, to: SlotStatus) -> AppResult<bool>;

    // ── Blocks ──
    fn insert_block(&self, block: &Block) -> AppResult<()>;
    fn delete_block(&self, blocker_id: &str, blocked_id: &str) -> AppResult<()>;
    fn blocked_ids(&self, blocker_id: &str) -> AppResult<Vec<String>>;

    // ── Gatherings ──
    fn insert_gathering(&self, gathering: &Gathering, host: &GatheringParticipant) -> AppResult<()>;
    fn get_gathering(&self, gathering_id: &str) -> AppResult<Option<Gathering>>;
    fn update_gathering_status(&self, gathering_id: &str, status: GatheringStatus) -> AppResult<()>;
    /// Open gatherings at a place, soonest first.
    fn open_gatherings_for_place(&self, place_id: &str) -> AppResult<Vec<Gathering>>;
    /// Hosted or joined by the user, soonest first, each gathering once.
    fn gatherings_for_user(&self, user_id: &str) -> AppResult<Vec<Gathering>>;
    fn participants(&self, gathering_id: &str) -> AppResult<Vec<GatheringParticipant>>;
    fn upsert_participant(&self, participant: &GatheringParticipant) -> AppResult<()>;

    // ── Realtime ──
    fn subscribe(&self, thread_id: &str) -> AppResult<Subscription>;
}
