//! `Backend` over a local SQLite database.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::{Connection, TransactionBehavior};

use crate::backend::{Backend, ChangeEvent, ChangeHub, Subscription};
use crate::gathering::{Gathering, GatheringParticipant, GatheringStatus};
use crate::message::Message;
use crate::profile::{Block, Photo, Profile};
use crate::slot::{Slot, SlotStatus};
use crate::thread::{Member, MemberRole, Thread};
use crate::AppResult;

use super::blocks::BlockStorage;
use super::database;
use super::gatherings::{GatheringStorage, ParticipantStorage};
use super::messages::MessageStorage;
use super::migrations;
use super::photos::PhotoStorage;
use super::profiles::ProfileStorage;
use super::slots::SlotStorage;
use super::threads::{MemberStorage, ThreadStorage};

pub struct SqliteBackend {
    conn: Mutex<Connection>,
    hub: ChangeHub,
}

impl SqliteBackend {
    /// Wrap an already-migrated connection.
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
            hub: ChangeHub::new(),
        }
    }

    pub fn open(path: &Path) -> AppResult<Self> {
        let conn = database::open_connection(path)?;
        migrations::migrate_local_db(&conn)?;
        Ok(Self::new(conn))
    }

    pub fn open_in_memory() -> AppResult<Self> {
        let conn = database::open_in_memory()?;
        migrations::migrate_local_db(&conn)?;
        Ok(Self::new(conn))
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|p| p.into_inner())
    }
}

impl Backend for SqliteBackend {
    fn get_profile(&self, user_id: &str) -> AppResult<Option<Profile>> {
        ProfileStorage::get(&self.conn(), user_id)
    }

    fn get_profiles(&self, user_ids: &[String]) -> AppResult<Vec<Profile>> {
        ProfileStorage::get_many(&self.conn(), user_ids)
    }

    fn upsert_profile(&self, profile: &Profile) -> AppResult<()> {
        ProfileStorage::upsert(&self.conn(), profile)
    }

    fn profiles_with_location(&self, exclude_user: &str, limit: usize) -> AppResult<Vec<Profile>> {
        ProfileStorage::with_location(&self.conn(), exclude_user, limit)
    }

    fn list_photos(&self, user_id: &str) -> AppResult<Vec<Photo>> {
        PhotoStorage::list(&self.conn(), user_id)
    }

    fn insert_photo(&self, photo: &Photo) -> AppResult<()> {
        PhotoStorage::insert(&self.conn(), photo)
    }

    fn set_primary_photo(&self, user_id: &str, photo_id: &str) -> AppResult<()> {
        PhotoStorage::set_primary(&self.conn(), user_id, photo_id)?;
        Ok(())
    }

    fn delete_photo(&self, user_id: &str, photo_id: &str) -> AppResult<bool> {
        PhotoStorage::delete(&self.conn(), user_id, photo_id)
    }

    fn insert_thread(&self, thread: &Thread, members: &[Member]) -> AppResult<()> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        ThreadStorage::insert(&tx, thread)?;
        for m in members {
            MemberStorage::insert(&tx, m)?;
        }
        tx.commit()?;
        Ok(())
    }

    fn get_thread(&self, thread_id: &str) -> AppResult<Option<Thread>> {
        ThreadStorage::get(&self.conn(), thread_id)
    }

    fn threads_for_user(&self, user_id: &str) -> AppResult<Vec<Thread>> {
        ThreadStorage::for_user(&self.conn(), user_id)
    }

    fn open_direct_thread(&self, user_a: &str, user_b: &str) -> AppResult<(Thread, bool)> {
        let mut conn = self.conn();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        if let Some(existing) = ThreadStorage::find_direct(&tx, user_a, user_b)? {
            return Ok((existing, false));
        }
        let thread = Thread::new_direct();
        ThreadStorage::insert(&tx, &thread)?;
        for user_id in [user_a, user_b] {
            MemberStorage::insert(&tx, &Member::new(&thread.id, user_id, MemberRole::Member))?;
        }
        tx.commit()?;
        Ok((thread, true))
    }

    fn thread_for_gathering(&self, gathering_id: &str) -> AppResult<Option<Thread>> {
        ThreadStorage::for_gathering(&self.conn(), gathering_id)
    }

    fn members(&self, thread_id: &str) -> AppResult<Vec<Member>> {
        MemberStorage::list(&self.conn(), thread_id)
    }

    fn add_member(&self, member: &Member) -> AppResult<()> {
        MemberStorage::insert(&self.conn(), member)
    }

    fn remove_member(&self, thread_id: &str, user_id: &str) -> AppResult<()> {
        MemberStorage::remove(&self.conn(), thread_id, user_id)
    }

    fn insert_message(&self, message: &Message) -> AppResult<()> {
        {
            let mut conn = self.conn();
            let tx = conn.transaction()?;
            MessageStorage::insert(&tx, message)?;
            ThreadStorage::touch(&tx, &message.thread_id, &message.created_at)?;
            tx.commit()?;
        }
        self.hub.publish(ChangeEvent::MessageInserted(message.clone()));
        Ok(())
    }

    fn list_messages(&self, thread_id: &str) -> AppResult<Vec<Message>> {
        MessageStorage::list(&self.conn(), thread_id)
    }

    fn insert_slot(&self, slot: &Slot) -> AppResult<()> {
        SlotStorage::insert(&self.conn(), slot)?;
        self.hub.publish(ChangeEvent::SlotChanged(slot.clone()));
        Ok(())
    }

    fn get_slot(&self, slot_id: &str) -> AppResult<Option<Slot>> {
        SlotStorage::get(&self.conn(), slot_id)
    }

    fn list_slots(&self, thread_id: &str) -> AppResult<Vec<Slot>> {
        SlotStorage::list(&self.conn(), thread_id)
    }

    fn update_slot_status(&self, slot_id: &str, from: SlotStatus, to: SlotStatus) -> AppResult<bool> {
        let updated = {
            let conn = self.conn();
            if SlotStorage::compare_and_set_status(&conn, slot_id, from, to)? {
                SlotStorage::get(&conn, slot_id)?
            } else {
                None
            }
        };
        match updated {
            Some(slot) => {
                self.hub.publish(ChangeEvent::SlotChanged(slot));
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn insert_block(&self, block: &Block) -> AppResult<()> {
        BlockStorage::insert(&self.conn(), block)
    }

    fn delete_block(&self, blocker_id: &str, blocked_id: &str) -> AppResult<()> {
        BlockStorage::delete(&self.conn(), blocker_id, blocked_id)
    }

    fn blocked_ids(&self, blocker_id: &str) -> AppResult<Vec<String>> {
        BlockStorage::blocked_ids(&self.conn(), blocker_id)
    }

    fn insert_gathering(&self, gathering: &Gathering, host: &GatheringParticipant) -> AppResult<()> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        GatheringStorage::insert(&tx, gathering)?;
        ParticipantStorage::upsert(&tx, host)?;
        tx.commit()?;
        Ok(())
    }

    fn get_gathering(&self, gathering_id: &str) -> AppResult<Option<Gathering>> {
        GatheringStorage::get(&self.conn(), gathering_id)
    }

    fn update_gathering_status(&self, gathering_id: &str, status: GatheringStatus) -> AppResult<()> {
        GatheringStorage::update_status(&self.conn(), gathering_id, status)
    }

    fn open_gatherings_for_place(&self, place_id: &str) -> AppResult<Vec<Gathering>> {
        GatheringStorage::open_for_place(&self.conn(), place_id)
    }

    fn gatherings_for_user(&self, user_id: &str) -> AppResult<Vec<Gathering>> {
        GatheringStorage::for_user(&self.conn(), user_id)
    }

    fn participants(&self, gathering_id: &str) -> AppResult<Vec<GatheringParticipant>> {
        ParticipantStorage::list(&self.conn(), gathering_id)
    }

    fn upsert_participant(&self, participant: &GatheringParticipant) -> AppResult<()> {
        ParticipantStorage::upsert(&self.conn(), participant)
    }

    fn subscribe(&self, thread_id: &str) -> AppResult<Subscription> {
        Ok(self.hub.subscribe(thread_id))
    }
}
