use crate::slot::{Slot, SlotStatus};
use crate::time_utils;
use crate::AppResult;
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{decode_enum, decode_ts};

pub struct SlotStorage;

fn slot_from_row(row: &Row) -> rusqlite::Result<Slot> {
    let status: String = row.get("status")?;
    let starts: String = row.get("starts_at")?;
    let created: String = row.get("created_at")?;
    Ok(Slot {
        id: row.get("id")?,
        thread_id: row.get("thread_id")?,
        place_name: row.get("place_name")?,
        place_category: row.get("place_category")?,
        place_address: row.get("place_address")?,
        proposer_id: row.get("proposer_id")?,
        starts_at: decode_ts("starts_at", &starts)?,
        notes: row.get("notes")?,
        status: decode_enum("status", &status)?,
        created_at: decode_ts("created_at", &created)?,
    })
}

impl SlotStorage {
    pub fn insert(conn: &Connection, s: &Slot) -> AppResult<()> {
        conn.execute(
            "INSERT INTO slots (
                id, thread_id, place_name, place_category, place_address,
                proposer_id, starts_at, notes, status, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                s.id,
                s.thread_id,
                s.place_name,
                s.place_category,
                s.place_address,
                s.proposer_id,
                time_utils::to_sqlite(&s.starts_at),
                s.notes,
                s.status.as_str(),
                time_utils::to_sqlite(&s.created_at),
            ],
        )?;
        Ok(())
    }

    pub fn get(conn: &Connection, id: &str) -> AppResult<Option<Slot>> {
        let slot = conn
            .query_row("SELECT * FROM slots WHERE id = ?1", params![id], slot_from_row)
            .optional()?;
        Ok(slot)
    }

    /// Newest first.
    pub fn list(conn: &Connection, thread_id: &str) -> AppResult<Vec<Slot>> {
        let mut stmt = conn.prepare(
            "SELECT * FROM slots WHERE thread_id = ?1 ORDER BY created_at DESC, rowid DESC",
        )?;
        let rows = stmt
            .query_map(params![thread_id], slot_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Write `to` only if the row is still `from`. Returns whether it did.
    pub fn compare_and_set_status(conn: &Connection, id: &str, from: SlotStatus, to: SlotStatus) -> AppResult<bool> {
        let n = conn.execute(
            "UPDATE slots SET status = ?3 WHERE id = ?1 AND status = ?2",
            params![id, from.as_str(), to.as_str()],
        )?;
        Ok(n == 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{setup_local_db, slot_in};
    use crate::thread::Thread;
    use crate::storage::threads::ThreadStorage;

    #[test]
    fn test_compare_and_set_only_from_expected() {
        let conn = setup_local_db();
        let t = Thread::new_direct();
        ThreadStorage::insert(&conn, &t).unwrap();
        let s = slot_in(&t.id, "alice");
        SlotStorage::insert(&conn, &s).unwrap();

        assert!(SlotStorage::compare_and_set_status(&conn, &s.id, SlotStatus::Proposed, SlotStatus::Accepted).unwrap());
        assert!(!SlotStorage::compare_and_set_status(&conn, &s.id, SlotStatus::Proposed, SlotStatus::Canceled).unwrap());
        assert_eq!(SlotStorage::get(&conn, &s.id).unwrap().unwrap().status, SlotStatus::Accepted);
    }
}
