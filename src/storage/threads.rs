use chrono::{DateTime, Utc};

use crate::thread::{Member, Thread};
use crate::time_utils;
use crate::AppResult;
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{decode_enum, decode_ts, decode_ts_opt};

pub struct ThreadStorage;
pub struct MemberStorage;

// ── Row mapping ──

fn thread_from_row(row: &Row) -> rusqlite::Result<Thread> {
    let created: String = row.get("created_at")?;
    let updated: String = row.get("updated_at")?;
    Ok(Thread {
        id: row.get("id")?,
        is_group: row.get::<_, i32>("is_group")? != 0,
        gathering_id: row.get("gathering_id")?,
        created_at: decode_ts("created_at", &created)?,
        updated_at: decode_ts("updated_at", &updated)?,
    })
}

fn member_from_row(row: &Row) -> rusqlite::Result<Member> {
    let role: String = row.get("role")?;
    let created: String = row.get("created_at")?;
    Ok(Member {
        id: row.get("id")?,
        thread_id: row.get("thread_id")?,
        user_id: row.get("user_id")?,
        role: decode_enum("role", &role)?,
        last_read: decode_ts_opt("last_read", row.get("last_read")?)?,
        created_at: decode_ts("created_at", &created)?,
    })
}

// ── Threads ──

impl ThreadStorage {
    pub fn insert(conn: &Connection, thread: &Thread) -> AppResult<()> {
        conn.execute(
            "INSERT INTO threads (id, is_group, gathering_id, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                thread.id,
                thread.is_group as i32,
                thread.gathering_id,
                time_utils::to_sqlite(&thread.created_at),
                time_utils::to_sqlite(&thread.updated_at),
            ],
        )?;
        Ok(())
    }

    pub fn get(conn: &Connection, id: &str) -> AppResult<Option<Thread>> {
        let thread = conn
            .query_row("SELECT * FROM threads WHERE id = ?1", params![id], thread_from_row)
            .optional()?;
        Ok(thread)
    }

    pub fn for_user(conn: &Connection, user_id: &str) -> AppResult<Vec<Thread>> {
        let mut stmt = conn.prepare(
            "SELECT t.* FROM threads t
             JOIN members m ON m.thread_id = t.id
             WHERE m.user_id = ?1
             ORDER BY t.updated_at DESC, t.rowid DESC",
        )?;
        let rows = stmt
            .query_map(params![user_id], thread_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Oldest non-group thread whose member set is exactly `{a, b}`.
    pub fn find_direct(conn: &Connection, a: &str, b: &str) -> AppResult<Option<Thread>> {
        let thread = conn
            .query_row(
                "SELECT t.* FROM threads t
                 WHERE t.is_group = 0
                   AND EXISTS (SELECT 1 FROM members m WHERE m.thread_id = t.id AND m.user_id = ?1)
                   AND EXISTS (SELECT 1 FROM members m WHERE m.thread_id = t.id AND m.user_id = ?2)
                   AND (SELECT COUNT(*) FROM members m WHERE m.thread_id = t.id) = 2
                 ORDER BY t.created_at ASC, t.rowid ASC
                 LIMIT 1",
                params![a, b],
                thread_from_row,
            )
            .optional()?;
        Ok(thread)
    }

    pub fn for_gathering(conn: &Connection, gathering_id: &str) -> AppResult<Option<Thread>> {
        let thread = conn
            .query_row(
                "SELECT * FROM threads WHERE gathering_id = ?1 ORDER BY created_at ASC LIMIT 1",
                params![gathering_id],
                thread_from_row,
            )
            .optional()?;
        Ok(thread)
    }

    pub fn touch(conn: &Connection, id: &str, at: &DateTime<Utc>) -> AppResult<()> {
        conn.execute(
            "UPDATE threads SET updated_at = ?2 WHERE id = ?1",
            params![id, time_utils::to_sqlite(at)],
        )?;
        Ok(())
    }
}

// ── Members ──

impl MemberStorage {
    /// Re-adding an existing member is a no-op.
    pub fn insert(conn: &Connection, member: &Member) -> AppResult<()> {
        conn.execute(
            "INSERT OR IGNORE INTO members (id, thread_id, user_id, role, last_read, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                member.id,
                member.thread_id,
                member.user_id,
                member.role.as_str(),
                member.last_read.map(|dt| time_utils::to_sqlite(&dt)),
                time_utils::to_sqlite(&member.created_at),
            ],
        )?;
        Ok(())
    }

    pub fn list(conn: &Connection, thread_id: &str) -> AppResult<Vec<Member>> {
        let mut stmt = conn.prepare(
            "SELECT * FROM members WHERE thread_id = ?1 ORDER BY created_at ASC, rowid ASC",
        )?;
        let rows = stmt
            .query_map(params![thread_id], member_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn remove(conn: &Connection, thread_id: &str, user_id: &str) -> AppResult<()> {
        conn.execute(
            "DELETE FROM members WHERE thread_id = ?1 AND user_id = ?2",
            params![thread_id, user_id],
        )?;
        Ok(())
    }
}
