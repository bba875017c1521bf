use crate::profile::Block;
use crate::time_utils;
use crate::AppResult;
use rusqlite::{params, Connection};

pub struct BlockStorage;

impl BlockStorage {
    /// Unique per (blocker, blocked); blocking twice keeps the first row.
    pub fn insert(conn: &Connection, b: &Block) -> AppResult<()> {
        conn.execute(
            "INSERT OR IGNORE INTO blocks (id, blocker_id, blocked_id, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![b.id, b.blocker_id, b.blocked_id, time_utils::to_sqlite(&b.created_at)],
        )?;
        Ok(())
    }

    pub fn delete(conn: &Connection, blocker_id: &str, blocked_id: &str) -> AppResult<()> {
        conn.execute(
            "DELETE FROM blocks WHERE blocker_id = ?1 AND blocked_id = ?2",
            params![blocker_id, blocked_id],
        )?;
        Ok(())
    }

    pub fn blocked_ids(conn: &Connection, blocker_id: &str) -> AppResult<Vec<String>> {
        let mut stmt = conn.prepare(
            "SELECT blocked_id FROM blocks WHERE blocker_id = ?1 ORDER BY created_at DESC",
        )?;
        let rows = stmt
            .query_map(params![blocker_id], |r| r.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}
