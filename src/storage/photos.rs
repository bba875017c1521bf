use crate::profile::Photo;
use crate::time_utils;
use crate::AppResult;
use rusqlite::{params, Connection, Row};

use super::decode_ts;

pub struct PhotoStorage;

fn photo_from_row(row: &Row) -> rusqlite::Result<Photo> {
    let created: String = row.get("created_at")?;
    Ok(Photo {
        id: row.get("id")?,
        user_id: row.get("user_id")?,
        url: row.get("url")?,
        is_primary: row.get::<_, i32>("is_primary")? != 0,
        created_at: decode_ts("created_at", &created)?,
    })
}

impl PhotoStorage {
    pub fn insert(conn: &Connection, photo: &Photo) -> AppResult<()> {
        conn.execute(
            "INSERT INTO photos (id, user_id, url, is_primary, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                photo.id,
                photo.user_id,
                photo.url,
                photo.is_primary as i32,
                time_utils::to_sqlite(&photo.created_at),
            ],
        )?;
        Ok(())
    }

    pub fn list(conn: &Connection, user_id: &str) -> AppResult<Vec<Photo>> {
        let mut stmt = conn.prepare(
            "SELECT * FROM photos WHERE user_id = ?1 ORDER BY created_at ASC, rowid ASC",
        )?;
        let rows = stmt
            .query_map(params![user_id], photo_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// One statement flips every photo of the user, so there is never a
    /// moment with two primaries.
    pub fn set_primary(conn: &Connection, user_id: &str, photo_id: &str) -> AppResult<usize> {
        let changed = conn.execute(
            "UPDATE photos SET is_primary = CASE WHEN id = ?2 THEN 1 ELSE 0 END
             WHERE user_id = ?1",
            params![user_id, photo_id],
        )?;
        Ok(changed)
    }

    pub fn delete(conn: &Connection, user_id: &str, photo_id: &str) -> AppResult<bool> {
        let n = conn.execute(
            "DELETE FROM photos WHERE id = ?1 AND user_id = ?2",
            params![photo_id, user_id],
        )?;
        Ok(n > 0)
    }
}
