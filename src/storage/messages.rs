use crate::message::Message;
use crate::time_utils;
use crate::AppResult;
use rusqlite::{params, Connection, Row};

use super::{decode_enum, decode_ts};

pub struct MessageStorage;

fn message_from_row(row: &Row) -> rusqlite::Result<Message> {
    let kind: String = row.get("kind")?;
    let created: String = row.get("created_at")?;
    Ok(Message {
        id: row.get("id")?,
        thread_id: row.get("thread_id")?,
        sender_id: row.get("sender_id")?,
        text: row.get("text")?,
        image_url: row.get("image_url")?,
        kind: decode_enum("kind", &kind)?,
        created_at: decode_ts("created_at", &created)?,
    })
}

impl MessageStorage {
    pub fn insert(conn: &Connection, m: &Message) -> AppResult<()> {
        conn.execute(
            "INSERT INTO messages (id, thread_id, sender_id, text, image_url, kind, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                m.id,
                m.thread_id,
                m.sender_id,
                m.text,
                m.image_url,
                m.kind.as_str(),
                time_utils::to_sqlite(&m.created_at),
            ],
        )?;
        Ok(())
    }

    pub fn list(conn: &Connection, thread_id: &str) -> AppResult<Vec<Message>> {
        let mut stmt = conn.prepare(
            "SELECT * FROM messages WHERE thread_id = ?1 ORDER BY created_at ASC, rowid ASC",
        )?;
        let rows = stmt
            .query_map(params![thread_id], message_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}
