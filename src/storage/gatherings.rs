use crate::gathering::{Gathering, GatheringParticipant, GatheringStatus};
use crate::time_utils;
use crate::AppResult;
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{decode_enum, decode_ts};

pub struct GatheringStorage;
pub struct ParticipantStorage;

// ── Row mapping ──

fn gathering_from_row(row: &Row) -> rusqlite::Result<Gathering> {
    let status: String = row.get("status")?;
    let scheduled: String = row.get("scheduled_at")?;
    let created: String = row.get("created_at")?;
    Ok(Gathering {
        id: row.get("id")?,
        place_id: row.get("place_id")?,
        place_name: row.get("place_name")?,
        place_address: row.get("place_address")?,
        place_photo_url: row.get("place_photo_url")?,
        place_lat: row.get("place_lat")?,
        place_lng: row.get("place_lng")?,
        host_id: row.get("host_id")?,
        title: row.get("title")?,
        description: row.get("description")?,
        scheduled_at: decode_ts("scheduled_at", &scheduled)?,
        max_participants: row.get("max_participants")?,
        status: decode_enum("status", &status)?,
        created_at: decode_ts("created_at", &created)?,
    })
}

fn participant_from_row(row: &Row) -> rusqlite::Result<GatheringParticipant> {
    let status: String = row.get("status")?;
    let joined: String = row.get("joined_at")?;
    Ok(GatheringParticipant {
        id: row.get("id")?,
        gathering_id: row.get("gathering_id")?,
        user_id: row.get("user_id")?,
        status: decode_enum("status", &status)?,
        is_host: row.get::<_, i32>("is_host")? != 0,
        joined_at: decode_ts("joined_at", &joined)?,
    })
}

// ── Gatherings ──

impl GatheringStorage {
    pub fn insert(conn: &Connection, g: &Gathering) -> AppResult<()> {
        conn.execute(
            "INSERT INTO gatherings (
                id, place_id, place_name, place_address, place_photo_url,
                place_lat, place_lng, host_id, title, description,
                scheduled_at, max_participants, status, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
            params![
                g.id,
                g.place_id,
                g.place_name,
                g.place_address,
                g.place_photo_url,
                g.place_lat,
                g.place_lng,
                g.host_id,
                g.title,
                g.description,
                time_utils::to_sqlite(&g.scheduled_at),
                g.max_participants,
                g.status.as_str(),
                time_utils::to_sqlite(&g.created_at),
            ],
        )?;
        Ok(())
    }

    pub fn get(conn: &Connection, id: &str) -> AppResult<Option<Gathering>> {
        let g = conn
            .query_row("SELECT * FROM gatherings WHERE id = ?1", params![id], gathering_from_row)
            .optional()?;
        Ok(g)
    }

    pub fn update_status(conn: &Connection, id: &str, status: GatheringStatus) -> AppResult<()> {
        conn.execute(
            "UPDATE gatherings SET status = ?2 WHERE id = ?1",
            params![id, status.as_str()],
        )?;
        Ok(())
    }

    pub fn open_for_place(conn: &Connection, place_id: &str) -> AppResult<Vec<Gathering>> {
        let mut stmt = conn.prepare(
            "SELECT * FROM gatherings WHERE place_id = ?1 AND status = 'open'
             ORDER BY scheduled_at ASC",
        )?;
        let rows = stmt
            .query_map(params![place_id], gathering_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Hosted, or joined and not left. `DISTINCT` keeps a host who is also a
    /// participant from appearing twice.
    pub fn for_user(conn: &Connection, user_id: &str) -> AppResult<Vec<Gathering>> {
        let mut stmt = conn.prepare(
            "SELECT DISTINCT g.* FROM gatherings g
             LEFT JOIN gathering_participants p
               ON p.gathering_id = g.id AND p.user_id = ?1 AND p.status = 'joined'
             WHERE g.host_id = ?1 OR p.id IS NOT NULL
             ORDER BY g.scheduled_at ASC",
        )?;
        let rows = stmt
            .query_map(params![user_id], gathering_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

// ── Participants ──

impl ParticipantStorage {
    /// Insert, or reactivate the existing (gathering, user) row.
    pub fn upsert(conn: &Connection, p: &GatheringParticipant) -> AppResult<()> {
        conn.execute(
            "INSERT INTO gathering_participants (id, gathering_id, user_id, status, is_host, joined_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(gathering_id, user_id) DO UPDATE SET
                status = excluded.status,
                joined_at = excluded.joined_at",
            params![
                p.id,
                p.gathering_id,
                p.user_id,
                p.status.as_str(),
                p.is_host as i32,
                time_utils::to_sqlite(&p.joined_at),
            ],
        )?;
        Ok(())
    }

    pub fn list(conn: &Connection, gathering_id: &str) -> AppResult<Vec<GatheringParticipant>> {
        let mut stmt = conn.prepare(
            "SELECT * FROM gathering_participants WHERE gathering_id = ?1
             ORDER BY joined_at ASC, rowid ASC",
        )?;
        let rows = stmt
            .query_map(params![gathering_id], participant_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gathering::ParticipantStatus;
    use crate::test_helpers::{gathering_at, setup_local_db};

    #[test]
    fn test_upsert_reactivates_participant() {
        let conn = setup_local_db();
        let g = gathering_at("p1", "host");
        GatheringStorage::insert(&conn, &g).unwrap();

        let mut p = GatheringParticipant::new(&g.id, "guest", false);
        ParticipantStorage::upsert(&conn, &p).unwrap();
        p.status = ParticipantStatus::Left;
        ParticipantStorage::upsert(&conn, &p).unwrap();

        let fresh = GatheringParticipant::new(&g.id, "guest", false);
        ParticipantStorage::upsert(&conn, &fresh).unwrap();

        let list = ParticipantStorage::list(&conn, &g.id).unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].status, ParticipantStatus::Joined);
        assert_eq!(list[0].id, p.id);
    }

    #[test]
    fn test_for_user_is_distinct_and_skips_left() {
        let conn = setup_local_db();
        let hosted = gathering_at("p1", "me");
        let joined = gathering_at("p2", "other");
        let left = gathering_at("p3", "other");
        for g in [&hosted, &joined, &left] {
            GatheringStorage::insert(&conn, g).unwrap();
        }
        ParticipantStorage::upsert(&conn, &GatheringParticipant::new(&hosted.id, "me", true)).unwrap();
        ParticipantStorage::upsert(&conn, &GatheringParticipant::new(&joined.id, "me", false)).unwrap();
        let mut gone = GatheringParticipant::new(&left.id, "me", false);
        gone.status = ParticipantStatus::Left;
        ParticipantStorage::upsert(&conn, &gone).unwrap();

        let mut ids: Vec<_> = GatheringStorage::for_user(&conn, "me").unwrap().into_iter().map(|g| g.id).collect();
        ids.sort();
        let mut expected = vec![hosted.id, joined.id];
        expected.sort();
        assert_eq!(ids, expected);
    }

    #[test]
    fn test_open_for_place_filters_status() {
        let conn = setup_local_db();
        let a = gathering_at("p1", "h");
        let b = gathering_at("p1", "h");
        GatheringStorage::insert(&conn, &a).unwrap();
        GatheringStorage::insert(&conn, &b).unwrap();
        GatheringStorage::update_status(&conn, &b.id, GatheringStatus::Cancelled).unwrap();
        let open = GatheringStorage::open_for_place(&conn, "p1").unwrap();
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].id, a.id);
    }
}
