use crate::profile::{BudgetRange, Profile};
use crate::time_utils;
use crate::AppResult;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

use super::{decode_json_list, decode_ts, encode_json_list};

pub struct ProfileStorage;

// ── Row mapping ──

fn profile_from_row(row: &Row) -> rusqlite::Result<Profile> {
    let budget: String = row.get("budget_range")?;
    let diet_tags: String = row.get("diet_tags")?;
    let time_slots: String = row.get("time_slots")?;
    let created: String = row.get("created_at")?;
    let updated: String = row.get("updated_at")?;
    Ok(Profile {
        id: row.get("id")?,
        display_name: row.get("display_name")?,
        bio: row.get("bio")?,
        diet_tags: decode_json_list(&diet_tags),
        budget_range: BudgetRange::parse_lenient(&budget),
        time_slots: decode_json_list(&time_slots),
        approx_lat: row.get("approx_lat")?,
        approx_lng: row.get("approx_lng")?,
        push_token: row.get("push_token")?,
        created_at: decode_ts("created_at", &created)?,
        updated_at: decode_ts("updated_at", &updated)?,
    })
}

// ── CRUD ──

impl ProfileStorage {
    pub fn upsert(conn: &Connection, p: &Profile) -> AppResult<()> {
        conn.execute(
            "INSERT INTO profiles (
                id, display_name, bio, diet_tags, budget_range, time_slots,
                approx_lat, approx_lng, push_token, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            ON CONFLICT(id) DO UPDATE SET
                display_name = excluded.display_name,
                bio = excluded.bio,
                diet_tags = excluded.diet_tags,
                budget_range = excluded.budget_range,
                time_slots = excluded.time_slots,
                approx_lat = excluded.approx_lat,
                approx_lng = excluded.approx_lng,
                push_token = excluded.push_token,
                updated_at = excluded.updated_at",
            params![
                p.id,
                p.display_name,
                p.bio,
                encode_json_list(&p.diet_tags),
                p.budget_range.as_str(),
                encode_json_list(&p.time_slots),
                p.approx_lat,
                p.approx_lng,
                p.push_token,
                time_utils::to_sqlite(&p.created_at),
                time_utils::to_sqlite(&p.updated_at),
            ],
        )?;
        Ok(())
    }

    pub fn get(conn: &Connection, id: &str) -> AppResult<Option<Profile>> {
        let profile = conn
            .query_row("SELECT * FROM profiles WHERE id = ?1", params![id], profile_from_row)
            .optional()?;
        Ok(profile)
    }

    /// Profiles for `ids`, in the order given. Unknown ids are skipped.
    pub fn get_many(conn: &Connection, ids: &[String]) -> AppResult<Vec<Profile>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!("SELECT * FROM profiles WHERE id IN ({})", placeholders);
        let mut stmt = conn.prepare(&sql)?;
        let found = stmt
            .query_map(params_from_iter(ids.iter()), profile_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ids
            .iter()
            .filter_map(|id| found.iter().find(|p| &p.id == id).cloned())
            .collect())
    }

    pub fn with_location(conn: &Connection, exclude: &str, limit: usize) -> AppResult<Vec<Profile>> {
        let mut stmt = conn.prepare(
            "SELECT * FROM profiles
             WHERE id != ?1 AND approx_lat IS NOT NULL AND approx_lng IS NOT NULL
             ORDER BY updated_at DESC
             LIMIT ?2",
        )?;
        let rows = stmt
            .query_map(params![exclude, limit as i64], profile_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{setup_local_db, ProfileBuilder};

    #[test]
    fn test_upsert_and_get() {
        let conn = setup_local_db();
        let p = ProfileBuilder::new("u1").name("민수").diet_tags(&["vegan"]).build();
        ProfileStorage::upsert(&conn, &p).unwrap();

        let mut loaded = ProfileStorage::get(&conn, "u1").unwrap().unwrap();
        assert_eq!(loaded.display_name, "민수");
        assert_eq!(loaded.diet_tags, vec!["vegan".to_string()]);

        loaded.bio = "떡볶이 러버".into();
        ProfileStorage::upsert(&conn, &loaded).unwrap();
        assert_eq!(ProfileStorage::get(&conn, "u1").unwrap().unwrap().bio, "떡볶이 러버");
        assert!(ProfileStorage::get(&conn, "nobody").unwrap().is_none());
    }

    #[test]
    fn test_with_location_excludes_self_and_unlocated() {
        let conn = setup_local_db();
        ProfileStorage::upsert(&conn, &ProfileBuilder::new("me").at(37.5, 127.0).build()).unwrap();
        ProfileStorage::upsert(&conn, &ProfileBuilder::new("a").at(37.51, 127.0).build()).unwrap();
        ProfileStorage::upsert(&conn, &ProfileBuilder::new("b").build()).unwrap();

        let rows = ProfileStorage::with_location(&conn, "me", 50).unwrap();
        let ids: Vec<_> = rows.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["a"]);
    }

    #[test]
    fn test_get_many_keeps_requested_order() {
        let conn = setup_local_db();
        for id in ["a", "b", "c"] {
            ProfileStorage::upsert(&conn, &ProfileBuilder::new(id).build()).unwrap();
        }
        let rows = ProfileStorage::get_many(&conn, &["c".into(), "x".into(), "a".into()]).unwrap();
        let ids: Vec<_> = rows.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "a"]);
    }
}
