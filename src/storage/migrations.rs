use crate::{AppError, AppResult};
use rusqlite::Connection;

/// Schema version actuelle
pub const CURRENT_SCHEMA_VERSION: u32 = 2;

/// Retourne la version de schema actuelle (0 si table absente)
pub fn get_schema_version(conn: &Connection) -> AppResult<u32> {
    let exists: bool = conn
        .query_row(
            "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type='table' AND name='schema_version'",
            [],
            |r| r.get(0),
        )
        .map_err(|e| AppError::Storage(e.to_string()))?;

    if !exists {
        return Ok(0);
    }

    let version: u32 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_version",
            [],
            |r| r.get(0),
        )
        .map_err(|e| AppError::Storage(e.to_string()))?;

    Ok(version)
}

fn set_schema_version(conn: &Connection, version: u32) -> AppResult<()> {
    conn.execute(
        "INSERT OR REPLACE INTO schema_version (version, applied_at) VALUES (?1, datetime('now'))",
        rusqlite::params![version],
    )
    .map_err(|e| AppError::Storage(e.to_string()))?;
    Ok(())
}

// ── Local DB ──

const LOCAL_DB_V1: &str = "
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS profiles (
    id TEXT PRIMARY KEY,
    display_name TEXT NOT NULL,
    bio TEXT NOT NULL DEFAULT '',
    diet_tags TEXT NOT NULL DEFAULT '[]',
    budget_range TEXT NOT NULL DEFAULT 'medium',
    time_slots TEXT NOT NULL DEFAULT '[]',
    approx_lat REAL,
    approx_lng REAL,
    push_token TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS photos (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL REFERENCES profiles(id) ON DELETE CASCADE,
    url TEXT NOT NULL,
    is_primary INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_photos_user ON photos(user_id);

CREATE TABLE IF NOT EXISTS threads (
    id TEXT PRIMARY KEY,
    is_group INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_threads_updated ON threads(updated_at);

CREATE TABLE IF NOT EXISTS members (
    id TEXT PRIMARY KEY,
    thread_id TEXT NOT NULL REFERENCES threads(id) ON DELETE CASCADE,
    user_id TEXT NOT NULL,
    role TEXT NOT NULL DEFAULT 'member',
    last_read TEXT,
    created_at TEXT NOT NULL,
    UNIQUE(thread_id, user_id)
);
CREATE INDEX IF NOT EXISTS idx_members_user ON members(user_id);

CREATE TABLE IF NOT EXISTS messages (
    id TEXT PRIMARY KEY,
    thread_id TEXT NOT NULL REFERENCES threads(id) ON DELETE CASCADE,
    sender_id TEXT NOT NULL,
    text TEXT,
    image_url TEXT,
    kind TEXT NOT NULL DEFAULT 'user',
    created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_messages_thread ON messages(thread_id, created_at);

CREATE TABLE IF NOT EXISTS slots (
    id TEXT PRIMARY KEY,
    thread_id TEXT NOT NULL REFERENCES threads(id) ON DELETE CASCADE,
    place_name TEXT NOT NULL,
    place_category TEXT,
    place_address TEXT,
    proposer_id TEXT NOT NULL,
    starts_at TEXT NOT NULL,
    notes TEXT NOT NULL DEFAULT '',
    status TEXT NOT NULL DEFAULT 'proposed',
    created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_slots_thread ON slots(thread_id);

CREATE TABLE IF NOT EXISTS blocks (
    id TEXT PRIMARY KEY,
    blocker_id TEXT NOT NULL,
    blocked_id TEXT NOT NULL,
    created_at TEXT NOT NULL,
    UNIQUE(blocker_id, blocked_id)
);
";

/// V2: gatherings (group meals) and the thread link to them.
const LOCAL_DB_V2: &str = "
CREATE TABLE IF NOT EXISTS gatherings (
    id TEXT PRIMARY KEY,
    place_id TEXT NOT NULL,
    place_name TEXT NOT NULL,
    place_address TEXT,
    place_photo_url TEXT,
    place_lat REAL,
    place_lng REAL,
    host_id TEXT NOT NULL,
    title TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    scheduled_at TEXT NOT NULL,
    max_participants INTEGER NOT NULL,
    status TEXT NOT NULL DEFAULT 'open',
    created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_gatherings_place ON gatherings(place_id, status);

CREATE TABLE IF NOT EXISTS gathering_participants (
    id TEXT PRIMARY KEY,
    gathering_id TEXT NOT NULL REFERENCES gatherings(id) ON DELETE CASCADE,
    user_id TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'joined',
    is_host INTEGER NOT NULL DEFAULT 0,
    joined_at TEXT NOT NULL,
    UNIQUE(gathering_id, user_id)
);
CREATE INDEX IF NOT EXISTS idx_participants_user ON gathering_participants(user_id);

ALTER TABLE threads ADD COLUMN gathering_id TEXT REFERENCES gatherings(id) ON DELETE SET NULL;
";

/// Verifie et applique les migrations pour la DB locale
pub fn migrate_local_db(conn: &Connection) -> AppResult<()> {
    let version = get_schema_version(conn)?;

    if version < 1 {
        conn.execute_batch(LOCAL_DB_V1)
            .map_err(|e| AppError::Storage(format!("Local DB V1 migration failed: {}", e)))?;
        set_schema_version(conn, 1)?;
    }

    if version < 2 {
        conn.execute_batch(LOCAL_DB_V2)
            .map_err(|e| AppError::Storage(format!("Local DB V2 migration failed: {}", e)))?;
        set_schema_version(conn, 2)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::database::open_in_memory;

    #[test]
    fn test_fresh_db_reaches_current_version() {
        let conn = open_in_memory().unwrap();
        assert_eq!(get_schema_version(&conn).unwrap(), 0);
        migrate_local_db(&conn).unwrap();
        assert_eq!(get_schema_version(&conn).unwrap(), CURRENT_SCHEMA_VERSION);
    }

    #[test]
    fn test_migration_is_idempotent() {
        let conn = open_in_memory().unwrap();
        migrate_local_db(&conn).unwrap();
        migrate_local_db(&conn).unwrap();
        assert_eq!(get_schema_version(&conn).unwrap(), CURRENT_SCHEMA_VERSION);
    }

    #[test]
    fn test_v2_adds_gathering_link() {
        let conn = open_in_memory().unwrap();
        migrate_local_db(&conn).unwrap();
        let cols: Vec<String> = conn
            .prepare("PRAGMA table_info(threads)")
            .unwrap()
            .query_map([], |r| r.get::<_, String>(1))
            .unwrap()
            .filter_map(|r| r.ok())
            .collect();
        assert!(cols.contains(&"gathering_id".to_string()));
    }
}
