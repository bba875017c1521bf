use crate::constants::SQLITE_BUSY_TIMEOUT_MS;
use crate::{AppError, AppResult};
use rusqlite::Connection;

/// Ouvre une connexion SQLite avec les pragmas appropries
pub fn open_connection(path: &std::path::Path) -> AppResult<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let conn = Connection::open(path)
        .map_err(|e| AppError::Storage(format!("Failed to open {}: {}", path.display(), e)))?;

    tracing::debug!(path = %path.display(), "Database connection opened");

    configure(&conn, true)?;
    Ok(conn)
}

/// In-memory database (tests, throwaway CLI runs). No WAL.
pub fn open_in_memory() -> AppResult<Connection> {
    let conn = Connection::open_in_memory()
        .map_err(|e| AppError::Storage(format!("Failed to open in-memory db: {}", e)))?;
    configure(&conn, false)?;
    Ok(conn)
}

/// Pragmas communs:
/// - journal_mode = WAL (fichier seulement)
/// - busy_timeout = SQLITE_BUSY_TIMEOUT_MS
/// - foreign_keys = ON
fn configure(conn: &Connection, wal: bool) -> AppResult<()> {
    if wal {
        conn.execute_batch("PRAGMA journal_mode = WAL; PRAGMA synchronous = NORMAL;")
            .map_err(|e| AppError::Storage(format!("Failed to enable WAL: {}", e)))?;
    }
    conn.execute_batch(&format!(
        "PRAGMA busy_timeout = {};
         PRAGMA cache_size = -2000;
         PRAGMA foreign_keys = ON;
         PRAGMA temp_store = MEMORY;",
        SQLITE_BUSY_TIMEOUT_MS,
    ))
    .map_err(|e| AppError::Storage(format!("Failed to configure pragmas: {}", e)))?;
    Ok(())
}
