use std::path::PathBuf;

use crate::AppResult;

use super::backend::SqliteBackend;
use super::migrations;
use super::path_utils;
use super::database;

/// Gestionnaire de storage centralise
pub struct StorageManager {
    db_path: PathBuf,
}

impl StorageManager {
    /// Manager for the default `{data_dir}/local.db`.
    pub fn new() -> Self {
        Self {
            db_path: path_utils::local_db_path(),
        }
    }

    pub fn with_path(db_path: PathBuf) -> Self {
        Self { db_path }
    }

    pub fn db_path(&self) -> &std::path::Path {
        &self.db_path
    }

    /// Ouvre la DB locale (cree si necessaire + migration)
    pub fn open_backend(&self) -> AppResult<SqliteBackend> {
        SqliteBackend::open(&self.db_path)
    }

    /// Create the data directory, the database, and a default config.json
    /// if none exists. Returns the schema version reached.
    pub fn init(&self) -> AppResult<u32> {
        std::fs::create_dir_all(path_utils::data_dir())?;
        let conn = database::open_connection(&self.db_path)?;
        migrations::migrate_local_db(&conn)?;

        let config_path = path_utils::config_path();
        if !config_path.exists() {
            crate::config::AppConfig::default().save_to(&config_path)?;
        }

        migrations::get_schema_version(&conn)
    }
}

impl Default for StorageManager {
    fn default() -> Self {
        Self::new()
    }
}
