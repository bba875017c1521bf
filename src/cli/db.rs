use std::path::PathBuf;

use anyhow::{Context, Result};
use eating_meeting::storage::path_utils::expand_tilde;
use eating_meeting::storage::StorageManager;

/// `db init [--path]`: create or migrate the local store.
pub fn init(path: Option<&str>) -> Result<()> {
    let manager = match path {
        Some(p) => StorageManager::with_path(PathBuf::from(expand_tilde(p))),
        None => StorageManager::new(),
    };
    let version = manager
        .init()
        .with_context(|| format!("Failed to initialize {}", manager.db_path().display()))?;

    println!("Database: {}", manager.db_path().display());
    println!("Schema version: {}", version);
    Ok(())
}
