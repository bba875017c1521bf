//! Persisted key/value store for auth material (`{data_dir}/session.json`).
//!
//! Every mutation is written through to disk. A vault opened without a
//! path keeps its entries in memory only.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::constants::LEGACY_AUTH_STORAGE_KEY;
use crate::AppResult;

pub struct SessionVault {
    path: Option<PathBuf>,
    entries: Mutex<BTreeMap<String, String>>,
}

/// Keys a sign-out must purge: the configured key, the legacy key, and any
/// `sb-*-auth-token`.
pub fn is_auth_key(key: &str, storage_key: &str) -> bool {
    key == storage_key
        || key == LEGACY_AUTH_STORAGE_KEY
        || (key.starts_with("sb-") && key.ends_with("-auth-token"))
}

impl SessionVault {
    pub fn open(path: &Path) -> Self {
        let entries = match std::fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!(path = %path.display(), error = %e, "Corrupt session vault, starting empty");
                BTreeMap::new()
            }),
            Err(_) => BTreeMap::new(),
        };
        Self {
            path: Some(path.to_path_buf()),
            entries: Mutex::new(entries),
        }
    }

    pub fn in_memory() -> Self {
        Self {
            path: None,
            entries: Mutex::new(BTreeMap::new()),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, String>> {
        self.entries.lock().unwrap_or_else(|p| p.into_inner())
    }

    fn persist(&self, entries: &BTreeMap<String, String>) -> AppResult<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(entries)?)?;
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.lock().get(key).cloned()
    }

    pub fn set(&self, key: &str, value: &str) -> AppResult<()> {
        let mut entries = self.lock();
        entries.insert(key.to_string(), value.to_string());
        self.persist(&entries)
    }

    pub fn remove(&self, key: &str) -> AppResult<bool> {
        let mut entries = self.lock();
        let removed = entries.remove(key).is_some();
        if removed {
            self.persist(&entries)?;
        }
        Ok(removed)
    }

    pub fn keys(&self) -> Vec<String> {
        self.lock().keys().cloned().collect()
    }

    /// Remove every auth key. Returns the keys removed.
    pub fn purge_auth_keys(&self, storage_key: &str) -> AppResult<Vec<String>> {
        let mut entries = self.lock();
        let doomed: Vec<String> = entries
            .keys()
            .filter(|k| is_auth_key(k, storage_key))
            .cloned()
            .collect();
        for key in &doomed {
            entries.remove(key);
        }
        if !doomed.is_empty() {
            self.persist(&entries)?;
        }
        Ok(doomed)
    }
}
