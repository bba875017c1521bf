use std::path::PathBuf;

/// Application data directory.
/// Linux: ~/.config/eating-meeting/
/// macOS: ~/Library/Application Support/eating-meeting/
/// Windows: %APPDATA%/eating-meeting/
pub fn data_dir() -> PathBuf {
    let base = dirs::config_dir().unwrap_or_else(|| {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
    });
    base.join("eating-meeting")
}

/// `{data_dir}/config.json`
pub fn config_path() -> PathBuf {
    data_dir().join("config.json")
}

/// `{data_dir}/local.db`, the SQLite store used offline and by the CLI.
pub fn local_db_path() -> PathBuf {
    data_dir().join("local.db")
}

/// `{data_dir}/session.json`, the persisted auth key/value store.
pub fn session_vault_path() -> PathBuf {
    data_dir().join("session.json")
}

pub fn log_path() -> PathBuf {
    data_dir().join("eating-meeting.log")
}

/// Expand ~ to home directory in paths.
pub fn expand_tilde(path: &str) -> String {
    if path.starts_with("~/") || path == "~" {
        if let Some(home) = dirs::home_dir() {
            return path.replacen('~', &home.to_string_lossy(), 1);
        }
    }
    path.to_string()
}
