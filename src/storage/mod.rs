pub mod backend;
pub mod blocks;
pub mod database;
pub mod gatherings;
pub mod manager;
pub mod messages;
pub mod migrations;
pub mod path_utils;
pub mod photos;
pub mod profiles;
pub mod slots;
pub mod threads;

pub use backend::SqliteBackend;
pub use manager::StorageManager;

use chrono::{DateTime, Utc};
use rusqlite::types::Type;

use crate::{time_utils, AppError};

// ── Row decoding ──
//
// Stored enums and timestamps decode strictly: a bad value fails the row
// with a storage error naming the column.

fn conversion_error(column: &str, msg: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        0,
        Type::Text,
        Box::new(AppError::Storage(format!("{}: {}", column, msg))),
    )
}

pub(crate) fn decode_enum<T>(column: &str, value: &str) -> rusqlite::Result<T>
where
    T: std::str::FromStr<Err = String>,
{
    value.parse().map_err(|e| conversion_error(column, e))
}

pub(crate) fn decode_ts(column: &str, value: &str) -> rusqlite::Result<DateTime<Utc>> {
    time_utils::parse_column(column, value).map_err(|e| conversion_error(column, e.to_string()))
}

pub(crate) fn decode_ts_opt(column: &str, value: Option<String>) -> rusqlite::Result<Option<DateTime<Utc>>> {
    value.map(|v| decode_ts(column, &v)).transpose()
}

pub(crate) fn decode_json_list(value: &str) -> Vec<String> {
    serde_json::from_str(value).unwrap_or_default()
}

pub(crate) fn encode_json_list(list: &[String]) -> String {
    serde_json::to_string(list).unwrap_or_else(|_| "[]".into())
}
