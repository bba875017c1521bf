use chrono::{DateTime, Duration, SecondsFormat, SubsecRound, Utc};

use crate::{AppError, AppResult};

/// Current time at column precision, so a freshly built record equals the
/// same record read back from storage.
pub fn now() -> DateTime<Utc> {
    at_column_precision(Utc::now())
}

/// Truncate to the microseconds kept by [`to_sqlite`].
pub fn at_column_precision(dt: DateTime<Utc>) -> DateTime<Utc> {
    dt.trunc_subsecs(6)
}

/// RFC 3339 text as stored in the `*_at` columns. Fixed width (micros, `Z`)
/// so that text ordering in SQL matches time ordering.
pub fn to_sqlite(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn from_sqlite(s: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    s.parse::<DateTime<Utc>>()
}

/// Strict variant for row mapping: a malformed timestamp is a storage error
/// naming the column, not a silent "now".
pub fn parse_column(column: &str, s: &str) -> AppResult<DateTime<Utc>> {
    from_sqlite(s).map_err(|e| AppError::Storage(format!("Bad timestamp in {}: {} ({})", column, s, e)))
}

pub fn is_future(dt: &DateTime<Utc>, reference: &DateTime<Utc>) -> bool {
    dt > reference
}

pub fn ms(millis: u64) -> std::time::Duration {
    std::time::Duration::from_millis(millis)
}

pub fn hours_from(reference: &DateTime<Utc>, hours: i64) -> DateTime<Utc> {
    *reference + Duration::hours(hours)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip() {
        let dt = now();
        let s = to_sqlite(&dt);
        let parsed = from_sqlite(&s).unwrap();
        assert_eq!(dt, parsed);
    }

    #[test]
    fn test_column_precision_survives_storage() {
        let raw = DateTime::parse_from_rfc3339("2026-03-01T12:00:00.123456789Z")
            .unwrap()
            .with_timezone(&Utc);
        let kept = at_column_precision(raw);
        assert_eq!(to_sqlite(&kept), "2026-03-01T12:00:00.123456Z");
        assert_eq!(from_sqlite(&to_sqlite(&kept)).unwrap(), kept);
        assert_ne!(from_sqlite(&to_sqlite(&raw)).unwrap(), raw);
    }

    #[test]
    fn test_text_order_matches_time_order() {
        let a = now();
        let b = a + Duration::milliseconds(1);
        assert!(to_sqlite(&a) < to_sqlite(&b));
        assert_eq!(to_sqlite(&a).len(), to_sqlite(&b).len());
    }

    #[test]
    fn test_parse_column_names_column() {
        let err = parse_column("starts_at", "yesterday").unwrap_err();
        assert!(err.to_string().contains("starts_at"));
    }

    #[test]
    fn test_is_future() {
        let t = now();
        assert!(is_future(&hours_from(&t, 1), &t));
        assert!(!is_future(&t, &t));
    }
}
