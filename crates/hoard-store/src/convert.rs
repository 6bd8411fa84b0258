//! Column conversion helpers shared by the row mappers.
//!
//! Timestamps are stored as RFC-3339 TEXT, calendar days as `YYYY-MM-DD`
//! TEXT, and UUIDs as their hyphenated string form.  A malformed column
//! surfaces as a `FromSqlConversionFailure` carrying the column index,
//! same as rusqlite's own conversions.

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::Type;
use uuid::Uuid;

pub fn bad_column(
    idx: usize,
    err: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

pub fn bad_value(idx: usize, msg: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, msg.into())
}

pub fn parse_uuid(idx: usize, s: &str) -> rusqlite::Result<Uuid> {
    Uuid::parse_str(s).map_err(|e| bad_column(idx, e))
}

pub fn parse_opt_uuid(idx: usize, s: Option<String>) -> rusqlite::Result<Option<Uuid>> {
    s.map(|s| parse_uuid(idx, &s)).transpose()
}

pub fn parse_datetime(idx: usize, s: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| bad_column(idx, e))
}

pub fn parse_opt_datetime(
    idx: usize,
    s: Option<String>,
) -> rusqlite::Result<Option<DateTime<Utc>>> {
    s.map(|s| parse_datetime(idx, &s)).transpose()
}

pub fn parse_date(idx: usize, s: &str) -> rusqlite::Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| bad_column(idx, e))
}

pub fn parse_opt_date(idx: usize, s: Option<String>) -> rusqlite::Result<Option<NaiveDate>> {
    s.map(|s| parse_date(idx, &s)).transpose()
}

/// Render a day the way [`parse_date`] expects it back.
pub fn fmt_date(d: NaiveDate) -> String {
    d.format("%Y-%m-%d").to_string()
}
