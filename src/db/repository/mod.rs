//! Repository layer: entity-scoped database operations.
//!
//! Free functions over a borrowed `rusqlite::Connection`, one sub-module per
//! table family. All public functions are re-exported here.

mod alert;
mod audit;
mod chat;
mod consent;
mod emotion;
mod recommendation;
mod symptom;
mod timeline;
mod user;

use chrono::{NaiveDate, NaiveDateTime};
use uuid::Uuid;

use super::DatabaseError;

pub use alert::*;
pub use audit::*;
pub use chat::*;
pub use consent::*;
pub use emotion::*;
pub use recommendation::*;
pub use symptom::*;
pub use timeline::*;
pub use user::*;

/// Storage format of every timestamp column.
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
pub const DATE_FORMAT: &str = "%Y-%m-%d";

pub(crate) fn fmt_datetime(dt: &NaiveDateTime) -> String {
    dt.format(DATETIME_FORMAT).to_string()
}

pub(crate) fn parse_datetime(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, DATETIME_FORMAT).unwrap_or_default()
}

pub(crate) fn parse_date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, DATE_FORMAT).unwrap_or_default()
}

pub(crate) fn parse_uuid(s: &str) -> Result<Uuid, DatabaseError> {
    Uuid::parse_str(s).map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))
}

pub(crate) fn parse_opt_uuid(s: Option<String>) -> Option<Uuid> {
    s.and_then(|s| Uuid::parse_str(&s).ok())
}

/// First day of the "last `days` days" window: midnight of `today - days`.
/// The window therefore spans `days + 1` calendar days, today included.
pub(crate) fn window_start_date(today: NaiveDate, days: i64) -> NaiveDate {
    today - chrono::Duration::days(days.max(0))
}

pub(crate) fn window_start(today: NaiveDate, days: i64) -> String {
    fmt_datetime(&window_start_date(today, days).and_time(chrono::NaiveTime::MIN))
}

/// Exclusive end of a window ending on `today`.
pub(crate) fn window_end(today: NaiveDate) -> String {
    let next = today.succ_opt().unwrap_or(today);
    fmt_datetime(&next.and_time(chrono::NaiveTime::MIN))
}

/// Map a `QueryReturnedNoRows` to `Ok(None)`.
pub(crate) fn optional<T>(result: rusqlite::Result<T>) -> Result<Option<T>, DatabaseError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}
