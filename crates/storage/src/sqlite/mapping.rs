use chrono::{DateTime, Utc};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;
use study_core::model::{ExecutionLogEntry, LogEntryId, WeekNumber};

use crate::repository::StorageError;

fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn week_from_i64(v: i64) -> Result<WeekNumber, StorageError> {
    let raw = u8::try_from(v).map_err(|_| ser(format!("invalid week: {v}")))?;
    WeekNumber::new(raw).map_err(ser)
}

pub(crate) fn week_to_i64(week: WeekNumber) -> i64 {
    i64::from(week.value())
}

/// Timestamps are stored as integer microseconds since the epoch.
pub(crate) fn datetime_to_micros(at: DateTime<Utc>) -> i64 {
    at.timestamp_micros()
}

pub(crate) fn datetime_from_micros(v: i64) -> Result<DateTime<Utc>, StorageError> {
    DateTime::<Utc>::from_timestamp_micros(v)
        .ok_or_else(|| ser(format!("invalid created_at_us: {v}")))
}

pub(crate) fn map_log_entry_row(row: &SqliteRow) -> Result<ExecutionLogEntry, StorageError> {
    let created_at_us: i64 = row.try_get("created_at_us").map_err(ser)?;
    Ok(ExecutionLogEntry {
        id: LogEntryId::new(row.try_get::<String, _>("id").map_err(ser)?),
        title: row.try_get("title").map_err(ser)?,
        detail: row.try_get("detail").map_err(ser)?,
        week: week_from_i64(row.try_get::<i64, _>("week").map_err(ser)?)?,
        created_at: Some(datetime_from_micros(created_at_us)?),
    })
}
