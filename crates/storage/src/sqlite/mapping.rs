use chrono::{DateTime, Utc};
use mentornet_core::model::StudentId;
use sqlx::Row;

use crate::repository::{CachedIdentity, StorageError};

fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn map_identity_row(
    row: &sqlx::sqlite::SqliteRow,
) -> Result<CachedIdentity, StorageError> {
    let raw: String = row.try_get("student_id").map_err(ser)?;
    let stored_at: DateTime<Utc> = row.try_get("stored_at").map_err(ser)?;
    let student_id = StudentId::new(raw).map_err(ser)?;
    Ok(CachedIdentity {
        student_id,
        stored_at,
    })
}
