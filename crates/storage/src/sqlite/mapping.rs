use lms_core::model::{Money, Progress, Score};

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

/// Maps driver errors, keeping constraint violations distinguishable.
pub(crate) fn db_err(e: sqlx::Error) -> StorageError {
    if let sqlx::Error::Database(db) = &e {
        if db.is_unique_violation() {
            return StorageError::Conflict;
        }
        if db.is_foreign_key_violation() {
            return StorageError::NotFound;
        }
    }
    StorageError::Connection(e.to_string())
}

pub(crate) fn i64_to_u64(field: &'static str, v: i64) -> Result<u64, StorageError> {
    u64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} sign overflow")))
}

pub(crate) fn id_i64(field: &'static str, v: u64) -> Result<i64, StorageError> {
    i64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} overflow")))
}

pub(crate) fn u32_from_i64(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(crate) fn money_to_i64(m: Money) -> Result<i64, StorageError> {
    id_i64("amount", m.cents())
}

pub(crate) fn money_from_i64(v: i64) -> Result<Money, StorageError> {
    Ok(Money::from_cents(i64_to_u64("amount", v)?))
}

pub(crate) fn progress_from_i64(v: i64) -> Result<Progress, StorageError> {
    Progress::from_hundredths(u32_from_i64("progress", v)?).map_err(ser)
}

pub(crate) fn score_from_i64(v: Option<i64>) -> Result<Option<Score>, StorageError> {
    v.map(|v| u32_from_i64("score", v).map(Score::from_hundredths))
        .transpose()
}
