use course_core::model::{
    Course, CourseId, LessonId, ModuleId, ProgressPercent, ProgressRecord, ProgressStatus, UserId,
};
use sqlx::Row;

use crate::repository::StorageError;

fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

fn i64_to_u64(field: &'static str, v: i64) -> Result<u64, StorageError> {
    u64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} sign overflow")))
}

pub(crate) fn id_to_i64(field: &'static str, v: u64) -> Result<i64, StorageError> {
    i64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} overflow")))
}

pub(crate) fn parse_status(s: &str) -> Result<ProgressStatus, StorageError> {
    ProgressStatus::parse(s)
        .ok_or_else(|| StorageError::Serialization(format!("invalid status: {s}")))
}

pub(crate) fn encode_course(course: &Course) -> Result<String, StorageError> {
    serde_json::to_string(course).map_err(ser)
}

/// Decode a cached payload, re-checking the catalog invariants.
pub(crate) fn map_course_row(row: &sqlx::sqlite::SqliteRow) -> Result<Course, StorageError> {
    let payload: String = row.try_get("payload").map_err(ser)?;
    let course: Course = serde_json::from_str(&payload).map_err(ser)?;
    course.validated().map_err(ser)
}

pub(crate) fn map_progress_row(
    row: &sqlx::sqlite::SqliteRow,
) -> Result<ProgressRecord, StorageError> {
    let user_id = UserId::new(row.try_get::<String, _>("user_id").map_err(ser)?).map_err(ser)?;
    let lesson_id = LessonId::new(i64_to_u64(
        "lesson_id",
        row.try_get("lesson_id").map_err(ser)?,
    )?);
    let course_id = CourseId::new(i64_to_u64(
        "course_id",
        row.try_get("course_id").map_err(ser)?,
    )?);
    let module_id = ModuleId::new(i64_to_u64(
        "module_id",
        row.try_get("module_id").map_err(ser)?,
    )?);

    let status_str: String = row.try_get("status").map_err(ser)?;
    let status = parse_status(&status_str)?;

    let progress_i64: i64 = row.try_get("progress").map_err(ser)?;
    if !(0..=100).contains(&progress_i64) {
        return Err(StorageError::Serialization(format!(
            "invalid progress: {progress_i64}"
        )));
    }

    Ok(ProgressRecord {
        user_id,
        lesson_id,
        course_id,
        module_id,
        status,
        progress: ProgressPercent::clamped(progress_i64),
        last_position: row.try_get("last_position").map_err(ser)?,
    })
}
