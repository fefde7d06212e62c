use chrono::{DateTime, Utc};
use course_core::model::{CourseId, LessonId, ProgressRecord, UserId};

use super::{
    SqliteRepository,
    mapping::{id_to_i64, map_progress_row},
};
use crate::repository::{ProgressRepository, StorageError};

#[async_trait::async_trait]
impl ProgressRepository for SqliteRepository {
    async fn upsert_progress(
        &self,
        record: &ProgressRecord,
        updated_at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        // The WHERE clause drops writes older than the stored row.
        sqlx::query(
            r"
            INSERT INTO progress (
                user_id, lesson_id, course_id, module_id,
                status, progress, last_position, updated_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ON CONFLICT(user_id, lesson_id) DO UPDATE SET
                course_id = excluded.course_id,
                module_id = excluded.module_id,
                status = excluded.status,
                progress = excluded.progress,
                last_position = excluded.last_position,
                updated_at = excluded.updated_at
            WHERE excluded.updated_at >= progress.updated_at
            ",
        )
        .bind(record.user_id.as_str())
        .bind(id_to_i64("lesson_id", record.lesson_id.value())?)
        .bind(id_to_i64("course_id", record.course_id.value())?)
        .bind(id_to_i64("module_id", record.module_id.value())?)
        .bind(record.status.as_str())
        .bind(i64::from(record.progress.value()))
        .bind(record.last_position.max(0.0))
        .bind(updated_at)
        .execute(self.pool())
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(())
    }

    async fn get_progress(
        &self,
        user_id: &UserId,
        lesson_id: LessonId,
    ) -> Result<Option<ProgressRecord>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT user_id, lesson_id, course_id, module_id, status, progress, last_position
            FROM progress
            WHERE user_id = ?1 AND lesson_id = ?2
            ",
        )
        .bind(user_id.as_str())
        .bind(id_to_i64("lesson_id", lesson_id.value())?)
        .fetch_optional(self.pool())
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        row.as_ref().map(map_progress_row).transpose()
    }

    async fn list_course_progress(
        &self,
        user_id: &UserId,
        course_id: CourseId,
    ) -> Result<Vec<ProgressRecord>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT user_id, lesson_id, course_id, module_id, status, progress, last_position
            FROM progress
            WHERE user_id = ?1 AND course_id = ?2
            ORDER BY lesson_id ASC
            ",
        )
        .bind(user_id.as_str())
        .bind(id_to_i64("course_id", course_id.value())?)
        .fetch_all(self.pool())
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        rows.iter().map(map_progress_row).collect()
    }
}
