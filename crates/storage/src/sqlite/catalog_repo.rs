use chrono::{DateTime, Utc};
use course_core::model::{Course, CourseId};

use super::{
    SqliteRepository,
    mapping::{encode_course, id_to_i64, map_course_row},
};
use crate::repository::{CatalogRepository, StorageError};

#[async_trait::async_trait]
impl CatalogRepository for SqliteRepository {
    async fn upsert_course(
        &self,
        course: &Course,
        fetched_at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        let id = id_to_i64("course_id", course.id().value())?;
        let payload = encode_course(course)?;

        sqlx::query(
            r"
            INSERT INTO courses (id, title, payload, fetched_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                payload = excluded.payload,
                fetched_at = excluded.fetched_at
            ",
        )
        .bind(id)
        .bind(course.title())
        .bind(payload)
        .bind(fetched_at)
        .execute(self.pool())
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(())
    }

    async fn get_course(&self, id: CourseId) -> Result<Option<Course>, StorageError> {
        let row = sqlx::query("SELECT payload FROM courses WHERE id = ?1")
            .bind(id_to_i64("course_id", id.value())?)
            .fetch_optional(self.pool())
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        row.as_ref().map(map_course_row).transpose()
    }

    async fn list_courses(&self) -> Result<Vec<Course>, StorageError> {
        let rows = sqlx::query("SELECT payload FROM courses ORDER BY id ASC")
            .fetch_all(self.pool())
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        rows.iter().map(map_course_row).collect()
    }
}
