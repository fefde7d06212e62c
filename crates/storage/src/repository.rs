use async_trait::async_trait;
use chrono::{DateTime, Utc};
use course_core::model::{Course, CourseId, LessonId, ProgressRecord, UserId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Local copy of the storefront catalog, used when the API is unreachable.
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    /// Store the latest copy of a course.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the course cannot be stored.
    async fn upsert_course(
        &self,
        course: &Course,
        fetched_at: DateTime<Utc>,
    ) -> Result<(), StorageError>;

    /// Fetch a cached course by ID.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` for backend failures; a miss is `Ok(None)`.
    async fn get_course(&self, id: CourseId) -> Result<Option<Course>, StorageError>;

    /// All cached courses, ordered by ID.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` for backend failures.
    async fn list_courses(&self) -> Result<Vec<Course>, StorageError>;
}

/// Last-known progress per `(user, lesson)`.
#[async_trait]
pub trait ProgressRepository: Send + Sync {
    /// Insert or replace the record for `(user_id, lesson_id)`.
    ///
    /// A write older than the stored one is ignored, so out-of-order
    /// deliveries cannot roll progress back.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the record cannot be stored.
    async fn upsert_progress(
        &self,
        record: &ProgressRecord,
        updated_at: DateTime<Utc>,
    ) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` for backend failures; a miss is `Ok(None)`.
    async fn get_progress(
        &self,
        user_id: &UserId,
        lesson_id: LessonId,
    ) -> Result<Option<ProgressRecord>, StorageError>;

    /// All records of a user within one course, ordered by lesson ID.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` for backend failures.
    async fn list_course_progress(
        &self,
        user_id: &UserId,
        course_id: CourseId,
    ) -> Result<Vec<ProgressRecord>, StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    courses: Arc<Mutex<HashMap<CourseId, Course>>>,
    progress: Arc<Mutex<HashMap<(UserId, LessonId), (ProgressRecord, DateTime<Utc>)>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CatalogRepository for InMemoryRepository {
    async fn upsert_course(
        &self,
        course: &Course,
        _fetched_at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        let mut guard = self
            .courses
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(course.id(), course.clone());
        Ok(())
    }

    async fn get_course(&self, id: CourseId) -> Result<Option<Course>, StorageError> {
        let guard = self
            .courses
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(&id).cloned())
    }

    async fn list_courses(&self) -> Result<Vec<Course>, StorageError> {
        let guard = self
            .courses
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let mut courses: Vec<Course> = guard.values().cloned().collect();
        courses.sort_by_key(Course::id);
        Ok(courses)
    }
}

#[async_trait]
impl ProgressRepository for InMemoryRepository {
    async fn upsert_progress(
        &self,
        record: &ProgressRecord,
        updated_at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        let mut guard = self
            .progress
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let key = (record.user_id.clone(), record.lesson_id);
        if let Some((_, existing_at)) = guard.get(&key) {
            if *existing_at > updated_at {
                return Ok(());
            }
        }
        guard.insert(key, (record.clone(), updated_at));
        Ok(())
    }

    async fn get_progress(
        &self,
        user_id: &UserId,
        lesson_id: LessonId,
    ) -> Result<Option<ProgressRecord>, StorageError> {
        let guard = self
            .progress
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard
            .get(&(user_id.clone(), lesson_id))
            .map(|(record, _)| record.clone()))
    }

    async fn list_course_progress(
        &self,
        user_id: &UserId,
        course_id: CourseId,
    ) -> Result<Vec<ProgressRecord>, StorageError> {
        let guard = self
            .progress
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let mut records: Vec<ProgressRecord> = guard
            .values()
            .filter(|(r, _)| r.user_id == *user_id && r.course_id == course_id)
            .map(|(r, _)| r.clone())
            .collect();
        records.sort_by_key(|r| r.lesson_id);
        Ok(records)
    }
}

/// Aggregates the catalog and progress repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub catalog: Arc<dyn CatalogRepository>,
    pub progress: Arc<dyn ProgressRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let catalog: Arc<dyn CatalogRepository> = Arc::new(repo.clone());
        let progress: Arc<dyn ProgressRepository> = Arc::new(repo);
        Self { catalog, progress }
    }
}
