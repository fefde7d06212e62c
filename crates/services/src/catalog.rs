use std::sync::Arc;

use course_core::Clock;
use course_core::model::{
    Course, CourseId, CourseProgress, LessonId, ProgressRecord, ProgressStatus, UserId,
};
use storage::repository::{CatalogRepository, ProgressRepository};
use tracing::{debug, warn};

use crate::api::CourseApi;
use crate::error::{ApiError, CatalogError};

/// Course listing and progress lookups, remote first with the local cache as
/// fallback.
#[derive(Clone)]
pub struct CatalogService {
    clock: Clock,
    api: Arc<dyn CourseApi>,
    catalog: Arc<dyn CatalogRepository>,
    progress: Arc<dyn ProgressRepository>,
}

impl CatalogService {
    #[must_use]
    pub fn new(
        clock: Clock,
        api: Arc<dyn CourseApi>,
        catalog: Arc<dyn CatalogRepository>,
        progress: Arc<dyn ProgressRepository>,
    ) -> Self {
        Self {
            clock,
            api,
            catalog,
            progress,
        }
    }

    /// All courses, refreshing the cache when the API answers.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` if the API fails and nothing is cached.
    pub async fn list_courses(&self) -> Result<Vec<Course>, CatalogError> {
        match self.api.list_courses().await {
            Ok(courses) => {
                let now = self.clock.now();
                for course in &courses {
                    if let Err(err) = self.catalog.upsert_course(course, now).await {
                        warn!(course = %course.id(), error = %err, "failed to cache course");
                    }
                }
                Ok(courses)
            }
            Err(err) => {
                log_fallback("list courses", &err);
                let cached = self.catalog.list_courses().await?;
                if cached.is_empty() {
                    return Err(err.into());
                }
                Ok(cached)
            }
        }
    }

    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` if the course is neither served nor cached.
    pub async fn get_course(&self, id: CourseId) -> Result<Course, CatalogError> {
        match self.api.get_course(id).await {
            Ok(course) => {
                if let Err(err) = self.catalog.upsert_course(&course, self.clock.now()).await {
                    warn!(course = %id, error = %err, "failed to cache course");
                }
                Ok(course)
            }
            Err(ApiError::HttpStatus(status)) if status == reqwest::StatusCode::NOT_FOUND => {
                Err(CatalogError::NotFound(id))
            }
            Err(err) => {
                log_fallback("get course", &err);
                self.catalog
                    .get_course(id)
                    .await?
                    .ok_or(CatalogError::NotFound(id))
            }
        }
    }

    /// Course-level progress for listing bars.
    ///
    /// Falls back to an aggregate of cached lesson records when the API fails.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Storage` if the fallback cannot read the cache.
    pub async fn course_progress(
        &self,
        user_id: &UserId,
        course: &Course,
    ) -> Result<CourseProgress, CatalogError> {
        match self.api.course_progress(user_id, course.id()).await {
            Ok(progress) => Ok(progress),
            Err(err) => {
                log_fallback("course progress", &err);
                let records = self
                    .progress
                    .list_course_progress(user_id, course.id())
                    .await?;
                let total = u32::try_from(course.lesson_count()).unwrap_or(u32::MAX);
                Ok(CourseProgress::from_records(course.id(), total, &records))
            }
        }
    }

    /// Cached per-lesson records of a course, for lesson list badges.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Storage` on cache failures.
    pub async fn lesson_progress(
        &self,
        user_id: &UserId,
        course_id: CourseId,
    ) -> Result<Vec<ProgressRecord>, CatalogError> {
        Ok(self
            .progress
            .list_course_progress(user_id, course_id)
            .await?)
    }

    /// Where to resume a lesson. Completed lessons restart from the top.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Storage` on cache failures.
    pub async fn resume_position(
        &self,
        user_id: &UserId,
        lesson_id: LessonId,
    ) -> Result<Option<f64>, CatalogError> {
        let record = self.progress.get_progress(user_id, lesson_id).await?;
        Ok(record
            .filter(|r| r.status != ProgressStatus::Completed && r.last_position > 0.0)
            .map(|r| r.last_position))
    }
}

fn log_fallback(op: &'static str, err: &ApiError) {
    if matches!(err, ApiError::Disabled) {
        debug!(op, "course API disabled, using local cache");
    } else {
        warn!(op, error = %err, "course API failed, using local cache");
    }
}
