use std::time::Duration;

use async_trait::async_trait;
use course_core::model::{Course, CourseId, CourseProgress, ProgressRecord, UserId};
use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::config::PlayerConfig;
use crate::error::ApiError;

/// Remote course catalog and progress store.
#[async_trait]
pub trait CourseApi: Send + Sync {
    /// # Errors
    ///
    /// Returns `ApiError` when the request fails or the payload is invalid.
    async fn list_courses(&self) -> Result<Vec<Course>, ApiError>;

    /// # Errors
    ///
    /// Returns `ApiError` when the request fails or the payload is invalid.
    async fn get_course(&self, id: CourseId) -> Result<Course, ApiError>;

    /// Aggregate progress of one customer in one course.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` when the request fails or the payload is invalid.
    async fn course_progress(
        &self,
        user_id: &UserId,
        course_id: CourseId,
    ) -> Result<CourseProgress, ApiError>;

    /// Upsert a lesson progress record keyed by `(user_id, lesson_id)`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` when the request fails.
    async fn upsert_progress(&self, record: &ProgressRecord) -> Result<(), ApiError>;
}

/// Storefront responses are either the bare value or wrapped in `{ "data": ... }`.
#[derive(Deserialize)]
#[serde(untagged)]
enum Envelope<T> {
    Wrapped { data: T },
    Bare(T),
}

impl<T> Envelope<T> {
    fn into_inner(self) -> T {
        match self {
            Self::Wrapped { data } | Self::Bare(data) => data,
        }
    }
}

/// `CourseApi` over the storefront's JSON endpoints.
#[derive(Clone)]
pub struct HttpCourseApi {
    client: Client,
    base_url: Option<Url>,
    progress_path: String,
}

impl HttpCourseApi {
    /// # Errors
    ///
    /// Returns `ApiError::Http` if the HTTP client cannot be built.
    pub fn from_config(config: &PlayerConfig) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(config.request_timeout).build()?;
        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            progress_path: config.progress_path.clone(),
        })
    }

    /// An API that fails every call with `ApiError::Disabled`.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            client: Client::new(),
            base_url: None,
            progress_path: String::new(),
        }
    }

    #[must_use]
    pub fn enabled(&self) -> bool {
        self.base_url.is_some()
    }

    fn endpoint(&self, path: &str) -> Result<String, ApiError> {
        let base = self.base_url.as_ref().ok_or(ApiError::Disabled)?;
        Ok(format!("{}{path}", base.as_str().trim_end_matches('/')))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = self.endpoint(path)?;
        debug!(%url, "GET");
        let response = self.client.get(url).send().await.map_err(map_send)?;
        if !response.status().is_success() {
            return Err(ApiError::HttpStatus(response.status()));
        }
        let body: Envelope<T> = response.json().await?;
        Ok(body.into_inner())
    }
}

fn map_send(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        ApiError::Timeout
    } else {
        ApiError::Http(err)
    }
}

#[async_trait]
impl CourseApi for HttpCourseApi {
    async fn list_courses(&self) -> Result<Vec<Course>, ApiError> {
        let courses: Vec<Course> = self.get_json("/api/frontend/courses").await?;
        courses
            .into_iter()
            .map(|course| course.validated().map_err(ApiError::from))
            .collect()
    }

    async fn get_course(&self, id: CourseId) -> Result<Course, ApiError> {
        let course: Course = self
            .get_json(&format!("/api/frontend/courses/{id}"))
            .await?;
        Ok(course.validated()?)
    }

    async fn course_progress(
        &self,
        user_id: &UserId,
        course_id: CourseId,
    ) -> Result<CourseProgress, ApiError> {
        self.get_json(&format!(
            "/api/frontend/progress/courseprogress/{}/{course_id}",
            user_id.as_str()
        ))
        .await
    }

    async fn upsert_progress(&self, record: &ProgressRecord) -> Result<(), ApiError> {
        let url = self.endpoint(&self.progress_path)?;
        let response = self
            .client
            .post(url)
            .json(record)
            .send()
            .await
            .map_err(map_send)?;
        if !response.status().is_success() {
            return Err(ApiError::HttpStatus(response.status()));
        }
        Ok(())
    }
}

/// Bound a call with `timeout`, mapping expiry to `ApiError::Timeout`.
///
/// # Errors
///
/// Returns the call's own error, or `ApiError::Timeout` once `timeout` elapses.
pub async fn with_timeout<T>(
    timeout: Duration,
    call: impl Future<Output = Result<T, ApiError>>,
) -> Result<T, ApiError> {
    tokio::time::timeout(timeout, call)
        .await
        .map_err(|_| ApiError::Timeout)?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_accepts_wrapped_and_bare() {
        let wrapped: Envelope<Vec<u32>> = serde_json::from_str(r#"{"data":[1,2]}"#).unwrap();
        assert_eq!(wrapped.into_inner(), vec![1, 2]);
        let bare: Envelope<Vec<u32>> = serde_json::from_str("[3]").unwrap();
        assert_eq!(bare.into_inner(), vec![3]);
    }

    #[test]
    fn endpoint_joins_base_and_path() {
        let config = PlayerConfig::default()
            .with_base_url("https://shop.example.com/")
            .unwrap();
        let api = HttpCourseApi::from_config(&config).unwrap();
        assert_eq!(
            api.endpoint("/api/frontend/courses").unwrap(),
            "https://shop.example.com/api/frontend/courses"
        );
        assert_eq!(
            api.endpoint(&api.progress_path).unwrap(),
            "https://shop.example.com/api/frontend/progress"
        );
    }

    #[tokio::test]
    async fn disabled_api_fails_fast() {
        let api = HttpCourseApi::disabled();
        assert!(!api.enabled());
        assert!(matches!(api.list_courses().await, Err(ApiError::Disabled)));
    }

    #[tokio::test(start_paused = true)]
    async fn with_timeout_maps_expiry() {
        let result: Result<(), ApiError> =
            with_timeout(Duration::from_secs(1), std::future::pending()).await;
        assert!(matches!(result, Err(ApiError::Timeout)));
    }
}
