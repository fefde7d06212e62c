//! Shared error types for the services crate.

use thiserror::Error;

use course_core::model::{CourseError, CourseId, ParseIdError};
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by `CourseApi` implementations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ApiError {
    #[error("course API is not configured")]
    Disabled,
    #[error("course API request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error("course API request timed out")]
    Timeout,
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error(transparent)]
    Course(#[from] CourseError),
}

/// Errors emitted by `CatalogService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CatalogError {
    #[error("course {0} is not available")]
    NotFound(CourseId),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while reading `PlayerConfig` from the environment.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("{key} must be a positive number of seconds, got {raw:?}")]
    InvalidSeconds { key: &'static str, raw: String },
    #[error("{key} is not a valid http(s) URL: {raw:?}")]
    InvalidUrl { key: &'static str, raw: String },
    #[error("COURSE_PAUSE_STATUS must be `legacy` or `derived`, got {0:?}")]
    InvalidPauseStatus(String),
    #[error("COURSE_PROGRESS_PATH must start with `/`, got {0:?}")]
    InvalidProgressPath(String),
    #[error(transparent)]
    User(#[from] ParseIdError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Api(#[from] ApiError),
}
