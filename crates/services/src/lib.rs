#![forbid(unsafe_code)]

pub mod api;
pub mod app_services;
pub mod catalog;
pub mod config;
pub mod error;
pub mod player;
pub mod reporter;
pub mod token;

pub use course_core::Clock;

pub use api::{CourseApi, HttpCourseApi};
pub use app_services::AppServices;
pub use catalog::CatalogService;
pub use config::PlayerConfig;
pub use error::{ApiError, AppServicesError, CatalogError, ConfigError};
pub use player::{MediaBackend, VideoSession};
pub use reporter::{ProgressReporter, ReportSession};
pub use token::SessionToken;
