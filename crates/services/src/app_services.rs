use std::sync::Arc;

use course_core::model::UserId;
use course_core::playback::PlaybackEvent;
use storage::repository::Storage;
use tokio::sync::mpsc;

use crate::Clock;
use crate::api::{CourseApi, HttpCourseApi};
use crate::catalog::CatalogService;
use crate::config::PlayerConfig;
use crate::error::AppServicesError;
use crate::player::{MediaBackend, VideoSession};
use crate::reporter::ProgressReporter;

/// Assembles app-facing services from config and storage.
#[derive(Clone)]
pub struct AppServices {
    config: PlayerConfig,
    catalog: Arc<CatalogService>,
    reporter: ProgressReporter,
}

impl AppServices {
    /// Build services backed by `SQLite` storage and the HTTP course API.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails or the HTTP
    /// client cannot be built.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        config: PlayerConfig,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        let api: Arc<dyn CourseApi> = Arc::new(HttpCourseApi::from_config(&config)?);
        Ok(Self::from_parts(&storage, api, clock, config))
    }

    /// Wire services over an existing storage and API, e.g. in-memory fakes.
    #[must_use]
    pub fn from_parts(
        storage: &Storage,
        api: Arc<dyn CourseApi>,
        clock: Clock,
        config: PlayerConfig,
    ) -> Self {
        let catalog = Arc::new(CatalogService::new(
            clock,
            Arc::clone(&api),
            Arc::clone(&storage.catalog),
            Arc::clone(&storage.progress),
        ));
        let reporter = ProgressReporter::new(api, Arc::clone(&storage.progress), clock, &config);
        Self {
            config,
            catalog,
            reporter,
        }
    }

    #[must_use]
    pub fn config(&self) -> &PlayerConfig {
        &self.config
    }

    #[must_use]
    pub fn user_id(&self) -> Option<&UserId> {
        self.config.user_id.as_ref()
    }

    #[must_use]
    pub fn catalog(&self) -> Arc<CatalogService> {
        Arc::clone(&self.catalog)
    }

    #[must_use]
    pub fn reporter(&self) -> ProgressReporter {
        self.reporter.clone()
    }

    /// A player session bound to this app's reporter.
    #[must_use]
    pub fn video_session<B: MediaBackend>(
        &self,
        backend: B,
    ) -> (VideoSession<B>, mpsc::UnboundedReceiver<PlaybackEvent>) {
        VideoSession::new(backend, self.reporter())
    }
}
