use std::sync::Arc;

use course_core::model::UserId;
use course_core::playback::PlaybackEvent;
use services::{AppServices, CatalogService, MediaBackend, ProgressReporter, VideoSession};
use tokio::sync::mpsc;

pub trait UiApp: Send + Sync {
    fn user_id(&self) -> Option<UserId>;

    fn catalog(&self) -> Arc<CatalogService>;
    fn reporter(&self) -> ProgressReporter;
}

impl UiApp for AppServices {
    fn user_id(&self) -> Option<UserId> {
        AppServices::user_id(self).cloned()
    }

    fn catalog(&self) -> Arc<CatalogService> {
        AppServices::catalog(self)
    }

    fn reporter(&self) -> ProgressReporter {
        AppServices::reporter(self)
    }
}

#[derive(Clone)]
pub struct AppContext {
    user_id: Option<UserId>,
    catalog: Arc<CatalogService>,
    reporter: ProgressReporter,
}

impl AppContext {
    #[must_use]
    pub fn new(app: &Arc<dyn UiApp>) -> Self {
        Self {
            user_id: app.user_id(),
            catalog: app.catalog(),
            reporter: app.reporter(),
        }
    }

    /// The signed-in customer; progress is hidden and not reported without one.
    #[must_use]
    pub fn user_id(&self) -> Option<&UserId> {
        self.user_id.as_ref()
    }

    #[must_use]
    pub fn catalog(&self) -> Arc<CatalogService> {
        Arc::clone(&self.catalog)
    }

    #[must_use]
    pub fn video_session<B: MediaBackend>(
        &self,
        backend: B,
    ) -> (VideoSession<B>, mpsc::UnboundedReceiver<PlaybackEvent>) {
        VideoSession::new(backend, self.reporter.clone())
    }
}

// Provided by the composition root (`crates/app`) or the view test harness.

/// Build an `AppContext` from a UI-facing app implementation.
#[must_use]
pub fn build_app_context(app: &Arc<dyn UiApp>) -> AppContext {
    AppContext::new(app)
}
