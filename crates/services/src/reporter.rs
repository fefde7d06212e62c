use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use course_core::Clock;
use course_core::model::{
    LessonRef, PauseStatusPolicy, ProgressRecord, ReportKind, ReportThrottle, UserId, percentage,
};
use storage::repository::ProgressRepository;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::api::{CourseApi, with_timeout};
use crate::config::PlayerConfig;
use crate::token::SessionToken;

/// Pushes lesson progress to the course API without blocking playback.
///
/// Shared across sessions; per-lesson state lives in [`ReportSession`].
#[derive(Clone)]
pub struct ProgressReporter {
    api: Arc<dyn CourseApi>,
    cache: Arc<dyn ProgressRepository>,
    clock: Clock,
    user_id: Option<UserId>,
    policy: PauseStatusPolicy,
    interval: Duration,
    timeout: Duration,
}

impl ProgressReporter {
    #[must_use]
    pub fn new(
        api: Arc<dyn CourseApi>,
        cache: Arc<dyn ProgressRepository>,
        clock: Clock,
        config: &PlayerConfig,
    ) -> Self {
        Self {
            api,
            cache,
            clock,
            user_id: config.user_id.clone(),
            policy: config.pause_status,
            interval: config.report_interval,
            timeout: config.request_timeout,
        }
    }

    #[must_use]
    pub fn user_id(&self) -> Option<&UserId> {
        self.user_id.as_ref()
    }

    /// Start reporting for one lesson. The returned session owns a fresh token.
    #[must_use]
    pub fn session(&self, lesson: LessonRef) -> ReportSession {
        let interval = chrono::Duration::from_std(self.interval)
            .unwrap_or_else(|_| chrono::Duration::seconds(5));
        ReportSession {
            reporter: self.clone(),
            lesson,
            throttle: ReportThrottle::new(interval),
            token: SessionToken::new(),
        }
    }
}

/// Reporting state for the lesson currently open in the player.
pub struct ReportSession {
    reporter: ProgressReporter,
    lesson: LessonRef,
    throttle: ReportThrottle,
    token: SessionToken,
}

impl ReportSession {
    #[must_use]
    pub fn lesson(&self) -> LessonRef {
        self.lesson
    }

    #[must_use]
    pub fn token(&self) -> &SessionToken {
        &self.token
    }

    /// Drop every in-flight periodic and pause send of this session.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Queue a report for a playback sample.
    ///
    /// Returns the spawned send, or `None` when nothing goes out: no user,
    /// unusable duration, cancelled session, or throttled periodic sample.
    pub fn report(
        &mut self,
        kind: ReportKind,
        current_time: f64,
        duration: f64,
    ) -> Option<JoinHandle<()>> {
        let reporter = &self.reporter;
        let user_id = reporter.user_id.clone()?;
        let percent = percentage(current_time, duration)?;
        if kind != ReportKind::Flush && self.token.is_cancelled() {
            return None;
        }

        let now = reporter.clock.now();
        if !self.throttle.should_send(kind, percent, now) {
            return None;
        }
        self.throttle.mark_sent(percent, now);

        let record = ProgressRecord::from_sample(
            user_id,
            self.lesson,
            kind,
            reporter.policy,
            current_time,
            duration,
        )?;
        debug!(
            lesson = %record.lesson_id,
            progress = record.progress.value(),
            status = record.status.as_str(),
            ?kind,
            "queue progress report"
        );

        let api = Arc::clone(&reporter.api);
        let cache = Arc::clone(&reporter.cache);
        let timeout = reporter.timeout;

        // The close-time flush outlives the session so the last position is kept.
        if kind == ReportKind::Flush {
            spawn_detached(deliver(api, cache, record, now, timeout))
        } else {
            let token = self.token.clone();
            spawn_detached(async move {
                tokio::select! {
                    biased;
                    () = token.cancelled() => {
                        debug!(lesson = %record.lesson_id, "progress report dropped for closed session");
                    }
                    () = deliver(api, cache, record.clone(), now, timeout) => {}
                }
            })
        }
    }
}

/// Spawn on the ambient tokio runtime, if any.
pub(crate) fn spawn_detached<F>(task: F) -> Option<JoinHandle<()>>
where
    F: Future<Output = ()> + Send + 'static,
{
    match Handle::try_current() {
        Ok(runtime) => Some(runtime.spawn(task)),
        Err(err) => {
            warn!(error = %err, "no async runtime, background task skipped");
            None
        }
    }
}

async fn deliver(
    api: Arc<dyn CourseApi>,
    cache: Arc<dyn ProgressRepository>,
    record: ProgressRecord,
    sampled_at: DateTime<Utc>,
    timeout: Duration,
) {
    if let Err(err) = with_timeout(timeout, api.upsert_progress(&record)).await {
        warn!(
            lesson = %record.lesson_id,
            error = %err,
            "progress report failed"
        );
        return;
    }
    if let Err(err) = cache.upsert_progress(&record, sampled_at).await {
        warn!(
            lesson = %record.lesson_id,
            error = %err,
            "failed to cache progress locally"
        );
    }
}
