use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use course_core::model::{
    Course, CourseId, CourseProgress, LessonId, LessonRef, ModuleId, PauseStatusPolicy,
    ProgressRecord, ProgressStatus, ReportKind, UserId,
};
use course_core::time::fixed_now;
use services::{ApiError, Clock, CourseApi, PlayerConfig, ProgressReporter};
use storage::repository::{InMemoryRepository, ProgressRepository};

#[derive(Clone, Copy, PartialEq)]
enum Mode {
    Accept,
    Fail,
    Hang,
}

struct FakeApi {
    mode: Mutex<Mode>,
    sent: Mutex<Vec<ProgressRecord>>,
}

impl FakeApi {
    fn new(mode: Mode) -> Arc<Self> {
        Arc::new(Self {
            mode: Mutex::new(mode),
            sent: Mutex::new(Vec::new()),
        })
    }

    fn sent(&self) -> Vec<ProgressRecord> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl CourseApi for FakeApi {
    async fn list_courses(&self) -> Result<Vec<Course>, ApiError> {
        Err(ApiError::Disabled)
    }

    async fn get_course(&self, _id: CourseId) -> Result<Course, ApiError> {
        Err(ApiError::Disabled)
    }

    async fn course_progress(
        &self,
        _user_id: &UserId,
        _course_id: CourseId,
    ) -> Result<CourseProgress, ApiError> {
        Err(ApiError::Disabled)
    }

    async fn upsert_progress(&self, record: &ProgressRecord) -> Result<(), ApiError> {
        let mode = *self.mode.lock().unwrap();
        match mode {
            Mode::Accept => {
                self.sent.lock().unwrap().push(record.clone());
                Ok(())
            }
            Mode::Fail => Err(ApiError::HttpStatus(reqwest::StatusCode::BAD_GATEWAY)),
            Mode::Hang => std::future::pending().await,
        }
    }
}

fn lesson() -> LessonRef {
    LessonRef {
        course_id: CourseId::new(1),
        module_id: ModuleId::new(2),
        lesson_id: LessonId::new(3),
    }
}

fn user() -> UserId {
    UserId::new("cust-42").unwrap()
}

fn reporter(api: Arc<FakeApi>, cache: &InMemoryRepository, policy: PauseStatusPolicy) -> ProgressReporter {
    let mut config = PlayerConfig::default().with_user(user());
    config.pause_status = policy;
    config.request_timeout = Duration::from_secs(2);
    ProgressReporter::new(api, Arc::new(cache.clone()), Clock::fixed(fixed_now()), &config)
}

#[tokio::test]
async fn periodic_report_at_ninety_percent_completes_lesson() {
    let api = FakeApi::new(Mode::Accept);
    let cache = InMemoryRepository::new();
    let mut session = reporter(api.clone(), &cache, PauseStatusPolicy::Legacy).session(lesson());

    session
        .report(ReportKind::Periodic, 108.0, 120.0)
        .expect("sent")
        .await
        .unwrap();

    let sent = api.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].progress.value(), 90);
    assert_eq!(sent[0].status, ProgressStatus::Completed);

    let body = serde_json::to_value(&sent[0]).unwrap();
    assert_eq!(body["lastPosition"], "108.00");
    assert_eq!(body["userId"], "cust-42");

    let cached = cache.get_progress(&user(), LessonId::new(3)).await.unwrap();
    assert_eq!(cached, Some(sent[0].clone()));
}

#[tokio::test]
async fn periodic_reports_are_throttled_but_pause_is_not() {
    let api = FakeApi::new(Mode::Accept);
    let cache = InMemoryRepository::new();
    let mut session = reporter(api.clone(), &cache, PauseStatusPolicy::Legacy).session(lesson());

    let first = session.report(ReportKind::Periodic, 10.0, 120.0);
    // Same bucket, same instant.
    let second = session.report(ReportKind::Periodic, 11.0, 120.0);
    let pause = session.report(ReportKind::Pause, 11.5, 120.0);

    assert!(second.is_none());
    first.unwrap().await.unwrap();
    pause.unwrap().await.unwrap();

    let sent = api.sent();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[1].status, ProgressStatus::NotStarted);
}

#[tokio::test]
async fn derived_pause_policy_reports_real_status() {
    let api = FakeApi::new(Mode::Accept);
    let cache = InMemoryRepository::new();
    let mut session =
        reporter(api.clone(), &cache, PauseStatusPolicy::Derived).session(lesson());

    session
        .report(ReportKind::Pause, 60.0, 120.0)
        .unwrap()
        .await
        .unwrap();
    assert_eq!(api.sent()[0].status, ProgressStatus::InProgress);
}

#[tokio::test]
async fn zero_or_nan_duration_sends_nothing() {
    let api = FakeApi::new(Mode::Accept);
    let cache = InMemoryRepository::new();
    let mut session = reporter(api.clone(), &cache, PauseStatusPolicy::Legacy).session(lesson());

    assert!(session.report(ReportKind::Periodic, 5.0, 0.0).is_none());
    assert!(session.report(ReportKind::Pause, 5.0, f64::NAN).is_none());
    assert!(session.report(ReportKind::Flush, 5.0, 0.0).is_none());
    assert!(api.sent().is_empty());
}

#[tokio::test]
async fn failed_report_is_swallowed_and_not_cached() {
    let api = FakeApi::new(Mode::Fail);
    let cache = InMemoryRepository::new();
    let mut session = reporter(api.clone(), &cache, PauseStatusPolicy::Legacy).session(lesson());

    session
        .report(ReportKind::Pause, 30.0, 120.0)
        .unwrap()
        .await
        .unwrap();

    assert!(
        cache
            .get_progress(&user(), LessonId::new(3))
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test(start_paused = true)]
async fn hanging_request_times_out() {
    let api = FakeApi::new(Mode::Hang);
    let cache = InMemoryRepository::new();
    let mut session = reporter(api.clone(), &cache, PauseStatusPolicy::Legacy).session(lesson());

    let handle = session.report(ReportKind::Pause, 30.0, 120.0).unwrap();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("bounded by request timeout")
        .unwrap();
}

#[tokio::test]
async fn cancelled_session_drops_in_flight_reports_but_keeps_flush() {
    let api = FakeApi::new(Mode::Hang);
    let cache = InMemoryRepository::new();
    let mut session = reporter(api.clone(), &cache, PauseStatusPolicy::Legacy).session(lesson());

    let in_flight = session.report(ReportKind::Periodic, 30.0, 120.0).unwrap();
    session.cancel();
    tokio::time::timeout(Duration::from_secs(1), in_flight)
        .await
        .expect("cancelled send finishes")
        .unwrap();

    assert!(session.report(ReportKind::Periodic, 90.0, 120.0).is_none());
    assert!(session.report(ReportKind::Pause, 90.0, 120.0).is_none());

    *api.mode.lock().unwrap() = Mode::Accept;
    session
        .report(ReportKind::Flush, 90.0, 120.0)
        .expect("flush survives cancellation")
        .await
        .unwrap();
    assert_eq!(api.sent().len(), 1);
    assert_eq!(api.sent()[0].progress.value(), 75);
}

#[tokio::test]
async fn no_user_means_no_reports() {
    let api = FakeApi::new(Mode::Accept);
    let cache = InMemoryRepository::new();
    let reporter = ProgressReporter::new(
        api.clone(),
        Arc::new(cache),
        Clock::fixed(fixed_now()),
        &PlayerConfig::default(),
    );
    assert!(reporter.user_id().is_none());
    let mut session = reporter.session(lesson());
    assert!(session.report(ReportKind::Pause, 30.0, 120.0).is_none());
}
