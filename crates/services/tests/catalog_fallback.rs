use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use course_core::model::{
    Course, CourseId, CourseProgress, Lesson, LessonId, LessonRef, Module, ModuleId,
    PauseStatusPolicy, ProgressPercent, ProgressRecord, ReportKind, UserId,
};
use course_core::time::fixed_now;
use services::{ApiError, CatalogError, CatalogService, Clock, CourseApi};
use storage::repository::{CatalogRepository, InMemoryRepository, ProgressRepository};

/// Serves a fixed catalog until switched offline.
struct ScriptedApi {
    courses: Vec<Course>,
    online: Mutex<bool>,
}

impl ScriptedApi {
    fn go_offline(&self) {
        *self.online.lock().unwrap() = false;
    }

    fn check(&self) -> Result<(), ApiError> {
        if *self.online.lock().unwrap() {
            Ok(())
        } else {
            Err(ApiError::HttpStatus(reqwest::StatusCode::SERVICE_UNAVAILABLE))
        }
    }
}

#[async_trait]
impl CourseApi for ScriptedApi {
    async fn list_courses(&self) -> Result<Vec<Course>, ApiError> {
        self.check()?;
        Ok(self.courses.clone())
    }

    async fn get_course(&self, id: CourseId) -> Result<Course, ApiError> {
        self.check()?;
        self.courses
            .iter()
            .find(|c| c.id() == id)
            .cloned()
            .ok_or(ApiError::HttpStatus(reqwest::StatusCode::NOT_FOUND))
    }

    async fn course_progress(
        &self,
        _user_id: &UserId,
        course_id: CourseId,
    ) -> Result<CourseProgress, ApiError> {
        self.check()?;
        Ok(CourseProgress {
            course_id,
            total_lessons: 4,
            completed_lessons: 4,
            percent: ProgressPercent::FULL,
        })
    }

    async fn upsert_progress(&self, _record: &ProgressRecord) -> Result<(), ApiError> {
        self.check()
    }
}

fn course() -> Course {
    let module_id = ModuleId::new(7);
    let lessons = (1..=4)
        .map(|n| Lesson::new(LessonId::new(n), module_id, format!("Lesson {n}"), n as u32))
        .collect();
    let module = Module::new(module_id, CourseId::new(1), "Basics", 1, lessons).unwrap();
    Course::new(CourseId::new(1), "Knife skills", None, vec![module]).unwrap()
}

fn record(lesson: u64, kind: ReportKind, at: f64) -> ProgressRecord {
    ProgressRecord::from_sample(
        UserId::new("cust-1").unwrap(),
        LessonRef {
            course_id: CourseId::new(1),
            module_id: ModuleId::new(7),
            lesson_id: LessonId::new(lesson),
        },
        kind,
        PauseStatusPolicy::Legacy,
        at,
        100.0,
    )
    .unwrap()
}

fn service(api: Arc<ScriptedApi>, repo: &InMemoryRepository) -> CatalogService {
    CatalogService::new(
        Clock::fixed(fixed_now()),
        api,
        Arc::new(repo.clone()),
        Arc::new(repo.clone()),
    )
}

#[tokio::test]
async fn listing_refreshes_cache_and_falls_back_to_it() {
    let api = Arc::new(ScriptedApi {
        courses: vec![course()],
        online: Mutex::new(true),
    });
    let repo = InMemoryRepository::new();
    let catalog = service(api.clone(), &repo);

    let online = catalog.list_courses().await.unwrap();
    assert_eq!(online.len(), 1);
    assert!(repo.get_course(CourseId::new(1)).await.unwrap().is_some());

    api.go_offline();
    let offline = catalog.list_courses().await.unwrap();
    assert_eq!(offline, online);
    let course = catalog.get_course(CourseId::new(1)).await.unwrap();
    assert_eq!(course.title(), "Knife skills");
}

#[tokio::test]
async fn offline_with_empty_cache_is_an_error() {
    let api = Arc::new(ScriptedApi {
        courses: Vec::new(),
        online: Mutex::new(false),
    });
    let repo = InMemoryRepository::new();
    let catalog = service(api, &repo);

    assert!(matches!(
        catalog.list_courses().await,
        Err(CatalogError::Api(ApiError::HttpStatus(_)))
    ));
    assert!(matches!(
        catalog.get_course(CourseId::new(1)).await,
        Err(CatalogError::NotFound(_))
    ));
}

#[tokio::test]
async fn unknown_course_is_not_found_even_online() {
    let api = Arc::new(ScriptedApi {
        courses: vec![course()],
        online: Mutex::new(true),
    });
    let catalog = service(api, &InMemoryRepository::new());
    assert!(matches!(
        catalog.get_course(CourseId::new(99)).await,
        Err(CatalogError::NotFound(id)) if id == CourseId::new(99)
    ));
}

#[tokio::test]
async fn course_progress_prefers_remote_then_local_aggregate() {
    let api = Arc::new(ScriptedApi {
        courses: vec![course()],
        online: Mutex::new(true),
    });
    let repo = InMemoryRepository::new();
    let user = UserId::new("cust-1").unwrap();
    repo.upsert_progress(&record(1, ReportKind::Periodic, 95.0), fixed_now())
        .await
        .unwrap();
    repo.upsert_progress(&record(2, ReportKind::Periodic, 50.0), fixed_now())
        .await
        .unwrap();
    let catalog = service(api.clone(), &repo);

    let remote = catalog.course_progress(&user, &course()).await.unwrap();
    assert_eq!(remote.percent, ProgressPercent::FULL);

    api.go_offline();
    let local = catalog.course_progress(&user, &course()).await.unwrap();
    assert_eq!(local.total_lessons, 4);
    assert_eq!(local.completed_lessons, 1);
    // (95 + 50 + 0 + 0) / 4
    assert_eq!(local.percent.value(), 36);
}

#[tokio::test]
async fn resume_position_skips_completed_lessons() {
    let api = Arc::new(ScriptedApi {
        courses: vec![course()],
        online: Mutex::new(true),
    });
    let repo = InMemoryRepository::new();
    let user = UserId::new("cust-1").unwrap();
    repo.upsert_progress(&record(1, ReportKind::Periodic, 95.0), fixed_now())
        .await
        .unwrap();
    repo.upsert_progress(&record(2, ReportKind::Pause, 42.5), fixed_now())
        .await
        .unwrap();
    let catalog = service(api, &repo);

    assert_eq!(
        catalog.resume_position(&user, LessonId::new(1)).await.unwrap(),
        None
    );
    assert_eq!(
        catalog.resume_position(&user, LessonId::new(2)).await.unwrap(),
        Some(42.5)
    );
    assert_eq!(
        catalog.resume_position(&user, LessonId::new(3)).await.unwrap(),
        None
    );
}
