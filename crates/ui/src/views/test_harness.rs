use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use course_core::model::{
    Course, CourseId, CourseProgress, Lesson, LessonDuration, LessonId, LessonRef, Module,
    ModuleId, ProgressRecord, UserId,
};
use course_core::playback::{MediaEvent, PlaybackErrorKind};
use course_core::time::fixed_now;
use dioxus::core::NoOpMutations;
use dioxus::prelude::*;
use dioxus_router::{Routable, Router};
use services::{ApiError, AppServices, Clock, CourseApi, PlayerConfig};
use storage::repository::Storage;

use crate::context::{UiApp, build_app_context};
use crate::views::{CourseView, HomeView, LessonViewer, use_video_player};
use crate::vm::map_lesson_viewer;

/// Course API double: serves `courses` while online, times out otherwise.
pub struct FakeCourseApi {
    courses: Vec<Course>,
    progress: Option<CourseProgress>,
    online: Mutex<bool>,
}

impl FakeCourseApi {
    pub fn new(courses: Vec<Course>) -> Self {
        Self {
            courses,
            progress: None,
            online: Mutex::new(true),
        }
    }

    pub fn offline() -> Self {
        Self {
            courses: Vec::new(),
            progress: None,
            online: Mutex::new(false),
        }
    }

    pub fn with_progress(mut self, progress: CourseProgress) -> Self {
        self.progress = Some(progress);
        self
    }

    fn check(&self) -> Result<(), ApiError> {
        if *self.online.lock().unwrap() {
            Ok(())
        } else {
            Err(ApiError::Timeout)
        }
    }
}

#[async_trait]
impl CourseApi for FakeCourseApi {
    async fn list_courses(&self) -> Result<Vec<Course>, ApiError> {
        self.check()?;
        Ok(self.courses.clone())
    }

    async fn get_course(&self, id: CourseId) -> Result<Course, ApiError> {
        self.check()?;
        // Unknown ids fall through to the (empty) cache.
        self.courses
            .iter()
            .find(|c| c.id() == id)
            .cloned()
            .ok_or(ApiError::Disabled)
    }

    async fn course_progress(
        &self,
        _user_id: &UserId,
        _course_id: CourseId,
    ) -> Result<CourseProgress, ApiError> {
        self.check()?;
        self.progress.ok_or(ApiError::Disabled)
    }

    async fn upsert_progress(&self, _record: &ProgressRecord) -> Result<(), ApiError> {
        self.check()
    }
}

pub fn sample_course() -> Course {
    let module_id = ModuleId::new(10);
    let module = Module::new(
        module_id,
        CourseId::new(1),
        "Basics",
        1,
        vec![
            Lesson::new(LessonId::new(1), module_id, "Holding the knife", 1)
                .with_video("https://cdn.example.com/grip.m3u8")
                .with_duration(LessonDuration::Seconds(185)),
            Lesson::new(LessonId::new(2), module_id, "Care and sharpening", 2)
                .with_description("Keep it **dry**."),
        ],
    )
    .unwrap();
    Course::new(
        CourseId::new(1),
        "Knife skills",
        Some("Everything about blades.".into()),
        vec![module],
    )
    .unwrap()
}

pub fn test_user() -> UserId {
    UserId::new("cust-7").unwrap()
}

#[derive(Clone, Copy, PartialEq, Eq)]
pub enum ViewKind {
    Home,
    Course(u64),
    /// The first sample lesson, opened and then failed with a network error.
    FailedLesson,
}

#[derive(Props, Clone)]
struct ViewHarnessProps {
    app: Arc<AppServices>,
    view: ViewKind,
}

impl PartialEq for ViewHarnessProps {
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}

#[component]
fn ViewRouterHarness(props: ViewHarnessProps) -> Element {
    let app: Arc<dyn UiApp> = props.app.clone();
    use_context_provider(|| build_app_context(&app));
    use_context_provider(|| props.view);
    rsx! { Router::<TestRoute> {} }
}

#[derive(Clone, Routable, PartialEq)]
#[rustfmt::skip]
enum TestRoute {
    #[route("/")]
    Root {},
}

#[component]
fn Root() -> Element {
    match use_context::<ViewKind>() {
        ViewKind::Home => rsx! { HomeView {} },
        ViewKind::Course(course_id) => rsx! { CourseView { course_id } },
        ViewKind::FailedLesson => rsx! { FailedLessonPlayer {} },
    }
}

#[component]
fn FailedLessonPlayer() -> Element {
    let mut player = use_video_player();
    use_hook(move || {
        spawn(async move {
            let lesson = LessonRef {
                course_id: CourseId::new(1),
                module_id: ModuleId::new(10),
                lesson_id: LessonId::new(1),
            };
            player.open(lesson, Some("https://cdn.example.com/grip.m3u8"));
            if let Some(session) = player.state().session() {
                player.media(session, MediaEvent::Failed(PlaybackErrorKind::Network));
            }
        });
    });

    let Some(viewer) = map_lesson_viewer(&sample_course(), LessonId::new(1)) else {
        return rsx! {};
    };
    rsx! {
        LessonViewer {
            viewer,
            player,
            on_close: move |_| {},
            on_next: move |_| {},
        }
    }
}

pub struct ViewHarness {
    pub dom: VirtualDom,
    pub storage: Storage,
}

impl ViewHarness {
    pub async fn settle(&mut self) {
        self.dom.rebuild_in_place();
        drive_dom(&mut self.dom);
        for _ in 0..3 {
            self.drive_async().await;
        }
    }

    pub async fn drive_async(&mut self) {
        let _ = tokio::time::timeout(
            std::time::Duration::from_millis(50),
            self.dom.wait_for_work(),
        )
        .await;
        self.dom.render_immediate(&mut NoOpMutations);
        self.dom.process_events();
    }

    pub fn render(&self) -> String {
        dioxus_ssr::render(&self.dom)
    }
}

pub fn drive_dom(dom: &mut VirtualDom) {
    dom.process_events();
    dom.render_immediate(&mut NoOpMutations);
    dom.process_events();
}

/// Build a view over in-memory storage; `storage` can be pre-seeded.
pub fn setup_view_harness(
    view: ViewKind,
    api: FakeCourseApi,
    user: Option<UserId>,
    storage: Storage,
) -> ViewHarness {
    let mut config = PlayerConfig::default();
    if let Some(user) = user {
        config = config.with_user(user);
    }
    let app = Arc::new(AppServices::from_parts(
        &storage,
        Arc::new(api),
        Clock::fixed(fixed_now()),
        config,
    ));
    let dom = VirtualDom::new_with_props(ViewRouterHarness, ViewHarnessProps { app, view });
    ViewHarness { dom, storage }
}
