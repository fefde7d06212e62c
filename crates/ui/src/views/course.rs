use course_core::model::{CourseId, LessonId, LessonRef};
use dioxus::prelude::*;
use dioxus_router::Link;
use tracing::warn;

use crate::context::AppContext;
use crate::routes::Route;
use crate::views::home::ProgressBar;
use crate::views::player::{LessonViewer, use_video_player};
use crate::views::{ViewError, ViewState, view_state_from_resource};
use crate::vm::{CourseDetailVm, LessonRowVm, LessonViewerVm, map_course_detail, map_lesson_viewer};

#[derive(Clone, Debug, PartialEq)]
struct CourseData {
    detail: CourseDetailVm,
    /// Viewer models keyed by lesson, built once per load.
    viewers: Vec<LessonViewerVm>,
}

impl CourseData {
    fn viewer(&self, lesson_id: LessonId) -> Option<&LessonViewerVm> {
        self.viewers.iter().find(|v| v.lesson.lesson_id == lesson_id)
    }
}

#[component]
pub fn CourseView(course_id: u64) -> Element {
    let ctx = use_context::<AppContext>();
    let catalog = ctx.catalog();
    let user_id = ctx.user_id().cloned();
    let course_id = CourseId::new(course_id);

    let mut selected = use_signal(|| None::<LessonId>);
    let mut player = use_video_player();

    let mut resource = use_resource({
        let catalog = catalog.clone();
        let user_id = user_id.clone();
        move || {
            let catalog = catalog.clone();
            let user_id = user_id.clone();
            async move {
                let course = catalog
                    .get_course(course_id)
                    .await
                    .map_err(ViewError::from)?;
                let (records, progress) = match user_id.as_ref() {
                    Some(user) => (
                        catalog.lesson_progress(user, course_id).await.unwrap_or_default(),
                        catalog.course_progress(user, &course).await.ok(),
                    ),
                    None => (Vec::new(), None),
                };
                let detail = map_course_detail(&course, &records, progress.as_ref());
                let viewers = course
                    .lessons()
                    .filter_map(|lesson| map_lesson_viewer(&course, lesson.id()))
                    .collect();
                Ok::<_, ViewError>(CourseData { detail, viewers })
            }
        }
    });

    let state = view_state_from_resource(&resource);

    let open_lesson = {
        let catalog = catalog.clone();
        let user_id = user_id.clone();
        move |viewer: LessonViewerVm| {
            let lesson = viewer.lesson;
            selected.set(Some(lesson.lesson_id));
            player.open(lesson, viewer.video.as_deref());

            let Some(user) = user_id.clone() else {
                return;
            };
            let catalog = catalog.clone();
            spawn(async move {
                let mut player = player;
                match catalog.resume_position(&user, lesson.lesson_id).await {
                    Ok(Some(position)) => player.resume_at(lesson, position),
                    Ok(None) => {}
                    Err(err) => warn!(lesson = %lesson.lesson_id, error = %err, "resume lookup failed"),
                }
            });
        }
    };

    let mut close_viewer = move || {
        player.close();
        selected.set(None);
        // Progress badges may have moved.
        resource.restart();
    };

    rsx! {
        div { class: "page",
            Link { class: "back-link", to: Route::Home {}, "← All courses" }

            match state {
                ViewState::Idle => rsx! {
                    p { "Idle" }
                },
                ViewState::Loading => rsx! {
                    p { "Loading..." }
                },
                ViewState::Ready(data) => {
                    let viewer = selected().and_then(|id| data.viewer(id).cloned());
                    let lookup = data.clone();
                    rsx! {
                        h2 { "{data.detail.title}" }
                        if let Some(bar) = data.detail.progress.clone() {
                            ProgressBar { bar }
                        }
                        if let Some(html) = data.detail.description_html.clone() {
                            div { class: "course-description", dangerous_inner_html: "{html}" }
                        }
                        for module in data.detail.modules.clone() {
                            section { class: "module",
                                h3 { "{module.title}" }
                                ol { class: "lesson-list",
                                    for row in module.lessons {
                                        LessonRow {
                                            key: "{row.lesson.lesson_id}",
                                            row: row.clone(),
                                            on_open: {
                                                let lookup = lookup.clone();
                                                let mut open_lesson = open_lesson.clone();
                                                move |lesson: LessonRef| {
                                                    if let Some(viewer) = lookup.viewer(lesson.lesson_id).cloned() {
                                                        open_lesson(viewer);
                                                    }
                                                }
                                            },
                                        }
                                    }
                                }
                            }
                        }
                        if let Some(viewer) = viewer {
                            LessonViewer {
                                viewer,
                                player,
                                on_close: move |()| close_viewer(),
                                on_next: {
                                    let lookup = lookup.clone();
                                    let mut open_lesson = open_lesson.clone();
                                    move |next: LessonId| {
                                        if let Some(viewer) = lookup.viewer(next).cloned() {
                                            open_lesson(viewer);
                                        }
                                    }
                                },
                            }
                        }
                    }
                }
                ViewState::Error(err) => rsx! {
                    div { class: "page-error",
                        p { "{err.message()}" }
                        button { class: "btn", onclick: move |_| resource.restart(), "Retry" }
                    }
                },
            }
        }
    }
}

#[component]
fn LessonRow(row: LessonRowVm, on_open: EventHandler<LessonRef>) -> Element {
    let lesson = row.lesson;
    let class = if row.completed {
        "lesson-row lesson-row--done"
    } else {
        "lesson-row"
    };

    rsx! {
        li { class,
            button {
                class: "lesson-open",
                onclick: move |_| on_open.call(lesson),
                span { class: "lesson-title", "{row.title}" }
                if let Some(duration) = row.duration_label.clone() {
                    span { class: "lesson-duration", "{duration}" }
                }
                if !row.has_video {
                    span { class: "lesson-tag", "Reading" }
                }
            }
            span { class: "lesson-status", "{row.status_label}" }
            if row.percent > 0 && !row.completed {
                span { class: "lesson-percent", "{row.percent}%" }
            }
        }
    }
}
