use dioxus::prelude::*;
use dioxus_router::Link;

use crate::context::AppContext;
use crate::routes::Route;
use crate::views::{ViewError, ViewState, view_state_from_resource};
use crate::vm::{CourseCardVm, ProgressBarVm, map_course_card};

#[component]
pub fn HomeView() -> Element {
    let ctx = use_context::<AppContext>();
    let catalog = ctx.catalog();
    let user_id = ctx.user_id().cloned();

    let mut resource = use_resource(move || {
        let catalog = catalog.clone();
        let user_id = user_id.clone();
        async move {
            let courses = catalog.list_courses().await.map_err(ViewError::from)?;
            let mut cards = Vec::with_capacity(courses.len());
            for course in &courses {
                // A missing bar is better than a missing course.
                let progress = match user_id.as_ref() {
                    Some(user) => catalog.course_progress(user, course).await.ok(),
                    None => None,
                };
                cards.push(map_course_card(course, progress.as_ref()));
            }
            Ok::<_, ViewError>(cards)
        }
    });

    let state = view_state_from_resource(&resource);

    rsx! {
        div { class: "page",
            h2 { "Courses" }

            match state {
                ViewState::Idle => rsx! {
                    p { "Idle" }
                },
                ViewState::Loading => rsx! {
                    p { "Loading..." }
                },
                ViewState::Ready(cards) => rsx! {
                    if cards.is_empty() {
                        p { "No courses yet." }
                    } else {
                        ul { class: "course-grid",
                            for card in cards {
                                CourseCard { key: "{card.id}", card }
                            }
                        }
                    }
                },
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
fn CourseCard(card: CourseCardVm) -> Element {
    rsx! {
        li { class: "course-card",
            Link { class: "course-link", to: Route::Course { course_id: card.id.value() },
                if let Some(src) = card.thumbnail.clone() {
                    img { class: "course-thumb", src: "{src}", alt: "" }
                }
                h3 { "{card.title}" }
            }
            if let Some(summary) = card.summary.clone() {
                p { class: "course-summary", "{summary}" }
            }
            p { class: "course-meta", "{card.lessons_label}" }
            if let Some(bar) = card.progress.clone() {
                ProgressBar { bar }
            }
        }
    }
}

#[component]
pub(crate) fn ProgressBar(bar: ProgressBarVm) -> Element {
    rsx! {
        div { class: "progress",
            div { class: "progress-track",
                div { class: "progress-fill", style: "width: {bar.percent}%" }
            }
            span { class: "progress-label", "{bar.label}" }
        }
    }
}
