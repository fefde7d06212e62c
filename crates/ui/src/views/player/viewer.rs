use course_core::keyboard::{PlayerCommand, command_for_key};
use course_core::model::LessonId;
use course_core::playback::{PlaybackEvent, SEEK_STEP_SECS};
use dioxus::document::eval;
use dioxus::prelude::*;

use super::PlayerHandle;
use super::scripts::{FRAME_ID, VIDEO_ID, VIEWER_ID, focus_viewer_script};
use crate::vm::{LessonViewerVm, PlayerOverlay, PlayerVm};

/// Modal lesson viewer: video surface, transport controls, lesson text and
/// downloads.
#[component]
pub fn LessonViewer(
    viewer: LessonViewerVm,
    player: PlayerHandle,
    on_close: EventHandler<()>,
    on_next: EventHandler<LessonId>,
) -> Element {
    let mut player = player;
    let vm = PlayerVm::from_state(&player.state());
    let is_fullscreen = player.state().is_fullscreen();

    use_effect(move || {
        let _ = eval(&focus_viewer_script());
    });

    let on_key = move |evt: KeyboardEvent| {
        let key = evt.data.key().to_string();
        let Some(command) = command_for_key(&key) else {
            return;
        };
        evt.prevent_default();
        if matches!(command, PlayerCommand::Escape) && !player.state().is_fullscreen() {
            on_close.call(());
            return;
        }
        player.dispatch(PlaybackEvent::Command(command));
    };

    let controls_disabled = !vm.controls_enabled;

    rsx! {
        div { class: "viewer-backdrop",
            div {
                id: VIEWER_ID,
                class: "viewer",
                role: "dialog",
                tabindex: "0",
                onkeydown: on_key,
                header { class: "viewer-header",
                    div {
                        p { class: "viewer-module", "{viewer.module_title}" }
                        h2 { "{viewer.title}" }
                    }
                    button {
                        class: "viewer-close",
                        title: "Close",
                        onclick: move |_| on_close.call(()),
                        "✕"
                    }
                }

                if viewer.video.is_some() {
                    div {
                        id: FRAME_ID,
                        class: if is_fullscreen { "player-frame player-frame--fullscreen" } else { "player-frame" },
                        video {
                            id: VIDEO_ID,
                            class: "player-video",
                            onclick: move |_| player.dispatch(PlaybackEvent::Command(PlayerCommand::TogglePlayPause)),
                        }
                        match vm.overlay {
                            PlayerOverlay::Spinner => rsx! {
                                div { class: "player-overlay",
                                    div { class: "spinner" }
                                }
                            },
                            PlayerOverlay::Error { message, can_retry } => rsx! {
                                div { class: "player-overlay player-error",
                                    p { "{message}" }
                                    div { class: "player-error-actions",
                                        if can_retry {
                                            button {
                                                class: "btn btn-primary",
                                                onclick: move |_| player.dispatch(PlaybackEvent::Retry),
                                                "Try again"
                                            }
                                        }
                                        button {
                                            class: "btn",
                                            onclick: move |_| on_close.call(()),
                                            "Close"
                                        }
                                    }
                                }
                            },
                            PlayerOverlay::None | PlayerOverlay::NoVideo => rsx! {},
                        }
                        div { class: "player-controls",
                            button {
                                class: "btn",
                                disabled: controls_disabled,
                                onclick: move |_| player.dispatch(PlaybackEvent::Command(PlayerCommand::TogglePlayPause)),
                                "{vm.play_label}"
                            }
                            button {
                                class: "btn",
                                disabled: controls_disabled,
                                onclick: move |_| player.dispatch(PlaybackEvent::Command(PlayerCommand::SeekBy(-SEEK_STEP_SECS))),
                                "−10s"
                            }
                            button {
                                class: "btn",
                                disabled: controls_disabled,
                                onclick: move |_| player.dispatch(PlaybackEvent::Command(PlayerCommand::SeekBy(SEEK_STEP_SECS))),
                                "+10s"
                            }
                            div { class: "player-scrubber",
                                div { class: "player-scrubber-fill", style: "width: {vm.percent:.1}%" }
                            }
                            span { class: "player-time", "{vm.playhead}" }
                            button {
                                class: "btn",
                                onclick: move |_| player.dispatch(PlaybackEvent::Command(PlayerCommand::ToggleFullscreen)),
                                "{vm.fullscreen_label}"
                            }
                        }
                    }
                } else {
                    div { class: "player-empty", "This lesson has no video." }
                }

                section { class: "viewer-body",
                    if let Some(html) = viewer.description_html.clone() {
                        div { class: "lesson-text", dangerous_inner_html: "{html}" }
                    }
                    if let Some(html) = viewer.content_html.clone() {
                        div { class: "lesson-text", dangerous_inner_html: "{html}" }
                    }
                    if !viewer.files.is_empty() {
                        h3 { "Downloads" }
                        ul { class: "lesson-files",
                            for file in viewer.files.clone() {
                                li { key: "{file.url}",
                                    a { href: "{file.url}", target: "_blank", "{file.name}" }
                                    if let Some(size) = file.size_label.clone() {
                                        span { class: "lesson-file-size", " ({size})" }
                                    }
                                }
                            }
                        }
                    }
                }

                footer { class: "viewer-footer",
                    if let Some(next) = viewer.next {
                        button {
                            class: "btn btn-primary",
                            onclick: move |_| on_next.call(next),
                            "Next lesson"
                        }
                    }
                }
            }
        }
    }
}
