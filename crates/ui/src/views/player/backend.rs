use course_core::playback::SessionId;
use course_core::video_source::{StreamKind, VideoSource};
use dioxus::document::eval;
use services::MediaBackend;
use tracing::debug;

use super::scripts::{attach_script, call_script, seek_script};

/// Drives the webview `<video>` through the bridge installed by
/// [`super::scripts::player_bridge_script`].
#[derive(Clone, Copy, Debug, Default)]
pub struct EvalBackend;

impl EvalBackend {
    fn run(js: &str) {
        let _ = eval(js);
    }
}

impl MediaBackend for EvalBackend {
    fn attach(&mut self, session: SessionId, source: &VideoSource) {
        debug!(session = session.value(), kind = ?source.kind(), "attaching video");
        Self::run(&attach_script(
            session.value(),
            source.url(),
            source.kind() == StreamKind::Hls,
        ));
    }

    fn teardown(&mut self) {
        Self::run(&call_script("teardown"));
    }

    fn play(&mut self) {
        Self::run(&call_script("play"));
    }

    fn pause(&mut self) {
        Self::run(&call_script("pause"));
    }

    fn seek(&mut self, to_secs: f64) {
        Self::run(&seek_script(to_secs));
    }

    fn enter_fullscreen(&mut self) {
        Self::run(&call_script("enterFullscreen"));
    }

    fn exit_fullscreen(&mut self) {
        Self::run(&call_script("exitFullscreen"));
    }
}
