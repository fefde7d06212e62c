use course_core::playback::{MediaEvent, PlaybackErrorKind, PlaybackState, PlaybackStatus};
use serde::Deserialize;

use crate::vm::time_fmt::format_playhead;

/// What covers the video surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlayerOverlay {
    None,
    /// The lesson has no video at all.
    NoVideo,
    Spinner,
    Error {
        message: &'static str,
        can_retry: bool,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub struct PlayerVm {
    pub overlay: PlayerOverlay,
    pub controls_enabled: bool,
    pub play_label: &'static str,
    pub fullscreen_label: &'static str,
    pub playhead: String,
    pub percent: f64,
}

impl PlayerVm {
    #[must_use]
    pub fn from_state(state: &PlaybackState) -> Self {
        let overlay = match state.status() {
            PlaybackStatus::Error(kind) => PlayerOverlay::Error {
                message: kind.message(),
                can_retry: kind.is_retryable(),
            },
            PlaybackStatus::Idle if state.session().is_none() => PlayerOverlay::NoVideo,
            // Idle with a session means a retry is waiting to reattach.
            PlaybackStatus::Idle | PlaybackStatus::Loading => PlayerOverlay::Spinner,
            PlaybackStatus::Ready | PlaybackStatus::Playing | PlaybackStatus::Paused => {
                PlayerOverlay::None
            }
        };
        let duration = state.duration();
        let percent = if duration > 0.0 {
            (state.current_time() / duration * 100.0).clamp(0.0, 100.0)
        } else {
            0.0
        };

        Self {
            overlay,
            controls_enabled: state.video_ready(),
            play_label: if state.is_playing() { "Pause" } else { "Play" },
            fullscreen_label: if state.is_fullscreen() {
                "Exit fullscreen"
            } else {
                "Fullscreen"
            },
            playhead: format_playhead(state.current_time(), duration),
            percent,
        }
    }
}

//
// ─── BRIDGE MESSAGES ───────────────────────────────────────────────────────────
//

/// A media event posted by the webview player script.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct BridgeMessage {
    pub session: u64,
    pub event: String,
    #[serde(default)]
    pub value: Option<f64>,
    #[serde(default)]
    pub detail: Option<String>,
}

impl BridgeMessage {
    /// The webview went to the background; progress should be flushed.
    #[must_use]
    pub fn is_page_hidden(&self) -> bool {
        self.event == "hidden"
    }

    /// Translate into a reducer event. Unknown names are dropped.
    #[must_use]
    pub fn media_event(&self) -> Option<MediaEvent> {
        let event = match self.event.as_str() {
            "manifestparsed" => MediaEvent::ManifestParsed,
            "canplay" => MediaEvent::CanPlay,
            "loadedmetadata" | "durationchange" => MediaEvent::MetadataLoaded {
                duration: self.value?,
            },
            "timeupdate" => MediaEvent::TimeUpdate {
                current_time: self.value?,
            },
            "playing" => MediaEvent::Playing,
            "pause" => MediaEvent::Paused,
            "fullscreenchange" => MediaEvent::FullscreenChanged(self.value? > 0.0),
            "volumechange" => MediaEvent::VolumeChanged(self.value?),
            "error" => MediaEvent::Failed(error_kind(self.detail.as_deref())),
            _ => return None,
        };
        Some(event)
    }
}

/// hls.js error types and `MediaError` codes, folded into three categories.
fn error_kind(detail: Option<&str>) -> PlaybackErrorKind {
    match detail {
        Some("networkError" | "MEDIA_ERR_NETWORK") => PlaybackErrorKind::Network,
        Some("unsupported") => PlaybackErrorKind::Unsupported,
        _ => PlaybackErrorKind::Media,
    }
}

#[cfg(test)]
mod tests {
    use course_core::playback::{PlaybackEvent, reduce};
    use course_core::video_source::VideoSource;

    use super::*;

    fn msg(event: &str, value: Option<f64>, detail: Option<&str>) -> BridgeMessage {
        BridgeMessage {
            session: 1,
            event: event.to_string(),
            value,
            detail: detail.map(str::to_string),
        }
    }

    #[test]
    fn maps_bridge_events() {
        assert_eq!(
            msg("timeupdate", Some(4.5), None).media_event(),
            Some(MediaEvent::TimeUpdate { current_time: 4.5 })
        );
        assert_eq!(msg("timeupdate", None, None).media_event(), None);
        assert_eq!(
            msg("error", None, Some("networkError")).media_event(),
            Some(MediaEvent::Failed(PlaybackErrorKind::Network))
        );
        assert_eq!(
            msg("error", None, Some("MEDIA_ERR_SRC_NOT_SUPPORTED")).media_event(),
            Some(MediaEvent::Failed(PlaybackErrorKind::Media))
        );
        assert_eq!(
            msg("error", None, Some("unsupported")).media_event(),
            Some(MediaEvent::Failed(PlaybackErrorKind::Unsupported))
        );
        assert_eq!(
            msg("fullscreenchange", Some(1.0), None).media_event(),
            Some(MediaEvent::FullscreenChanged(true))
        );
        assert_eq!(msg("seeking", None, None).media_event(), None);
    }

    #[test]
    fn hidden_page_is_not_a_media_event() {
        let hidden = msg("hidden", None, None);
        assert!(hidden.is_page_hidden());
        assert_eq!(hidden.media_event(), None);
        assert!(!msg("pause", None, None).is_page_hidden());
    }

    #[test]
    fn overlay_follows_status() {
        let idle = PlaybackState::new();
        assert_eq!(PlayerVm::from_state(&idle).overlay, PlayerOverlay::NoVideo);

        let source = VideoSource::resolve("https://cdn.example.com/v.mp4").unwrap();
        let loading = reduce(&idle, PlaybackEvent::Open { source: Some(source) }).state;
        let vm = PlayerVm::from_state(&loading);
        assert_eq!(vm.overlay, PlayerOverlay::Spinner);
        assert!(!vm.controls_enabled);

        let session = loading.session().unwrap();
        let ready = reduce(
            &loading,
            PlaybackEvent::Media {
                session,
                event: MediaEvent::CanPlay,
            },
        )
        .state;
        let vm = PlayerVm::from_state(&ready);
        assert_eq!(vm.overlay, PlayerOverlay::None);
        assert!(vm.controls_enabled);
        assert_eq!(vm.play_label, "Play");

        let failed = reduce(
            &ready,
            PlaybackEvent::Media {
                session,
                event: MediaEvent::Failed(PlaybackErrorKind::Unsupported),
            },
        )
        .state;
        assert!(matches!(
            PlayerVm::from_state(&failed).overlay,
            PlayerOverlay::Error {
                can_retry: false,
                ..
            }
        ));
    }

    #[test]
    fn manifest_network_failure_offers_retry() {
        let source = VideoSource::resolve("https://cdn.example.com/course/index.m3u8").unwrap();
        let loading = reduce(
            &PlaybackState::new(),
            PlaybackEvent::Open {
                source: Some(source),
            },
        )
        .state;
        let session = loading.session().unwrap();

        let failed = reduce(
            &loading,
            PlaybackEvent::Media {
                session,
                event: MediaEvent::Failed(PlaybackErrorKind::Network),
            },
        )
        .state;
        let vm = PlayerVm::from_state(&failed);
        assert_eq!(
            vm.overlay,
            PlayerOverlay::Error {
                message: PlaybackErrorKind::Network.message(),
                can_retry: true,
            }
        );
        assert!(!vm.controls_enabled);
    }
}
