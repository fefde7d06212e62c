//! Playback lifecycle of a single lesson video as a pure state machine.
//!
//! `reduce` never performs I/O. It returns the next state plus a list of
//! [`Effect`]s that the session controller executes against the real player,
//! in order. Media events carry the [`SessionId`] they were produced for, and
//! events from an abandoned session are dropped.

use std::time::Duration;

use crate::keyboard::PlayerCommand;
use crate::model::{ReportKind, percentage};
use crate::video_source::VideoSource;

/// Pause between tearing the player down and re-attaching on retry.
pub const RETRY_DELAY: Duration = Duration::from_millis(500);

/// Distance covered by the arrow-key seek shortcuts.
pub const SEEK_STEP_SECS: f64 = 10.0;

/// Identifies one attach of a player to a lesson source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct SessionId(u64);

impl SessionId {
    #[must_use]
    pub fn value(self) -> u64 {
        self.0
    }

    #[must_use]
    fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

/// For ids echoed back by the player bridge.
impl From<u64> for SessionId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

/// Category of a playback failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlaybackErrorKind {
    /// The manifest or segments could not be fetched.
    Network,
    /// The decoder rejected the content.
    Media,
    /// Neither a streaming library nor native support is available.
    Unsupported,
}

impl PlaybackErrorKind {
    #[must_use]
    pub fn message(self) -> &'static str {
        match self {
            Self::Network => {
                "We couldn't load this video. Check your connection and try again."
            }
            Self::Media => "This video couldn't be played. The file may be damaged or in an unsupported format.",
            Self::Unsupported => "Your browser can't play this video. Try a different browser.",
        }
    }

    #[must_use]
    pub fn is_retryable(self) -> bool {
        !matches!(self, Self::Unsupported)
    }
}

//
// ─── STATE ─────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackStatus {
    Idle,
    Loading,
    Ready,
    Playing,
    Paused,
    Error(PlaybackErrorKind),
}

/// Ephemeral playback state for the lesson currently open in the viewer.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackState {
    session: Option<SessionId>,
    last_session: SessionId,
    source: Option<VideoSource>,
    status: PlaybackStatus,
    current_time: f64,
    duration: f64,
    volume: f64,
    is_fullscreen: bool,
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaybackState {
    #[must_use]
    pub fn new() -> Self {
        Self {
            session: None,
            last_session: SessionId::default(),
            source: None,
            status: PlaybackStatus::Idle,
            current_time: 0.0,
            duration: 0.0,
            volume: 1.0,
            is_fullscreen: false,
        }
    }

    #[must_use]
    pub fn session(&self) -> Option<SessionId> {
        self.session
    }

    #[must_use]
    pub fn source(&self) -> Option<&VideoSource> {
        self.source.as_ref()
    }

    #[must_use]
    pub fn status(&self) -> PlaybackStatus {
        self.status
    }

    #[must_use]
    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    #[must_use]
    pub fn duration(&self) -> f64 {
        self.duration
    }

    #[must_use]
    pub fn volume(&self) -> f64 {
        self.volume
    }

    #[must_use]
    pub fn is_fullscreen(&self) -> bool {
        self.is_fullscreen
    }

    #[must_use]
    pub fn is_playing(&self) -> bool {
        self.status == PlaybackStatus::Playing
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.status == PlaybackStatus::Loading
    }

    /// True once the first frame can be rendered.
    #[must_use]
    pub fn video_ready(&self) -> bool {
        matches!(
            self.status,
            PlaybackStatus::Ready | PlaybackStatus::Playing | PlaybackStatus::Paused
        )
    }

    #[must_use]
    pub fn error(&self) -> Option<PlaybackErrorKind> {
        match self.status {
            PlaybackStatus::Error(kind) => Some(kind),
            _ => None,
        }
    }

    fn has_progress(&self) -> bool {
        self.current_time > 0.0 && percentage(self.current_time, self.duration).is_some()
    }

    fn cleared(&self) -> Self {
        Self {
            last_session: self.last_session,
            volume: self.volume,
            ..Self::new()
        }
    }
}

//
// ─── EVENTS & EFFECTS ──────────────────────────────────────────────────────────
//

/// Signals coming from the media element or the streaming library.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MediaEvent {
    ManifestParsed,
    CanPlay,
    MetadataLoaded { duration: f64 },
    TimeUpdate { current_time: f64 },
    Playing,
    Paused,
    Failed(PlaybackErrorKind),
    FullscreenChanged(bool),
    VolumeChanged(f64),
}

#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackEvent {
    /// A lesson was selected. `None` means it has no video.
    Open { source: Option<VideoSource> },
    Media { session: SessionId, event: MediaEvent },
    Command(PlayerCommand),
    Seek(f64),
    Retry,
    ReattachDue { session: SessionId },
    Close,
}

/// Side effects requested by a transition, executed in order.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Attach { session: SessionId, source: VideoSource },
    /// Destroy the decoder, clear the source, detach listeners.
    Teardown,
    Play,
    Pause,
    Seek(f64),
    EnterFullscreen,
    ExitFullscreen,
    Report {
        kind: ReportKind,
        current_time: f64,
        duration: f64,
    },
    ScheduleReattach { session: SessionId, delay: Duration },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub state: PlaybackState,
    pub effects: Vec<Effect>,
}

impl Transition {
    fn unchanged(state: &PlaybackState) -> Self {
        Self {
            state: state.clone(),
            effects: Vec::new(),
        }
    }
}

//
// ─── REDUCER ───────────────────────────────────────────────────────────────────
//

#[must_use]
pub fn reduce(state: &PlaybackState, event: PlaybackEvent) -> Transition {
    match event {
        PlaybackEvent::Open { source } => open(state, source),
        PlaybackEvent::Media { session, event } => {
            if state.session != Some(session) {
                return Transition::unchanged(state);
            }
            media(state, event)
        }
        PlaybackEvent::Command(command) => command_event(state, command),
        PlaybackEvent::Seek(target) => {
            if !state.video_ready() {
                return Transition::unchanged(state);
            }
            Transition {
                state: state.clone(),
                effects: vec![Effect::Seek(target)],
            }
        }
        PlaybackEvent::Retry => retry(state),
        PlaybackEvent::ReattachDue { session } => reattach(state, session),
        PlaybackEvent::Close => close(state),
    }
}

fn shutdown_effects(state: &PlaybackState) -> Vec<Effect> {
    let mut effects = Vec::new();
    if state.session.is_none() {
        return effects;
    }
    if state.has_progress() {
        effects.push(Effect::Report {
            kind: ReportKind::Flush,
            current_time: state.current_time,
            duration: state.duration,
        });
    }
    effects.push(Effect::Teardown);
    effects
}

fn open(state: &PlaybackState, source: Option<VideoSource>) -> Transition {
    let mut effects = shutdown_effects(state);
    let mut next = state.cleared();

    if let Some(source) = source {
        let session = state.last_session.next();
        next.last_session = session;
        next.session = Some(session);
        next.source = Some(source.clone());
        next.status = PlaybackStatus::Loading;
        effects.push(Effect::Attach { session, source });
    }

    Transition {
        state: next,
        effects,
    }
}

fn close(state: &PlaybackState) -> Transition {
    Transition {
        effects: shutdown_effects(state),
        state: state.cleared(),
    }
}

fn retry(state: &PlaybackState) -> Transition {
    let Some(kind) = state.error() else {
        return Transition::unchanged(state);
    };
    if !kind.is_retryable() {
        return Transition::unchanged(state);
    }

    let session = state.last_session.next();
    let mut next = state.cleared();
    next.last_session = session;
    next.session = Some(session);
    next.source = state.source.clone();

    Transition {
        state: next,
        effects: vec![
            Effect::Teardown,
            Effect::ScheduleReattach {
                session,
                delay: RETRY_DELAY,
            },
        ],
    }
}

fn reattach(state: &PlaybackState, session: SessionId) -> Transition {
    if state.session != Some(session) || state.status != PlaybackStatus::Idle {
        return Transition::unchanged(state);
    }
    let Some(source) = state.source.clone() else {
        return Transition::unchanged(state);
    };

    let mut next = state.clone();
    next.status = PlaybackStatus::Loading;
    Transition {
        state: next,
        effects: vec![Effect::Attach { session, source }],
    }
}

fn media(state: &PlaybackState, event: MediaEvent) -> Transition {
    use PlaybackStatus as S;

    let mut next = state.clone();
    let mut effects = Vec::new();
    let active = !matches!(state.status, S::Idle | S::Error(_));

    match event {
        MediaEvent::ManifestParsed | MediaEvent::CanPlay => {
            if state.status == S::Loading {
                next.status = S::Ready;
            }
        }
        MediaEvent::MetadataLoaded { duration } => {
            if active && duration.is_finite() && duration > 0.0 {
                next.duration = duration;
            }
        }
        MediaEvent::TimeUpdate { current_time } => {
            if active && current_time.is_finite() {
                next.current_time = current_time.max(0.0);
                if state.status == S::Playing
                    && percentage(next.current_time, next.duration).is_some()
                {
                    effects.push(Effect::Report {
                        kind: ReportKind::Periodic,
                        current_time: next.current_time,
                        duration: next.duration,
                    });
                }
            }
        }
        MediaEvent::Playing => {
            if matches!(state.status, S::Loading | S::Ready | S::Paused) {
                next.status = S::Playing;
            }
        }
        MediaEvent::Paused => {
            if state.status == S::Playing {
                next.status = S::Paused;
                if percentage(state.current_time, state.duration).is_some() {
                    effects.push(Effect::Report {
                        kind: ReportKind::Pause,
                        current_time: state.current_time,
                        duration: state.duration,
                    });
                }
            }
        }
        MediaEvent::Failed(kind) => {
            if active {
                next.status = S::Error(kind);
            }
        }
        MediaEvent::FullscreenChanged(on) => {
            next.is_fullscreen = on;
        }
        MediaEvent::VolumeChanged(volume) => {
            if volume.is_finite() {
                next.volume = volume.clamp(0.0, 1.0);
            }
        }
    }

    Transition {
        state: next,
        effects,
    }
}

fn command_event(state: &PlaybackState, command: PlayerCommand) -> Transition {
    match command {
        PlayerCommand::TogglePlayPause => {
            if !state.video_ready() {
                return Transition::unchanged(state);
            }
            let effect = if state.is_playing() {
                Effect::Pause
            } else {
                Effect::Play
            };
            Transition {
                state: state.clone(),
                effects: vec![effect],
            }
        }
        PlayerCommand::SeekBy(delta) => {
            if !state.video_ready() || !delta.is_finite() {
                return Transition::unchanged(state);
            }
            let upper = if state.duration > 0.0 {
                state.duration
            } else {
                f64::MAX
            };
            let target = (state.current_time + delta).clamp(0.0, upper);
            Transition {
                state: state.clone(),
                effects: vec![Effect::Seek(target)],
            }
        }
        PlayerCommand::ToggleFullscreen => {
            if state.session.is_none() {
                return Transition::unchanged(state);
            }
            let effect = if state.is_fullscreen {
                Effect::ExitFullscreen
            } else {
                Effect::EnterFullscreen
            };
            Transition {
                state: state.clone(),
                effects: vec![effect],
            }
        }
        PlayerCommand::Escape => {
            if state.is_fullscreen {
                Transition {
                    state: state.clone(),
                    effects: vec![Effect::ExitFullscreen],
                }
            } else {
                close(state)
            }
        }
    }
}
