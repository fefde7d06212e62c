use course_core::model::{LessonRef, ReportKind};
use course_core::playback::{
    Effect, MediaEvent, PlaybackEvent, PlaybackState, SessionId, reduce,
};
use course_core::video_source::VideoSource;
use tokio::sync::mpsc;
use tracing::debug;

use crate::reporter::{ProgressReporter, ReportSession, spawn_detached};

/// The concrete player: a `<video>` element driven by hls.js in the UI, or a
/// recorder in tests.
///
/// Calls are fire-and-forget; outcomes come back as [`MediaEvent`]s tagged
/// with the session they were attached for.
pub trait MediaBackend: Send {
    fn attach(&mut self, session: SessionId, source: &VideoSource);
    /// Destroy the decoder, clear the source and detach listeners.
    fn teardown(&mut self);
    fn play(&mut self);
    fn pause(&mut self);
    fn seek(&mut self, to_secs: f64);
    fn enter_fullscreen(&mut self);
    fn exit_fullscreen(&mut self);
}

/// Owns the player for whichever lesson is open.
///
/// Events go through [`reduce`]; the returned effects are executed in order.
/// Deferred events (the retry re-attach) are posted to the channel handed out
/// by [`VideoSession::new`] and must be fed back through
/// [`VideoSession::dispatch`].
pub struct VideoSession<B: MediaBackend> {
    state: PlaybackState,
    backend: B,
    reporter: ProgressReporter,
    lesson: Option<ReportSession>,
    deferred: mpsc::UnboundedSender<PlaybackEvent>,
}

impl<B: MediaBackend> VideoSession<B> {
    #[must_use]
    pub fn new(
        backend: B,
        reporter: ProgressReporter,
    ) -> (Self, mpsc::UnboundedReceiver<PlaybackEvent>) {
        let (deferred, rx) = mpsc::unbounded_channel();
        (
            Self {
                state: PlaybackState::new(),
                backend,
                reporter,
                lesson: None,
                deferred,
            },
            rx,
        )
    }

    #[must_use]
    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    #[must_use]
    pub fn lesson(&self) -> Option<LessonRef> {
        self.lesson.as_ref().map(ReportSession::lesson)
    }

    #[must_use]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Open a lesson, tearing down whatever was playing before.
    ///
    /// `raw_video` is the lesson's `videoUrl` field; a lesson without one
    /// leaves the player idle.
    pub fn open_lesson(&mut self, lesson: LessonRef, raw_video: Option<&str>) -> &PlaybackState {
        self.close();
        let source = raw_video.and_then(VideoSource::resolve);
        debug!(lesson = %lesson.lesson_id, has_video = source.is_some(), "open lesson");
        self.lesson = Some(self.reporter.session(lesson));
        self.dispatch(PlaybackEvent::Open { source })
    }

    /// Close the viewer: flush progress, tear down, forget the lesson.
    pub fn close(&mut self) -> &PlaybackState {
        if self.lesson.is_some() || self.state.session().is_some() {
            self.dispatch(PlaybackEvent::Close);
        }
        if let Some(lesson) = self.lesson.take() {
            lesson.cancel();
        }
        &self.state
    }

    /// Shorthand for a media event of the current session.
    pub fn media(&mut self, session: SessionId, event: MediaEvent) -> &PlaybackState {
        self.dispatch(PlaybackEvent::Media { session, event })
    }

    pub fn dispatch(&mut self, event: PlaybackEvent) -> &PlaybackState {
        let transition = reduce(&self.state, event);
        if transition.state.status() != self.state.status() {
            debug!(
                from = ?self.state.status(),
                to = ?transition.state.status(),
                "playback transition"
            );
        }
        let was_attached = self.state.session().is_some();
        self.state = transition.state;
        for effect in transition.effects {
            self.execute(effect);
        }
        // Escape can close the viewer from inside the reducer.
        if was_attached && self.state.session().is_none() {
            if let Some(lesson) = self.lesson.take() {
                lesson.cancel();
            }
        }
        &self.state
    }

    fn execute(&mut self, effect: Effect) {
        match effect {
            Effect::Attach { session, source } => self.backend.attach(session, &source),
            Effect::Teardown => self.backend.teardown(),
            Effect::Play => self.backend.play(),
            Effect::Pause => self.backend.pause(),
            Effect::Seek(to) => self.backend.seek(to),
            Effect::EnterFullscreen => self.backend.enter_fullscreen(),
            Effect::ExitFullscreen => self.backend.exit_fullscreen(),
            Effect::Report {
                kind,
                current_time,
                duration,
            } => {
                if let Some(lesson) = self.lesson.as_mut() {
                    let _ = lesson.report(kind, current_time, duration);
                }
            }
            Effect::ScheduleReattach { session, delay } => {
                let tx = self.deferred.clone();
                let token = self.lesson.as_ref().map(|l| l.token().clone());
                let _ = spawn_detached(async move {
                    let wait = tokio::time::sleep(delay);
                    match token {
                        Some(token) => {
                            tokio::select! {
                                () = token.cancelled() => return,
                                () = wait => {}
                            }
                        }
                        None => wait.await,
                    }
                    let _ = tx.send(PlaybackEvent::ReattachDue { session });
                });
            }
        }
    }

    /// Report the current position as a flush without closing, e.g. when the
    /// player page is hidden.
    pub fn flush(&mut self) {
        let (current, duration) = (self.state.current_time(), self.state.duration());
        if let Some(lesson) = self.lesson.as_mut() {
            let _ = lesson.report(ReportKind::Flush, current, duration);
        }
    }
}

impl<B: MediaBackend> Drop for VideoSession<B> {
    fn drop(&mut self) {
        self.close();
    }
}
