mod backend;
mod scripts;
mod viewer;

use std::cell::RefCell;
use std::rc::Rc;

use course_core::model::LessonRef;
use course_core::playback::{MediaEvent, PlaybackEvent, PlaybackState, SessionId};
use dioxus::document::eval;
use dioxus::prelude::*;
use services::VideoSession;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, trace};

use crate::context::AppContext;
use crate::vm::BridgeMessage;

pub use backend::EvalBackend;
pub use viewer::LessonViewer;

/// Component-scoped handle on the [`VideoSession`] of a course page.
#[derive(Clone, Copy, PartialEq)]
pub struct PlayerHandle {
    session: Signal<VideoSession<EvalBackend>>,
    /// Position to seek to once the opened lesson becomes ready.
    resume: Signal<Option<(LessonRef, f64)>>,
}

impl PlayerHandle {
    #[must_use]
    pub fn state(&self) -> PlaybackState {
        self.session.read().state().clone()
    }

    #[must_use]
    pub fn lesson(&self) -> Option<LessonRef> {
        self.session.read().lesson()
    }

    pub fn open(&mut self, lesson: LessonRef, raw_video: Option<&str>) {
        self.resume.set(None);
        self.session.write().open_lesson(lesson, raw_video);
    }

    pub fn close(&mut self) {
        self.resume.set(None);
        self.session.write().close();
    }

    pub fn dispatch(&mut self, event: PlaybackEvent) {
        self.session.write().dispatch(event);
        self.apply_resume();
    }

    /// Send the current position without closing the lesson.
    pub fn flush(&mut self) {
        self.session.write().flush();
    }

    pub fn media(&mut self, session: SessionId, event: MediaEvent) {
        self.session.write().media(session, event);
        self.apply_resume();
    }

    /// Remember where `lesson` was left off; ignored if another lesson is open.
    pub fn resume_at(&mut self, lesson: LessonRef, position: f64) {
        if self.lesson() == Some(lesson) {
            self.resume.set(Some((lesson, position)));
            self.apply_resume();
        }
    }

    fn apply_resume(&mut self) {
        let Some((lesson, position)) = *self.resume.peek() else {
            return;
        };
        let (ready, current) = {
            let session = self.session.peek();
            (session.state().video_ready(), session.lesson())
        };
        if current != Some(lesson) {
            self.resume.set(None);
            return;
        }
        if ready {
            self.resume.set(None);
            self.session.write().dispatch(PlaybackEvent::Seek(position));
        }
    }
}

/// Own a video session for the calling component and pump its events.
///
/// The session is closed (flushing progress) when the component unmounts.
pub fn use_video_player() -> PlayerHandle {
    let ctx = use_context::<AppContext>();
    let deferred: Rc<RefCell<Option<UnboundedReceiver<PlaybackEvent>>>> =
        use_hook(|| Rc::new(RefCell::new(None)));

    let session = use_signal({
        let deferred = Rc::clone(&deferred);
        move || {
            let (session, rx) = ctx.video_session(EvalBackend);
            *deferred.borrow_mut() = Some(rx);
            session
        }
    });
    let resume = use_signal(|| None);
    let handle = PlayerHandle { session, resume };

    use_hook(move || {
        let rx = deferred.borrow_mut().take();
        spawn(pump_player_events(handle, rx));
    });

    use_drop(move || {
        let mut session = handle.session;
        if let Ok(mut session) = session.try_write() {
            session.close();
        }
    });

    handle
}

async fn pump_player_events(
    mut player: PlayerHandle,
    mut deferred: Option<UnboundedReceiver<PlaybackEvent>>,
) {
    let mut bridge = eval(&scripts::player_bridge_script());
    let mut bridge_open = true;

    loop {
        tokio::select! {
            message = bridge.recv::<BridgeMessage>(), if bridge_open => match message {
                Ok(message) if message.is_page_hidden() => player.flush(),
                Ok(message) => match message.media_event() {
                    Some(event) => player.media(SessionId::from(message.session), event),
                    None => trace!(event = %message.event, "ignoring player event"),
                },
                Err(err) => {
                    debug!(error = ?err, "player bridge closed");
                    bridge_open = false;
                }
            },
            Some(event) = next_deferred(&mut deferred) => player.dispatch(event),
            else => break,
        }
    }
}

async fn next_deferred(
    rx: &mut Option<UnboundedReceiver<PlaybackEvent>>,
) -> Option<PlaybackEvent> {
    match rx {
        Some(rx) => rx.recv().await,
        None => None,
    }
}
