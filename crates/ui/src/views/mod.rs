mod course;
mod home;
mod player;
mod state;

#[cfg(test)]
mod test_harness;
#[cfg(test)]
mod view_smoke;

pub use course::CourseView;
pub use home::HomeView;
pub use player::{EvalBackend, LessonViewer, PlayerHandle, use_video_player};
pub use state::{ViewError, ViewState, view_state_from_resource};
