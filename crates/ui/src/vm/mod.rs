mod content_vm;
mod course_vm;
mod player_vm;
mod time_fmt;

pub use content_vm::{lesson_text_html, markdown_to_html, sanitize_html};
pub use course_vm::{
    CourseCardVm, CourseDetailVm, LessonFileVm, LessonRowVm, LessonViewerVm, ModuleVm,
    ProgressBarVm, map_course_card, map_course_detail, map_lesson_viewer, status_label,
};
pub use player_vm::{BridgeMessage, PlayerOverlay, PlayerVm};
pub use time_fmt::{format_file_size, format_lesson_duration, format_playhead};
