mod course;
mod ids;
mod lesson;
pub mod progress;

pub use ids::{CourseId, LessonId, ModuleId, ParseIdError, UserId};

pub use course::{Course, CourseError, Module};
pub use lesson::{Lesson, LessonDuration, LessonFile};
pub use progress::{
    COMPLETION_THRESHOLD, CourseProgress, LessonRef, PauseStatusPolicy, ProgressPercent,
    ProgressRecord, ProgressStatus, ReportKind, ReportThrottle, percentage,
};
