use std::collections::HashMap;

use course_core::model::{
    Course, CourseId, CourseProgress, Lesson, LessonId, LessonRef, ProgressRecord, ProgressStatus,
};

use crate::vm::content_vm::lesson_text_html;
use crate::vm::time_fmt::{format_file_size, format_lesson_duration};

//
// ─── LISTING ───────────────────────────────────────────────────────────────────
//

#[derive(Clone, Debug, PartialEq)]
pub struct CourseCardVm {
    pub id: CourseId,
    pub title: String,
    pub summary: Option<String>,
    pub thumbnail: Option<String>,
    pub lessons_label: String,
    /// `None` when there is no signed-in customer.
    pub progress: Option<ProgressBarVm>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProgressBarVm {
    pub percent: u8,
    pub label: String,
}

impl ProgressBarVm {
    #[must_use]
    pub fn from_course(progress: &CourseProgress) -> Self {
        let percent = progress.percent.value();
        let label = if progress.total_lessons == 0 {
            format!("{percent}%")
        } else {
            format!(
                "{percent}% · {}/{} lessons",
                progress.completed_lessons, progress.total_lessons
            )
        };
        Self { percent, label }
    }
}

#[must_use]
pub fn map_course_card(course: &Course, progress: Option<&CourseProgress>) -> CourseCardVm {
    let count = course.lesson_count();
    CourseCardVm {
        id: course.id(),
        title: course.title().to_string(),
        summary: course.description().map(first_line).filter(|s| !s.is_empty()),
        thumbnail: course.thumbnail().map(str::to_string),
        lessons_label: if count == 1 {
            "1 lesson".to_string()
        } else {
            format!("{count} lessons")
        },
        progress: progress.map(ProgressBarVm::from_course),
    }
}

fn first_line(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or_default()
        .to_string()
}

//
// ─── DETAIL ────────────────────────────────────────────────────────────────────
//

#[derive(Clone, Debug, PartialEq)]
pub struct LessonRowVm {
    pub lesson: LessonRef,
    pub title: String,
    pub duration_label: Option<String>,
    pub has_video: bool,
    pub percent: u8,
    pub status_label: &'static str,
    pub completed: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ModuleVm {
    pub title: String,
    pub lessons: Vec<LessonRowVm>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CourseDetailVm {
    pub id: CourseId,
    pub title: String,
    pub description_html: Option<String>,
    pub modules: Vec<ModuleVm>,
    pub progress: Option<ProgressBarVm>,
}

#[must_use]
pub fn status_label(status: ProgressStatus) -> &'static str {
    match status {
        ProgressStatus::NotStarted => "Not started",
        ProgressStatus::InProgress => "In progress",
        ProgressStatus::Completed => "Completed",
    }
}

#[must_use]
pub fn map_course_detail(
    course: &Course,
    records: &[ProgressRecord],
    progress: Option<&CourseProgress>,
) -> CourseDetailVm {
    let by_lesson: HashMap<LessonId, &ProgressRecord> =
        records.iter().map(|r| (r.lesson_id, r)).collect();

    let modules = course
        .modules()
        .iter()
        .map(|module| ModuleVm {
            title: module.title().to_string(),
            lessons: module
                .lessons()
                .iter()
                .map(|lesson| lesson_row(course.id(), lesson, by_lesson.get(&lesson.id()).copied()))
                .collect(),
        })
        .collect();

    CourseDetailVm {
        id: course.id(),
        title: course.title().to_string(),
        description_html: course.description().and_then(lesson_text_html),
        modules,
        progress: progress.map(ProgressBarVm::from_course),
    }
}

fn lesson_row(course_id: CourseId, lesson: &Lesson, record: Option<&ProgressRecord>) -> LessonRowVm {
    let status = record.map_or(ProgressStatus::NotStarted, |r| r.status);
    LessonRowVm {
        lesson: LessonRef {
            course_id,
            module_id: lesson.module_id(),
            lesson_id: lesson.id(),
        },
        title: lesson.title().to_string(),
        duration_label: format_lesson_duration(lesson.duration()),
        has_video: lesson.video().is_some(),
        percent: record.map_or(0, |r| r.progress.value()),
        status_label: status_label(status),
        completed: status == ProgressStatus::Completed,
    }
}

//
// ─── LESSON VIEWER ─────────────────────────────────────────────────────────────
//

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LessonFileVm {
    pub name: String,
    pub url: String,
    pub size_label: Option<String>,
}

/// Everything the lesson viewer shows around the video surface.
#[derive(Clone, Debug, PartialEq)]
pub struct LessonViewerVm {
    pub lesson: LessonRef,
    pub title: String,
    pub module_title: String,
    pub video: Option<String>,
    pub description_html: Option<String>,
    pub content_html: Option<String>,
    pub files: Vec<LessonFileVm>,
    pub next: Option<LessonId>,
}

#[must_use]
pub fn map_lesson_viewer(course: &Course, lesson_id: LessonId) -> Option<LessonViewerVm> {
    let module = course
        .modules()
        .iter()
        .find(|m| m.lessons().iter().any(|l| l.id() == lesson_id))?;
    let lesson = module.lessons().iter().find(|l| l.id() == lesson_id)?;

    Some(LessonViewerVm {
        lesson: LessonRef {
            course_id: course.id(),
            module_id: module.id(),
            lesson_id,
        },
        title: lesson.title().to_string(),
        module_title: module.title().to_string(),
        video: lesson.video().map(str::to_string),
        description_html: lesson.description().and_then(lesson_text_html),
        content_html: lesson.content().and_then(lesson_text_html),
        files: lesson
            .downloadable_files()
            .map(|f| LessonFileVm {
                name: f.name.clone(),
                url: f.url.clone(),
                size_label: f.size.map(format_file_size),
            })
            .collect(),
        next: course.next_lesson(lesson_id).map(Lesson::id),
    })
}
