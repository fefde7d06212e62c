use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{CourseId, LessonId, ModuleId};
use crate::model::lesson::Lesson;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CourseError {
    #[error("course title cannot be empty")]
    EmptyCourseTitle,

    #[error("module title cannot be empty")]
    EmptyModuleTitle,

    #[error("lesson title cannot be empty")]
    EmptyLessonTitle,

    #[error("lesson {lesson:?} belongs to {actual:?}, not {expected:?}")]
    ForeignLesson {
        lesson: LessonId,
        expected: ModuleId,
        actual: ModuleId,
    },
}

/// Ordered grouping of lessons inside a course.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Module {
    id: ModuleId,
    course_id: CourseId,
    title: String,
    #[serde(default)]
    order: u32,
    #[serde(default)]
    lessons: Vec<Lesson>,
}

impl Module {
    /// Build a module, sorting its lessons by `order`.
    ///
    /// # Errors
    ///
    /// Returns `CourseError` if the title is blank or a lesson points at a
    /// different module.
    pub fn new(
        id: ModuleId,
        course_id: CourseId,
        title: impl Into<String>,
        order: u32,
        lessons: Vec<Lesson>,
    ) -> Result<Self, CourseError> {
        let module = Self {
            id,
            course_id,
            title: title.into(),
            order,
            lessons,
        };
        module.validated()
    }

    fn validated(mut self) -> Result<Self, CourseError> {
        if self.title.trim().is_empty() {
            return Err(CourseError::EmptyModuleTitle);
        }
        for lesson in &self.lessons {
            if lesson.title().trim().is_empty() {
                return Err(CourseError::EmptyLessonTitle);
            }
            if lesson.module_id() != self.id {
                return Err(CourseError::ForeignLesson {
                    lesson: lesson.id(),
                    expected: self.id,
                    actual: lesson.module_id(),
                });
            }
        }
        self.lessons.sort_by_key(|l| (l.order(), l.id()));
        Ok(self)
    }

    #[must_use]
    pub fn id(&self) -> ModuleId {
        self.id
    }

    #[must_use]
    pub fn course_id(&self) -> CourseId {
        self.course_id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn order(&self) -> u32 {
        self.order
    }

    #[must_use]
    pub fn lessons(&self) -> &[Lesson] {
        &self.lessons
    }
}

/// A course as served by the storefront API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    id: CourseId,
    title: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    thumbnail: Option<String>,
    #[serde(default)]
    modules: Vec<Module>,
}

impl Course {
    /// Build a course, sorting modules (and their lessons) by `order`.
    ///
    /// # Errors
    ///
    /// Returns `CourseError` if any title is blank.
    pub fn new(
        id: CourseId,
        title: impl Into<String>,
        description: Option<String>,
        modules: Vec<Module>,
    ) -> Result<Self, CourseError> {
        Self {
            id,
            title: title.into(),
            description,
            thumbnail: None,
            modules,
        }
        .validated()
    }

    /// Re-check invariants on a value that came off the wire or out of storage.
    ///
    /// # Errors
    ///
    /// Returns `CourseError` if any title is blank or a lesson is misplaced.
    pub fn validated(mut self) -> Result<Self, CourseError> {
        if self.title.trim().is_empty() {
            return Err(CourseError::EmptyCourseTitle);
        }
        self.modules = self
            .modules
            .into_iter()
            .map(Module::validated)
            .collect::<Result<_, _>>()?;
        self.modules.sort_by_key(|m| (m.order(), m.id()));
        Ok(self)
    }

    #[must_use]
    pub fn with_thumbnail(mut self, thumbnail: impl Into<String>) -> Self {
        self.thumbnail = Some(thumbnail.into());
        self
    }

    #[must_use]
    pub fn id(&self) -> CourseId {
        self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    #[must_use]
    pub fn thumbnail(&self) -> Option<&str> {
        self.thumbnail.as_deref()
    }

    #[must_use]
    pub fn modules(&self) -> &[Module] {
        &self.modules
    }

    /// All lessons in play order.
    pub fn lessons(&self) -> impl Iterator<Item = &Lesson> {
        self.modules.iter().flat_map(|m| m.lessons.iter())
    }

    #[must_use]
    pub fn lesson_count(&self) -> usize {
        self.modules.iter().map(|m| m.lessons.len()).sum()
    }

    #[must_use]
    pub fn find_lesson(&self, id: LessonId) -> Option<&Lesson> {
        self.lessons().find(|l| l.id() == id)
    }

    /// The lesson that follows `id` in play order, crossing module boundaries.
    #[must_use]
    pub fn next_lesson(&self, id: LessonId) -> Option<&Lesson> {
        let mut iter = self.lessons().skip_while(|l| l.id() != id);
        iter.next()?;
        iter.next()
    }
}
