use chrono::{DateTime, Duration, Utc};
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};

use crate::model::ids::{CourseId, LessonId, ModuleId, UserId};

/// Percentage at or above which a lesson counts as completed.
pub const COMPLETION_THRESHOLD: u8 = 90;

//
// ─── PERCENT ───────────────────────────────────────────────────────────────────
//

/// Integer share of a lesson video watched, always within `0..=100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
#[serde(transparent)]
pub struct ProgressPercent(u8);

impl ProgressPercent {
    pub const ZERO: Self = Self(0);
    pub const FULL: Self = Self(100);

    /// Clamp an arbitrary integer into a percentage.
    #[must_use]
    pub fn clamped(value: i64) -> Self {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        Self(value.clamp(0, 100) as u8)
    }

    #[must_use]
    pub fn value(self) -> u8 {
        self.0
    }

    /// Ten-percent bucket this value falls into (`0..=10`).
    #[must_use]
    pub fn bucket(self) -> u8 {
        self.0 / 10
    }
}

impl<'de> Deserialize<'de> for ProgressPercent {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = f64::deserialize(deserializer)?;
        if !raw.is_finite() {
            return Err(de::Error::custom("progress must be a finite number"));
        }
        #[allow(clippy::cast_possible_truncation)]
        Ok(Self::clamped(raw.floor() as i64))
    }
}

/// `floor(current / duration * 100)`, or `None` when the duration is unusable.
///
/// A zero, negative or NaN duration yields `None`: no report is sent for it.
#[must_use]
pub fn percentage(current_time: f64, duration: f64) -> Option<ProgressPercent> {
    if !duration.is_finite() || duration <= 0.0 || current_time.is_nan() {
        return None;
    }
    let ratio = (current_time / duration * 100.0).floor();
    #[allow(clippy::cast_possible_truncation)]
    Some(ProgressPercent::clamped(ratio as i64))
}

//
// ─── STATUS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressStatus {
    NotStarted,
    InProgress,
    Completed,
}

impl ProgressStatus {
    /// Status derived from a watched percentage.
    #[must_use]
    pub fn derived(percent: ProgressPercent) -> Self {
        if percent.value() >= COMPLETION_THRESHOLD {
            Self::Completed
        } else {
            Self::InProgress
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotStarted => "not_started",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
        }
    }

    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "not_started" => Some(Self::NotStarted),
            "in_progress" => Some(Self::InProgress),
            "completed" => Some(Self::Completed),
            _ => None,
        }
    }
}

/// What triggered a progress report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    /// Continuous time updates while playing.
    Periodic,
    /// The viewer paused playback.
    Pause,
    /// Last report of a session, sent when the viewer closes or switches lesson.
    Flush,
}

impl ReportKind {
    /// Pause and flush reports bypass throttling.
    #[must_use]
    pub fn is_forced(self) -> bool {
        !matches!(self, Self::Periodic)
    }
}

/// Status reported at pause time.
///
/// The storefront has always sent `not_started` from its pause handler while
/// time updates send the derived status. `Legacy` keeps that behaviour until
/// the product decides otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PauseStatusPolicy {
    #[default]
    Legacy,
    Derived,
}

impl PauseStatusPolicy {
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "legacy" | "not_started" => Some(Self::Legacy),
            "derived" => Some(Self::Derived),
            _ => None,
        }
    }

    #[must_use]
    pub fn status_for(self, kind: ReportKind, percent: ProgressPercent) -> ProgressStatus {
        match (kind, self) {
            (ReportKind::Pause, Self::Legacy) => ProgressStatus::NotStarted,
            _ => ProgressStatus::derived(percent),
        }
    }
}

//
// ─── RECORD ────────────────────────────────────────────────────────────────────
//

/// Where a lesson sits in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LessonRef {
    pub course_id: CourseId,
    pub module_id: ModuleId,
    pub lesson_id: LessonId,
}

/// Progress upserted to the course backend, keyed by `(user_id, lesson_id)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressRecord {
    pub user_id: UserId,
    pub lesson_id: LessonId,
    pub course_id: CourseId,
    pub module_id: ModuleId,
    pub status: ProgressStatus,
    pub progress: ProgressPercent,
    #[serde(
        serialize_with = "position_as_fixed",
        deserialize_with = "position_from_any"
    )]
    pub last_position: f64,
}

impl ProgressRecord {
    /// Build a report from a playback sample.
    ///
    /// Returns `None` when the duration is unusable.
    #[must_use]
    pub fn from_sample(
        user_id: UserId,
        lesson: LessonRef,
        kind: ReportKind,
        policy: PauseStatusPolicy,
        current_time: f64,
        duration: f64,
    ) -> Option<Self> {
        let progress = percentage(current_time, duration)?;
        Some(Self {
            user_id,
            lesson_id: lesson.lesson_id,
            course_id: lesson.course_id,
            module_id: lesson.module_id,
            status: policy.status_for(kind, progress),
            progress,
            last_position: round_position(current_time.max(0.0)),
        })
    }

    #[must_use]
    pub fn lesson_ref(&self) -> LessonRef {
        LessonRef {
            course_id: self.course_id,
            module_id: self.module_id,
            lesson_id: self.lesson_id,
        }
    }
}

fn round_position(secs: f64) -> f64 {
    (secs * 100.0).round() / 100.0
}

fn position_as_fixed<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format!("{value:.2}"))
}

fn position_from_any<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Num(f64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Num(n) => Ok(n),
        Raw::Text(s) => s.trim().parse::<f64>().map_err(de::Error::custom),
    }
}

//
// ─── THROTTLE ──────────────────────────────────────────────────────────────────
//

/// Decides which periodic samples are worth a network call.
///
/// A periodic sample goes out when nothing was sent yet, when `min_interval`
/// has passed since the last send, or when the percentage enters a new
/// ten-percent bucket or reaches the completion threshold. Forced kinds always
/// go out.
#[derive(Debug, Clone)]
pub struct ReportThrottle {
    min_interval: Duration,
    last: Option<(DateTime<Utc>, ProgressPercent)>,
}

impl ReportThrottle {
    #[must_use]
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last: None,
        }
    }

    #[must_use]
    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    #[must_use]
    pub fn should_send(&self, kind: ReportKind, percent: ProgressPercent, now: DateTime<Utc>) -> bool {
        if kind.is_forced() {
            return true;
        }
        let Some((at, last)) = self.last else {
            return true;
        };
        if now - at >= self.min_interval {
            return true;
        }
        if percent.bucket() != last.bucket() {
            return true;
        }
        last.value() < COMPLETION_THRESHOLD && percent.value() >= COMPLETION_THRESHOLD
    }

    pub fn mark_sent(&mut self, percent: ProgressPercent, now: DateTime<Utc>) {
        self.last = Some((now, percent));
    }
}

impl Default for ReportThrottle {
    fn default() -> Self {
        Self::new(Duration::seconds(5))
    }
}

//
// ─── COURSE AGGREGATE ──────────────────────────────────────────────────────────
//

/// Course-level progress used for listing progress bars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseProgress {
    pub course_id: CourseId,
    #[serde(default)]
    pub total_lessons: u32,
    #[serde(default)]
    pub completed_lessons: u32,
    #[serde(default)]
    pub percent: ProgressPercent,
}

impl CourseProgress {
    /// Aggregate per-lesson records; lessons without a record count as 0 %.
    #[must_use]
    pub fn from_records<'a>(
        course_id: CourseId,
        total_lessons: u32,
        records: impl IntoIterator<Item = &'a ProgressRecord>,
    ) -> Self {
        let mut completed = 0_u32;
        let mut sum = 0_i64;
        for record in records {
            if record.course_id != course_id {
                continue;
            }
            if record.status == ProgressStatus::Completed {
                completed = completed.saturating_add(1);
            }
            sum += i64::from(record.progress.value());
        }
        let percent = if total_lessons == 0 {
            ProgressPercent::ZERO
        } else {
            ProgressPercent::clamped(sum / i64::from(total_lessons))
        };
        Self {
            course_id,
            total_lessons,
            completed_lessons: completed.min(total_lessons),
            percent,
        }
    }
}
