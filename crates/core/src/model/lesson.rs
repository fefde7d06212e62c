use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

use crate::model::ids::{LessonId, ModuleId};

//
// ─── DURATION ──────────────────────────────────────────────────────────────────
//

/// Length of a lesson video as stored by the course backend.
///
/// The backend stores either a number of seconds or a `mm:ss` / `hh:mm:ss`
/// string. Anything else is treated as unknown rather than rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LessonDuration {
    Seconds(u32),
    #[default]
    Unknown,
}

impl LessonDuration {
    /// Parse a clock-style (`mm:ss`, `hh:mm:ss`) or plain-seconds string.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.is_empty() {
            return Self::Unknown;
        }
        if let Ok(secs) = raw.parse::<f64>() {
            return Self::from_secs_f64(secs);
        }

        let parts: Vec<&str> = raw.split(':').collect();
        if !(2..=3).contains(&parts.len()) {
            return Self::Unknown;
        }
        let mut total: u32 = 0;
        for (idx, part) in parts.iter().enumerate() {
            let Ok(value) = part.trim().parse::<u32>() else {
                return Self::Unknown;
            };
            // Every field after the leading one is base-60.
            if idx > 0 && value >= 60 {
                return Self::Unknown;
            }
            total = match total.checked_mul(60).and_then(|t| t.checked_add(value)) {
                Some(t) => t,
                None => return Self::Unknown,
            };
        }
        Self::Seconds(total)
    }

    #[must_use]
    pub fn from_secs_f64(secs: f64) -> Self {
        if !secs.is_finite() || secs <= 0.0 || secs > f64::from(u32::MAX) {
            return Self::Unknown;
        }
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let whole = secs.round() as u32;
        if whole == 0 {
            Self::Unknown
        } else {
            Self::Seconds(whole)
        }
    }

    #[must_use]
    pub fn seconds(self) -> Option<u32> {
        match self {
            Self::Seconds(s) => Some(s),
            Self::Unknown => None,
        }
    }
}

impl Serialize for LessonDuration {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Seconds(s) => serializer.serialize_u32(*s),
            Self::Unknown => serializer.serialize_none(),
        }
    }
}

impl<'de> Deserialize<'de> for LessonDuration {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct DurationVisitor;

        impl<'de> Visitor<'de> for DurationVisitor {
            type Value = LessonDuration;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("seconds or a mm:ss string")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
                Ok(u32::try_from(v)
                    .ok()
                    .filter(|s| *s > 0)
                    .map_or(LessonDuration::Unknown, LessonDuration::Seconds))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
                Ok(u64::try_from(v).map_or(LessonDuration::Unknown, |v| {
                    u32::try_from(v)
                        .ok()
                        .filter(|s| *s > 0)
                        .map_or(LessonDuration::Unknown, LessonDuration::Seconds)
                }))
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
                Ok(LessonDuration::from_secs_f64(v))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                Ok(LessonDuration::parse(v))
            }

            fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
                Ok(LessonDuration::Unknown)
            }

            fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
                Ok(LessonDuration::Unknown)
            }

            fn visit_some<D: Deserializer<'de>>(self, d: D) -> Result<Self::Value, D::Error> {
                d.deserialize_any(self)
            }
        }

        deserializer.deserialize_any(DurationVisitor)
    }
}

//
// ─── FILES ─────────────────────────────────────────────────────────────────────
//

/// Supplementary file attached to a lesson.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonFile {
    pub url: String,
    pub name: String,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub is_downloadable: bool,
}

//
// ─── LESSON ────────────────────────────────────────────────────────────────────
//

/// A single playable unit of a module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lesson {
    id: LessonId,
    module_id: ModuleId,
    title: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    order: u32,
    #[serde(default)]
    duration: LessonDuration,
    #[serde(default, rename = "videoUrl", deserialize_with = "blank_as_none")]
    video: Option<String>,
    #[serde(default)]
    files: Vec<LessonFile>,
    #[serde(default)]
    thumbnail: Option<String>,
}

fn blank_as_none<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    let raw = Option::<String>::deserialize(d)?;
    Ok(raw.filter(|s| !s.trim().is_empty()))
}

impl Lesson {
    #[must_use]
    pub fn new(id: LessonId, module_id: ModuleId, title: impl Into<String>, order: u32) -> Self {
        Self {
            id,
            module_id,
            title: title.into(),
            description: None,
            content: None,
            order,
            duration: LessonDuration::Unknown,
            video: None,
            files: Vec::new(),
            thumbnail: None,
        }
    }

    #[must_use]
    pub fn with_video(mut self, raw: impl Into<String>) -> Self {
        let raw = raw.into();
        self.video = (!raw.trim().is_empty()).then_some(raw);
        self
    }

    #[must_use]
    pub fn with_duration(mut self, duration: LessonDuration) -> Self {
        self.duration = duration;
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn with_files(mut self, files: Vec<LessonFile>) -> Self {
        self.files = files;
        self
    }

    #[must_use]
    pub fn id(&self) -> LessonId {
        self.id
    }

    #[must_use]
    pub fn module_id(&self) -> ModuleId {
        self.module_id
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
    pub fn content(&self) -> Option<&str> {
        self.content.as_deref()
    }

    #[must_use]
    pub fn order(&self) -> u32 {
        self.order
    }

    #[must_use]
    pub fn duration(&self) -> LessonDuration {
        self.duration
    }

    /// Raw video reference: a direct URL or a signed token.
    #[must_use]
    pub fn video(&self) -> Option<&str> {
        self.video.as_deref()
    }

    #[must_use]
    pub fn files(&self) -> &[LessonFile] {
        &self.files
    }

    /// Files the customer is allowed to download.
    pub fn downloadable_files(&self) -> impl Iterator<Item = &LessonFile> {
        self.files.iter().filter(|f| f.is_downloadable)
    }

    #[must_use]
    pub fn thumbnail(&self) -> Option<&str> {
        self.thumbnail.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_clock_durations() {
        assert_eq!(LessonDuration::parse("02:30"), LessonDuration::Seconds(150));
        assert_eq!(LessonDuration::parse("1:02:03"), LessonDuration::Seconds(3723));
        assert_eq!(LessonDuration::parse("95"), LessonDuration::Seconds(95));
        assert_eq!(LessonDuration::parse("1:75"), LessonDuration::Unknown);
        assert_eq!(LessonDuration::parse("abc"), LessonDuration::Unknown);
        assert_eq!(LessonDuration::parse(""), LessonDuration::Unknown);
    }

    #[test]
    fn deserializes_backend_lesson() {
        let json = r#"{
            "id": 11,
            "moduleId": 3,
            "title": "Intro",
            "order": 2,
            "duration": "03:05",
            "videoUrl": "https://cdn.example.com/v/intro.m3u8",
            "files": [
                {"url": "https://cdn.example.com/f.pdf", "name": "Slides", "size": 2048, "isDownloadable": true},
                {"url": "https://cdn.example.com/g.pdf", "name": "Notes"}
            ]
        }"#;
        let lesson: Lesson = serde_json::from_str(json).unwrap();
        assert_eq!(lesson.id(), LessonId::new(11));
        assert_eq!(lesson.duration().seconds(), Some(185));
        assert_eq!(lesson.video(), Some("https://cdn.example.com/v/intro.m3u8"));
        assert_eq!(lesson.downloadable_files().count(), 1);
    }

    #[test]
    fn blank_or_null_video_is_none() {
        let json = r#"{"id": 1, "moduleId": 1, "title": "T", "videoUrl": null, "duration": 120}"#;
        let lesson: Lesson = serde_json::from_str(json).unwrap();
        assert_eq!(lesson.video(), None);
        assert_eq!(lesson.duration(), LessonDuration::Seconds(120));

        let json = r#"{"id": 1, "moduleId": 1, "title": "T", "videoUrl": "  "}"#;
        let lesson: Lesson = serde_json::from_str(json).unwrap();
        assert_eq!(lesson.video(), None);
        assert_eq!(lesson.duration(), LessonDuration::Unknown);
    }
}
