use course_core::model::LessonDuration;
use course_core::time::format_position;

#[must_use]
pub fn format_lesson_duration(duration: LessonDuration) -> Option<String> {
    duration
        .seconds()
        .map(|secs| format_position(f64::from(secs)))
}

/// `0:40 / 2:00`, or just the position while the duration is unknown.
#[must_use]
pub fn format_playhead(current_time: f64, duration: f64) -> String {
    if duration.is_finite() && duration > 0.0 {
        format!(
            "{} / {}",
            format_position(current_time),
            format_position(duration)
        )
    } else {
        format_position(current_time)
    }
}

#[must_use]
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    #[allow(clippy::cast_precision_loss)]
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}
