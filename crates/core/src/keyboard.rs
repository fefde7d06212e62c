use crate::playback::SEEK_STEP_SECS;

/// Transport intents the viewer can issue, either from buttons or shortcuts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlayerCommand {
    TogglePlayPause,
    ToggleFullscreen,
    /// Leave fullscreen if active, otherwise close the viewer.
    Escape,
    SeekBy(f64),
}

/// Map a DOM `KeyboardEvent.key` value to a player command.
///
/// Shortcuts are only meaningful while the viewer is open; callers must not
/// route keys here otherwise.
#[must_use]
pub fn command_for_key(key: &str) -> Option<PlayerCommand> {
    match key {
        " " | "Spacebar" => Some(PlayerCommand::TogglePlayPause),
        "f" | "F" => Some(PlayerCommand::ToggleFullscreen),
        "Escape" | "Esc" => Some(PlayerCommand::Escape),
        "ArrowLeft" | "Left" => Some(PlayerCommand::SeekBy(-SEEK_STEP_SECS)),
        "ArrowRight" | "Right" => Some(PlayerCommand::SeekBy(SEEK_STEP_SECS)),
        _ => None,
    }
}
