#![forbid(unsafe_code)]

pub mod keyboard;
pub mod model;
pub mod playback;
pub mod time;
pub mod video_source;

pub use time::Clock;
