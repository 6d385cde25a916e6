pub mod window;

pub use window::{seconds_to_display_time, AlarmWindow, DEFAULT_VIBRATE_PATTERN, SECONDS_PER_DAY};
