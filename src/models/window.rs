use serde::{Deserialize, Serialize};

pub const SECONDS_PER_DAY: i64 = 86_400;

/// Pattern handed to the presentation layer when `vibrate` is set:
/// delay/buzz pairs in milliseconds.
pub const DEFAULT_VIBRATE_PATTERN: [u64; 5] = [0, 200, 200, 450, 0];

fn default_vibrate_pattern() -> Vec<u64> {
    DEFAULT_VIBRATE_PATTERN.to_vec()
}

/// One recurring daily alarm window: an inclusive `[start, end]` time-of-day
/// interval (seconds into the day) during which the alarm may fire, at most
/// once per `repeat_frequency_seconds`.
///
/// Windows never wrap past midnight on their own; `start <= end` is assumed
/// and rollover to the next day is handled by the scheduling math. Equality
/// is by `id` alone.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlarmWindow {
    pub id: u32,
    pub start_seconds_in_day: u32,
    pub end_seconds_in_day: u32,
    pub active: bool,
    pub repeat_frequency_seconds: u32,
    #[serde(default)]
    pub vibrate: bool,
    #[serde(default = "default_vibrate_pattern")]
    pub vibrate_pattern: Vec<u64>,
    #[serde(default)]
    pub audio_file: String,
    #[serde(default)]
    pub playback_duration_seconds: u32,
}

impl Default for AlarmWindow {
    fn default() -> Self {
        Self {
            id: 0,
            start_seconds_in_day: 60 * 60 * 12,
            end_seconds_in_day: 60 * 60 * 12 + 60,
            active: false,
            repeat_frequency_seconds: 60 * 60 * 23,
            vibrate: false,
            vibrate_pattern: default_vibrate_pattern(),
            audio_file: String::new(),
            playback_duration_seconds: 0,
        }
    }
}

impl PartialEq for AlarmWindow {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for AlarmWindow {}

impl AlarmWindow {
    /// An active window with the given interval and repeat cadence;
    /// presentation fields keep their defaults.
    pub fn new(
        id: u32,
        start_seconds_in_day: u32,
        end_seconds_in_day: u32,
        repeat_frequency_seconds: u32,
    ) -> Self {
        Self {
            id,
            start_seconds_in_day,
            end_seconds_in_day,
            active: true,
            repeat_frequency_seconds,
            ..Self::default()
        }
    }

    pub fn audio_playback_enabled(&self) -> bool {
        !self.audio_file.is_empty()
    }

    pub fn start_hours_in_day(&self) -> u32 {
        self.start_seconds_in_day / (60 * 60)
    }

    pub fn start_minutes_in_day(&self) -> u32 {
        (self.start_seconds_in_day / 60) % 60
    }

    pub fn end_hours_in_day(&self) -> u32 {
        self.end_seconds_in_day / (60 * 60)
    }

    pub fn end_minutes_in_day(&self) -> u32 {
        (self.end_seconds_in_day / 60) % 60
    }

    pub fn start_time(&self) -> String {
        seconds_to_display_time(self.start_seconds_in_day)
    }

    pub fn end_time(&self) -> String {
        seconds_to_display_time(self.end_seconds_in_day)
    }

    /// True when the closed intervals of the two windows intersect.
    /// Symmetric. Used for configuration validation and UI, never for
    /// scheduling.
    pub fn overlaps(&self, another: &AlarmWindow) -> bool {
        let lower = self.start_seconds_in_day.max(another.start_seconds_in_day) as i64;
        let upper = self.end_seconds_in_day.min(another.end_seconds_in_day) as i64;

        upper - lower >= 0
    }

    /// Seconds from `current_time_of_day_seconds` until this window is next
    /// eligible to fire, given `seconds_since_last_trigger` elapsed since it
    /// last fired (0 when it never has).
    ///
    /// Eligible means the clock is inside `[start, end]` and at least
    /// `repeat_frequency_seconds` have elapsed since the last trigger. When
    /// the remaining cooldown would spill past today's window close, the
    /// window is unreachable until tomorrow's start.
    pub fn next_eligible_seconds(
        &self,
        current_time_of_day_seconds: u32,
        seconds_since_last_trigger: i64,
    ) -> i64 {
        let start = self.start_seconds_in_day as i64;
        let end = self.end_seconds_in_day as i64;
        let frequency = self.repeat_frequency_seconds as i64;
        let now = current_time_of_day_seconds as i64;

        if start <= now && now <= end {
            if seconds_since_last_trigger >= frequency {
                return 0;
            }

            let cooldown = frequency - seconds_since_last_trigger;

            if now + cooldown <= end {
                cooldown
            } else {
                SECONDS_PER_DAY - now + start
            }
        } else if now < start {
            start - now
        } else {
            SECONDS_PER_DAY - now + start
        }
    }
}

/// Formats a seconds-of-day value as a 12-hour clock string, e.g.
/// `43200` -> `"12:00 PM"`, `3661` -> `"1:01 AM"`.
pub fn seconds_to_display_time(seconds_in_day: u32) -> String {
    let hours = seconds_in_day / (60 * 60);
    let minutes = (seconds_in_day / 60) % 60;

    let display_hours = if hours % 12 == 0 { 12 } else { hours % 12 };
    let suffix = if hours < 12 { "AM" } else { "PM" };

    format!("{}:{:02} {}", display_hours, minutes, suffix)
}
