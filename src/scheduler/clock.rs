use chrono::{Local, Timelike, Utc};

/// Time inputs for scheduling decisions. Injected so rollover and cooldown
/// edges can be pinned in tests.
pub trait ClockSource: Send + Sync {
    /// Seconds into the local day, `0..=86399`, from wall-clock
    /// hour/minute/second.
    fn time_of_day_seconds(&self) -> u32;

    fn epoch_millis(&self) -> i64;
}

/// The real local wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl ClockSource for SystemClock {
    fn time_of_day_seconds(&self) -> u32 {
        let now = Local::now();

        now.hour() * 3600 + now.minute() * 60 + now.second()
    }

    fn epoch_millis(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_clock_stays_within_a_day() {
        let clock = SystemClock;
        assert!(clock.time_of_day_seconds() < 86_400);
        assert!(clock.epoch_millis() > 0);
    }
}
