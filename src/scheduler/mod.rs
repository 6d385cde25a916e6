pub mod clock;
pub mod selection;

pub use clock::{ClockSource, SystemClock};
pub use selection::{
    currently_eligible_window, next_eligible_window, next_eligible_window_seconds_from_now,
    record_trigger, seconds_since_last_trigger,
};
