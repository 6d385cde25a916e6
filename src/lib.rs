//! Recurring daily alarm windows: time-of-day intervals that fire at most
//! once per repeat frequency, with rollover past midnight and per-window
//! trigger de-duplication. The scheduling math is pure over an injected
//! clock and trigger history; presentation and persistence sit behind the
//! collaborator traits.

pub mod models;
pub mod scheduler;
pub mod service;
pub mod settings;
pub mod store;

pub use models::{seconds_to_display_time, AlarmWindow};
pub use scheduler::{ClockSource, SystemClock};
pub use service::{AlarmService, AlertSink, LogAlertSink, NextWakeup};
pub use settings::{ScheduleSettings, ScheduleSettingsStore};
pub use store::{
    LastTriggerLookup, MemoryTriggerStore, SqliteTriggerStore, TriggerRecorder, TriggerStore,
};
