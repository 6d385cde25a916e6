use anyhow::Result;

mod memory;
mod sqlite;

pub use memory::MemoryTriggerStore;
pub use sqlite::SqliteTriggerStore;

/// Read side of the last-trigger history: when did a given window of a given
/// schedule last fire?
///
/// Storage read failures are not part of the scheduling contract;
/// implementations log them and report the trigger as absent.
pub trait LastTriggerLookup: Send + Sync {
    fn last_trigger_epoch_ms(&self, schedule_id: &str, window_id: u32) -> Option<i64>;
}

/// Write side of the last-trigger history. Recording overwrites any prior
/// value for the `(schedule_id, window_id)` pair.
pub trait TriggerRecorder: Send + Sync {
    fn record_trigger(&self, schedule_id: &str, window_id: u32, epoch_ms: i64) -> Result<()>;
}

/// A full trigger store: both lookup and recording.
pub trait TriggerStore: LastTriggerLookup + TriggerRecorder {}

impl<T: LastTriggerLookup + TriggerRecorder> TriggerStore for T {}
