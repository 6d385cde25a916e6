use std::collections::HashMap;
use std::sync::RwLock;

use anyhow::Result;

use super::{LastTriggerLookup, TriggerRecorder};

/// In-memory trigger history, keyed by `(schedule_id, window_id)`. Useful for
/// tests and for embedders that persist trigger state elsewhere.
#[derive(Debug, Default)]
pub struct MemoryTriggerStore {
    data: RwLock<HashMap<(String, u32), i64>>,
}

impl MemoryTriggerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops every recorded trigger for the given schedule.
    pub fn clear_schedule(&self, schedule_id: &str) {
        self.data
            .write()
            .unwrap()
            .retain(|(schedule, _), _| schedule != schedule_id);
    }
}

impl LastTriggerLookup for MemoryTriggerStore {
    fn last_trigger_epoch_ms(&self, schedule_id: &str, window_id: u32) -> Option<i64> {
        self.data
            .read()
            .unwrap()
            .get(&(schedule_id.to_string(), window_id))
            .copied()
    }
}

impl TriggerRecorder for MemoryTriggerStore {
    fn record_trigger(&self, schedule_id: &str, window_id: u32, epoch_ms: i64) -> Result<()> {
        self.data
            .write()
            .unwrap()
            .insert((schedule_id.to_string(), window_id), epoch_ms);
        Ok(())
    }
}
