use anyhow::{bail, Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, sync::RwLock};

use crate::models::AlarmWindow;

/// Persisted configuration for one schedule: the service enable flag and the
/// alarm window set the caller edits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleSettings {
    pub enabled: bool,
    pub windows: Vec<AlarmWindow>,
}

impl Default for ScheduleSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            windows: Vec::new(),
        }
    }
}

/// JSON-file settings store. Window validation happens here, at edit time;
/// the scheduler itself assumes well-formed input.
pub struct ScheduleSettingsStore {
    path: PathBuf,
    data: RwLock<ScheduleSettings>,
}

impl ScheduleSettingsStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_default()
        } else {
            ScheduleSettings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn schedule(&self) -> ScheduleSettings {
        self.data.read().unwrap().clone()
    }

    pub fn enabled(&self) -> bool {
        self.data.read().unwrap().enabled
    }

    pub fn set_enabled(&self, enabled: bool) -> Result<()> {
        let mut guard = self.data.write().unwrap();
        guard.enabled = enabled;
        self.persist(&guard)
    }

    /// Replaces the window set after validating it.
    pub fn update_windows(&self, windows: Vec<AlarmWindow>) -> Result<()> {
        validate_windows(&windows)?;

        let mut guard = self.data.write().unwrap();
        guard.windows = windows;
        self.persist(&guard)
    }

    pub fn reload(&self) -> Result<()> {
        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read settings from {}", self.path.display()))?;
        let data: ScheduleSettings = serde_json::from_str(&contents)?;
        let mut guard = self.data.write().unwrap();
        *guard = data;
        Ok(())
    }

    fn persist(&self, data: &ScheduleSettings) -> Result<()> {
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }
}

/// Edit-time window validation: seconds-in-day bounds, interval direction,
/// unique ids. Overlapping active windows are legal but usually a
/// configuration mistake, so they only warn.
pub fn validate_windows(windows: &[AlarmWindow]) -> Result<()> {
    for window in windows {
        if window.start_seconds_in_day >= 86_400 || window.end_seconds_in_day >= 86_400 {
            bail!(
                "alarm {}: seconds-in-day out of range (start {}, end {})",
                window.id,
                window.start_seconds_in_day,
                window.end_seconds_in_day
            );
        }

        if window.end_seconds_in_day < window.start_seconds_in_day {
            bail!(
                "alarm {}: window ends ({}) before it starts ({})",
                window.id,
                window.end_seconds_in_day,
                window.start_seconds_in_day
            );
        }
    }

    for (index, window) in windows.iter().enumerate() {
        if windows[..index].iter().any(|other| other.id == window.id) {
            bail!("alarm id {} appears more than once", window.id);
        }
    }

    for (index, window) in windows.iter().enumerate() {
        for other in &windows[index + 1..] {
            if window.active && other.active && window.overlaps(other) {
                warn!(
                    "Alarms {} and {} have overlapping windows ({} - {} vs {} - {})",
                    window.id,
                    other.id,
                    window.start_time(),
                    window.end_time(),
                    other.start_time(),
                    other.end_time()
                );
            }
        }
    }

    Ok(())
}
