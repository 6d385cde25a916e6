pub mod controller;

pub use controller::{AlarmService, NextWakeup};

use anyhow::Result;
use log::info;

use crate::models::AlarmWindow;

/// Presentation side of an alert: notification, audio, vibration. The
/// scheduling core never owns these resources; the platform layer implements
/// this and is handed the winning window's presentation fields.
pub trait AlertSink: Send + Sync {
    fn present(&self, window: &AlarmWindow) -> Result<()>;
}

/// Sink that only writes to the log. Useful as a default and in headless
/// environments.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogAlertSink;

impl AlertSink for LogAlertSink {
    fn present(&self, window: &AlarmWindow) -> Result<()> {
        info!(
            "Alarm {} fired ({} - {})",
            window.id,
            window.start_time(),
            window.end_time()
        );

        if window.vibrate {
            info!(
                "Vibrating for alarm {} with pattern {:?}",
                window.id, window.vibrate_pattern
            );
        }

        if window.audio_playback_enabled() {
            info!(
                "Playing {} for alarm {} ({}s)",
                window.audio_file, window.id, window.playback_duration_seconds
            );
        }

        Ok(())
    }
}
