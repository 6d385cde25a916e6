use std::sync::Arc;

use anyhow::Result;
use log::info;

use dailywake::{
    AlarmService, AlarmWindow, LogAlertSink, ScheduleSettingsStore, SqliteTriggerStore,
    SystemClock,
};

const SCHEDULE_ID: &str = "sample";

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    info!("dailywake sample starting up...");

    let data_dir = std::env::temp_dir().join("dailywake-sample");
    std::fs::create_dir_all(&data_dir)?;

    let settings = ScheduleSettingsStore::new(data_dir.join("schedule.json"))?;
    if settings.schedule().windows.is_empty() {
        settings.update_windows(sample_windows())?;
        settings.set_enabled(true)?;
    }

    if !settings.enabled() {
        info!("Schedule disabled. Nothing to do.");
        return Ok(());
    }

    let triggers = Arc::new(SqliteTriggerStore::open(data_dir.join("triggers.sqlite3"))?);

    let service = AlarmService::new(
        SCHEDULE_ID,
        settings.schedule().windows,
        triggers,
        Arc::new(SystemClock),
        Arc::new(LogAlertSink),
    );

    if let Some(next) = service.next_wakeup().await {
        info!(
            "Next alarm: {} ({} - {}) in {} seconds",
            next.window.id,
            next.window.start_time(),
            next.window.end_time(),
            next.seconds_from_now
        );
    }

    service.start().await;

    tokio::signal::ctrl_c().await?;
    info!("Shutting down...");
    service.stop().await?;

    Ok(())
}

fn sample_windows() -> Vec<AlarmWindow> {
    vec![
        // Morning stretch reminder, at most once an hour.
        AlarmWindow {
            vibrate: true,
            ..AlarmWindow::new(0, 8 * 3600, 10 * 3600, 3600)
        },
        // Evening wind-down chime.
        AlarmWindow {
            audio_file: "chime.ogg".into(),
            playback_duration_seconds: 10,
            ..AlarmWindow::new(1, 21 * 3600, 22 * 3600, 20 * 3600)
        },
    ]
}
