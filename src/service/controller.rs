use std::sync::Arc;

use anyhow::{Context, Result};
use log::{debug, error, info};
use tokio::{
    sync::Mutex,
    task::JoinHandle,
    time::{self, Duration},
};
use tokio_util::sync::CancellationToken;

use crate::models::AlarmWindow;
use crate::scheduler::{selection, ClockSource};
use crate::store::TriggerStore;

use super::AlertSink;

/// The winning window of a scheduling decision and how far away it is.
#[derive(Debug, Clone)]
pub struct NextWakeup {
    pub window: AlarmWindow,
    pub seconds_from_now: i64,
}

/// Drives one schedule's alarm set: evaluates eligibility, presents alerts
/// through the injected sink, records triggers, and arms the next wake-up.
///
/// One instance owns one schedule id. Each evaluation (read elapsed, decide,
/// present, record) runs under a single mutex so two concurrent wake-ups can
/// never both decide to fire for the same instant.
#[derive(Clone)]
pub struct AlarmService {
    schedule_id: Arc<String>,
    windows: Arc<Mutex<Vec<AlarmWindow>>>,
    triggers: Arc<dyn TriggerStore>,
    clock: Arc<dyn ClockSource>,
    sink: Arc<dyn AlertSink>,
    eval_gate: Arc<Mutex<()>>,
    worker: Arc<Mutex<Option<(JoinHandle<()>, CancellationToken)>>>,
}

impl AlarmService {
    pub fn new(
        schedule_id: impl Into<String>,
        windows: Vec<AlarmWindow>,
        triggers: Arc<dyn TriggerStore>,
        clock: Arc<dyn ClockSource>,
        sink: Arc<dyn AlertSink>,
    ) -> Self {
        Self {
            schedule_id: Arc::new(schedule_id.into()),
            windows: Arc::new(Mutex::new(windows)),
            triggers,
            clock,
            sink,
            eval_gate: Arc::new(Mutex::new(())),
            worker: Arc::new(Mutex::new(None)),
        }
    }

    pub fn schedule_id(&self) -> &str {
        &self.schedule_id
    }

    /// Replaces the alarm set. A running wake loop keeps its already-armed
    /// delay; call `restart` to rearm against the new set.
    pub async fn update_windows(&self, windows: Vec<AlarmWindow>) {
        *self.windows.lock().await = windows;
    }

    /// The next window to schedule and its delay, without side effects.
    /// `None` when the set has no active windows.
    pub async fn next_wakeup(&self) -> Option<NextWakeup> {
        let windows = self.windows.lock().await.clone();
        let time_of_day = self.clock.time_of_day_seconds();
        let now_ms = self.clock.epoch_millis();

        let window = selection::next_eligible_window(
            &windows,
            &self.schedule_id,
            time_of_day,
            now_ms,
            self.triggers.as_ref(),
        )?
        .clone();

        let elapsed = selection::seconds_since_last_trigger(
            self.triggers.as_ref(),
            &self.schedule_id,
            &window,
            now_ms,
        );
        let seconds_from_now = window.next_eligible_seconds(time_of_day, elapsed);

        Some(NextWakeup {
            window,
            seconds_from_now,
        })
    }

    /// One wake-up evaluation: present and record the currently eligible
    /// window if there is one, then return the delay until the next
    /// occurrence (`None` when there are no active windows).
    ///
    /// A failing sink aborts the evaluation without recording a trigger;
    /// the alert was not presented, so the cooldown must not engage.
    pub async fn run_once(&self) -> Result<Option<i64>> {
        let _gate = self.eval_gate.lock().await;

        let windows = self.windows.lock().await.clone();
        let time_of_day = self.clock.time_of_day_seconds();
        let now_ms = self.clock.epoch_millis();

        if let Some(current) = selection::currently_eligible_window(
            &windows,
            &self.schedule_id,
            time_of_day,
            now_ms,
            self.triggers.as_ref(),
        ) {
            info!(
                "Schedule {}: alarm {} eligible. Presenting...",
                self.schedule_id, current.id
            );

            self.sink
                .present(current)
                .with_context(|| format!("alert sink failed for alarm {}", current.id))?;

            selection::record_trigger(
                self.triggers.as_ref(),
                &self.schedule_id,
                current,
                now_ms,
            )?;
        } else {
            debug!("Schedule {}: no eligible alarm", self.schedule_id);
        }

        let next = selection::next_eligible_window_seconds_from_now(
            &windows,
            &self.schedule_id,
            time_of_day,
            now_ms,
            self.triggers.as_ref(),
        );

        if let Some(seconds) = next {
            info!(
                "Schedule {}: next wake-up in {} seconds",
                self.schedule_id, seconds
            );
        }

        Ok(next)
    }

    /// Spawns the wake loop, replacing any loop already running for this
    /// service. Each iteration evaluates once and sleeps until the computed
    /// delay elapses or the loop is cancelled.
    pub async fn start(&self) {
        let mut guard = self.worker.lock().await;
        if let Some((handle, token)) = guard.take() {
            token.cancel();
            handle.abort();
        }

        let token = CancellationToken::new();
        let loop_token = token.clone();
        let service = self.clone();

        let handle = tokio::spawn(async move {
            loop {
                let delay = match service.run_once().await {
                    Ok(Some(seconds)) => seconds.max(0) as u64,
                    Ok(None) => {
                        info!(
                            "Schedule {}: no active windows, wake loop stopping",
                            service.schedule_id
                        );
                        break;
                    }
                    Err(err) => {
                        error!(
                            "Schedule {}: evaluation failed, wake loop stopping: {err:?}",
                            service.schedule_id
                        );
                        break;
                    }
                };

                tokio::select! {
                    _ = time::sleep(Duration::from_secs(delay)) => {}
                    _ = loop_token.cancelled() => {
                        debug!("Schedule {}: wake loop shutting down", service.schedule_id);
                        break;
                    }
                }
            }
        });

        *guard = Some((handle, token));
    }

    /// Cancels the wake loop and waits for it to finish. A no-op when the
    /// loop is not running.
    pub async fn stop(&self) -> Result<()> {
        let taken = self.worker.lock().await.take();

        if let Some((handle, token)) = taken {
            token.cancel();
            handle.await.context("wake loop task failed to join")?;
        }

        Ok(())
    }

    /// Stop, then arm a fresh wake loop against the current alarm set.
    pub async fn restart(&self) -> Result<()> {
        self.stop().await?;
        self.start().await;
        Ok(())
    }
}
