use anyhow::Result;

use crate::models::AlarmWindow;
use crate::store::{LastTriggerLookup, TriggerRecorder};

/// Seconds elapsed since the window last fired for this schedule, or 0 when
/// it never has (an absent or non-positive recorded value).
pub fn seconds_since_last_trigger<T>(
    triggers: &T,
    schedule_id: &str,
    window: &AlarmWindow,
    now_epoch_ms: i64,
) -> i64
where
    T: LastTriggerLookup + ?Sized,
{
    match triggers.last_trigger_epoch_ms(schedule_id, window.id) {
        Some(last_ms) if last_ms > 0 => (now_epoch_ms - last_ms) / 1000,
        _ => 0,
    }
}

/// The active window that becomes eligible soonest, or `None` when the set
/// has no active windows. Ties go to the first window in input order.
pub fn next_eligible_window<'a, T>(
    windows: &'a [AlarmWindow],
    schedule_id: &str,
    time_of_day_seconds: u32,
    now_epoch_ms: i64,
    triggers: &T,
) -> Option<&'a AlarmWindow>
where
    T: LastTriggerLookup + ?Sized,
{
    next_eligible(windows, schedule_id, time_of_day_seconds, now_epoch_ms, triggers)
        .map(|(window, _)| window)
}

/// Seconds from now until the soonest-eligible active window fires; `None`
/// when the set has no active windows.
pub fn next_eligible_window_seconds_from_now<T>(
    windows: &[AlarmWindow],
    schedule_id: &str,
    time_of_day_seconds: u32,
    now_epoch_ms: i64,
    triggers: &T,
) -> Option<i64>
where
    T: LastTriggerLookup + ?Sized,
{
    next_eligible(windows, schedule_id, time_of_day_seconds, now_epoch_ms, triggers)
        .map(|(_, seconds)| seconds)
}

/// The window that should fire right now, if any: among active windows in
/// ascending start order, the first whose delay is zero (inside its interval
/// with the repeat cooldown elapsed). This is the gate a wake-up handler
/// checks before presenting anything to the user.
pub fn currently_eligible_window<'a, T>(
    windows: &'a [AlarmWindow],
    schedule_id: &str,
    time_of_day_seconds: u32,
    now_epoch_ms: i64,
    triggers: &T,
) -> Option<&'a AlarmWindow>
where
    T: LastTriggerLookup + ?Sized,
{
    let mut active: Vec<&AlarmWindow> = windows.iter().filter(|window| window.active).collect();
    active.sort_by_key(|window| window.start_seconds_in_day);

    active.into_iter().find(|window| {
        let elapsed = seconds_since_last_trigger(triggers, schedule_id, window, now_epoch_ms);
        window.next_eligible_seconds(time_of_day_seconds, elapsed) == 0
    })
}

/// Persists a trigger for the window. Must be called exactly once per
/// actually-presented alert and never on a mere reschedule check: a missed
/// record disables the cooldown, a spurious one suppresses a legitimate
/// future alert.
pub fn record_trigger<T>(
    triggers: &T,
    schedule_id: &str,
    window: &AlarmWindow,
    now_epoch_ms: i64,
) -> Result<()>
where
    T: TriggerRecorder + ?Sized,
{
    triggers.record_trigger(schedule_id, window.id, now_epoch_ms)
}

fn next_eligible<'a, T>(
    windows: &'a [AlarmWindow],
    schedule_id: &str,
    time_of_day_seconds: u32,
    now_epoch_ms: i64,
    triggers: &T,
) -> Option<(&'a AlarmWindow, i64)>
where
    T: LastTriggerLookup + ?Sized,
{
    let mut best: Option<(&AlarmWindow, i64)> = None;

    for window in windows.iter().filter(|window| window.active) {
        let elapsed = seconds_since_last_trigger(triggers, schedule_id, window, now_epoch_ms);
        let seconds = window.next_eligible_seconds(time_of_day_seconds, elapsed);

        // Strict comparison keeps the first window on ties.
        if best.map_or(true, |(_, current)| seconds < current) {
            best = Some((window, seconds));
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryTriggerStore;

    const HOUR: u32 = 3600;
    const SCHEDULE: &str = "test";

    fn three_active() -> Vec<AlarmWindow> {
        vec![
            AlarmWindow::new(0, 2 * HOUR, 4 * HOUR, 1),
            AlarmWindow::new(1, 8 * HOUR, 10 * HOUR, 1),
            AlarmWindow::new(2, 14 * HOUR, 16 * HOUR, 1),
        ]
    }

    fn next_at(windows: &[AlarmWindow], hour: u32, triggers: &MemoryTriggerStore) -> Option<u32> {
        next_eligible_window(windows, SCHEDULE, hour * HOUR, hour as i64 * 3_600_000, triggers)
            .map(|window| window.start_seconds_in_day)
    }

    fn seconds_at(
        windows: &[AlarmWindow],
        hour: u32,
        triggers: &MemoryTriggerStore,
    ) -> Option<i64> {
        next_eligible_window_seconds_from_now(
            windows,
            SCHEDULE,
            hour * HOUR,
            hour as i64 * 3_600_000,
            triggers,
        )
    }

    #[test]
    fn next_eligible_window_can_be_found() {
        let windows = three_active();
        let triggers = MemoryTriggerStore::new();

        assert_eq!(next_at(&windows, 1, &triggers), Some(2 * HOUR));
        assert_eq!(next_at(&windows, 6, &triggers), Some(8 * HOUR));
        assert_eq!(next_at(&windows, 12, &triggers), Some(14 * HOUR));
        assert_eq!(next_at(&windows, 20, &triggers), Some(2 * HOUR));
    }

    #[test]
    fn next_eligible_seconds_with_rollover() {
        let windows = three_active();
        let triggers = MemoryTriggerStore::new();

        assert_eq!(seconds_at(&windows, 0, &triggers), Some(2 * 3600));
        assert_eq!(seconds_at(&windows, 1, &triggers), Some(3600));
        // Inside a window with the 1s cooldown still pending.
        assert_eq!(seconds_at(&windows, 2, &triggers), Some(1));
        assert_eq!(seconds_at(&windows, 6, &triggers), Some(2 * 3600));
        assert_eq!(seconds_at(&windows, 12, &triggers), Some(2 * 3600));
        assert_eq!(seconds_at(&windows, 15, &triggers), Some(1));
        // Past the last window: wrap to tomorrow's first.
        assert_eq!(seconds_at(&windows, 20, &triggers), Some(6 * 3600));
    }

    #[test]
    fn triggered_window_serves_its_cooldown() {
        let mut windows = three_active();
        windows[0].repeat_frequency_seconds = HOUR;
        let triggers = MemoryTriggerStore::new();

        record_trigger(&triggers, SCHEDULE, &windows[0], 3 * 3_600_000).unwrap();

        // One hour of cooldown remains; it still fits inside [2h, 4h].
        assert_eq!(seconds_at(&windows, 3, &triggers), Some(3600));

        // A fresher trigger pushes the first window past its close, so the
        // 8h window (5h away) wins instead.
        record_trigger(&triggers, SCHEDULE, &windows[0], 3 * 3_600_000 + 1000).unwrap();
        assert_eq!(seconds_at(&windows, 3, &triggers), Some(5 * 3600));
    }

    #[test]
    fn inactive_windows_are_ignored() {
        let mut windows = three_active();
        for window in &mut windows {
            window.active = false;
        }
        let triggers = MemoryTriggerStore::new();

        assert_eq!(next_at(&windows, 1, &triggers), None);
        assert_eq!(seconds_at(&windows, 1, &triggers), None);
        assert!(currently_eligible_window(&windows, SCHEDULE, 3 * HOUR, 0, &triggers).is_none());

        windows[1].active = true;
        assert_eq!(next_at(&windows, 1, &triggers), Some(8 * HOUR));
    }

    #[test]
    fn empty_set_has_nothing_to_schedule() {
        let triggers = MemoryTriggerStore::new();

        assert_eq!(next_at(&[], 1, &triggers), None);
        assert_eq!(seconds_at(&[], 1, &triggers), None);
    }

    #[test]
    fn ties_select_the_first_window_in_input_order() {
        // Same interval, same cadence: identical delay for both.
        let windows = vec![
            AlarmWindow::new(10, 5 * HOUR, 6 * HOUR, 1),
            AlarmWindow::new(11, 5 * HOUR, 6 * HOUR, 1),
        ];
        let triggers = MemoryTriggerStore::new();

        let winner = next_eligible_window(&windows, SCHEDULE, HOUR, 0, &triggers).unwrap();
        assert_eq!(winner.id, 10);
    }

    #[test]
    fn selection_is_idempotent_without_new_triggers() {
        let windows = three_active();
        let triggers = MemoryTriggerStore::new();
        record_trigger(&triggers, SCHEDULE, &windows[1], 5 * 3_600_000).unwrap();

        let first = seconds_at(&windows, 6, &triggers);
        let second = seconds_at(&windows, 6, &triggers);
        assert_eq!(first, second);

        let w1 = next_at(&windows, 6, &triggers);
        let w2 = next_at(&windows, 6, &triggers);
        assert_eq!(w1, w2);
    }

    #[test]
    fn currently_eligible_requires_elapsed_cooldown() {
        let windows = vec![AlarmWindow::new(0, 2 * HOUR, 4 * HOUR, 600)];
        let triggers = MemoryTriggerStore::new();

        let trigger_ms = 3 * 3_600_000i64;
        record_trigger(&triggers, SCHEDULE, &windows[0], trigger_ms).unwrap();

        // One second short of the cooldown: not eligible.
        let almost = trigger_ms + 599_000;
        assert!(currently_eligible_window(
            &windows,
            SCHEDULE,
            3 * HOUR + 599,
            almost,
            &triggers
        )
        .is_none());

        // Exactly at the cooldown, still inside the window: fire.
        let ready = trigger_ms + 600_000;
        let eligible =
            currently_eligible_window(&windows, SCHEDULE, 3 * HOUR + 600, ready, &triggers);
        assert_eq!(eligible.map(|window| window.id), Some(0));
    }

    #[test]
    fn currently_eligible_prefers_the_earliest_start() {
        let windows = vec![
            AlarmWindow::new(5, 3 * HOUR, 6 * HOUR, 0),
            AlarmWindow::new(4, 2 * HOUR, 6 * HOUR, 0),
        ];
        let triggers = MemoryTriggerStore::new();

        // Both are inside their interval with no cooldown; the 2h window
        // starts earlier and wins despite its input position.
        let eligible = currently_eligible_window(&windows, SCHEDULE, 4 * HOUR, 0, &triggers);
        assert_eq!(eligible.map(|window| window.id), Some(4));
    }

    #[test]
    fn never_fired_reads_as_zero_elapsed() {
        let windows = three_active();
        let triggers = MemoryTriggerStore::new();

        assert_eq!(
            seconds_since_last_trigger(&triggers, SCHEDULE, &windows[0], 1_000_000),
            0
        );

        record_trigger(&triggers, SCHEDULE, &windows[0], 400_000).unwrap();
        assert_eq!(
            seconds_since_last_trigger(&triggers, SCHEDULE, &windows[0], 1_000_000),
            600
        );
    }

    #[test]
    fn cooldown_exceeding_window_duration_defers_to_tomorrow() {
        // 10-minute window, 1-hour cadence: after any trigger the window can
        // only fire again on a later day.
        let windows = vec![AlarmWindow::new(0, 10 * HOUR, 10 * HOUR + 600, 3600)];
        let triggers = MemoryTriggerStore::new();

        let trigger_ms = 10 * 3_600_000i64;
        record_trigger(&triggers, SCHEDULE, &windows[0], trigger_ms).unwrap();

        let now = 10 * HOUR + 300;
        let seconds = next_eligible_window_seconds_from_now(
            &windows,
            SCHEDULE,
            now,
            trigger_ms + 300_000,
            &triggers,
        );
        assert_eq!(seconds, Some(86_400 - now as i64 + (10 * HOUR) as i64));
        assert!(
            currently_eligible_window(&windows, SCHEDULE, now, trigger_ms + 300_000, &triggers)
                .is_none()
        );
    }
}
