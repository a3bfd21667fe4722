//! Property-based tests for the frame metrics and action counting.

use std::time::{Duration, Instant};

use proptest::prelude::*;
use tm_core::action_tracker::ActionTracker;
use tm_core::frame_metrics::{MetricsAggregator, WINDOW_FRAMES};
use tm_core::host::{PlayerStats, UnitView};
use tm_test_utils::fixtures::{command, own_unit};
use tm_test_utils::harness::SessionHarness;
use tm_test_utils::strategies::{
    arb_command_history, arb_cumulative_series, arb_frame_times, CommandState,
};

fn unit_in(state: &CommandState) -> UnitView {
    let mut unit = own_unit(1, "Terran_Marine", 0, 0);
    command(&mut unit, state.order, state.target, state.target_position);
    unit
}

fn expected_actions(history: &[CommandState]) -> u32 {
    let mut count = 0;
    for pair in history.windows(2) {
        let (prev, cur) = (pair[0], pair[1]);
        let target_changed = matches!(cur.target, Some(t) if prev.target != Some(t));
        if prev.order != cur.order || prev.target_position != cur.target_position || target_changed
        {
            count += 1;
        }
    }
    count
}

proptest! {
    #[test]
    fn rows_emitted_once_per_full_window(times in arb_frame_times(120)) {
        let mut session = SessionHarness::new();
        session.start();
        for ms in &times {
            session.step(Duration::from_millis(*ms));
        }
        let output = session.teardown();
        prop_assert_eq!(output.frametime_rows().len() as u64, times.len() as u64 / WINDOW_FRAMES);
    }

    #[test]
    fn window_max_bounds_average(times in arb_frame_times(96)) {
        let mut session = SessionHarness::new();
        session.start();
        for ms in &times {
            session.step(Duration::from_millis(*ms));
        }
        let output = session.teardown();
        for row in output.frametime_rows() {
            let fields: Vec<f64> = row.split(',').take(3).map(|f| f.parse().unwrap()).collect();
            prop_assert!(fields[1] >= fields[2]);
            prop_assert!(fields[2] > 0.0);
        }
    }

    #[test]
    fn resource_deltas_sum_to_total(series in arb_cumulative_series(96)) {
        let start = Instant::now();
        let mut metrics = MetricsAggregator::new(start, &PlayerStats::default());
        let mut total = 0;
        for (frame, gathered) in series.iter().enumerate() {
            let stats = PlayerStats {
                gathered_minerals: *gathered,
                ..PlayerStats::default()
            };
            metrics.record_frame(start + Duration::from_millis(frame as u64));
            if let Some(row) = metrics.end_frame(frame as u64, &stats) {
                prop_assert!(row.resources.minerals_gathered >= 0);
                total += row.resources.minerals_gathered;
            }
        }
        prop_assert_eq!(total, series[95]);
    }

    #[test]
    fn action_count_matches_history(history in arb_command_history(60)) {
        let mut tracker = ActionTracker::new();
        let mut counted = 0;
        for state in &history {
            counted += tracker.detect_actions(&[unit_in(state)]);
        }
        prop_assert_eq!(counted, expected_actions(&history));
    }

    #[test]
    fn repeated_state_is_never_an_action(history in arb_command_history(20)) {
        let mut tracker = ActionTracker::new();
        for state in &history {
            tracker.detect_actions(&[unit_in(state)]);
            prop_assert_eq!(tracker.detect_actions(&[unit_in(state)]), 0);
        }
    }
}
