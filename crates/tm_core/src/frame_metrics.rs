//! Windowed frame metrics.
//!
//! Per-frame measurements are folded into a window of [`WINDOW_FRAMES`]
//! frames. When the last frame of a window arrives (`frame % 24 == 23`) the
//! aggregator produces one [`FrameTimeRow`] and starts a fresh window:
//!
//! - frame time max and average (average always divides by 24)
//! - number of new unit actions detected during the window
//! - minerals/gas gathered and spent since the previous row
//! - supply used and total at the end of the window
//!
//! Windows are aligned on frame index, not wall time, so the reporting
//! cadence follows simulation speed. A match shorter than one window
//! produces no rows.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::host::PlayerStats;

/// Frames per reporting window.
pub const WINDOW_FRAMES: u64 = 24;

/// [`WINDOW_FRAMES`] as a `Duration` divisor.
const WINDOW_DIVISOR: u32 = 24;

/// Header line of the frame time CSV.
pub const FRAMETIMES_HEADER: &str = "frame_count,frame_time_max,frame_time_avg,num_actions,minerals_gathered,minerals_spent,gas_gathered,gas_spent,supply_used,supply_total";

/// Cumulative resource counters captured at the start of a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ResourceBaseline {
    /// Minerals gathered.
    pub minerals_gathered: i32,
    /// Minerals spent.
    pub minerals_spent: i32,
    /// Gas gathered.
    pub gas_gathered: i32,
    /// Gas spent.
    pub gas_spent: i32,
}

impl ResourceBaseline {
    /// Capture the cumulative counters from a stats snapshot.
    #[must_use]
    pub const fn capture(stats: &PlayerStats) -> Self {
        Self {
            minerals_gathered: stats.gathered_minerals,
            minerals_spent: stats.spent_minerals,
            gas_gathered: stats.gathered_gas,
            gas_spent: stats.spent_gas,
        }
    }

    /// Counters accumulated since this baseline.
    #[must_use]
    pub const fn delta(&self, stats: &PlayerStats) -> Self {
        Self {
            minerals_gathered: stats.gathered_minerals - self.minerals_gathered,
            minerals_spent: stats.spent_minerals - self.minerals_spent,
            gas_gathered: stats.gathered_gas - self.gas_gathered,
            gas_spent: stats.spent_gas - self.gas_spent,
        }
    }
}

/// State accumulated over the current window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameWindow {
    /// Longest single frame seen in this window.
    pub max_frame_time: Duration,
    /// Sum of all frame times in this window.
    pub frame_time_sum: Duration,
    /// New actions counted in this window.
    pub num_actions: u32,
}

impl FrameWindow {
    /// Fold one frame's duration into the window.
    pub fn record_frame_time(&mut self, duration: Duration) {
        self.max_frame_time = self.max_frame_time.max(duration);
        self.frame_time_sum += duration;
    }
}

/// One row of the frame time CSV.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrameTimeRow {
    /// Frame index + 1 of the last frame in the window.
    pub frame_count: u64,
    /// Longest frame in the window, in milliseconds.
    pub frame_time_max: f64,
    /// Window sum divided by 24, in milliseconds.
    pub frame_time_avg: f64,
    /// New actions detected in the window.
    pub num_actions: u32,
    /// Resource deltas since the previous row.
    pub resources: ResourceBaseline,
    /// Supply used at the end of the window.
    pub supply_used: i32,
    /// Supply total at the end of the window.
    pub supply_total: i32,
}

impl FrameTimeRow {
    /// Render the row in [`FRAMETIMES_HEADER`] column order.
    #[must_use]
    pub fn to_csv_line(&self) -> String {
        format!(
            "{},{},{},{},{},{},{},{},{},{}",
            self.frame_count,
            self.frame_time_max,
            self.frame_time_avg,
            self.num_actions,
            self.resources.minerals_gathered,
            self.resources.minerals_spent,
            self.resources.gas_gathered,
            self.resources.gas_spent,
            self.supply_used,
            self.supply_total,
        )
    }
}

/// Folds per-frame measurements into [`FrameTimeRow`]s.
#[derive(Debug, Clone)]
pub struct MetricsAggregator {
    window: FrameWindow,
    baseline: ResourceBaseline,
    last_frame_at: Instant,
}

impl MetricsAggregator {
    /// Start measuring from `now` with the given resource baseline.
    #[must_use]
    pub fn new(now: Instant, stats: &PlayerStats) -> Self {
        Self {
            window: FrameWindow::default(),
            baseline: ResourceBaseline::capture(stats),
            last_frame_at: now,
        }
    }

    /// Measure the time since the previous frame and add it to the window.
    ///
    /// Returns the measured duration.
    pub fn record_frame(&mut self, now: Instant) -> Duration {
        let duration = now.saturating_duration_since(self.last_frame_at);
        self.last_frame_at = now;
        self.window.record_frame_time(duration);
        duration
    }

    /// Count newly detected actions.
    pub fn add_actions(&mut self, count: u32) {
        self.window.num_actions += count;
    }

    /// Close the window if `frame` is its last frame.
    ///
    /// On a window boundary this returns the row and resets the window and
    /// the resource baseline to the current counters.
    pub fn end_frame(&mut self, frame: u64, stats: &PlayerStats) -> Option<FrameTimeRow> {
        if frame % WINDOW_FRAMES != WINDOW_FRAMES - 1 {
            return None;
        }

        let row = FrameTimeRow {
            frame_count: frame + 1,
            frame_time_max: millis(self.window.max_frame_time),
            frame_time_avg: millis(self.window.frame_time_sum / WINDOW_DIVISOR),
            num_actions: self.window.num_actions,
            resources: self.baseline.delta(stats),
            supply_used: stats.supply_used,
            supply_total: stats.supply_total,
        };

        self.window = FrameWindow::default();
        self.baseline = ResourceBaseline::capture(stats);
        Some(row)
    }

    /// Current window state.
    #[must_use]
    pub fn window(&self) -> &FrameWindow {
        &self.window
    }

    /// Baseline the next row's deltas are measured against.
    #[must_use]
    pub fn baseline(&self) -> &ResourceBaseline {
        &self.baseline
    }
}

#[allow(clippy::cast_precision_loss)]
fn millis(duration: Duration) -> f64 {
    duration.as_nanos() as f64 / 1_000_000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(minerals: i32) -> PlayerStats {
        PlayerStats {
            gathered_minerals: minerals,
            supply_used: 8,
            supply_total: 18,
            ..Default::default()
        }
    }

    #[test]
    fn test_no_row_inside_window() {
        let start = Instant::now();
        let mut agg = MetricsAggregator::new(start, &stats(0));
        for frame in 0..23 {
            agg.record_frame(start + Duration::from_millis(10 * (frame + 1)));
            assert!(agg.end_frame(frame, &stats(0)).is_none());
        }
    }

    #[test]
    fn test_constant_frames_row() {
        let start = Instant::now();
        let mut agg = MetricsAggregator::new(start, &stats(0));
        let mut row = None;
        for frame in 0..24u64 {
            agg.record_frame(start + Duration::from_millis(10 * (frame + 1)));
            let minerals = i32::try_from((frame + 1) * 500 / 24).unwrap();
            row = agg.end_frame(frame, &stats(if frame == 23 { 500 } else { minerals }));
        }

        let row = row.expect("row on frame 23");
        assert_eq!(row.frame_count, 24);
        assert!(row.to_csv_line().starts_with("24,10,10,0,500,0,0,0,8,18"));
    }

    #[test]
    fn test_window_resets_after_row() {
        let start = Instant::now();
        let mut agg = MetricsAggregator::new(start, &stats(0));
        agg.record_frame(start + Duration::from_millis(50));
        agg.add_actions(3);
        assert!(agg.end_frame(23, &stats(100)).is_some());

        assert_eq!(*agg.window(), FrameWindow::default());
        assert_eq!(agg.baseline().minerals_gathered, 100);
    }

    #[test]
    fn test_average_divides_by_window_size() {
        let start = Instant::now();
        let mut agg = MetricsAggregator::new(start, &stats(0));
        agg.record_frame(start + Duration::from_millis(48));
        let row = agg.end_frame(23, &stats(0)).unwrap();
        assert!((row.frame_time_max - 48.0).abs() < 1e-9);
        assert!((row.frame_time_avg - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_average_renders_like_max() {
        let start = Instant::now();
        let mut agg = MetricsAggregator::new(start, &stats(0));
        let mut row = None;
        for frame in 0..24u32 {
            agg.record_frame(start + Duration::from_micros(41_700) * (frame + 1));
            row = agg.end_frame(u64::from(frame), &stats(0));
        }
        let row = row.unwrap();
        assert!(row.to_csv_line().starts_with("24,41.7,41.7,"), "{}", row.to_csv_line());
    }

    #[test]
    fn test_deltas_against_previous_row() {
        let start = Instant::now();
        let mut agg = MetricsAggregator::new(start, &stats(50));
        let first = agg.end_frame(23, &stats(300)).unwrap();
        let second = agg.end_frame(47, &stats(320)).unwrap();
        assert_eq!(first.resources.minerals_gathered, 250);
        assert_eq!(second.resources.minerals_gathered, 20);
        assert_eq!(second.frame_count, 48);
    }

    #[test]
    fn test_fractional_millis_render() {
        let row = FrameTimeRow {
            frame_count: 24,
            frame_time_max: 16.5,
            frame_time_avg: 0.25,
            num_actions: 2,
            resources: ResourceBaseline::default(),
            supply_used: 4,
            supply_total: 10,
        };
        assert_eq!(row.to_csv_line(), "24,16.5,0.25,2,0,0,0,0,4,10");
    }
}
