//! The telemetry manager.
//!
//! [`TournamentManager`] owns all adapter state for one attached process:
//! the frame metrics window, the action tracker, the session recorder and
//! the two CSV streams. The host-facing adapters in [`crate::module`]
//! forward every callback here.
//!
//! Callback order per match, as delivered by the host:
//!
//! 1. `on_reset` once at match start: opens both CSV streams (writing their
//!    headers), applies the speed override, starts the frame clock.
//! 2. `on_frame` once per frame, plus `on_unit_event` between frames.
//! 3. `on_end` once, unless the host dies first.
//! 4. `finalize` at teardown, also run from `Drop`: writes the outcome
//!    summary exactly once.
//!
//! Nothing here returns an error to the caller. Output failures are logged
//! and the match carries on.

use std::fs::File;
use std::io::BufWriter;

use crate::action_tracker::ActionTracker;
use crate::authorization::ActionPolicy;
use crate::clock::{Clock, SystemClock};
use crate::config::TelemetryConfig;
use crate::error::{Result, TelemetryError};
use crate::frame_metrics::{MetricsAggregator, FRAMETIMES_HEADER};
use crate::host::{Game, TournamentAction, UnitView};
use crate::outcome::{OutcomeRecord, SessionPhase, SessionRecorder};
use crate::output::CsvLog;
use crate::unit_events::{UnitEventKind, UnitEventRow, UNIT_EVENTS_HEADER};

type FileLog = CsvLog<BufWriter<File>>;

/// Owns and drives all telemetry state for one session.
#[derive(Debug)]
pub struct TournamentManager<C: Clock = SystemClock> {
    config: TelemetryConfig,
    policy: ActionPolicy,
    clock: C,
    metrics: Option<MetricsAggregator>,
    tracker: ActionTracker,
    recorder: SessionRecorder,
    frametimes: FileLog,
    unit_events: FileLog,
    results_written: bool,
}

impl TournamentManager<SystemClock> {
    /// Create a manager timed by the wall clock.
    #[must_use]
    pub fn new(config: TelemetryConfig) -> Self {
        Self::with_clock(config, SystemClock)
    }
}

impl<C: Clock> TournamentManager<C> {
    /// Create a manager with a custom clock.
    pub fn with_clock(config: TelemetryConfig, clock: C) -> Self {
        Self {
            policy: ActionPolicy::new(config.allow_user_input),
            config,
            clock,
            metrics: None,
            tracker: ActionTracker::new(),
            recorder: SessionRecorder::new(),
            frametimes: CsvLog::disabled("frametimes"),
            unit_events: CsvLog::disabled("unit_events"),
            results_written: false,
        }
    }

    /// Match start.
    pub fn on_reset(&mut self, game: &mut dyn Game) {
        self.recorder.reset();
        if self.recorder.phase() != SessionPhase::Active {
            return;
        }

        self.frametimes = CsvLog::create(
            "frametimes",
            self.config.frametimes_path.as_deref(),
            FRAMETIMES_HEADER,
        );
        self.unit_events = CsvLog::create(
            "unit_events",
            self.config.unit_events_path.as_deref(),
            UNIT_EVENTS_HEADER,
        );

        game.set_local_speed(self.config.speed_override);
        self.tracker.clear();
        self.metrics = Some(MetricsAggregator::new(self.clock.now(), &game.self_stats()));

        tracing::info!(
            speed = self.config.speed_override,
            time_out_at_frame = self.config.time_out_at_frame,
            frametimes = self.frametimes.is_enabled(),
            unit_events = self.unit_events.is_enabled(),
            "Session started"
        );
    }

    /// One simulation frame.
    pub fn on_frame(&mut self, game: &mut dyn Game) {
        let Some(metrics) = self.metrics.as_mut() else {
            tracing::debug!("Frame before session start, ignoring");
            return;
        };
        if self.recorder.timed_out() || self.recorder.phase() == SessionPhase::Finalized {
            return;
        }

        let frame = game.frame_count();
        if self
            .recorder
            .check_timeout(frame, self.config.time_out_at_frame)
        {
            game.leave_game();
            return;
        }

        let stats = game.self_stats();
        self.recorder.refresh_scores(&stats);

        metrics.record_frame(self.clock.now());
        let units = game.self_units();
        metrics.add_actions(self.tracker.detect_actions(&units));

        if let Some(row) = metrics.end_frame(frame, &stats) {
            tracing::debug!(
                frame = row.frame_count,
                max_ms = row.frame_time_max,
                avg_ms = row.frame_time_avg,
                actions = row.num_actions,
                "Frame window closed"
            );
            self.frametimes.append(&row.to_csv_line());
        }
    }

    /// Match end as reported by the host.
    pub fn on_end(&mut self, won: bool) {
        self.recorder.end(won);
    }

    /// A unit lifecycle callback.
    pub fn on_unit_event(&mut self, kind: UnitEventKind, game: &dyn Game, unit: &UnitView) {
        if self.metrics.is_none() {
            tracing::debug!(event = kind.name(), "Unit event before session start, ignoring");
            return;
        }
        let owned = unit.owner == game.self_player();
        if !kind.should_log(owned, unit.owner_type) {
            return;
        }
        let row = UnitEventRow::new(game.frame_count(), kind, owned, unit);
        self.unit_events.append(&row.to_csv_line());
    }

    /// Approve or deny a privileged action.
    #[must_use]
    pub fn on_action(&self, action: &TournamentAction) -> bool {
        self.policy.authorize(action)
    }

    /// Write the outcome summary if it has not been written yet.
    ///
    /// Safe to call any number of times and in any phase.
    pub fn finalize(&mut self) {
        let Some(record) = self.recorder.finalize() else {
            return;
        };
        match self.write_results(&record) {
            Ok(()) => {
                self.results_written = true;
                tracing::info!(?record, "Outcome written");
            }
            Err(TelemetryError::NoOutputPath(_)) => {
                tracing::debug!("No results path configured, outcome not written");
            }
            Err(e) => tracing::warn!(error = %e, "Failed to write outcome"),
        }
    }

    fn write_results(&self, record: &OutcomeRecord) -> Result<()> {
        let path = self
            .config
            .results_path
            .as_deref()
            .ok_or(TelemetryError::NoOutputPath("results"))?;
        let file = File::create(path).map_err(|e| TelemetryError::io(path, e))?;
        record.write_to(BufWriter::new(file))
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &TelemetryConfig {
        &self.config
    }

    /// Session recorder.
    #[must_use]
    pub fn recorder(&self) -> &SessionRecorder {
        &self.recorder
    }

    /// Action tracker.
    #[must_use]
    pub fn tracker(&self) -> &ActionTracker {
        &self.tracker
    }

    /// Frame time rows written so far.
    #[must_use]
    pub fn frametime_rows(&self) -> u64 {
        self.frametimes.rows_written()
    }

    /// Unit event rows written so far.
    #[must_use]
    pub fn unit_event_rows(&self) -> u64 {
        self.unit_events.rows_written()
    }

    /// Whether the outcome summary made it to disk.
    #[must_use]
    pub fn results_written(&self) -> bool {
        self.results_written
    }
}

impl<C: Clock> Drop for TournamentManager<C> {
    fn drop(&mut self) {
        self.finalize();
    }
}
