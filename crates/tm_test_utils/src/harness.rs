//! Session harness.
//!
//! Wires a [`FakeGame`], a [`ManualClock`] and both adapters to a temporary
//! output directory so tests can drive a whole match and then inspect the
//! files the adapter produced.
//!
//! ```
//! use std::time::Duration;
//! use tm_test_utils::harness::SessionHarness;
//!
//! let mut session = SessionHarness::new();
//! session.start();
//! session.run_frames(48, Duration::from_millis(10));
//! session.end(true);
//! let output = session.teardown();
//! assert_eq!(output.frametime_rows().len(), 2);
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use tempfile::TempDir;
use tm_core::config::TelemetryConfig;
use tm_core::host::{TournamentAction, UnitView};
use tm_core::module::{attach_with_clock, AiModule, TournamentBot, TournamentGuard, TournamentModule};

use crate::fixtures::{FakeGame, ManualClock};

/// A match in progress against the fake host.
pub struct SessionHarness {
    /// Host state; edit freely between frames.
    pub game: FakeGame,
    /// Clock the adapter reads.
    pub clock: ManualClock,
    bot: TournamentBot<ManualClock>,
    guard: TournamentGuard<ManualClock>,
    dir: TempDir,
}

impl SessionHarness {
    /// Harness with all three outputs enabled and no time limit.
    ///
    /// # Panics
    ///
    /// Panics if the temporary directory cannot be created.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(|_| {})
    }

    /// Harness with a customised configuration.
    ///
    /// Output paths are set before `customize` runs, so it may clear them.
    ///
    /// # Panics
    ///
    /// Panics if the temporary directory cannot be created.
    pub fn with_config<F: FnOnce(&mut TelemetryConfig)>(customize: F) -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let mut config = TelemetryConfig::default().with_output_dir(dir.path());
        customize(&mut config);

        let clock = ManualClock::new();
        let (bot, guard) = attach_with_clock(config, clock.clone());
        Self {
            game: FakeGame::new(),
            clock,
            bot,
            guard,
            dir,
        }
    }

    /// Deliver the start callback.
    pub fn start(&mut self) {
        self.bot.on_start(&mut self.game);
    }

    /// Advance the clock by `frame_time`, deliver one frame and move the
    /// host to the next frame index.
    pub fn step(&mut self, frame_time: Duration) {
        self.clock.advance(frame_time);
        self.bot.on_frame(&mut self.game);
        self.game.frame += 1;
    }

    /// Run `count` frames of equal duration.
    pub fn run_frames(&mut self, count: u64, frame_time: Duration) {
        for _ in 0..count {
            self.step(frame_time);
        }
    }

    /// Deliver the end callback.
    pub fn end(&mut self, won: bool) {
        self.bot.on_end(&mut self.game, won);
    }

    /// Deliver a unit creation callback.
    pub fn unit_created(&mut self, unit: &UnitView) {
        self.bot.on_unit_create(&self.game, unit);
    }

    /// Deliver a unit destruction callback.
    pub fn unit_destroyed(&mut self, unit: &UnitView) {
        self.bot.on_unit_destroy(&self.game, unit);
    }

    /// Deliver a unit completion callback.
    pub fn unit_completed(&mut self, unit: &UnitView) {
        self.bot.on_unit_complete(&self.game, unit);
    }

    /// Deliver a unit morph callback.
    pub fn unit_morphed(&mut self, unit: &UnitView) {
        self.bot.on_unit_morph(&self.game, unit);
    }

    /// Deliver a unit renegade callback.
    pub fn unit_renegade(&mut self, unit: &UnitView) {
        self.bot.on_unit_renegade(&self.game, unit);
    }

    /// Deliver a unit show callback.
    pub fn unit_shown(&mut self, unit: &UnitView) {
        self.bot.on_unit_show(&self.game, unit);
    }

    /// Deliver a unit hide callback.
    pub fn unit_hidden(&mut self, unit: &UnitView) {
        self.bot.on_unit_hide(&self.game, unit);
    }

    /// Ask the tournament module to approve an action.
    pub fn authorize(&mut self, action: &TournamentAction) -> bool {
        self.guard.on_action(action)
    }

    /// The bot adapter.
    pub fn bot(&self) -> &TournamentBot<ManualClock> {
        &self.bot
    }

    /// Output directory.
    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    /// Drop both adapters, which writes the outcome, and collect the files.
    #[must_use]
    pub fn teardown(self) -> SessionOutput {
        let Self {
            bot, guard, dir, ..
        } = self;
        drop(bot);
        drop(guard);
        SessionOutput { dir }
    }
}

impl Default for SessionHarness {
    fn default() -> Self {
        Self::new()
    }
}

/// Files left behind by a finished session.
pub struct SessionOutput {
    dir: TempDir,
}

impl SessionOutput {
    /// Path of an output file.
    #[must_use]
    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Full frame time CSV, or empty if it was never written.
    #[must_use]
    pub fn frametimes(&self) -> String {
        std::fs::read_to_string(self.path("frametimes.csv")).unwrap_or_default()
    }

    /// Frame time data rows without the header.
    #[must_use]
    pub fn frametime_rows(&self) -> Vec<String> {
        data_rows(&self.frametimes())
    }

    /// Full unit event CSV, or empty if it was never written.
    #[must_use]
    pub fn unit_events(&self) -> String {
        std::fs::read_to_string(self.path("unit_events.csv")).unwrap_or_default()
    }

    /// Unit event data rows without the header.
    #[must_use]
    pub fn unit_event_rows(&self) -> Vec<String> {
        data_rows(&self.unit_events())
    }

    /// Outcome summary, if one was written.
    #[must_use]
    pub fn results(&self) -> Option<String> {
        std::fs::read_to_string(self.path("results.json")).ok()
    }
}

fn data_rows(csv: &str) -> Vec<String> {
    csv.lines().skip(1).map(str::to_string).collect()
}
