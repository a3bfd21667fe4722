//! # Tournament Telemetry Core
//!
//! Observability adapter for bots playing in a real-time strategy
//! tournament. It attaches to the game host's callback interface, observes
//! one player, and records:
//!
//! - frame timing, action counts and economy per 24-frame window
//!   (`frametimes.csv`)
//! - unit lifecycle events (`unit_events.csv`)
//! - the final verdict and scores (`results.json`), written once at teardown
//!
//! The adapter never issues game commands and never lets an error escape
//! into the host: failed writes degrade to missing telemetry.
//!
//! ## Crate Structure
//!
//! - [`host`] - Types and traits modelling the game host
//! - [`config`] - Environment / RON configuration
//! - [`frame_metrics`] - Windowed frame time and economy aggregation
//! - [`action_tracker`] - New-command detection from unit state deltas
//! - [`unit_events`] - Lifecycle event filtering and rows
//! - [`outcome`] - Session phases and the outcome summary
//! - [`authorization`] - Approval of privileged host actions
//! - [`manager`] - Owns all state and sequences the callbacks
//! - [`module`] - Host-facing adapters
//!
//! ## Example
//!
//! ```no_run
//! use tm_core::config::TelemetryConfig;
//! use tm_core::module::{attach, AiModule};
//! # fn host_loop(bot: &mut dyn AiModule) {}
//!
//! let (mut bot, _guard) = attach(TelemetryConfig::from_env());
//! host_loop(&mut bot);
//! // Dropping the last adapter writes the outcome summary.
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod action_tracker;
pub mod authorization;
pub mod clock;
pub mod config;
pub mod error;
pub mod frame_metrics;
pub mod host;
pub mod manager;
pub mod module;
pub mod outcome;
pub mod output;
pub mod unit_events;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::clock::{Clock, SystemClock};
    pub use crate::config::TelemetryConfig;
    pub use crate::error::{Result, TelemetryError};
    pub use crate::frame_metrics::{FrameTimeRow, WINDOW_FRAMES};
    pub use crate::host::{
        Flag, Game, OrderId, PlayerId, PlayerStats, PlayerType, Position, TournamentAction,
        UnitId, UnitView,
    };
    pub use crate::manager::TournamentManager;
    pub use crate::module::{
        attach, attach_with_clock, AiModule, TournamentBot, TournamentGuard, TournamentModule,
    };
    pub use crate::outcome::{OutcomeRecord, SessionPhase, Winner};
    pub use crate::unit_events::UnitEventKind;
}
