//! Headless match driver for the tournament telemetry adapter.
//!
//! This crate plays scripted matches through the adapter without a game
//! engine. A script describes the world (units, orders, resources, scores)
//! frame by frame; the driver turns it into the same callback sequence a
//! real host would deliver. This enables:
//!
//! - **End-to-end checks**: the CSV streams and outcome summary a match
//!   produces, from real files on disk
//! - **Batch runs**: many scripts in parallel, one output directory each
//! - **Config trials**: frame limits, speed overrides and input permission
//!   tried against recorded match shapes
//!
//! # Example
//!
//! ```bash
//! # Play one script with config from the TM_* environment
//! cargo run -p tm_headless -- run --script scripts/marine_rush.ron
//!
//! # Play one script into a directory
//! cargo run -p tm_headless -- run --script scripts/marine_rush.ron --output out/
//!
//! # Play every script in a directory
//! cargo run -p tm_headless -- batch --scripts scripts/ --output results/
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod batch;
pub mod game;
pub mod runner;
pub mod script;

pub use batch::{run_batch, BatchConfig, BatchResults, BatchSummary};
pub use game::{ScriptedGame, SimulatedClock};
pub use runner::{run_match, Approval, MatchReport};
pub use script::{MatchScript, PlayerSlot, ScriptAction, ScriptError, ScriptEvent};
