//! Match outcome recording.
//!
//! The recorder follows one session through its phases:
//!
//! ```text
//! Uninitialized --reset--> Active --end / time limit--> Ended
//!        \                    \                           \
//!         +--------------------+------ finalize ----------+--> Finalized
//! ```
//!
//! The outcome starts out as "crashed, enemy wins" and only a graceful end
//! callback replaces it, so a host that dies mid-match is reported as a
//! crash. A time limit that fires before the end callback turns any later
//! victory into a loss.

use std::io::Write;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::host::PlayerStats;

/// Who won the match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Winner {
    /// The observed player.
    SelfPlayer,
    /// The opponent.
    #[default]
    Enemy,
}

/// How the match ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WinReason {
    /// The host delivered a regular end callback.
    Eliminated,
    /// No end callback was ever delivered.
    #[default]
    Crash,
}

/// Session lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SessionPhase {
    /// Attached, match not started.
    #[default]
    Uninitialized,
    /// Match running.
    Active,
    /// Match over (end callback or time limit).
    Ended,
    /// Outcome written; terminal.
    Finalized,
}

/// Score counters copied from the host every frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Scores {
    /// Building score.
    pub building: i32,
    /// Kill score.
    pub kill: i32,
    /// Razing score.
    pub razing: i32,
    /// Unit score.
    pub unit: i32,
}

impl Scores {
    /// Copy the scores out of a stats snapshot.
    #[must_use]
    pub const fn from_stats(stats: &PlayerStats) -> Self {
        Self {
            building: stats.building_score,
            kill: stats.kill_score,
            razing: stats.razing_score,
            unit: stats.unit_score,
        }
    }
}

/// Everything the outcome summary reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SessionOutcome {
    /// Match winner.
    pub winner: Winner,
    /// How the match ended.
    pub reason: WinReason,
    /// Whether the frame limit ended the match.
    pub timed_out: bool,
    /// Last score snapshot.
    pub scores: Scores,
}

/// Serialized shape of the outcome summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeRecord {
    /// Observed player won.
    pub is_winner: bool,
    /// No end callback was delivered.
    pub is_crashed: bool,
    /// The frame limit was hit.
    pub timed_out: bool,
    /// Building score.
    pub building_score: i32,
    /// Kill score.
    pub kill_score: i32,
    /// Razing score.
    pub razing_score: i32,
    /// Unit score.
    pub unit_score: i32,
}

impl From<&SessionOutcome> for OutcomeRecord {
    fn from(outcome: &SessionOutcome) -> Self {
        Self {
            is_winner: outcome.winner == Winner::SelfPlayer,
            is_crashed: outcome.reason == WinReason::Crash,
            timed_out: outcome.timed_out,
            building_score: outcome.scores.building,
            kill_score: outcome.scores.kill,
            razing_score: outcome.scores.razing,
            unit_score: outcome.scores.unit,
        }
    }
}

impl OutcomeRecord {
    /// Write the record as tab-indented JSON.
    pub fn write_to<W: Write>(&self, writer: W) -> Result<()> {
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"\t");
        let mut serializer = serde_json::Serializer::with_formatter(writer, formatter);
        self.serialize(&mut serializer)?;
        serializer.into_inner().flush()?;
        Ok(())
    }

    /// Render the record as a string.
    pub fn to_text(&self) -> Result<String> {
        let mut buf = Vec::new();
        self.write_to(&mut buf)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}

/// Tracks the session phase and the outcome fields.
#[derive(Debug, Clone, Default)]
pub struct SessionRecorder {
    phase: SessionPhase,
    outcome: SessionOutcome,
}

impl SessionRecorder {
    /// Create a recorder in the `Uninitialized` phase.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new session with a crashed/enemy-wins default outcome.
    pub fn reset(&mut self) {
        if self.phase == SessionPhase::Finalized {
            tracing::warn!("Reset after outcome was finalized, ignoring");
            return;
        }
        self.phase = SessionPhase::Active;
        self.outcome = SessionOutcome::default();
    }

    /// Copy the latest scores.
    pub fn refresh_scores(&mut self, stats: &PlayerStats) {
        self.outcome.scores = Scores::from_stats(stats);
    }

    /// Check the frame limit; returns true on the frame it is first reached.
    ///
    /// A `limit` of 0 disables the check.
    pub fn check_timeout(&mut self, frame: u64, limit: u64) -> bool {
        if limit == 0 || self.outcome.timed_out || self.phase != SessionPhase::Active {
            return false;
        }
        if frame < limit {
            return false;
        }
        tracing::info!(frame, limit, "Frame limit reached, match timed out");
        self.outcome.timed_out = true;
        self.phase = SessionPhase::Ended;
        true
    }

    /// Record the host's end callback.
    pub fn end(&mut self, won: bool) {
        match self.phase {
            SessionPhase::Active | SessionPhase::Ended => {}
            phase => {
                tracing::warn!(?phase, won, "End callback outside of a session, ignoring");
                return;
            }
        }
        self.outcome.reason = WinReason::Eliminated;
        self.outcome.winner = if won && !self.outcome.timed_out {
            Winner::SelfPlayer
        } else {
            Winner::Enemy
        };
        self.phase = SessionPhase::Ended;
        tracing::info!(won, outcome = ?self.outcome, "Match ended");
    }

    /// Move to `Finalized` and hand out the outcome to write.
    ///
    /// Returns `None` if the session was already finalized.
    pub fn finalize(&mut self) -> Option<OutcomeRecord> {
        if self.phase == SessionPhase::Finalized {
            return None;
        }
        self.phase = SessionPhase::Finalized;
        Some(OutcomeRecord::from(&self.outcome))
    }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Current outcome.
    #[must_use]
    pub fn outcome(&self) -> &SessionOutcome {
        &self.outcome
    }

    /// Whether the frame limit has fired.
    #[must_use]
    pub fn timed_out(&self) -> bool {
        self.outcome.timed_out
    }
}
