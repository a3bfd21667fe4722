//! Match driver.
//!
//! Plays a [`MatchScript`] through the telemetry adapters in the order a
//! real host delivers callbacks:
//!
//! 1. `on_start`, then the tournament module is advertised.
//! 2. For each frame: the frame's scripted events (unit callbacks and
//!    approval requests), then `on_frame`.
//! 3. `on_end`, unless the script has the host die without one.
//! 4. Teardown, which writes the outcome summary.
//!
//! The match stops after the first frame on which the adapter asks to
//! leave. A host treats a leaving player as the loser, so `on_end(false)`
//! follows.

use std::time::Instant;

use serde::{Deserialize, Serialize};
use tm_core::clock::Clock;
use tm_core::config::TelemetryConfig;
use tm_core::host::{Game, TournamentAction, UnitView};
use tm_core::module::{attach_with_clock, AiModule, TournamentBot, TournamentModule};
use tm_core::outcome::OutcomeRecord;
use tm_core::unit_events::UnitEventKind;

use crate::game::{Applied, ScriptedGame, SimulatedClock};
use crate::script::{MatchScript, ScriptError};

/// One approval request and its answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Approval {
    /// Frame of the request.
    pub frame: u64,
    /// Requested action.
    pub action: TournamentAction,
    /// Whether it was allowed.
    pub allowed: bool,
}

/// What happened in one match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchReport {
    /// Script name.
    pub name: String,
    /// Frames delivered to the adapter.
    pub frames_played: u64,
    /// Whether the adapter ended the match by leaving.
    pub left_early: bool,
    /// Speed the adapter set at start.
    pub local_speed: Option<i32>,
    /// End report delivered to the adapter, if any.
    pub reported_result: Option<bool>,
    /// Frame time rows written.
    pub frametime_rows: u64,
    /// Unit event rows written.
    pub unit_event_rows: u64,
    /// Outcome the adapter recorded.
    pub outcome: OutcomeRecord,
    /// Whether the outcome summary reached disk.
    pub results_written: bool,
    /// Approval requests in the order they were made.
    pub approvals: Vec<Approval>,
    /// Wall time spent driving the match.
    pub duration_seconds: f64,
}

/// Play `script` against an adapter configured with `config`.
///
/// Returns an error only for an invalid script. Output failures inside
/// the adapter are logged by the adapter and reflected in the report.
pub fn run_match(script: &MatchScript, config: TelemetryConfig) -> Result<MatchReport, ScriptError> {
    script.validate()?;
    let started = Instant::now();

    tracing::info!(
        name = %script.name,
        frames = script.frames,
        events = script.events.len(),
        "Starting match"
    );

    let clock = SimulatedClock::new();
    let (mut bot, mut guard) = attach_with_clock(config, clock.clone());
    let mut game = ScriptedGame::new(script);
    let mut approvals = Vec::new();

    bot.on_start(&mut game);
    guard.on_first_advertisement();

    let timeline = script.timeline();
    let mut pending = timeline.iter().peekable();
    let mut frames_played = 0;

    for frame in 0..script.frames {
        game.set_frame(frame);
        while let Some(event) = pending.next_if(|event| event.frame == frame) {
            match game.apply(&event.action)? {
                Applied::Lifecycle(kind, unit) => deliver(&mut bot, kind, &game, &unit),
                Applied::Request(action) => {
                    let allowed = guard.on_action(&action);
                    approvals.push(Approval {
                        frame,
                        action,
                        allowed,
                    });
                }
                Applied::Quiet => {}
            }
        }

        clock.advance(script.frame_time(frame));
        bot.on_frame(&mut game);
        frames_played += 1;

        if game.leave_requested() {
            tracing::info!(frame, "Adapter left the match");
            break;
        }
    }

    let left_early = game.leave_requested();
    let reported_result = if left_early {
        Some(false)
    } else {
        script.result
    };
    match reported_result {
        Some(won) => bot.on_end(&mut game, won),
        None => tracing::info!("Host ended without an end report"),
    }

    bot.teardown();
    let report = {
        let manager = bot.manager().borrow();
        MatchReport {
            name: script.name.clone(),
            frames_played,
            left_early,
            local_speed: game.local_speed(),
            reported_result,
            frametime_rows: manager.frametime_rows(),
            unit_event_rows: manager.unit_event_rows(),
            outcome: OutcomeRecord::from(manager.recorder().outcome()),
            results_written: manager.results_written(),
            approvals,
            duration_seconds: started.elapsed().as_secs_f64(),
        }
    };

    tracing::info!(
        name = %report.name,
        frames = report.frames_played,
        winner = report.outcome.is_winner,
        crashed = report.outcome.is_crashed,
        timed_out = report.outcome.timed_out,
        "Match finished"
    );
    Ok(report)
}

fn deliver<C: Clock>(
    bot: &mut TournamentBot<C>,
    kind: UnitEventKind,
    game: &dyn Game,
    unit: &UnitView,
) {
    match kind {
        UnitEventKind::Create => bot.on_unit_create(game, unit),
        UnitEventKind::Destroy => bot.on_unit_destroy(game, unit),
        UnitEventKind::Complete => bot.on_unit_complete(game, unit),
        UnitEventKind::Morph => bot.on_unit_morph(game, unit),
        UnitEventKind::Renegade => bot.on_unit_renegade(game, unit),
        UnitEventKind::Show => bot.on_unit_show(game, unit),
        UnitEventKind::Hide => bot.on_unit_hide(game, unit),
    }
}
