//! Host-facing adapters.
//!
//! The host registers two independent objects: an AI module that receives
//! match callbacks and a tournament module that approves privileged
//! actions. Both forward into one shared [`TournamentManager`].
//!
//! The host drives every callback from a single thread, so the manager is
//! shared through `Rc<RefCell<_>>`. A callback that finds the manager
//! already borrowed is logged and skipped instead of panicking, because a
//! panic here would take the host process down with it.

use std::cell::RefCell;
use std::rc::Rc;

use crate::authorization::ActionPolicy;
use crate::clock::{Clock, SystemClock};
use crate::config::TelemetryConfig;
use crate::host::{Game, TournamentAction, UnitView};
use crate::manager::TournamentManager;
use crate::unit_events::UnitEventKind;

/// Match callbacks delivered by the host, one method per event kind.
///
/// Every method has an empty default body so implementors only override
/// what they observe.
#[allow(unused_variables)]
pub trait AiModule {
    /// Match start.
    fn on_start(&mut self, game: &mut dyn Game) {}

    /// One simulation frame.
    fn on_frame(&mut self, game: &mut dyn Game) {}

    /// Match end.
    fn on_end(&mut self, game: &mut dyn Game, is_winner: bool) {}

    /// A unit was created.
    fn on_unit_create(&mut self, game: &dyn Game, unit: &UnitView) {}

    /// A unit was destroyed.
    fn on_unit_destroy(&mut self, game: &dyn Game, unit: &UnitView) {}

    /// A unit finished construction or training.
    fn on_unit_complete(&mut self, game: &dyn Game, unit: &UnitView) {}

    /// A unit changed type.
    fn on_unit_morph(&mut self, game: &dyn Game, unit: &UnitView) {}

    /// A unit changed owner.
    fn on_unit_renegade(&mut self, game: &dyn Game, unit: &UnitView) {}

    /// A unit became visible.
    fn on_unit_show(&mut self, game: &dyn Game, unit: &UnitView) {}

    /// A unit stopped being visible.
    fn on_unit_hide(&mut self, game: &dyn Game, unit: &UnitView) {}
}

/// Privileged-action hook.
pub trait TournamentModule {
    /// Whether the host may carry out `action`.
    fn on_action(&mut self, action: &TournamentAction) -> bool;

    /// Called once when the module is first announced to players.
    fn on_first_advertisement(&mut self) {}
}

/// Manager handle shared by both adapters.
pub type SharedManager<C = SystemClock> = Rc<RefCell<TournamentManager<C>>>;

/// Build both adapters around one manager timed by the wall clock.
#[must_use]
pub fn attach(config: TelemetryConfig) -> (TournamentBot, TournamentGuard) {
    attach_with_clock(config, SystemClock)
}

/// Build both adapters around one manager with a custom clock.
pub fn attach_with_clock<C: Clock>(
    config: TelemetryConfig,
    clock: C,
) -> (TournamentBot<C>, TournamentGuard<C>) {
    let policy = ActionPolicy::new(config.allow_user_input);
    let manager = Rc::new(RefCell::new(TournamentManager::with_clock(config, clock)));
    (
        TournamentBot {
            manager: Rc::clone(&manager),
        },
        TournamentGuard { manager, policy },
    )
}

/// AI module adapter: forwards match callbacks to the manager.
pub struct TournamentBot<C: Clock = SystemClock> {
    manager: SharedManager<C>,
}

impl<C: Clock> TournamentBot<C> {
    /// The shared manager.
    #[must_use]
    pub fn manager(&self) -> &SharedManager<C> {
        &self.manager
    }

    /// Write the outcome now instead of waiting for the last handle to drop.
    pub fn teardown(&self) {
        self.with_manager("teardown", TournamentManager::finalize);
    }

    fn with_manager<F>(&self, callback: &'static str, f: F)
    where
        F: FnOnce(&mut TournamentManager<C>),
    {
        match self.manager.try_borrow_mut() {
            Ok(mut manager) => f(&mut manager),
            Err(_) => tracing::warn!(callback, "Re-entrant callback, skipped"),
        }
    }

    fn unit_event(&self, kind: UnitEventKind, game: &dyn Game, unit: &UnitView) {
        self.with_manager(kind.name(), |m| m.on_unit_event(kind, game, unit));
    }
}

impl<C: Clock> AiModule for TournamentBot<C> {
    fn on_start(&mut self, game: &mut dyn Game) {
        self.with_manager("on_start", |m| m.on_reset(game));
    }

    fn on_frame(&mut self, game: &mut dyn Game) {
        self.with_manager("on_frame", |m| m.on_frame(game));
    }

    fn on_end(&mut self, _game: &mut dyn Game, is_winner: bool) {
        self.with_manager("on_end", |m| m.on_end(is_winner));
    }

    fn on_unit_create(&mut self, game: &dyn Game, unit: &UnitView) {
        self.unit_event(UnitEventKind::Create, game, unit);
    }

    fn on_unit_destroy(&mut self, game: &dyn Game, unit: &UnitView) {
        self.unit_event(UnitEventKind::Destroy, game, unit);
    }

    fn on_unit_complete(&mut self, game: &dyn Game, unit: &UnitView) {
        self.unit_event(UnitEventKind::Complete, game, unit);
    }

    fn on_unit_morph(&mut self, game: &dyn Game, unit: &UnitView) {
        self.unit_event(UnitEventKind::Morph, game, unit);
    }

    fn on_unit_renegade(&mut self, game: &dyn Game, unit: &UnitView) {
        self.unit_event(UnitEventKind::Renegade, game, unit);
    }

    fn on_unit_show(&mut self, game: &dyn Game, unit: &UnitView) {
        self.unit_event(UnitEventKind::Show, game, unit);
    }

    fn on_unit_hide(&mut self, game: &dyn Game, unit: &UnitView) {
        self.unit_event(UnitEventKind::Hide, game, unit);
    }
}

/// Tournament module adapter: answers action approval requests.
pub struct TournamentGuard<C: Clock = SystemClock> {
    manager: SharedManager<C>,
    // The host may ask for approval from inside a bot callback, e.g. the
    // leave request issued on timeout, while the manager is still borrowed.
    policy: ActionPolicy,
}

impl<C: Clock> TournamentGuard<C> {
    /// The shared manager.
    #[must_use]
    pub fn manager(&self) -> &SharedManager<C> {
        &self.manager
    }
}

impl<C: Clock> TournamentModule for TournamentGuard<C> {
    fn on_action(&mut self, action: &TournamentAction) -> bool {
        match self.manager.try_borrow() {
            Ok(manager) => manager.on_action(action),
            Err(_) => self.policy.authorize(action),
        }
    }

    fn on_first_advertisement(&mut self) {
        tracing::debug!("Tournament module advertised");
    }
}
