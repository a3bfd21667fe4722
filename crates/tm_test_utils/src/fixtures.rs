//! Test fixtures and helpers.
//!
//! A hand-driven clock and an in-memory host for exercising the adapter
//! without a game engine.

use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

use tm_core::clock::Clock;
use tm_core::host::{
    Game, OrderId, PlayerId, PlayerStats, PlayerType, Position, UnitId, UnitView,
};

/// Player id the fake host observes.
pub const SELF_PLAYER: PlayerId = 0;
/// Player id of the opponent.
pub const ENEMY_PLAYER: PlayerId = 1;
/// Player id owning neutral units.
pub const NEUTRAL_PLAYER: PlayerId = 11;

/// Clock that only moves when told to.
///
/// Clones share the same time, so a test can keep one handle and give
/// another to the manager.
#[derive(Debug, Clone)]
pub struct ManualClock {
    origin: Instant,
    offset: Rc<Cell<Duration>>,
}

impl ManualClock {
    /// Create a clock stopped at an arbitrary origin.
    #[must_use]
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            offset: Rc::new(Cell::new(Duration::ZERO)),
        }
    }

    /// Move time forward.
    pub fn advance(&self, by: Duration) {
        self.offset.set(self.offset.get() + by);
    }

    /// Time elapsed since the origin.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.offset.get()
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + self.offset.get()
    }
}

/// In-memory host with public, directly editable state.
#[derive(Debug, Clone, Default)]
pub struct FakeGame {
    /// Current frame index.
    pub frame: u64,
    /// Observed player.
    pub self_player: PlayerId,
    /// Observed player's counters.
    pub stats: PlayerStats,
    /// Observed player's units.
    pub units: Vec<UnitView>,
    /// Last speed requested by the adapter.
    pub local_speed: Option<i32>,
    /// Whether the adapter asked to leave.
    pub left: bool,
    /// How many times the adapter asked to leave.
    pub leave_requests: u32,
}

impl FakeGame {
    /// Empty match at frame 0 observing [`SELF_PLAYER`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mutable access to one of the observed player's units.
    ///
    /// # Panics
    ///
    /// Panics if no such unit exists.
    pub fn unit_mut(&mut self, id: UnitId) -> &mut UnitView {
        self.units
            .iter_mut()
            .find(|u| u.id == id)
            .unwrap_or_else(|| panic!("no unit {id}"))
    }
}

impl Game for FakeGame {
    fn frame_count(&self) -> u64 {
        self.frame
    }

    fn self_player(&self) -> PlayerId {
        self.self_player
    }

    fn self_stats(&self) -> PlayerStats {
        self.stats
    }

    fn self_units(&self) -> Vec<UnitView> {
        self.units.clone()
    }

    fn set_local_speed(&mut self, speed: i32) {
        self.local_speed = Some(speed);
    }

    fn leave_game(&mut self) {
        self.left = true;
        self.leave_requests += 1;
    }
}

/// A unit owned by [`SELF_PLAYER`].
#[must_use]
pub fn own_unit(id: UnitId, type_name: &str, x: i32, y: i32) -> UnitView {
    UnitView::new(id, type_name, SELF_PLAYER, PlayerType::Player, Position::new(x, y))
}

/// A unit owned by [`ENEMY_PLAYER`].
#[must_use]
pub fn enemy_unit(id: UnitId, type_name: &str, x: i32, y: i32) -> UnitView {
    UnitView::new(id, type_name, ENEMY_PLAYER, PlayerType::Player, Position::new(x, y))
}

/// A unit owned by [`NEUTRAL_PLAYER`].
#[must_use]
pub fn neutral_unit(id: UnitId, type_name: &str, x: i32, y: i32) -> UnitView {
    UnitView::new(id, type_name, NEUTRAL_PLAYER, PlayerType::Neutral, Position::new(x, y))
}

/// Give a unit a new order.
pub fn command(unit: &mut UnitView, order: OrderId, target: Option<UnitId>, target_position: Position) {
    unit.order = order;
    unit.target = target;
    unit.target_position = target_position;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_shared_between_clones() {
        let clock = ManualClock::new();
        let other = clock.clone();
        let start = other.now();
        clock.advance(Duration::from_millis(25));
        assert_eq!(other.now() - start, Duration::from_millis(25));
    }

    #[test]
    fn test_fake_game_records_requests() {
        let mut game = FakeGame::new();
        game.set_local_speed(0);
        game.leave_game();
        game.leave_game();
        assert_eq!(game.local_speed, Some(0));
        assert_eq!(game.leave_requests, 2);
    }
}
