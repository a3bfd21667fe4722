//! Scripted host world.
//!
//! [`ScriptedGame`] holds the world state a match script builds up and
//! exposes it through the same [`Game`] trait a real engine implements.
//! [`SimulatedClock`] stands in for the wall clock so frame times come
//! from the script rather than from how fast this process runs.

use std::cell::Cell;
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;
use std::time::{Duration, Instant};

use tm_core::clock::Clock;
use tm_core::host::{Game, PlayerId, PlayerStats, PlayerType, TournamentAction, UnitId, UnitView};
use tm_core::unit_events::UnitEventKind;

use crate::script::{MatchScript, ScriptAction, ScriptError};

/// Clock advanced by the match driver.
///
/// Clones share the same time.
#[derive(Debug, Clone)]
pub struct SimulatedClock {
    origin: Instant,
    elapsed: Rc<Cell<Duration>>,
}

impl SimulatedClock {
    /// Create a clock at zero simulated time.
    #[must_use]
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            elapsed: Rc::new(Cell::new(Duration::ZERO)),
        }
    }

    /// Let `by` pass.
    pub fn advance(&self, by: Duration) {
        self.elapsed.set(self.elapsed.get() + by);
    }

    /// Simulated time since creation.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.elapsed.get()
    }
}

impl Default for SimulatedClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SimulatedClock {
    fn now(&self) -> Instant {
        self.origin + self.elapsed.get()
    }
}

/// What applying a script action asks of the driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Applied {
    /// Deliver a unit lifecycle callback.
    Lifecycle(UnitEventKind, UnitView),
    /// Ask the tournament module for approval.
    Request(TournamentAction),
    /// World changed, nothing to deliver.
    Quiet,
}

/// World state of a scripted match.
#[derive(Debug, Clone)]
pub struct ScriptedGame {
    frame: u64,
    self_player: PlayerId,
    seats: HashMap<PlayerId, PlayerType>,
    stats: PlayerStats,
    units: BTreeMap<UnitId, UnitView>,
    local_speed: Option<i32>,
    leave_requested: bool,
}

impl ScriptedGame {
    /// Empty world for `script`'s seats.
    #[must_use]
    pub fn new(script: &MatchScript) -> Self {
        Self {
            frame: 0,
            self_player: script.self_player,
            seats: script
                .players
                .iter()
                .map(|slot| (slot.id, slot.player_type))
                .collect(),
            stats: PlayerStats::default(),
            units: BTreeMap::new(),
            local_speed: None,
            leave_requested: false,
        }
    }

    /// Move to `frame`.
    pub fn set_frame(&mut self, frame: u64) {
        self.frame = frame;
    }

    /// Speed the adapter last requested.
    #[must_use]
    pub fn local_speed(&self) -> Option<i32> {
        self.local_speed
    }

    /// Whether the adapter asked to leave.
    #[must_use]
    pub fn leave_requested(&self) -> bool {
        self.leave_requested
    }

    /// Observed player's counters.
    #[must_use]
    pub fn stats(&self) -> &PlayerStats {
        &self.stats
    }

    /// A unit by id, whoever owns it.
    #[must_use]
    pub fn unit(&self, id: UnitId) -> Option<&UnitView> {
        self.units.get(&id)
    }

    fn seat(&self, owner: PlayerId) -> PlayerType {
        self.seats.get(&owner).copied().unwrap_or(PlayerType::Unknown)
    }

    fn unit_mut(&mut self, id: UnitId) -> Result<&mut UnitView, ScriptError> {
        let frame = self.frame;
        self.units.get_mut(&id).ok_or_else(|| {
            ScriptError::Invalid(format!("unit {id} does not exist at frame {frame}"))
        })
    }

    fn lifecycle(&mut self, kind: UnitEventKind, id: UnitId) -> Result<Applied, ScriptError> {
        let unit = self.unit_mut(id)?.clone();
        Ok(Applied::Lifecycle(kind, unit))
    }

    /// Apply one script action to the world.
    pub fn apply(&mut self, action: &ScriptAction) -> Result<Applied, ScriptError> {
        match action {
            ScriptAction::Spawn {
                id,
                unit_type,
                owner,
                position,
            } => {
                if self.units.contains_key(id) {
                    return Err(ScriptError::Invalid(format!("unit {id} spawned twice")));
                }
                let unit = UnitView::new(*id, unit_type.as_str(), *owner, self.seat(*owner), *position);
                self.units.insert(*id, unit.clone());
                Ok(Applied::Lifecycle(UnitEventKind::Create, unit))
            }
            ScriptAction::Destroy { id } => {
                let frame = self.frame;
                let unit = self.units.remove(id).ok_or_else(|| {
                    ScriptError::Invalid(format!("unit {id} does not exist at frame {frame}"))
                })?;
                Ok(Applied::Lifecycle(UnitEventKind::Destroy, unit))
            }
            ScriptAction::Morph { id, unit_type } => {
                self.unit_mut(*id)?.type_name.clone_from(unit_type);
                self.lifecycle(UnitEventKind::Morph, *id)
            }
            ScriptAction::Renegade { id, owner } => {
                let owner_type = self.seat(*owner);
                let unit = self.unit_mut(*id)?;
                unit.owner = *owner;
                unit.owner_type = owner_type;
                self.lifecycle(UnitEventKind::Renegade, *id)
            }
            ScriptAction::Complete { id } => self.lifecycle(UnitEventKind::Complete, *id),
            ScriptAction::Show { id } => self.lifecycle(UnitEventKind::Show, *id),
            ScriptAction::Hide { id } => self.lifecycle(UnitEventKind::Hide, *id),
            ScriptAction::Order {
                id,
                order,
                target,
                target_position,
            } => {
                let unit = self.unit_mut(*id)?;
                unit.order = *order;
                unit.target = *target;
                unit.target_position = target_position.unwrap_or(unit.position);
                Ok(Applied::Quiet)
            }
            ScriptAction::Move { id, position } => {
                self.unit_mut(*id)?.position = *position;
                Ok(Applied::Quiet)
            }
            ScriptAction::Resources {
                gathered_minerals,
                spent_minerals,
                gathered_gas,
                spent_gas,
            } => {
                let frame = self.frame;
                accumulate(&mut self.stats.gathered_minerals, *gathered_minerals, "gathered minerals", frame)?;
                accumulate(&mut self.stats.spent_minerals, *spent_minerals, "spent minerals", frame)?;
                accumulate(&mut self.stats.gathered_gas, *gathered_gas, "gathered gas", frame)?;
                accumulate(&mut self.stats.spent_gas, *spent_gas, "spent gas", frame)?;
                Ok(Applied::Quiet)
            }
            ScriptAction::Supply { used, total } => {
                self.stats.supply_used = *used;
                self.stats.supply_total = *total;
                Ok(Applied::Quiet)
            }
            ScriptAction::Score {
                building,
                kill,
                razing,
                unit,
            } => {
                let frame = self.frame;
                accumulate(&mut self.stats.building_score, *building, "building score", frame)?;
                accumulate(&mut self.stats.kill_score, *kill, "kill score", frame)?;
                accumulate(&mut self.stats.razing_score, *razing, "razing score", frame)?;
                accumulate(&mut self.stats.unit_score, *unit, "unit score", frame)?;
                Ok(Applied::Quiet)
            }
            ScriptAction::Request(action) => Ok(Applied::Request(*action)),
        }
    }
}

fn accumulate(total: &mut i32, amount: i32, counter: &str, frame: u64) -> Result<(), ScriptError> {
    *total = total
        .checked_add(amount)
        .ok_or_else(|| ScriptError::Invalid(format!("{counter} overflows at frame {frame}")))?;
    Ok(())
}

impl Game for ScriptedGame {
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
        self.units
            .values()
            .filter(|unit| unit.owner == self.self_player)
            .cloned()
            .collect()
    }

    fn set_local_speed(&mut self, speed: i32) {
        tracing::debug!(speed, "Local speed set");
        self.local_speed = Some(speed);
    }

    fn leave_game(&mut self) {
        tracing::debug!(frame = self.frame, "Leave requested");
        self.leave_requested = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tm_core::host::Position;

    fn world() -> ScriptedGame {
        ScriptedGame::new(&MatchScript::default())
    }

    fn spawn(id: UnitId, owner: PlayerId) -> ScriptAction {
        ScriptAction::Spawn {
            id,
            unit_type: "Zerg_Larva".into(),
            owner,
            position: Position::new(64, 96),
        }
    }

    #[test]
    fn test_spawn_uses_seat_type() {
        let mut game = world();
        let applied = game.apply(&spawn(1, 11)).unwrap();
        match applied {
            Applied::Lifecycle(UnitEventKind::Create, unit) => {
                assert_eq!(unit.owner_type, PlayerType::Neutral);
                assert_eq!(unit.target_position, Position::new(64, 96));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_self_units_only_observed_player() {
        let mut game = world();
        game.apply(&spawn(2, 0)).unwrap();
        game.apply(&spawn(1, 1)).unwrap();
        game.apply(&spawn(3, 0)).unwrap();
        let ids: Vec<UnitId> = game.self_units().iter().map(|u| u.id).collect();
        assert_eq!(ids, vec![2, 3]);
    }

    #[test]
    fn test_destroy_reports_last_state() {
        let mut game = world();
        game.apply(&spawn(1, 0)).unwrap();
        game.apply(&ScriptAction::Move {
            id: 1,
            position: Position::new(5, 6),
        })
        .unwrap();
        let applied = game.apply(&ScriptAction::Destroy { id: 1 }).unwrap();
        match applied {
            Applied::Lifecycle(UnitEventKind::Destroy, unit) => {
                assert_eq!(unit.position, Position::new(5, 6));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(game.unit(1).is_none());
    }

    #[test]
    fn test_morph_and_renegade() {
        let mut game = world();
        game.apply(&spawn(1, 1)).unwrap();
        game.apply(&ScriptAction::Morph {
            id: 1,
            unit_type: "Zerg_Drone".into(),
        })
        .unwrap();
        game.apply(&ScriptAction::Renegade { id: 1, owner: 0 }).unwrap();
        let unit = game.unit(1).unwrap();
        assert_eq!(unit.type_name, "Zerg_Drone");
        assert_eq!(unit.owner, 0);
        assert_eq!(game.self_units().len(), 1);
    }

    #[test]
    fn test_order_defaults_target_position() {
        let mut game = world();
        game.apply(&spawn(1, 0)).unwrap();
        let applied = game
            .apply(&ScriptAction::Order {
                id: 1,
                order: 3,
                target: Some(9),
                target_position: None,
            })
            .unwrap();
        assert_eq!(applied, Applied::Quiet);
        let unit = game.unit(1).unwrap();
        assert_eq!(unit.order, 3);
        assert_eq!(unit.target, Some(9));
        assert_eq!(unit.target_position, unit.position);
    }

    #[test]
    fn test_counters_accumulate() {
        let mut game = world();
        let gather = ScriptAction::Resources {
            gathered_minerals: 8,
            spent_minerals: 0,
            gathered_gas: 4,
            spent_gas: 0,
        };
        game.apply(&gather).unwrap();
        game.apply(&gather).unwrap();
        game.apply(&ScriptAction::Score {
            building: 0,
            kill: 50,
            razing: 0,
            unit: 0,
        })
        .unwrap();
        assert_eq!(game.stats().gathered_minerals, 16);
        assert_eq!(game.stats().gathered_gas, 8);
        assert_eq!(game.stats().kill_score, 50);
    }

    #[test]
    fn test_unknown_unit_is_an_error() {
        let mut game = world();
        assert!(game.apply(&ScriptAction::Hide { id: 4 }).is_err());
        assert!(game.apply(&ScriptAction::Destroy { id: 4 }).is_err());
    }

    #[test]
    fn test_counter_overflow_is_an_error() {
        let mut game = world();
        let flood = ScriptAction::Resources {
            gathered_minerals: i32::MAX,
            spent_minerals: 0,
            gathered_gas: 0,
            spent_gas: 0,
        };
        game.apply(&flood).unwrap();
        let err = game.apply(&flood).unwrap_err();
        assert!(matches!(err, ScriptError::Invalid(ref msg) if msg.contains("gathered minerals")));
        assert_eq!(game.stats().gathered_minerals, i32::MAX);

        let score = ScriptAction::Score {
            building: 0,
            kill: i32::MIN,
            razing: 0,
            unit: 0,
        };
        game.apply(&score).unwrap();
        assert!(game.apply(&score).is_err());
    }

    #[test]
    fn test_host_requests_recorded() {
        let mut game = world();
        game.set_local_speed(0);
        game.leave_game();
        assert_eq!(game.local_speed(), Some(0));
        assert!(game.leave_requested());
    }

    #[test]
    fn test_simulated_clock() {
        let clock = SimulatedClock::new();
        let shared = clock.clone();
        let start = shared.now();
        clock.advance(Duration::from_millis(42));
        assert_eq!(shared.now() - start, Duration::from_millis(42));
        assert_eq!(shared.elapsed(), Duration::from_millis(42));
    }
}
