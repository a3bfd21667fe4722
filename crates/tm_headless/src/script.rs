//! Match script loading and validation.
//!
//! A match script is a RON file describing one match from the observed
//! player's seat: who plays, how long each frame takes, what happens on which
//! frame, and how the host reports the end of the match.
//!
//! ```ron
//! (
//!     name: "marine_rush",
//!     players: [(id: 0, player_type: Player), (id: 1, player_type: Player)],
//!     frames: 96,
//!     frame_time_ms: 42,
//!     events: [
//!         (frame: 0, action: Spawn(id: 1, unit_type: "Terran_Marine", owner: 0, position: (x: 100, y: 100))),
//!         (frame: 5, action: Order(id: 1, order: 6, target: None, target_position: Some((x: 900, y: 400)))),
//!     ],
//!     result: Some(true),
//! )
//! ```

use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tm_core::host::{OrderId, PlayerId, PlayerType, Position, TournamentAction, UnitId};

/// Error type for script operations.
#[derive(Error, Debug)]
pub enum ScriptError {
    /// File not found.
    #[error("Script file not found: {0}")]
    FileNotFound(String),
    /// Failed to read file.
    #[error("Failed to read script file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse RON.
    #[error("Failed to parse script: {0}")]
    ParseError(#[from] ron::error::SpannedError),
    /// Script parsed but describes an impossible match.
    #[error("Invalid script: {0}")]
    Invalid(String),
}

/// Default simulated frame duration, the host's fastest game speed.
pub const DEFAULT_FRAME_TIME_MS: u64 = 42;

/// One seat in the match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSlot {
    /// Player id.
    pub id: PlayerId,
    /// Seat type.
    pub player_type: PlayerType,
}

impl PlayerSlot {
    /// Create a slot.
    #[must_use]
    pub const fn new(id: PlayerId, player_type: PlayerType) -> Self {
        Self { id, player_type }
    }
}

/// Something that happens in the world.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScriptAction {
    /// A unit appears.
    Spawn {
        /// New unit id.
        id: UnitId,
        /// Unit type name.
        unit_type: String,
        /// Owning player.
        owner: PlayerId,
        /// Spawn position.
        position: Position,
    },
    /// A unit finishes construction.
    Complete {
        /// Unit id.
        id: UnitId,
    },
    /// A unit dies.
    Destroy {
        /// Unit id.
        id: UnitId,
    },
    /// A unit changes type.
    Morph {
        /// Unit id.
        id: UnitId,
        /// New unit type name.
        unit_type: String,
    },
    /// A unit changes owner.
    Renegade {
        /// Unit id.
        id: UnitId,
        /// New owner.
        owner: PlayerId,
    },
    /// A unit becomes visible.
    Show {
        /// Unit id.
        id: UnitId,
    },
    /// A unit stops being visible.
    Hide {
        /// Unit id.
        id: UnitId,
    },
    /// A unit receives a new order.
    Order {
        /// Unit id.
        id: UnitId,
        /// Order kind.
        order: OrderId,
        /// Target unit.
        #[serde(default)]
        target: Option<UnitId>,
        /// Target position; the unit's own position when absent.
        #[serde(default)]
        target_position: Option<Position>,
    },
    /// A unit moves.
    Move {
        /// Unit id.
        id: UnitId,
        /// New position.
        position: Position,
    },
    /// Add to the observed player's resource counters.
    Resources {
        /// Minerals gathered.
        #[serde(default)]
        gathered_minerals: i32,
        /// Minerals spent.
        #[serde(default)]
        spent_minerals: i32,
        /// Gas gathered.
        #[serde(default)]
        gathered_gas: i32,
        /// Gas spent.
        #[serde(default)]
        spent_gas: i32,
    },
    /// Set the observed player's supply.
    Supply {
        /// Supply in use.
        used: i32,
        /// Supply available.
        total: i32,
    },
    /// Add to the observed player's scores.
    Score {
        /// Building score.
        #[serde(default)]
        building: i32,
        /// Kill score.
        #[serde(default)]
        kill: i32,
        /// Razing score.
        #[serde(default)]
        razing: i32,
        /// Unit score.
        #[serde(default)]
        unit: i32,
    },
    /// Ask the tournament module to approve an action.
    Request(TournamentAction),
}

/// An action scheduled for a frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptEvent {
    /// Frame the action happens on, before the frame callback.
    pub frame: u64,
    /// What happens.
    pub action: ScriptAction,
}

impl ScriptEvent {
    /// Create an event.
    #[must_use]
    pub const fn new(frame: u64, action: ScriptAction) -> Self {
        Self { frame, action }
    }
}

fn default_frame_time_ms() -> u64 {
    DEFAULT_FRAME_TIME_MS
}

/// A complete match description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchScript {
    /// Script name.
    pub name: String,
    /// Player the adapter observes.
    #[serde(default)]
    pub self_player: PlayerId,
    /// All seats, including neutral.
    pub players: Vec<PlayerSlot>,
    /// Frames the host plays unless the adapter leaves first.
    pub frames: u64,
    /// Simulated duration of every frame.
    #[serde(default = "default_frame_time_ms")]
    pub frame_time_ms: u64,
    /// Per-frame duration overrides.
    #[serde(default)]
    pub frame_time_overrides: BTreeMap<u64, u64>,
    /// Timeline, in any order.
    #[serde(default)]
    pub events: Vec<ScriptEvent>,
    /// End report: won, lost, or `None` for a host that dies without one.
    #[serde(default)]
    pub result: Option<bool>,
}

impl Default for MatchScript {
    fn default() -> Self {
        Self {
            name: "Empty 1v1".to_string(),
            self_player: 0,
            players: vec![
                PlayerSlot::new(0, PlayerType::Player),
                PlayerSlot::new(1, PlayerType::Player),
                PlayerSlot::new(11, PlayerType::Neutral),
            ],
            frames: 240,
            frame_time_ms: DEFAULT_FRAME_TIME_MS,
            frame_time_overrides: BTreeMap::new(),
            events: Vec::new(),
            result: Some(true),
        }
    }
}

impl MatchScript {
    /// Load a script from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ScriptError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ScriptError::FileNotFound(path.display().to_string()));
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_ron_str(&contents)
    }

    /// Load from a RON string.
    pub fn from_ron_str(ron: &str) -> Result<Self, ScriptError> {
        let script: MatchScript = ron::from_str(ron)?;
        Ok(script)
    }

    /// Simulated duration of `frame`.
    #[must_use]
    pub fn frame_time(&self, frame: u64) -> Duration {
        let ms = self
            .frame_time_overrides
            .get(&frame)
            .copied()
            .unwrap_or(self.frame_time_ms);
        Duration::from_millis(ms)
    }

    /// Seat type of a player, if seated.
    #[must_use]
    pub fn player_type(&self, id: PlayerId) -> Option<PlayerType> {
        self.players
            .iter()
            .find(|slot| slot.id == id)
            .map(|slot| slot.player_type)
    }

    /// Events ordered by frame, keeping file order within a frame.
    #[must_use]
    pub fn timeline(&self) -> Vec<&ScriptEvent> {
        let mut events: Vec<&ScriptEvent> = self.events.iter().collect();
        events.sort_by_key(|event| event.frame);
        events
    }

    /// Check that the script describes a playable match.
    ///
    /// Unit references are checked against earlier spawns in timeline
    /// order, so a unit must exist before anything happens to it.
    pub fn validate(&self) -> Result<(), ScriptError> {
        if self.frames == 0 {
            return Err(ScriptError::Invalid("match has no frames".into()));
        }
        let mut seen = HashSet::new();
        for slot in &self.players {
            if !seen.insert(slot.id) {
                return Err(ScriptError::Invalid(format!(
                    "player {} seated twice",
                    slot.id
                )));
            }
        }
        if self.player_type(self.self_player).is_none() {
            return Err(ScriptError::Invalid(format!(
                "observed player {} has no seat",
                self.self_player
            )));
        }

        let mut alive = HashSet::new();
        for event in self.timeline() {
            if event.frame >= self.frames {
                return Err(ScriptError::Invalid(format!(
                    "event at frame {} is past the last frame {}",
                    event.frame,
                    self.frames - 1
                )));
            }
            match &event.action {
                ScriptAction::Spawn { id, owner, .. } => {
                    self.require_player(*owner, event.frame)?;
                    if !alive.insert(*id) {
                        return Err(ScriptError::Invalid(format!(
                            "unit {id} spawned twice (frame {})",
                            event.frame
                        )));
                    }
                }
                ScriptAction::Destroy { id } => {
                    if !alive.remove(id) {
                        return Err(unknown_unit(*id, event.frame));
                    }
                }
                ScriptAction::Renegade { id, owner } => {
                    self.require_player(*owner, event.frame)?;
                    if !alive.contains(id) {
                        return Err(unknown_unit(*id, event.frame));
                    }
                }
                ScriptAction::Complete { id }
                | ScriptAction::Morph { id, .. }
                | ScriptAction::Show { id }
                | ScriptAction::Hide { id }
                | ScriptAction::Order { id, .. }
                | ScriptAction::Move { id, .. } => {
                    if !alive.contains(id) {
                        return Err(unknown_unit(*id, event.frame));
                    }
                }
                ScriptAction::Resources { .. }
                | ScriptAction::Supply { .. }
                | ScriptAction::Score { .. }
                | ScriptAction::Request(_) => {}
            }
        }
        Ok(())
    }

    fn require_player(&self, id: PlayerId, frame: u64) -> Result<(), ScriptError> {
        match self.player_type(id) {
            Some(_) => Ok(()),
            None => Err(ScriptError::Invalid(format!(
                "player {id} has no seat (frame {frame})"
            ))),
        }
    }
}

fn unknown_unit(id: UnitId, frame: u64) -> ScriptError {
    ScriptError::Invalid(format!("unit {id} does not exist at frame {frame}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spawn(frame: u64, id: UnitId, owner: PlayerId) -> ScriptEvent {
        ScriptEvent::new(
            frame,
            ScriptAction::Spawn {
                id,
                unit_type: "Terran_Marine".into(),
                owner,
                position: Position::new(0, 0),
            },
        )
    }

    #[test]
    fn test_default_script_is_valid() {
        assert!(MatchScript::default().validate().is_ok());
    }

    #[test]
    fn test_parse_ron() {
        let ron = r#"(
            name: "tiny",
            players: [(id: 0, player_type: Player), (id: 1, player_type: Computer)],
            frames: 48,
            frame_time_overrides: {10: 120},
            events: [
                (frame: 0, action: Spawn(id: 5, unit_type: "Zerg_Drone", owner: 0, position: (x: 10, y: 20))),
                (frame: 3, action: Order(id: 5, order: 2)),
                (frame: 4, action: Resources(gathered_minerals: 8)),
                (frame: 6, action: Request(EnableFlag(CompleteMapInformation))),
            ],
        )"#;
        let script = MatchScript::from_ron_str(ron).unwrap();
        assert_eq!(script.name, "tiny");
        assert_eq!(script.frame_time_ms, DEFAULT_FRAME_TIME_MS);
        assert_eq!(script.frame_time(10), Duration::from_millis(120));
        assert_eq!(script.frame_time(11), Duration::from_millis(42));
        assert_eq!(script.result, None);
        assert_eq!(script.events.len(), 4);
        assert!(script.validate().is_ok());
    }

    #[test]
    fn test_parse_error() {
        let err = MatchScript::from_ron_str("(name: ").unwrap_err();
        assert!(matches!(err, ScriptError::ParseError(_)));
    }

    #[test]
    fn test_load_missing_file() {
        let err = MatchScript::load("/nonexistent/match.ron").unwrap_err();
        assert!(matches!(err, ScriptError::FileNotFound(_)));
    }

    #[test]
    fn test_timeline_is_stable() {
        let mut script = MatchScript::default();
        script.events = vec![spawn(5, 2, 0), spawn(1, 1, 0), spawn(5, 3, 1)];
        let frames: Vec<u64> = script.timeline().iter().map(|e| e.frame).collect();
        assert_eq!(frames, vec![1, 5, 5]);
        match &script.timeline()[1].action {
            ScriptAction::Spawn { id, .. } => assert_eq!(*id, 2),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_validate_rejects_unknown_unit() {
        let mut script = MatchScript::default();
        script.events = vec![ScriptEvent::new(3, ScriptAction::Show { id: 9 })];
        assert!(matches!(script.validate(), Err(ScriptError::Invalid(_))));
    }

    #[test]
    fn test_validate_rejects_use_after_destroy() {
        let mut script = MatchScript::default();
        script.events = vec![
            spawn(0, 1, 0),
            ScriptEvent::new(2, ScriptAction::Destroy { id: 1 }),
            ScriptEvent::new(4, ScriptAction::Hide { id: 1 }),
        ];
        assert!(script.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_event_past_end() {
        let mut script = MatchScript::default();
        script.events = vec![spawn(script.frames, 1, 0)];
        assert!(script.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_unseated_owner() {
        let mut script = MatchScript::default();
        script.events = vec![spawn(0, 1, 7)];
        assert!(script.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_missing_self_seat() {
        let script = MatchScript {
            self_player: 4,
            ..MatchScript::default()
        };
        assert!(script.validate().is_err());
    }
}
