//! Model of the game host the adapter attaches to.
//!
//! The host owns the simulation. Each callback hands the adapter a [`Game`]
//! handle that exposes a read-only snapshot of the observed player (economy,
//! scores, friendly units) plus the two requests the adapter is allowed to
//! make: changing the local speed and leaving the game.
//!
//! Units are passed around as [`UnitView`] snapshots. A view is only valid
//! for the callback it was delivered in; the adapter keys everything it
//! remembers by [`UnitId`], never by reference.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable identifier of a unit for the lifetime of a match.
pub type UnitId = i32;

/// Identifier of a player slot.
pub type PlayerId = i32;

/// Numeric order kind as reported by the host.
pub type OrderId = u32;

/// Order id the host reports for idle units.
pub const ORDER_NOTHING: OrderId = 0;

/// A map position in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Position {
    /// Horizontal pixel coordinate.
    pub x: i32,
    /// Vertical pixel coordinate.
    pub y: i32,
}

impl Position {
    /// Origin, also what the host reports for "no target position".
    pub const ORIGIN: Self = Self { x: 0, y: 0 };

    /// Create a new position.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.x, self.y)
    }
}

/// Kind of participant occupying a player slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PlayerType {
    /// A competing participant (bot or human).
    #[default]
    Player,
    /// Built-in computer opponent.
    Computer,
    /// Map-owned neutral units (minerals, critters).
    Neutral,
    /// Rescuable units that stay passive.
    RescuePassive,
    /// Rescuable units that defend themselves.
    RescueActive,
    /// Spectator slot.
    Observer,
    /// A player that has left the match.
    PlayerLeft,
    /// A computer that has left the match.
    ComputerLeft,
    /// Closed slot.
    Closed,
    /// Anything the host could not classify.
    Unknown,
}

impl PlayerType {
    /// Whether units of this owner count as a genuine competitive player.
    #[must_use]
    pub const fn is_competitive(self) -> bool {
        matches!(self, Self::Player)
    }
}

/// Snapshot of a single unit as seen during one callback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitView {
    /// Stable unit identity.
    pub id: UnitId,
    /// Human-readable unit type, e.g. `Protoss_Probe`.
    pub type_name: String,
    /// Owning player.
    pub owner: PlayerId,
    /// Kind of the owning player.
    pub owner_type: PlayerType,
    /// Current position.
    pub position: Position,
    /// Current order.
    pub order: OrderId,
    /// Target unit of the current order, if it still exists.
    pub target: Option<UnitId>,
    /// Target position of the current order.
    pub target_position: Position,
}

impl UnitView {
    /// Create an idle unit with no target.
    #[must_use]
    pub fn new(
        id: UnitId,
        type_name: impl Into<String>,
        owner: PlayerId,
        owner_type: PlayerType,
        position: Position,
    ) -> Self {
        Self {
            id,
            type_name: type_name.into(),
            owner,
            owner_type,
            position,
            order: ORDER_NOTHING,
            target: None,
            target_position: position,
        }
    }
}

/// Cumulative counters for the observed player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PlayerStats {
    /// Total minerals gathered so far.
    pub gathered_minerals: i32,
    /// Total minerals spent so far.
    pub spent_minerals: i32,
    /// Total gas gathered so far.
    pub gathered_gas: i32,
    /// Total gas spent so far.
    pub spent_gas: i32,
    /// Supply currently used.
    pub supply_used: i32,
    /// Supply currently available.
    pub supply_total: i32,
    /// Building score.
    pub building_score: i32,
    /// Kill score.
    pub kill_score: i32,
    /// Razing score.
    pub razing_score: i32,
    /// Unit score.
    pub unit_score: i32,
}

/// Live view of the running match, supplied by the host on every callback.
pub trait Game {
    /// Index of the current frame, starting at 0.
    fn frame_count(&self) -> u64;

    /// The player this adapter observes.
    fn self_player(&self) -> PlayerId;

    /// Current cumulative counters of the observed player.
    fn self_stats(&self) -> PlayerStats;

    /// Units currently owned by the observed player.
    fn self_units(&self) -> Vec<UnitView>;

    /// Ask the host to run at the given local speed.
    fn set_local_speed(&mut self, speed: i32);

    /// Ask the host to end the match for the observed player.
    fn leave_game(&mut self);
}

/// Game flags a module may try to enable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Flag {
    /// Full map vision.
    CompleteMapInformation,
    /// Accept keyboard and mouse input from the local user.
    UserInput,
    /// Any other flag, by raw id.
    Other(i32),
}

/// Privileged actions the host asks the tournament module to approve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TournamentAction {
    /// Enable a game flag.
    EnableFlag(Flag),
    /// Leave the match.
    LeaveGame,
    /// Toggle latency compensation.
    SetLatCom,
    /// Change on-screen text size.
    SetTextSize,
    /// Send a chat message.
    SendText,
    /// Print to the local screen.
    Printf,
    /// Change the command optimizer level.
    SetCommandOptimizationLevel,
    /// Pause the match.
    PauseGame,
    /// Resume the match.
    ResumeGame,
    /// Change local game speed.
    SetLocalSpeed,
    /// Change frame skip.
    SetFrameSkip,
    /// Change the map for the next game.
    SetMap,
    /// Toggle the game GUI.
    SetGui,
    /// Change alliances.
    SetAlliance,
    /// Share vision.
    SetVision,
    /// Any other action, by raw id.
    Other(i32),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_display() {
        assert_eq!(Position::new(120, -4).to_string(), "(120,-4)");
    }

    #[test]
    fn test_only_players_are_competitive() {
        assert!(PlayerType::Player.is_competitive());
        for other in [
            PlayerType::Computer,
            PlayerType::Neutral,
            PlayerType::RescuePassive,
            PlayerType::Observer,
            PlayerType::Unknown,
        ] {
            assert!(!other.is_competitive(), "{other:?}");
        }
    }

    #[test]
    fn test_new_unit_is_idle() {
        let unit = UnitView::new(7, "Terran_SCV", 0, PlayerType::Player, Position::new(5, 6));
        assert_eq!(unit.order, ORDER_NOTHING);
        assert_eq!(unit.target, None);
        assert_eq!(unit.target_position, unit.position);
    }
}
