//! Unit lifecycle event log.
//!
//! Lifecycle callbacks are written straight through, one CSV row per event,
//! after a per-kind ownership filter:
//!
//! | Event                      | Logged when                                   |
//! |----------------------------|-----------------------------------------------|
//! | create, complete           | owner is a competitive player                 |
//! | show, hide                 | owner is a competitive player other than self |
//! | destroy, morph, renegade   | always                                        |

use serde::{Deserialize, Serialize};

use crate::host::{PlayerType, Position, UnitId, UnitView};

/// Header line of the unit event CSV.
pub const UNIT_EVENTS_HEADER: &str =
    "frame_number,event_type,player_owned,unit_id,unit_type,unit_position";

/// Kinds of unit lifecycle callbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitEventKind {
    /// A unit was created.
    Create,
    /// A unit was destroyed.
    Destroy,
    /// A unit finished construction or training.
    Complete,
    /// A unit changed type.
    Morph,
    /// A unit changed owner.
    Renegade,
    /// A unit became visible.
    Show,
    /// A unit stopped being visible.
    Hide,
}

impl UnitEventKind {
    /// All kinds, in callback declaration order.
    pub const ALL: [Self; 7] = [
        Self::Create,
        Self::Destroy,
        Self::Complete,
        Self::Morph,
        Self::Renegade,
        Self::Show,
        Self::Hide,
    ];

    /// Name written to the `event_type` column.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Create => "unitCreate",
            Self::Destroy => "unitDestroy",
            Self::Complete => "unitComplete",
            Self::Morph => "unitMorph",
            Self::Renegade => "unitRenegade",
            Self::Show => "unitShow",
            Self::Hide => "unitHide",
        }
    }

    /// Whether an event of this kind for a unit with the given owner is logged.
    #[must_use]
    pub const fn should_log(self, owned_by_self: bool, owner_type: PlayerType) -> bool {
        match self {
            Self::Create | Self::Complete => owner_type.is_competitive(),
            Self::Show | Self::Hide => !owned_by_self && owner_type.is_competitive(),
            Self::Destroy | Self::Morph | Self::Renegade => true,
        }
    }
}

/// One row of the unit event CSV.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitEventRow {
    /// Frame index + 1.
    pub frame_number: u64,
    /// Event kind.
    pub kind: UnitEventKind,
    /// Whether the unit belongs to the observed player.
    pub player_owned: bool,
    /// Unit identity.
    pub unit_id: UnitId,
    /// Unit type name.
    pub unit_type: String,
    /// Unit position.
    pub unit_position: Position,
}

impl UnitEventRow {
    /// Build the row for `unit` at `frame`.
    #[must_use]
    pub fn new(frame: u64, kind: UnitEventKind, player_owned: bool, unit: &UnitView) -> Self {
        Self {
            frame_number: frame + 1,
            kind,
            player_owned,
            unit_id: unit.id,
            unit_type: unit.type_name.clone(),
            unit_position: unit.position,
        }
    }

    /// Render the row; the position is quoted since it contains a comma.
    #[must_use]
    pub fn to_csv_line(&self) -> String {
        format!(
            "{},{},{},{},{},\"{}\"",
            self.frame_number,
            self.kind.name(),
            self.player_owned,
            self.unit_id,
            self.unit_type,
            self.unit_position,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_format() {
        let unit = UnitView::new(
            17,
            "Protoss_Zealot",
            1,
            PlayerType::Player,
            Position::new(320, 96),
        );
        let row = UnitEventRow::new(99, UnitEventKind::Destroy, false, &unit);
        assert_eq!(
            row.to_csv_line(),
            "100,unitDestroy,false,17,Protoss_Zealot,\"(320,96)\""
        );
    }

    #[test]
    fn test_create_and_complete_need_competitive_owner() {
        for kind in [UnitEventKind::Create, UnitEventKind::Complete] {
            assert!(kind.should_log(true, PlayerType::Player));
            assert!(kind.should_log(false, PlayerType::Player));
            assert!(!kind.should_log(false, PlayerType::Neutral));
            assert!(!kind.should_log(false, PlayerType::RescuePassive));
            assert!(!kind.should_log(false, PlayerType::Observer));
        }
    }

    #[test]
    fn test_show_and_hide_only_for_enemies() {
        for kind in [UnitEventKind::Show, UnitEventKind::Hide] {
            assert!(kind.should_log(false, PlayerType::Player));
            assert!(!kind.should_log(true, PlayerType::Player));
            assert!(!kind.should_log(false, PlayerType::Neutral));
        }
    }

    #[test]
    fn test_destroy_morph_renegade_unconditional() {
        for kind in [
            UnitEventKind::Destroy,
            UnitEventKind::Morph,
            UnitEventKind::Renegade,
        ] {
            assert!(kind.should_log(true, PlayerType::Neutral));
            assert!(kind.should_log(false, PlayerType::Unknown));
        }
    }

    #[test]
    fn test_names_are_distinct() {
        let mut names: Vec<_> = UnitEventKind::ALL.iter().map(|k| k.name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), UnitEventKind::ALL.len());
    }
}
