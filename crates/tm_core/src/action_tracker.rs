//! Detection of newly issued unit commands.
//!
//! The host does not report commands directly, so a new action is inferred
//! from the difference between a unit's state this frame and the state
//! recorded for it on the previous frame. A unit counts at most one action
//! per frame, and only when one of these changed:
//!
//! - order kind
//! - target position
//! - target unit, when the unit now has a target (losing a target is not an
//!   action by itself)
//!
//! The first sighting of a unit only records its state. Records are never
//! removed; entries of dead units are simply never looked up again.

use std::collections::HashMap;

use crate::host::{OrderId, Position, UnitId, UnitView};

/// Last observed command state of one unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandRecord {
    /// Order kind.
    pub order: OrderId,
    /// Target position of the order.
    pub target_position: Position,
    /// Target unit of the order, `None` when it had no target.
    pub target: Option<UnitId>,
}

impl CommandRecord {
    /// Record the command state of a unit.
    #[must_use]
    pub fn observe(unit: &UnitView) -> Self {
        Self {
            order: unit.order,
            target_position: unit.target_position,
            target: unit.target,
        }
    }

    /// Whether `current` represents a different command than this record.
    #[must_use]
    pub fn is_new_action(&self, current: &Self) -> bool {
        if self.order != current.order || self.target_position != current.target_position {
            return true;
        }
        match current.target {
            Some(target) => self.target != Some(target),
            None => false,
        }
    }
}

/// Per-unit command memory used to count actions.
#[derive(Debug, Clone, Default)]
pub struct ActionTracker {
    records: HashMap<UnitId, CommandRecord>,
}

impl ActionTracker {
    /// Create an empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Compare every unit against its record and update the records.
    ///
    /// Returns the number of units that received a new command this frame.
    pub fn detect_actions(&mut self, units: &[UnitView]) -> u32 {
        let mut actions = 0;
        for unit in units {
            let current = CommandRecord::observe(unit);
            if let Some(previous) = self.records.insert(unit.id, current) {
                if previous.is_new_action(&current) {
                    tracing::trace!(unit = unit.id, order = unit.order, "New action");
                    actions += 1;
                }
            }
        }
        actions
    }

    /// Record held for a unit.
    #[must_use]
    pub fn record(&self, id: UnitId) -> Option<&CommandRecord> {
        self.records.get(&id)
    }

    /// Number of units ever seen.
    #[must_use]
    pub fn tracked_units(&self) -> usize {
        self.records.len()
    }

    /// Forget everything.
    pub fn clear(&mut self) {
        self.records.clear();
    }
}
