//! Proptest strategies.
//!
//! Command states are drawn from deliberately tiny domains so consecutive
//! frames often repeat, which is where action counting gets interesting.

use proptest::prelude::*;
use tm_core::host::{OrderId, Position, UnitId};

/// Command state of one unit on one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandState {
    /// Order kind.
    pub order: OrderId,
    /// Target unit.
    pub target: Option<UnitId>,
    /// Target position.
    pub target_position: Position,
}

/// Generate an order kind out of a handful.
pub fn arb_order() -> impl Strategy<Value = OrderId> {
    0u32..4
}

/// Generate a command state.
pub fn arb_command_state() -> impl Strategy<Value = CommandState> {
    (
        arb_order(),
        proptest::option::of(100i32..103),
        (0i32..3, 0i32..2),
    )
        .prop_map(|(order, target, (x, y))| CommandState {
            order,
            target,
            target_position: Position::new(x * 32, y * 32),
        })
}

/// Generate one unit's command state for each of up to `max_frames` frames.
pub fn arb_command_history(max_frames: usize) -> impl Strategy<Value = Vec<CommandState>> {
    proptest::collection::vec(arb_command_state(), 1..max_frames)
}

/// Generate a cumulative, never decreasing counter series of `len` values.
pub fn arb_cumulative_series(len: usize) -> impl Strategy<Value = Vec<i32>> {
    proptest::collection::vec(0i32..40, len).prop_map(|increments| {
        increments
            .into_iter()
            .scan(0i32, |total, step| {
                *total += step;
                Some(*total)
            })
            .collect()
    })
}

/// Generate per-frame durations in milliseconds.
pub fn arb_frame_times(max_frames: usize) -> impl Strategy<Value = Vec<u64>> {
    proptest::collection::vec(1u64..80, 0..max_frames)
}
