//! Time source for frame timing.

use std::time::Instant;

/// Monotonic time source.
///
/// Frame durations are differences between two [`Clock::now`] readings,
/// so implementations only need to be monotonic.
pub trait Clock {
    /// Current instant.
    fn now(&self) -> Instant;
}

/// Wall clock backed by [`Instant::now`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}
