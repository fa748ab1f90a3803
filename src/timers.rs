//! RAII timing for the decision pipeline phases.

use std::time::{Duration, Instant};

/// Accumulated wall-clock per decision phase.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct DecisionPhases {
    pub(crate) retrieval: Duration,
    pub(crate) evaluation: Duration,
}

/// Timer that adds its elapsed time to a `Duration` slot when dropped, so a
/// phase is accounted for even on early return.
pub(crate) struct PhaseTimer<'a> {
    start: Instant,
    slot: &'a mut Duration,
}

impl<'a> PhaseTimer<'a> {
    pub(crate) fn new(slot: &'a mut Duration) -> Self {
        Self {
            start: Instant::now(),
            slot,
        }
    }
}

impl Drop for PhaseTimer<'_> {
    fn drop(&mut self) {
        *self.slot += self.start.elapsed();
    }
}
