//! Worker-owned leg-index bookkeeping.

use nav_route::MatchStatus;

/// A leg transition observed on one fix.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LegChange {
    pub from: usize,
    pub to:   usize,
}

/// Records the active leg so a change is noticed before progress is built.
///
/// `Copy` so the processor can snapshot it and roll back if a tick aborts
/// after bookkeeping.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct LegTracker {
    current: usize,
}

impl LegTracker {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn current(&self) -> usize {
        self.current
    }

    /// Record the leg implied by `status`; return the transition if it moved.
    pub fn observe(&mut self, status: &MatchStatus) -> Option<LegChange> {
        if status.leg_index == self.current {
            return None;
        }
        let change = LegChange { from: self.current, to: status.leg_index };
        self.current = status.leg_index;
        Some(change)
    }

    /// Back to leg 0 (new route).
    pub fn reset(&mut self) {
        self.current = 0;
    }
}
