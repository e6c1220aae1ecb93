//! Explicit firing-state records.

use rustc_hash::FxHashMap;

use nav_core::{MilestoneId, Timestamp};

/// What is known about one milestone's past firings this session.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FiringRecord {
    pub fire_count: u32,
    pub last_fired: Option<Timestamp>,
    /// (leg, step) of the most recent firing.
    pub last_step:  Option<(usize, usize)>,
}

/// Firing records keyed by milestone identity.
///
/// Absent key ≡ never fired.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MilestoneState {
    records: FxHashMap<MilestoneId, FiringRecord>,
}

impl MilestoneState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, id: MilestoneId) -> FiringRecord {
        self.records.get(&id).copied().unwrap_or_default()
    }

    pub fn has_fired(&self, id: MilestoneId) -> bool {
        self.record(id).fire_count > 0
    }

    /// Register one firing of `id` at (`leg`, `step`).
    pub fn mark_fired(&mut self, id: MilestoneId, at: Timestamp, leg: usize, step: usize) {
        let rec = self.records.entry(id).or_default();
        rec.fire_count = rec.fire_count.saturating_add(1);
        rec.last_fired = Some(at);
        rec.last_step = Some((leg, step));
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}
