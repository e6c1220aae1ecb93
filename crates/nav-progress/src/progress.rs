//! The route-progress snapshot.

use nav_core::Timestamp;

/// Distance left on the final step below which the agent counts as arrived.
pub const ARRIVAL_THRESHOLD_M: f64 = 10.0;

/// Progress along one span of the route (a step or a leg).
#[derive(Copy, Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SpanProgress {
    pub distance_remaining_m: f64,
    pub distance_traveled_m:  f64,
    pub duration_remaining_s: f64,
    /// Traveled / total, in `[0.0, 1.0]`.  A zero-length span reports `1.0`.
    pub fraction_traveled:    f64,
}

impl SpanProgress {
    /// Derive traveled and fraction from a span total and what is left of it.
    pub fn from_remaining(total_m: f64, remaining_m: f64, duration_remaining_s: f64) -> Self {
        // NaN remaining counts as nothing traveled.
        let remaining = if remaining_m.is_nan() {
            total_m.max(0.0)
        } else {
            remaining_m.clamp(0.0, total_m.max(0.0))
        };
        let traveled  = total_m - remaining;
        let fraction  = if total_m > 0.0 { (traveled / total_m).clamp(0.0, 1.0) } else { 1.0 };
        Self {
            distance_remaining_m: remaining,
            distance_traveled_m:  traveled,
            duration_remaining_s: duration_remaining_s.max(0.0),
            fraction_traveled:    fraction,
        }
    }
}

/// What changed relative to the previous snapshot.
///
/// Both flags are `true` on the first snapshot of a route.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Advancement {
    /// The active (leg, step) pair differs from the previous snapshot's.
    pub step_changed: bool,
    pub leg_changed:  bool,
}

/// The authoritative progress snapshot for one processed fix.
///
/// Immutable once built.  The worker shares it with the presentation side as
/// `Arc<RouteProgress>`.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RouteProgress {
    /// Timestamp of the fix this snapshot derives from.
    pub timestamp:  Timestamp,

    pub leg_index:  usize,
    pub step_index: usize,
    pub leg_count:  usize,
    /// Number of steps in the active leg.
    pub step_count: usize,

    pub step: SpanProgress,
    pub leg:  SpanProgress,

    // ── Whole route ───────────────────────────────────────────────────────
    pub distance_remaining_m: f64,
    pub duration_remaining_s: f64,
    pub distance_traveled_m:  f64,
    pub fraction_traveled:    f64,

    /// Waypoints still ahead, counting the active leg's destination.
    pub remaining_waypoints: usize,

    pub advancement: Advancement,
}

impl RouteProgress {
    #[inline]
    pub fn is_first_step(&self) -> bool {
        self.step_index == 0
    }

    #[inline]
    pub fn is_last_step(&self) -> bool {
        self.step_index + 1 >= self.step_count
    }

    #[inline]
    pub fn is_first_leg(&self) -> bool {
        self.leg_index == 0
    }

    #[inline]
    pub fn is_last_leg(&self) -> bool {
        self.leg_index + 1 >= self.leg_count
    }

    /// `true` if `self` is on a different (leg, step) than `previous`.
    pub fn step_changed_from(&self, previous: &RouteProgress) -> bool {
        (self.leg_index, self.step_index) != (previous.leg_index, previous.step_index)
    }

    pub fn leg_changed_from(&self, previous: &RouteProgress) -> bool {
        self.leg_index != previous.leg_index
    }

    /// On the final step of the final leg and within
    /// [`ARRIVAL_THRESHOLD_M`] of its end.
    pub fn has_arrived(&self) -> bool {
        self.is_last_leg() && self.is_last_step() && self.step.distance_remaining_m <= ARRIVAL_THRESHOLD_M
    }
}
