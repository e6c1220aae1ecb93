//! Faster-route gate.
//!
//! Decides whether this tick should trigger an out-of-band "is there a faster
//! route" evaluation.  The gate only rate-limits; deciding whether an
//! alternative actually is faster belongs to the routing collaborator.

use std::time::Duration;

use nav_core::{GeoPoint, LocationFix, Timestamp};
use nav_progress::RouteProgress;

use crate::FasterRouteConfig;

/// Throttle state: where and when the last positive decision was made.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct FasterRouteCheckState {
    pub last_check: Option<(Timestamp, GeoPoint)>,
}

/// Rate/condition policy for faster-route checks.
///
/// Owned and mutated exclusively by the processing worker.
#[derive(Clone, Debug, Default)]
pub struct FasterRouteGate {
    config: FasterRouteConfig,
    state:  FasterRouteCheckState,
}

impl FasterRouteGate {
    pub fn new(config: FasterRouteConfig) -> Self {
        Self { config, state: FasterRouteCheckState::default() }
    }

    pub fn state(&self) -> FasterRouteCheckState {
        self.state
    }

    /// Forget the throttle baseline (new route or session).
    pub fn reset(&mut self) {
        self.state = FasterRouteCheckState::default();
    }

    /// `true` if a faster-route check should run for this tick.
    ///
    /// Off-route or disabled returns `false` without touching state.  The
    /// first on-route call after a reset only seeds the baseline.  After
    /// that, all of:
    ///
    /// - at least `check_interval_secs` since the last positive decision,
    /// - at least `min_distance_m` moved since then,
    /// - at least `min_route_duration_remaining_s` of the route left,
    ///
    /// must hold, and a positive decision moves the baseline to this fix.
    pub fn should_check(
        &mut self,
        off_route: bool,
        enabled:   bool,
        fix:       &LocationFix,
        progress:  &RouteProgress,
    ) -> bool {
        if off_route || !enabled {
            return false;
        }

        let Some((last_time, last_pos)) = self.state.last_check else {
            self.state.last_check = Some((fix.timestamp, fix.position));
            return false;
        };

        if fix.timestamp.since(last_time) < Duration::from_secs(self.config.check_interval_secs) {
            return false;
        }
        if last_pos.distance_m(fix.position) < self.config.min_distance_m {
            return false;
        }
        if progress.duration_remaining_s < self.config.min_route_duration_remaining_s {
            return false;
        }

        self.state.last_check = Some((fix.timestamp, fix.position));
        true
    }
}
