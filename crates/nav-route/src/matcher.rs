//! The route-matcher boundary.
//!
//! # Pluggability
//!
//! The processing worker calls matching via the [`RouteMatcher`] trait, so
//! applications can plug in a native navigator, a hidden-Markov map matcher,
//! or a scripted matcher in tests.  [`PolylineMatcher`][crate::PolylineMatcher]
//! is the bundled reference implementation.

use nav_core::{GeoPoint, LocationFix};

use crate::{MatchResult, NavigationContext};

/// The matcher's best estimate of where on the route the agent is.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct MatchedPosition {
    pub point:   GeoPoint,
    /// Route bearing at `point`, degrees clockwise from north.
    pub bearing: Option<f32>,
}

/// Output of a [`RouteMatcher`] for one fix.  Value type, discarded after use.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct MatchStatus {
    /// `true` when the fix deviates from the route beyond tolerance.
    pub off_route:                 bool,
    pub matched:                   MatchedPosition,
    pub leg_index:                 usize,
    pub step_index:                usize,
    /// Distance left until the next maneuver (end of the current step).
    pub step_distance_remaining_m: f64,
    pub step_duration_remaining_s: f64,
}

/// Pluggable route-matching engine.
///
/// # Threading
///
/// A matcher is owned by the processing worker and only ever called from the
/// worker thread, hence `&mut self` and `Send` (not `Sync`).  Calls are
/// expected to be synchronous and bounded in latency.
pub trait RouteMatcher: Send + 'static {
    /// Resolve `fix` against `ctx.route`.
    ///
    /// Any error aborts only the current tick.
    fn match_fix(&mut self, fix: &LocationFix, ctx: &NavigationContext) -> MatchResult<MatchStatus>;

    /// Forget any tracking state.  Called when the active route is replaced.
    fn reset(&mut self) {}
}

impl<M: RouteMatcher + ?Sized> RouteMatcher for Box<M> {
    fn match_fix(&mut self, fix: &LocationFix, ctx: &NavigationContext) -> MatchResult<MatchStatus> {
        (**self).match_fix(fix, ctx)
    }

    fn reset(&mut self) {
        (**self).reset()
    }
}
