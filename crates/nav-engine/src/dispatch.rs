//! The per-tick result bundle and the presentation-side observer.

use std::sync::Arc;

use nav_core::{LocationFix, SessionId};
use nav_milestone::FiredMilestone;
use nav_progress::{LegChange, RouteProgress};

/// Everything one processed fix produced, delivered as a unit.
///
/// All fields derive from the same match status and the same progress
/// snapshot.  The bundle owns its data (the snapshot behind an `Arc`), so it
/// crosses to the consumer's context as an immutable value.
#[derive(Clone, Debug, PartialEq)]
pub struct DispatchBundle {
    pub session:            SessionId,
    /// Snapped or raw, per the snap resolver.
    pub position:           LocationFix,
    pub progress:           Arc<RouteProgress>,
    /// Newly fired milestones, registration order.
    pub milestones:         Vec<FiredMilestone>,
    pub off_route:          bool,
    pub check_faster_route: bool,
    /// Set on the tick where the active leg changed.
    pub leg_change:         Option<LegChange>,
}

impl DispatchBundle {
    /// Invoke `observer` in the fixed order progress → milestones →
    /// off-route → faster-route.
    ///
    /// Consumers may rely on the progress callback having run before the
    /// off-route and faster-route callbacks of the same delivery.
    pub fn deliver<O: NavigationObserver + ?Sized>(&self, observer: &mut O) {
        observer.on_progress(&self.position, &self.progress);
        observer.on_milestones(&self.milestones, &self.progress);
        observer.on_off_route(&self.position, self.off_route);
        observer.on_faster_route_check(&self.position, &self.progress, self.check_faster_route);
    }
}

/// Presentation-side callbacks, invoked once each per delivered bundle.
///
/// All methods have default no-op implementations so implementors only need
/// to override what they care about.
pub trait NavigationObserver {
    fn on_progress(&mut self, _position: &LocationFix, _progress: &RouteProgress) {}

    /// Called on every delivery, with an empty slice when nothing fired.
    fn on_milestones(&mut self, _milestones: &[FiredMilestone], _progress: &RouteProgress) {}

    fn on_off_route(&mut self, _position: &LocationFix, _off_route: bool) {}

    fn on_faster_route_check(&mut self, _position: &LocationFix, _progress: &RouteProgress, _check: bool) {}
}

/// A [`NavigationObserver`] that does nothing.
pub struct NoopObserver;

impl NavigationObserver for NoopObserver {}
