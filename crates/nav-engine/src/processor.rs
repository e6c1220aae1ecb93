//! `RouteProcessor`: one fix in, one `DispatchBundle` out.

use std::sync::Arc;

use tracing::{debug, info};

use nav_core::{LocationFix, SessionId};
use nav_milestone::MilestoneEvaluator;
use nav_progress::{build_progress, LegTracker, ProgressError, RouteProgress};
use nav_route::{NavigationContext, Route, RouteMatcher};

use crate::{
    resolve_position, DispatchBundle, FasterRouteConfig, FasterRouteGate, NavigationOptions, ProcessError,
    ProcessResult,
};

/// Owns every piece of per-session state the pipeline mutates.
///
/// Runs on exactly one thread at a time (the processing worker, or the
/// caller in synchronous use), so none of its state needs locking.
///
/// # State on failure
///
/// A tick that fails in matching or progress building leaves the previous
/// snapshot, the leg tracker, milestone records and the faster-route gate
/// exactly as they were.
pub struct RouteProcessor<M: RouteMatcher> {
    matcher:    M,
    context:    NavigationContext,
    previous:   Option<Arc<RouteProgress>>,
    legs:       LegTracker,
    milestones: MilestoneEvaluator,
    gate:       FasterRouteGate,
}

impl<M: RouteMatcher> RouteProcessor<M> {
    pub fn new(
        matcher:      M,
        context:      NavigationContext,
        milestones:   MilestoneEvaluator,
        faster_route: FasterRouteConfig,
    ) -> Self {
        Self {
            matcher,
            context,
            previous: None,
            legs: LegTracker::new(),
            milestones,
            gate: FasterRouteGate::new(faster_route),
        }
    }

    /// Build the context from `options` and wire everything up.
    pub fn from_options(
        matcher:    M,
        route:      Arc<Route>,
        session:    SessionId,
        milestones: MilestoneEvaluator,
        options:    &NavigationOptions,
    ) -> Self {
        let context = NavigationContext::new(route, session, options.flags());
        Self::new(matcher, context, milestones, options.faster_route.clone())
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    pub fn context(&self) -> &NavigationContext {
        &self.context
    }

    /// The snapshot of the last successful tick, if any.
    pub fn previous(&self) -> Option<&RouteProgress> {
        self.previous.as_deref()
    }

    pub fn milestones(&self) -> &MilestoneEvaluator {
        &self.milestones
    }

    pub fn faster_route_gate(&self) -> &FasterRouteGate {
        &self.gate
    }

    // ── Mutation ──────────────────────────────────────────────────────────

    /// Install a new route for the same session.
    ///
    /// Clears the previous snapshot, the leg tracker, the faster-route
    /// baseline and the matcher's tracking state.  Milestone records are
    /// kept, so `Once` milestones do not re-fire after a reroute.
    pub fn replace_route(&mut self, route: Arc<Route>) {
        info!(
            session = %self.context.session,
            legs = route.leg_count(),
            distance_m = route.total().distance_m,
            "active route replaced"
        );
        self.context = self.context.with_route(route);
        self.previous = None;
        self.legs.reset();
        self.gate.reset();
        self.matcher.reset();
    }

    /// Run the full pipeline for one fix.
    ///
    /// # Errors
    ///
    /// - [`ProcessError::Match`] if the matcher fails,
    /// - [`ProcessError::NonFiniteStatus`] if the matcher reports a NaN or
    ///   infinite remaining distance or duration,
    /// - [`ProcessError::Progress`] if the matched step does not exist,
    /// - [`ProcessError::IndexRegression`] if the matched (leg, step) is
    ///   behind the previous snapshot.
    pub fn process(&mut self, fix: &LocationFix) -> ProcessResult<DispatchBundle> {
        let status = self.matcher.match_fix(fix, &self.context)?;
        let here = (status.leg_index, status.step_index);

        if !status.step_distance_remaining_m.is_finite() || !status.step_duration_remaining_s.is_finite() {
            return Err(ProcessError::NonFiniteStatus { leg: here.0, step: here.1 });
        }
        if !self.context.route.contains(here.0, here.1) {
            return Err(ProgressError::IndexOutOfRange { leg: here.0, step: here.1 }.into());
        }
        if let Some(prev) = &self.previous {
            let before = (prev.leg_index, prev.step_index);
            if here < before {
                return Err(ProcessError::IndexRegression { from: before, to: here });
            }
        }

        // Leg bookkeeping precedes progress so the snapshot sees the new leg.
        let legs_before = self.legs;
        let leg_change = self.legs.observe(&status);

        let progress = match build_progress(&self.context.route, &status, self.previous.as_deref(), fix.timestamp) {
            Ok(p) => Arc::new(p),
            Err(e) => {
                self.legs = legs_before;
                return Err(e.into());
            }
        };
        if let Some(change) = leg_change {
            debug!(from = change.from, to = change.to, at = %fix.timestamp, "leg changed");
        }

        let off_route = status.off_route;
        let milestones = self.milestones.evaluate(self.previous.as_deref(), &progress);

        let flags = self.context.flags;
        let position = resolve_position(fix, &status, off_route, flags.snap_to_route);
        let check_faster_route =
            self.gate.should_check(off_route, flags.faster_route_detection, fix, &progress);

        self.previous = Some(Arc::clone(&progress));

        Ok(DispatchBundle {
            session: self.context.session,
            position,
            progress,
            milestones,
            off_route,
            check_faster_route,
            leg_change,
        })
    }
}
