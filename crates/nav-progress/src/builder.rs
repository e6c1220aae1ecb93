//! The progress builder.
//!
//! A pure value transformation: route geometry is read-only, the matcher's
//! status is a value, and the previous snapshot is passed in explicitly.
//!
//! ```text
//! step remaining  = status.step_distance_remaining   (clamped to the step)
//! leg remaining   = step remaining + Σ later steps in the leg
//! route remaining = leg remaining  + Σ later legs
//! ```

use nav_core::Timestamp;
use nav_route::{MatchStatus, Route};

use crate::{Advancement, ProgressError, ProgressResult, RouteProgress, SpanProgress};

/// Build the snapshot for one fix.
///
/// `previous` is only consulted to fill [`RouteProgress::advancement`].
///
/// # Errors
///
/// [`ProgressError::IndexOutOfRange`] if `status` addresses a step that does
/// not exist on `route`.
pub fn build_progress(
    route:     &Route,
    status:    &MatchStatus,
    previous:  Option<&RouteProgress>,
    timestamp: Timestamp,
) -> ProgressResult<RouteProgress> {
    let (leg_index, step_index) = (status.leg_index, status.step_index);
    let out_of_range = ProgressError::IndexOutOfRange { leg: leg_index, step: step_index };

    let step        = route.step(leg_index, step_index).ok_or(out_of_range.clone())?;
    let steps_after = route.steps_after(leg_index, step_index).ok_or(out_of_range.clone())?;
    let legs_after  = route.legs_after(leg_index).ok_or(out_of_range.clone())?;
    let leg_total   = route.leg_total(leg_index).ok_or(out_of_range)?;
    let route_total = route.total();

    let step_progress = SpanProgress::from_remaining(
        step.distance_m,
        status.step_distance_remaining_m,
        status.step_duration_remaining_s.min(step.duration_s),
    );

    let leg_remaining_m = step_progress.distance_remaining_m + steps_after.distance_m;
    let leg_remaining_s = step_progress.duration_remaining_s + steps_after.duration_s;
    let leg_progress    = SpanProgress::from_remaining(leg_total.distance_m, leg_remaining_m, leg_remaining_s);

    let whole = SpanProgress::from_remaining(
        route_total.distance_m,
        leg_progress.distance_remaining_m + legs_after.distance_m,
        leg_progress.duration_remaining_s + legs_after.duration_s,
    );

    let advancement = match previous {
        None => Advancement { step_changed: true, leg_changed: true },
        Some(prev) => Advancement {
            step_changed: (prev.leg_index, prev.step_index) != (leg_index, step_index),
            leg_changed:  prev.leg_index != leg_index,
        },
    };

    Ok(RouteProgress {
        timestamp,
        leg_index,
        step_index,
        leg_count:  route.leg_count(),
        step_count: route.step_count(leg_index),
        step:       step_progress,
        leg:        leg_progress,
        distance_remaining_m: whole.distance_remaining_m,
        duration_remaining_s: whole.duration_remaining_s,
        distance_traveled_m:  whole.distance_traveled_m,
        fraction_traveled:    whole.fraction_traveled,
        remaining_waypoints:  route.leg_count() - leg_index,
        advancement,
    })
}
