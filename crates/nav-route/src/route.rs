//! The static route model.
//!
//! # Suffix totals
//!
//! Progress is computed every fix as "what the matcher says is left of the
//! current step" plus "everything after it".  The second term depends only on
//! the route, so [`Route::new`] precomputes it once:
//!
//! ```text
//! steps_after[leg][step] = Σ steps (step+1 ..) of `leg`
//! legs_after[leg]        = Σ legs  (leg+1 ..)
//! ```
//!
//! Each lookup on the hot path is then a single index.

use nav_core::GeoPoint;

use crate::{RouteError, RouteResult};

// ── Totals ────────────────────────────────────────────────────────────────────

/// A distance/duration pair.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Totals {
    pub distance_m: f64,
    pub duration_s: f64,
}

impl std::ops::Add for Totals {
    type Output = Totals;
    #[inline]
    fn add(self, rhs: Totals) -> Totals {
        Totals {
            distance_m: self.distance_m + rhs.distance_m,
            duration_s: self.duration_s + rhs.duration_s,
        }
    }
}

// ── RouteStep / RouteLeg ──────────────────────────────────────────────────────

/// One maneuver-to-maneuver segment.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RouteStep {
    /// Road or maneuver name, free-form.
    #[cfg_attr(feature = "serde", serde(default))]
    pub name:       String,
    pub distance_m: f64,
    pub duration_s: f64,
    /// Polyline from the step's start maneuver to the next one.  May be empty
    /// for matchers that do not need geometry.
    #[cfg_attr(feature = "serde", serde(default))]
    pub geometry:   Vec<GeoPoint>,
}

impl RouteStep {
    pub fn new(name: impl Into<String>, distance_m: f64, duration_s: f64) -> Self {
        Self {
            name: name.into(),
            distance_m,
            duration_s,
            geometry: Vec::new(),
        }
    }

    pub fn with_geometry(mut self, geometry: Vec<GeoPoint>) -> Self {
        self.geometry = geometry;
        self
    }

    #[inline]
    pub fn totals(&self) -> Totals {
        Totals { distance_m: self.distance_m, duration_s: self.duration_s }
    }
}

/// One waypoint-to-waypoint segment.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RouteLeg {
    pub steps: Vec<RouteStep>,
}

impl RouteLeg {
    pub fn new(steps: Vec<RouteStep>) -> Self {
        Self { steps }
    }
}

// ── Route ─────────────────────────────────────────────────────────────────────

/// A validated, immutable route with precomputed suffix totals.
///
/// Do not construct directly; use [`Route::new`].  Share between the worker
/// and the presentation side as `Arc<Route>`.
#[derive(Clone, Debug)]
pub struct Route {
    legs:        Vec<RouteLeg>,
    leg_totals:  Vec<Totals>,
    steps_after: Vec<Vec<Totals>>,
    legs_after:  Vec<Totals>,
    total:       Totals,
}

impl Route {
    /// Validate `legs` and precompute all suffix totals.
    ///
    /// # Errors
    ///
    /// - [`RouteError::NoLegs`] for an empty route.
    /// - [`RouteError::EmptyLeg`] for a leg without steps.
    /// - [`RouteError::InvalidStep`] for a negative or non-finite distance or
    ///   duration.
    pub fn new(legs: Vec<RouteLeg>) -> RouteResult<Self> {
        if legs.is_empty() {
            return Err(RouteError::NoLegs);
        }

        let mut leg_totals  = Vec::with_capacity(legs.len());
        let mut steps_after = Vec::with_capacity(legs.len());

        for (li, leg) in legs.iter().enumerate() {
            if leg.steps.is_empty() {
                return Err(RouteError::EmptyLeg(li));
            }
            for (si, step) in leg.steps.iter().enumerate() {
                if !step.distance_m.is_finite() || step.distance_m < 0.0 {
                    return Err(RouteError::InvalidStep { leg: li, step: si, reason: "bad distance" });
                }
                if !step.duration_s.is_finite() || step.duration_s < 0.0 {
                    return Err(RouteError::InvalidStep { leg: li, step: si, reason: "bad duration" });
                }
            }

            // Walk backwards accumulating everything after each step.
            let mut after = vec![Totals::default(); leg.steps.len()];
            let mut acc   = Totals::default();
            for (si, step) in leg.steps.iter().enumerate().rev() {
                after[si] = acc;
                acc = acc + step.totals();
            }
            leg_totals.push(acc);
            steps_after.push(after);
        }

        let mut legs_after = vec![Totals::default(); legs.len()];
        let mut acc        = Totals::default();
        for (li, t) in leg_totals.iter().enumerate().rev() {
            legs_after[li] = acc;
            acc = acc + *t;
        }

        Ok(Self { legs, leg_totals, steps_after, legs_after, total: acc })
    }

    // ── Shape ─────────────────────────────────────────────────────────────

    pub fn legs(&self) -> &[RouteLeg] {
        &self.legs
    }

    pub fn leg_count(&self) -> usize {
        self.legs.len()
    }

    /// Number of steps in `leg`, or `0` if the leg does not exist.
    pub fn step_count(&self, leg: usize) -> usize {
        self.legs.get(leg).map_or(0, |l| l.steps.len())
    }

    pub fn step(&self, leg: usize, step: usize) -> Option<&RouteStep> {
        self.legs.get(leg)?.steps.get(step)
    }

    /// `true` if (`leg`, `step`) addresses an existing step.
    #[inline]
    pub fn contains(&self, leg: usize, step: usize) -> bool {
        step < self.step_count(leg)
    }

    // ── Totals ────────────────────────────────────────────────────────────

    /// Whole-route distance and duration.
    #[inline]
    pub fn total(&self) -> Totals {
        self.total
    }

    pub fn leg_total(&self, leg: usize) -> Option<Totals> {
        self.leg_totals.get(leg).copied()
    }

    /// Sum of the steps after `step` within `leg`.
    pub fn steps_after(&self, leg: usize, step: usize) -> Option<Totals> {
        self.steps_after.get(leg)?.get(step).copied()
    }

    /// Sum of the legs after `leg`.
    pub fn legs_after(&self, leg: usize) -> Option<Totals> {
        self.legs_after.get(leg).copied()
    }
}
