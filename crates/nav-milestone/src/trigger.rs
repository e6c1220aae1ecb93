//! Trigger expressions.
//!
//! A [`Trigger`] is a small boolean expression over the previous and the
//! current [`RouteProgress`].  Numeric properties are read as `f64`; boolean
//! properties (`FirstStep`, `LastLeg`, …) read as `1.0` / `0.0` so they can be
//! compared with [`Trigger::equals`].
//!
//! ```rust,ignore
//! // "Announce the maneuver within 400 m of it, on steps longer than 800 m."
//! let t = Trigger::all([
//!     Trigger::lte(TriggerProperty::StepDistanceRemaining, 400.0),
//!     Trigger::gt(TriggerProperty::StepDistanceTotal, 800.0),
//! ]);
//! ```

use nav_progress::RouteProgress;

/// A numeric view of a progress snapshot.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TriggerProperty {
    StepDistanceRemaining,
    StepDistanceTraveled,
    StepDistanceTotal,
    StepDurationRemaining,
    LegDistanceRemaining,
    LegDurationRemaining,
    RouteDistanceRemaining,
    RouteDurationRemaining,
    RouteFractionTraveled,
    StepIndex,
    LegIndex,
    FirstStep,
    LastStep,
    FirstLeg,
    LastLeg,
}

impl TriggerProperty {
    pub fn read(self, p: &RouteProgress) -> f64 {
        let flag = |b: bool| if b { 1.0 } else { 0.0 };
        match self {
            Self::StepDistanceRemaining  => p.step.distance_remaining_m,
            Self::StepDistanceTraveled   => p.step.distance_traveled_m,
            Self::StepDistanceTotal      => p.step.distance_traveled_m + p.step.distance_remaining_m,
            Self::StepDurationRemaining  => p.step.duration_remaining_s,
            Self::LegDistanceRemaining   => p.leg.distance_remaining_m,
            Self::LegDurationRemaining   => p.leg.duration_remaining_s,
            Self::RouteDistanceRemaining => p.distance_remaining_m,
            Self::RouteDurationRemaining => p.duration_remaining_s,
            Self::RouteFractionTraveled  => p.fraction_traveled,
            Self::StepIndex              => p.step_index as f64,
            Self::LegIndex               => p.leg_index as f64,
            Self::FirstStep              => flag(p.is_first_step()),
            Self::LastStep               => flag(p.is_last_step()),
            Self::FirstLeg               => flag(p.is_first_leg()),
            Self::LastLeg                => flag(p.is_last_leg()),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Comparison {
    Lt,
    Lte,
    Gt,
    Gte,
    Eq,
    Neq,
}

impl Comparison {
    #[inline]
    pub fn apply(self, lhs: f64, rhs: f64) -> bool {
        match self {
            Self::Lt  => lhs < rhs,
            Self::Lte => lhs <= rhs,
            Self::Gt  => lhs > rhs,
            Self::Gte => lhs >= rhs,
            Self::Eq  => lhs == rhs,
            Self::Neq => lhs != rhs,
        }
    }
}

/// A predicate over `(previous, current)` progress.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Trigger {
    Always,
    /// Every child holds.  An empty list holds.
    All(Vec<Trigger>),
    /// At least one child holds.  An empty list does not hold.
    Any(Vec<Trigger>),
    Not(Box<Trigger>),
    Compare {
        property: TriggerProperty,
        op:       Comparison,
        value:    f64,
    },
    /// `property` was at or above `value` on the previous snapshot and is
    /// below it now.  Never holds without a previous snapshot.
    CrossedBelow {
        property: TriggerProperty,
        value:    f64,
    },
    /// The (leg, step) pair differs from the previous snapshot, or there is
    /// no previous snapshot.
    StepChanged,
    /// The leg differs from the previous snapshot, or there is no previous
    /// snapshot.
    LegChanged,
    /// [`RouteProgress::has_arrived`].
    Arrived,
}

impl Trigger {
    pub fn evaluate(&self, previous: Option<&RouteProgress>, current: &RouteProgress) -> bool {
        match self {
            Trigger::Always => true,
            Trigger::All(children) => children.iter().all(|c| c.evaluate(previous, current)),
            Trigger::Any(children) => children.iter().any(|c| c.evaluate(previous, current)),
            Trigger::Not(inner) => !inner.evaluate(previous, current),
            Trigger::Compare { property, op, value } => op.apply(property.read(current), *value),
            Trigger::CrossedBelow { property, value } => previous.is_some_and(|prev| {
                property.read(prev) >= *value && property.read(current) < *value
            }),
            Trigger::StepChanged => previous.is_none_or(|prev| current.step_changed_from(prev)),
            Trigger::LegChanged => previous.is_none_or(|prev| current.leg_changed_from(prev)),
            Trigger::Arrived => current.has_arrived(),
        }
    }

    // ── Constructors ──────────────────────────────────────────────────────

    pub fn all(children: impl IntoIterator<Item = Trigger>) -> Self {
        Trigger::All(children.into_iter().collect())
    }

    pub fn any(children: impl IntoIterator<Item = Trigger>) -> Self {
        Trigger::Any(children.into_iter().collect())
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(inner: Trigger) -> Self {
        Trigger::Not(Box::new(inner))
    }

    pub fn compare(property: TriggerProperty, op: Comparison, value: f64) -> Self {
        Trigger::Compare { property, op, value }
    }

    pub fn lt(property: TriggerProperty, value: f64) -> Self {
        Self::compare(property, Comparison::Lt, value)
    }

    pub fn lte(property: TriggerProperty, value: f64) -> Self {
        Self::compare(property, Comparison::Lte, value)
    }

    pub fn gt(property: TriggerProperty, value: f64) -> Self {
        Self::compare(property, Comparison::Gt, value)
    }

    pub fn gte(property: TriggerProperty, value: f64) -> Self {
        Self::compare(property, Comparison::Gte, value)
    }

    pub fn equals(property: TriggerProperty, value: f64) -> Self {
        Self::compare(property, Comparison::Eq, value)
    }

    pub fn crossed_below(property: TriggerProperty, value: f64) -> Self {
        Trigger::CrossedBelow { property, value }
    }
}
