//! Milestone rules.

use std::sync::Arc;

use nav_core::MilestoneId;

use crate::Trigger;

/// How often a milestone may fire.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FiringPolicy {
    /// At most once per navigation session.
    #[default]
    Once,
    /// On every tick the trigger holds.
    Repeatable,
    /// At most once for each distinct (leg, step).
    OncePerStep,
}

/// A named trigger rule.  Immutable once registered.
#[derive(Clone, Debug, PartialEq)]
pub struct Milestone {
    pub id:      MilestoneId,
    pub name:    Arc<str>,
    pub trigger: Trigger,
    pub policy:  FiringPolicy,
}

impl Milestone {
    pub fn new(id: MilestoneId, name: impl Into<Arc<str>>, trigger: Trigger, policy: FiringPolicy) -> Self {
        Self { id, name: name.into(), trigger, policy }
    }

    pub fn once(id: MilestoneId, name: impl Into<Arc<str>>, trigger: Trigger) -> Self {
        Self::new(id, name, trigger, FiringPolicy::Once)
    }

    pub fn repeatable(id: MilestoneId, name: impl Into<Arc<str>>, trigger: Trigger) -> Self {
        Self::new(id, name, trigger, FiringPolicy::Repeatable)
    }

    pub fn once_per_step(id: MilestoneId, name: impl Into<Arc<str>>, trigger: Trigger) -> Self {
        Self::new(id, name, trigger, FiringPolicy::OncePerStep)
    }
}

/// A milestone that fired on one tick; what the presentation side receives.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FiredMilestone {
    pub id:   MilestoneId,
    pub name: Arc<str>,
}
