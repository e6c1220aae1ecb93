//! The milestone evaluator.

use tracing::debug;

use nav_progress::RouteProgress;

use crate::{FiredMilestone, FiringPolicy, Milestone, MilestoneError, MilestoneResult, MilestoneState};

/// Evaluates registered milestones against each new progress snapshot.
///
/// Milestones are evaluated in registration order and the returned list
/// preserves that order; it carries no notion of priority or severity.
///
/// Owned by the processing worker; only ever mutated from that thread.
#[derive(Clone, Debug, Default)]
pub struct MilestoneEvaluator {
    milestones: Vec<Milestone>,
    state:      MilestoneState,
}

impl MilestoneEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an evaluator from a list of milestones, rejecting duplicate ids.
    pub fn with_milestones(milestones: impl IntoIterator<Item = Milestone>) -> MilestoneResult<Self> {
        let mut ev = Self::new();
        for m in milestones {
            ev.register(m)?;
        }
        Ok(ev)
    }

    /// Append `milestone` to the evaluation order.
    pub fn register(&mut self, milestone: Milestone) -> MilestoneResult<()> {
        if self.milestones.iter().any(|m| m.id == milestone.id) {
            return Err(MilestoneError::DuplicateId(milestone.id));
        }
        self.milestones.push(milestone);
        Ok(())
    }

    pub fn milestones(&self) -> &[Milestone] {
        &self.milestones
    }

    pub fn state(&self) -> &MilestoneState {
        &self.state
    }

    /// Replace firing state, e.g. with one saved from an earlier run of the
    /// same session.
    pub fn restore_state(&mut self, state: MilestoneState) {
        self.state = state;
    }

    /// Forget all firings (new session).
    pub fn reset_state(&mut self) {
        self.state.clear();
    }

    /// Evaluate every milestone against (`previous`, `current`) and return
    /// those that fired, in registration order.
    ///
    /// A milestone's record is updated as soon as it fires, before the next
    /// milestone is looked at.
    pub fn evaluate(
        &mut self,
        previous: Option<&RouteProgress>,
        current:  &RouteProgress,
    ) -> Vec<FiredMilestone> {
        let here = (current.leg_index, current.step_index);
        let mut fired = Vec::new();

        for m in &self.milestones {
            let record = self.state.record(m.id);
            let eligible = match m.policy {
                FiringPolicy::Once        => record.fire_count == 0,
                FiringPolicy::Repeatable  => true,
                FiringPolicy::OncePerStep => record.last_step != Some(here),
            };
            if !eligible || !m.trigger.evaluate(previous, current) {
                continue;
            }

            self.state.mark_fired(m.id, current.timestamp, here.0, here.1);
            debug!(milestone = %m.id, name = %m.name, leg = here.0, step = here.1, "milestone fired");
            fired.push(FiredMilestone { id: m.id, name: m.name.clone() });
        }

        fired
    }
}
