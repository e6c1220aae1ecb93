//! `nav-milestone` — scheduled notifications driven by route progress.
//!
//! # Crate layout
//!
//! | Module        | Contents                                                      |
//! |---------------|---------------------------------------------------------------|
//! | [`trigger`]   | `Trigger` expression tree over `(previous, current)` progress |
//! | [`milestone`] | `Milestone`, `FiringPolicy`, `FiredMilestone`                 |
//! | [`state`]     | `MilestoneState` — firing records keyed by `MilestoneId`      |
//! | [`evaluator`] | `MilestoneEvaluator` — registration-ordered evaluation        |
//! | [`error`]     | `MilestoneError`, `MilestoneResult<T>`                        |
//!
//! # State model
//!
//! Milestone rules are immutable after registration.  Whether a rule has
//! already fired lives in a separate [`MilestoneState`] owned by the
//! evaluator, updated in an explicit step right after a rule fires and
//! before the next rule is evaluated.  Keeping the records apart from the
//! rules means a session's firing state can be snapshotted and restored.

pub mod error;
pub mod evaluator;
pub mod milestone;
pub mod state;
pub mod trigger;


pub use error::{MilestoneError, MilestoneResult};
pub use evaluator::MilestoneEvaluator;
pub use milestone::{FiredMilestone, FiringPolicy, Milestone};
pub use state::{FiringRecord, MilestoneState};
pub use trigger::{Comparison, Trigger, TriggerProperty};
