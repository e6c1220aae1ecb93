//! `nav-progress` — route-progress snapshots and how they are derived.
//!
//! # Crate layout
//!
//! | Module         | Contents                                                     |
//! |----------------|--------------------------------------------------------------|
//! | [`progress`]   | `RouteProgress`, `SpanProgress`, `Advancement`               |
//! | [`builder`]    | `build_progress` — pure `(status, previous) → RouteProgress` |
//! | [`leg_tracker`]| `LegTracker`, `LegChange` — worker-owned leg bookkeeping     |
//! | [`error`]      | `ProgressError`, `ProgressResult<T>`                         |
//!
//! # Snapshot model
//!
//! A new `RouteProgress` is produced for every processed fix and never
//! mutated afterwards.  The processing worker keeps exactly one "previous"
//! snapshot, passes it explicitly into the builder and the milestone
//! evaluator, then replaces it with the new one in a single assignment.

pub mod builder;
pub mod error;
pub mod leg_tracker;
pub mod progress;


pub use builder::build_progress;
pub use error::{ProgressError, ProgressResult};
pub use leg_tracker::{LegChange, LegTracker};
pub use progress::{Advancement, RouteProgress, SpanProgress, ARRIVAL_THRESHOLD_M};
