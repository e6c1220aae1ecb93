//! `nav-engine` — the per-fix processing pipeline and its worker.
//!
//! # Per-fix pipeline
//!
//! ```text
//! fix ─▶ ① RouteMatcher::match_fix        → MatchStatus
//!        ② LegTracker::observe            (before progress is built)
//!        ③ build_progress(status, prev)   → RouteProgress
//!        ④ off_route = status.off_route
//!        ⑤ MilestoneEvaluator::evaluate(prev, new)
//!        ⑥ resolve_position(fix, status, off_route, snap)
//!        ⑦ FasterRouteGate::should_check  (on-route and enabled only)
//!        ⑧ prev ← new
//!        ⑨ DispatchBundle ─▶ result consumer
//! ```
//!
//! A failure in ①–③ drops the tick; nothing is dispatched and the next fix
//! starts from the previous snapshot.
//!
//! # Crate layout
//!
//! | Module           | Contents                                                   |
//! |------------------|------------------------------------------------------------|
//! | [`options`]      | `NavigationOptions`, `FasterRouteConfig`, `QueueConfig`    |
//! | [`snap`]         | `resolve_position` — snapped vs raw position               |
//! | [`faster_route`] | `FasterRouteGate`, `FasterRouteCheckState`                 |
//! | [`dispatch`]     | `DispatchBundle`, `NavigationObserver`, `NoopObserver`     |
//! | [`processor`]    | `RouteProcessor<M>` — runs ①–⑨ for one fix                |
//! | [`queue`]        | `FixQueue` — bounded inbound FIFO                          |
//! | [`worker`]       | `ProcessingWorker`, `WorkerHandle`, `FixSender`, `DispatchReceiver` |
//! | [`error`]        | `ProcessError`, `EngineError`                              |
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use nav_engine::{NavigationOptions, ProcessingWorker, RouteProcessor};
//! use nav_milestone::MilestoneEvaluator;
//! use nav_route::PolylineMatcher;
//!
//! let options = NavigationOptions::from_json_str(&json)?;
//! let processor = RouteProcessor::from_options(
//!     PolylineMatcher::default(), route, SessionId(1), MilestoneEvaluator::new(), &options,
//! );
//! let (worker, mut results) = ProcessingWorker::spawn(processor, options.queue)?;
//! worker.submit(fix)?;
//! results.deliver_blocking(&mut my_view);
//! worker.shutdown(TeardownMode::Drain);
//! ```

pub mod dispatch;
pub mod error;
pub mod faster_route;
pub mod options;
pub mod processor;
pub mod queue;
pub mod snap;
pub mod worker;

#[cfg(test)]
mod tests;

pub use dispatch::{DispatchBundle, NavigationObserver, NoopObserver};
pub use error::{EngineError, EngineResult, ProcessError, ProcessResult};
pub use faster_route::{FasterRouteCheckState, FasterRouteGate};
pub use options::{FasterRouteConfig, NavigationOptions, OverflowPolicy, QueueConfig};
pub use processor::RouteProcessor;
pub use snap::resolve_position;
pub use worker::{DispatchReceiver, FixSender, ProcessingWorker, TeardownMode, WorkerHandle, WorkerStats};
