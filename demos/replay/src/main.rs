//! replay — feed a recorded (or synthetic) fix trace through the navigation
//! engine and print what the presentation side would see.
//!
//! ```text
//! replay [ROUTE_JSON [FIXES_CSV [OPTIONS_JSON]]]
//! ```
//!
//! With no arguments a two-leg route through downtown Mobile, Alabama is
//! built in code and a noisy drive along it is synthesized, including one
//! detour far enough off the road to trip the off-route detector.
//!
//! Set `RUST_LOG=debug` to see dropped ticks, leg changes and milestone
//! firings from the engine itself.

mod route;
mod trace;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

use anyhow::{anyhow, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use nav_core::{LocationFix, MilestoneId, SessionId};
use nav_engine::{
    FasterRouteConfig, NavigationObserver, NavigationOptions, OverflowPolicy, ProcessingWorker, QueueConfig,
    RouteProcessor, TeardownMode, WorkerStats,
};
use nav_milestone::{FiredMilestone, Milestone, MilestoneEvaluator, Trigger, TriggerProperty};
use nav_progress::RouteProgress;
use nav_route::{PolylineMatcher, PolylineMatcherConfig};

use trace::TraceConfig;

// ── Constants ─────────────────────────────────────────────────────────────────

const SESSION:         SessionId = SessionId(1);
const PRINT_EVERY:     u64       = 10; // progress line every N bundles
const OFF_ROUTE_M:     f64       = 50.0;

// ── Arguments ─────────────────────────────────────────────────────────────────

struct Args {
    route:   Option<PathBuf>,
    fixes:   Option<PathBuf>,
    options: Option<PathBuf>,
}

impl Args {
    fn parse() -> Self {
        let mut it = std::env::args_os().skip(1).map(PathBuf::from);
        Self { route: it.next(), fixes: it.next(), options: it.next() }
    }
}

/// Demo defaults: faster-route checks on, short interval, lossless queue so
/// every recorded fix is processed.
fn default_options() -> NavigationOptions {
    NavigationOptions {
        snap_to_route:          true,
        faster_route_detection: true,
        faster_route: FasterRouteConfig {
            check_interval_secs:            60,
            min_distance_m:                 200.0,
            min_route_duration_remaining_s: 60.0,
        },
        queue: QueueConfig { capacity: 64, overflow: OverflowPolicy::Unbounded },
    }
}

fn load_options(path: Option<&Path>) -> Result<NavigationOptions> {
    match path {
        None => Ok(default_options()),
        Some(p) => {
            let json = std::fs::read_to_string(p)?;
            Ok(NavigationOptions::from_json_str(&json)?)
        }
    }
}

fn milestones() -> Result<MilestoneEvaluator> {
    Ok(MilestoneEvaluator::with_milestones([
        Milestone::once(MilestoneId(1), "departed", Trigger::Always),
        Milestone::once_per_step(
            MilestoneId(2),
            "maneuver ahead",
            Trigger::all([
                Trigger::lte(TriggerProperty::StepDistanceRemaining, 100.0),
                Trigger::equals(TriggerProperty::LastStep, 0.0),
            ]),
        ),
        Milestone::once(MilestoneId(3), "halfway", Trigger::gte(TriggerProperty::RouteFractionTraveled, 0.5)),
        Milestone::repeatable(
            MilestoneId(4),
            "waypoint reached",
            Trigger::all([Trigger::LegChanged, Trigger::gte(TriggerProperty::LegIndex, 1.0)]),
        ),
        Milestone::once(MilestoneId(5), "arrived", Trigger::Arrived),
    ])?)
}

// ── Console observer ──────────────────────────────────────────────────────────

#[derive(Default)]
struct ConsoleObserver {
    bundles:         u64,
    off_route:       bool,
    off_route_ticks: u64,
    faster_checks:   u64,
    fired:           Vec<FiredMilestone>,
}

impl NavigationObserver for ConsoleObserver {
    fn on_progress(&mut self, position: &LocationFix, progress: &RouteProgress) {
        self.bundles += 1;
        if self.bundles % PRINT_EVERY == 1 {
            println!(
                "{:>9}  leg {} step {}  {:>7.0} m left  {:>5.1}%  at {}",
                position.timestamp.to_string(),
                progress.leg_index,
                progress.step_index,
                progress.distance_remaining_m,
                progress.fraction_traveled * 100.0,
                position.position,
            );
        }
    }

    fn on_milestones(&mut self, milestones: &[FiredMilestone], progress: &RouteProgress) {
        for m in milestones {
            println!(
                "{:>9}  * {} (leg {} step {})",
                progress.timestamp.to_string(),
                m.name,
                progress.leg_index,
                progress.step_index
            );
        }
        self.fired.extend_from_slice(milestones);
    }

    fn on_off_route(&mut self, position: &LocationFix, off_route: bool) {
        if off_route {
            self.off_route_ticks += 1;
        }
        if off_route != self.off_route {
            let what = if off_route { "OFF ROUTE" } else { "back on route" };
            println!("{:>9}  ! {what} at {}", position.timestamp.to_string(), position.position);
            self.off_route = off_route;
        }
    }

    fn on_faster_route_check(&mut self, position: &LocationFix, progress: &RouteProgress, check: bool) {
        if check {
            self.faster_checks += 1;
            println!(
                "{:>9}  ? faster-route check ({:.0} s of route left)",
                position.timestamp.to_string(),
                progress.duration_remaining_s
            );
        }
    }
}

// ── main ──────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    // 1. Route.
    let route = Arc::new(match &args.route {
        Some(p) => route::load_route_json(p)?,
        None => route::build_demo_route()?,
    });
    info!(
        legs = route.leg_count(),
        distance_m = route.total().distance_m,
        duration_s = route.total().duration_s,
        "route loaded"
    );

    // 2. Fixes.
    let fixes = match &args.fixes {
        Some(p) => trace::load_fixes_csv(p)?,
        None => trace::synthesize(&route, &TraceConfig::default()),
    };
    info!(fixes = fixes.len(), "trace loaded");

    // 3. Options and processor.
    let options = load_options(args.options.as_deref())?;
    let matcher = PolylineMatcher::new(PolylineMatcherConfig { off_route_threshold_m: OFF_ROUTE_M });
    let processor = RouteProcessor::from_options(matcher, route, SESSION, milestones()?, &options);

    // 4. Worker.  The producer thread plays the location provider and owns
    //    the handle; the main thread plays the presentation side.
    let (worker, mut results) = ProcessingWorker::spawn(processor, options.queue)?;
    let producer = thread::Builder::new()
        .name("fix-producer".to_string())
        .spawn(move || -> Result<WorkerStats> {
            let sender = worker.sender();
            for fix in fixes {
                sender.submit(fix)?;
            }
            Ok(worker.shutdown(TeardownMode::Drain))
        })?;

    // 5. Deliver until the worker has drained and stopped.
    let t0 = Instant::now();
    let mut obs = ConsoleObserver::default();
    while results.deliver_blocking(&mut obs) {}
    let elapsed = t0.elapsed();

    let stats = producer
        .join()
        .map_err(|_| anyhow!("fix producer thread panicked"))??;

    // 6. Summary.
    println!();
    println!("Replay complete in {:.3} s", elapsed.as_secs_f64());
    println!(
        "  processed {}  dropped {}  coalesced {}",
        stats.processed, stats.dropped, stats.coalesced
    );
    println!("  delivered {} bundles, {} off-route", obs.bundles, obs.off_route_ticks);
    println!("  faster-route checks requested: {}", obs.faster_checks);
    println!("  milestones fired: {}", obs.fired.len());
    for m in &obs.fired {
        println!("    {:<6} {}", m.id.to_string(), m.name);
    }

    Ok(())
}
