//! Unit tests for nav-engine.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Arc};

use nav_core::{GeoPoint, LocationFix, MilestoneId, SessionId, Timestamp};
use nav_milestone::{Milestone, MilestoneEvaluator, Trigger, TriggerProperty};
use nav_progress::{build_progress, RouteProgress};
use nav_route::{
    FeatureFlags, MatchError, MatchResult, MatchStatus, MatchedPosition, NavigationContext, Route, RouteLeg,
    RouteMatcher, RouteStep,
};

use crate::{
    resolve_position, DispatchBundle, FasterRouteConfig, FasterRouteGate, NavigationObserver, NavigationOptions,
    ProcessError, RouteProcessor,
};

// ── Helpers ───────────────────────────────────────────────────────────────────

const MATCHED: GeoPoint = GeoPoint { lat: 1.0, lon: 1.0 };
const RAW: GeoPoint = GeoPoint { lat: 1.0005, lon: 1.0 };

/// Two legs: [1000 m / 600 s, 500 m / 300 s] and [800 m / 480 s, 0 m arrival].
fn route() -> Arc<Route> {
    Arc::new(
        Route::new(vec![
            RouteLeg::new(vec![
                RouteStep::new("depart", 1000.0, 600.0),
                RouteStep::new("turn", 500.0, 300.0),
            ]),
            RouteLeg::new(vec![
                RouteStep::new("straight", 800.0, 480.0),
                RouteStep::new("arrive", 0.0, 0.0),
            ]),
        ])
        .unwrap(),
    )
}

fn on(leg: usize, step: usize, remaining_m: f64) -> MatchStatus {
    MatchStatus {
        off_route: false,
        matched: MatchedPosition { point: MATCHED, bearing: Some(90.0) },
        leg_index: leg,
        step_index: step,
        step_distance_remaining_m: remaining_m,
        step_duration_remaining_s: remaining_m * 0.6,
    }
}

fn off(leg: usize, step: usize, remaining_m: f64) -> MatchStatus {
    MatchStatus { off_route: true, ..on(leg, step, remaining_m) }
}

fn fix(secs: u64) -> LocationFix {
    LocationFix::new(RAW, Timestamp::from_secs(secs))
        .with_bearing(10.0)
        .with_speed(12.0)
        .with_accuracy(5.0)
}

fn progress(status: &MatchStatus, secs: u64) -> RouteProgress {
    build_progress(&route(), status, None, Timestamp::from_secs(secs)).unwrap()
}

#[derive(Clone, Debug)]
enum Scripted {
    Ok(MatchStatus),
    Fail,
    Panic,
}

/// Replays a fixed list of outcomes, one per fix.
///
/// With `entered`/`release` set, every call first reports entry and then
/// waits for a release signal (or for the release sender to be dropped).
struct ScriptedMatcher {
    script:  VecDeque<Scripted>,
    resets:  Arc<AtomicUsize>,
    entered: Option<mpsc::Sender<()>>,
    release: Option<mpsc::Receiver<()>>,
}

impl ScriptedMatcher {
    fn new(script: impl IntoIterator<Item = Scripted>) -> Self {
        Self {
            script:  script.into_iter().collect(),
            resets:  Arc::new(AtomicUsize::new(0)),
            entered: None,
            release: None,
        }
    }

    fn ok(statuses: impl IntoIterator<Item = MatchStatus>) -> Self {
        Self::new(statuses.into_iter().map(Scripted::Ok))
    }

    fn gated(mut self) -> (Self, mpsc::Receiver<()>, mpsc::Sender<()>) {
        let (entered_tx, entered_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        self.entered = Some(entered_tx);
        self.release = Some(release_rx);
        (self, entered_rx, release_tx)
    }
}

impl RouteMatcher for ScriptedMatcher {
    fn match_fix(&mut self, _fix: &LocationFix, _ctx: &NavigationContext) -> MatchResult<MatchStatus> {
        if let Some(entered) = &self.entered {
            let _ = entered.send(());
        }
        if let Some(release) = &self.release {
            let _ = release.recv();
        }
        match self.script.pop_front() {
            Some(Scripted::Ok(status)) => Ok(status),
            Some(Scripted::Panic) => panic!("scripted matcher panic"),
            Some(Scripted::Fail) | None => Err(MatchError::Unmatched("scripted failure".into())),
        }
    }

    fn reset(&mut self) {
        self.resets.fetch_add(1, Ordering::SeqCst);
    }
}

fn options(snap: bool, faster: bool) -> NavigationOptions {
    NavigationOptions { snap_to_route: snap, faster_route_detection: faster, ..NavigationOptions::default() }
}

fn processor(matcher: ScriptedMatcher, milestones: MilestoneEvaluator, opts: &NavigationOptions) -> RouteProcessor<ScriptedMatcher> {
    RouteProcessor::from_options(matcher, route(), SessionId(7), milestones, opts)
}

/// Records callback names in invocation order.
#[derive(Default)]
struct Recorder {
    calls: Vec<&'static str>,
}

impl NavigationObserver for Recorder {
    fn on_progress(&mut self, _position: &LocationFix, _progress: &RouteProgress) {
        self.calls.push("progress");
    }
    fn on_milestones(&mut self, _milestones: &[nav_milestone::FiredMilestone], _progress: &RouteProgress) {
        self.calls.push("milestones");
    }
    fn on_off_route(&mut self, _position: &LocationFix, _off_route: bool) {
        self.calls.push("off_route");
    }
    fn on_faster_route_check(&mut self, _position: &LocationFix, _progress: &RouteProgress, _check: bool) {
        self.calls.push("faster_route");
    }
}

// ── Options ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod options {
    use super::*;
    use crate::{EngineError, OverflowPolicy};

    #[test]
    fn empty_object_gives_defaults() {
        let o = NavigationOptions::from_json_str("{}").unwrap();
        assert_eq!(o, NavigationOptions::default());
        assert!(o.snap_to_route);
        assert!(!o.faster_route_detection);
        assert_eq!(o.faster_route.check_interval_secs, 120);
        assert_eq!(o.faster_route.min_route_duration_remaining_s, 600.0);
        assert_eq!(o.queue.capacity, 64);
        assert_eq!(o.queue.overflow, OverflowPolicy::DropOldest);
    }

    #[test]
    fn partial_override() {
        let o = NavigationOptions::from_json_str(
            r#"{ "faster_route_detection": true,
                 "faster_route": { "check_interval_secs": 30 },
                 "queue": { "capacity": 8, "overflow": "unbounded" } }"#,
        )
        .unwrap();
        assert!(o.snap_to_route);
        assert!(o.faster_route_detection);
        assert_eq!(o.faster_route.check_interval_secs, 30);
        assert_eq!(o.faster_route.min_distance_m, 0.0);
        assert_eq!(o.queue.capacity, 8);
        assert_eq!(o.queue.overflow, OverflowPolicy::Unbounded);
        assert_eq!(o.flags(), FeatureFlags { snap_to_route: true, faster_route_detection: true });
    }

    #[test]
    fn zero_capacity_rejected_only_when_bounded() {
        let err = NavigationOptions::from_json_str(r#"{ "queue": { "capacity": 0 } }"#).unwrap_err();
        assert!(matches!(err, EngineError::Config(_)));
        assert!(NavigationOptions::from_json_str(r#"{ "queue": { "capacity": 0, "overflow": "unbounded" } }"#).is_ok());
    }

    #[test]
    fn negative_thresholds_rejected() {
        let err = NavigationOptions::from_json_str(r#"{ "faster_route": { "min_distance_m": -1.0 } }"#).unwrap_err();
        assert!(matches!(err, EngineError::Config(_)));
    }

    #[test]
    fn malformed_json_is_config_error() {
        let err = NavigationOptions::from_json_str("{ snap_to_route: ").unwrap_err();
        assert!(matches!(err, EngineError::Config(_)));
    }
}

// ── Snap resolver ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod snap {
    use super::*;

    #[test]
    fn on_route_with_snap_uses_matched_position() {
        let f = fix(5);
        let out = resolve_position(&f, &on(0, 0, 500.0), false, true);
        assert_eq!(out.position, MATCHED);
        assert_eq!(out.bearing, Some(90.0));
        assert_eq!(out.timestamp, f.timestamp);
        assert_eq!(out.speed, f.speed);
        assert_eq!(out.accuracy, f.accuracy);
    }

    #[test]
    fn off_route_is_always_raw() {
        let f = fix(5);
        for snap in [true, false] {
            assert_eq!(resolve_position(&f, &off(0, 0, 500.0), true, snap), f);
            // The caller's off-route decision wins over the status flag.
            assert_eq!(resolve_position(&f, &on(0, 0, 500.0), true, snap), f);
        }
    }

    #[test]
    fn snap_disabled_is_raw() {
        let f = fix(5);
        assert_eq!(resolve_position(&f, &on(0, 0, 500.0), false, false), f);
    }

    #[test]
    fn missing_matched_bearing_keeps_raw_bearing() {
        let f = fix(5);
        let mut status = on(0, 0, 500.0);
        status.matched.bearing = None;
        let out = resolve_position(&f, &status, false, true);
        assert_eq!(out.position, MATCHED);
        assert_eq!(out.bearing, Some(10.0));
    }
}

// ── Faster-route gate ─────────────────────────────────────────────────────────

#[cfg(test)]
mod faster_route {
    use super::*;

    fn gate(interval: u64, min_distance_m: f64) -> FasterRouteGate {
        FasterRouteGate::new(FasterRouteConfig {
            check_interval_secs: interval,
            min_distance_m,
            min_route_duration_remaining_s: 600.0,
        })
    }

    fn fix_at(secs: u64, lat: f64) -> LocationFix {
        LocationFix::new(GeoPoint::new(lat, 1.0), Timestamp::from_secs(secs))
    }

    #[test]
    fn first_call_seeds_then_interval_applies() {
        let mut g = gate(120, 0.0);
        let p = progress(&on(0, 0, 1000.0), 0);
        assert!(!g.should_check(false, true, &fix_at(0, 1.0), &p));
        assert_eq!(g.state().last_check.map(|(t, _)| t), Some(Timestamp::ZERO));
        assert!(!g.should_check(false, true, &fix_at(119, 1.0), &p));
        assert!(g.should_check(false, true, &fix_at(120, 1.0), &p));
        // Baseline moved: the next check needs another full interval.
        assert!(!g.should_check(false, true, &fix_at(200, 1.0), &p));
        assert!(g.should_check(false, true, &fix_at(240, 1.0), &p));
    }

    #[test]
    fn never_true_off_route() {
        let mut g = gate(10, 0.0);
        let p = progress(&on(0, 0, 1000.0), 0);
        assert!(!g.should_check(false, true, &fix_at(0, 1.0), &p));
        let before = g.state();
        for secs in [100, 1_000, 10_000] {
            assert!(!g.should_check(true, true, &fix_at(secs, 1.0), &p));
        }
        assert_eq!(g.state(), before);
    }

    #[test]
    fn disabled_touches_nothing() {
        let mut g = gate(10, 0.0);
        let p = progress(&on(0, 0, 1000.0), 0);
        assert!(!g.should_check(false, false, &fix_at(0, 1.0), &p));
        assert_eq!(g.state().last_check, None);
    }

    #[test]
    fn too_little_route_left() {
        let mut g = gate(10, 0.0);
        let near_end = progress(&on(1, 0, 100.0), 0);
        assert!(near_end.duration_remaining_s < 600.0);
        assert!(!g.should_check(false, true, &fix_at(0, 1.0), &near_end));
        assert!(!g.should_check(false, true, &fix_at(100, 1.0), &near_end));
        assert_eq!(g.state().last_check.map(|(t, _)| t), Some(Timestamp::ZERO));
    }

    #[test]
    fn minimum_distance_moved() {
        let mut g = gate(10, 100.0);
        let p = progress(&on(0, 0, 1000.0), 0);
        assert!(!g.should_check(false, true, &fix_at(0, 1.0), &p));
        // ~11 m north: not far enough.
        assert!(!g.should_check(false, true, &fix_at(60, 1.0001), &p));
        // ~111 m north.
        assert!(g.should_check(false, true, &fix_at(60, 1.001), &p));
    }

    #[test]
    fn reset_forgets_baseline() {
        let mut g = gate(10, 0.0);
        let p = progress(&on(0, 0, 1000.0), 0);
        g.should_check(false, true, &fix_at(0, 1.0), &p);
        g.reset();
        assert_eq!(g.state().last_check, None);
        assert!(!g.should_check(false, true, &fix_at(100, 1.0), &p));
    }
}

// ── Dispatch ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod dispatch {
    use super::*;
    use crate::NoopObserver;

    fn bundle() -> DispatchBundle {
        DispatchBundle {
            session:            SessionId(1),
            position:           fix(0),
            progress:           Arc::new(progress(&on(0, 0, 500.0), 0)),
            milestones:         Vec::new(),
            off_route:          false,
            check_faster_route: false,
            leg_change:         None,
        }
    }

    #[test]
    fn callbacks_in_fixed_order() {
        let mut rec = Recorder::default();
        bundle().deliver(&mut rec);
        assert_eq!(rec.calls, ["progress", "milestones", "off_route", "faster_route"]);
    }

    #[test]
    fn noop_observer_accepts_everything() {
        bundle().deliver(&mut NoopObserver);
        let dyn_obs: &mut dyn NavigationObserver = &mut NoopObserver;
        bundle().deliver(dyn_obs);
    }
}

// ── Processor ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod processor {
    use super::*;

    #[test]
    fn first_tick_snaps_and_reports_advancement() {
        let mut p = processor(ScriptedMatcher::ok([on(0, 0, 800.0)]), MilestoneEvaluator::new(), &options(true, false));
        let b = p.process(&fix(0)).unwrap();
        assert_eq!(b.session, SessionId(7));
        assert_eq!(b.position.position, MATCHED);
        assert!(!b.off_route);
        assert!(!b.check_faster_route);
        assert!(b.milestones.is_empty());
        assert_eq!(b.leg_change, None);
        assert!(b.progress.advancement.step_changed);
        assert!(b.progress.advancement.leg_changed);
        assert_eq!(b.progress.distance_remaining_m, 800.0 + 500.0 + 800.0);
        assert_eq!(p.previous(), Some(&*b.progress));
    }

    #[test]
    fn monotone_indices_give_monotone_progress() {
        let statuses = [
            on(0, 0, 1000.0),
            on(0, 0, 600.0),
            on(0, 1, 500.0),
            on(0, 1, 50.0),
            on(1, 0, 800.0),
            on(1, 0, 10.0),
            on(1, 1, 0.0),
        ];
        let mut p = processor(ScriptedMatcher::ok(statuses), MilestoneEvaluator::new(), &options(true, false));
        let out: Vec<_> = (0..statuses.len() as u64).map(|t| p.process(&fix(t)).unwrap().progress).collect();

        for w in out.windows(2) {
            assert!((w[1].leg_index, w[1].step_index) >= (w[0].leg_index, w[0].step_index));
            assert!(w[1].distance_remaining_m <= w[0].distance_remaining_m);
        }
        assert!(out.last().unwrap().has_arrived());
    }

    #[test]
    fn stationary_fix_is_idempotent() {
        let s = on(0, 1, 250.0);
        let mut p = processor(ScriptedMatcher::ok([s, s, s]), MilestoneEvaluator::new(), &options(true, false));
        let f = fix(10);
        let _first = p.process(&f).unwrap();
        let second = p.process(&f).unwrap();
        let third = p.process(&f).unwrap();
        assert_eq!(second.progress, third.progress);
        assert_eq!(second.position, third.position);
    }

    #[test]
    fn match_failure_keeps_previous_progress() {
        let script = [Scripted::Ok(on(0, 0, 800.0)), Scripted::Fail, Scripted::Ok(on(0, 0, 700.0))];
        let mut p = processor(ScriptedMatcher::new(script), MilestoneEvaluator::new(), &options(true, false));

        let k_minus_1 = p.process(&fix(0)).unwrap();
        let err = p.process(&fix(1)).unwrap_err();
        assert!(matches!(err, ProcessError::Match(_)));
        assert_eq!(p.previous(), Some(&*k_minus_1.progress));

        let k_plus_1 = p.process(&fix(2)).unwrap();
        // Same step as tick k-1, so no advancement against it.
        assert!(!k_plus_1.progress.advancement.step_changed);
        assert_eq!(k_plus_1.progress.distance_remaining_m, k_minus_1.progress.distance_remaining_m - 100.0);
    }

    #[test]
    fn out_of_range_status_aborts_without_leg_change() {
        let script = [on(0, 1, 100.0), on(5, 0, 100.0), on(1, 0, 700.0)];
        let mut p = processor(ScriptedMatcher::ok(script), MilestoneEvaluator::new(), &options(true, false));
        p.process(&fix(0)).unwrap();

        let err = p.process(&fix(1)).unwrap_err();
        assert!(matches!(err, ProcessError::Progress(_)));

        // The leg tracker still says leg 0, so the real change is reported.
        let b = p.process(&fix(2)).unwrap();
        assert_eq!(b.leg_change, Some(nav_progress::LegChange { from: 0, to: 1 }));
        assert!(b.progress.advancement.leg_changed);
    }

    #[test]
    fn index_regression_is_rejected() {
        let script = [on(0, 1, 100.0), on(0, 0, 900.0)];
        let mut p = processor(ScriptedMatcher::ok(script), MilestoneEvaluator::new(), &options(true, false));
        let first = p.process(&fix(0)).unwrap();
        let err = p.process(&fix(1)).unwrap_err();
        assert_eq!(err, ProcessError::IndexRegression { from: (0, 1), to: (0, 0) });
        assert_eq!(p.previous(), Some(&*first.progress));
    }

    #[test]
    fn milestone_edges_use_previous_tick() {
        let ms = MilestoneEvaluator::with_milestones([Milestone::repeatable(
            MilestoneId(2),
            "under 2 km",
            Trigger::crossed_below(TriggerProperty::RouteDistanceRemaining, 2000.0),
        )])
        .unwrap();
        let script = [on(0, 0, 900.0), on(0, 0, 700.0), on(0, 0, 600.0), on(0, 0, 500.0)];
        let mut p = processor(ScriptedMatcher::ok(script), ms, &options(true, false));
        let fired: Vec<usize> = (0..4).map(|t| p.process(&fix(t)).unwrap().milestones.len()).collect();
        assert_eq!(fired, [0, 0, 1, 0]);
    }

    #[test]
    fn non_finite_status_is_dropped() {
        let mut nan = on(0, 0, 800.0);
        nan.step_distance_remaining_m = f64::NAN;
        let mut inf = on(0, 0, 800.0);
        inf.step_duration_remaining_s = f64::INFINITY;
        let script = [on(0, 0, 900.0), nan, inf, on(0, 0, 700.0)];
        let mut p = processor(ScriptedMatcher::ok(script), MilestoneEvaluator::new(), &options(true, false));

        let first = p.process(&fix(0)).unwrap();
        for t in [1, 2] {
            let err = p.process(&fix(t)).unwrap_err();
            assert_eq!(err, ProcessError::NonFiniteStatus { leg: 0, step: 0 });
            assert_eq!(p.previous(), Some(&*first.progress));
        }
        let next = p.process(&fix(3)).unwrap();
        assert!(next.progress.distance_remaining_m.is_finite());
        assert_eq!(next.progress.distance_remaining_m, 700.0 + 500.0 + 800.0);
    }

    #[test]
    fn off_route_tick_reports_raw_and_no_check() {
        let mut opts = options(true, true);
        opts.faster_route.check_interval_secs = 0;
        let script = [on(0, 0, 900.0), off(0, 0, 800.0)];
        let mut p = processor(ScriptedMatcher::ok(script), MilestoneEvaluator::new(), &opts);
        p.process(&fix(0)).unwrap();
        let b = p.process(&fix(500)).unwrap();
        assert!(b.off_route);
        assert!(!b.check_faster_route);
        assert_eq!(b.position, fix(500));
    }

    #[test]
    fn once_milestone_fires_once_across_ticks() {
        let ms = MilestoneEvaluator::with_milestones([Milestone::once(
            MilestoneId(1),
            "halfway",
            Trigger::gte(TriggerProperty::RouteFractionTraveled, 0.5),
        )])
        .unwrap();
        let script = [on(0, 0, 100.0), on(0, 1, 400.0), on(0, 1, 100.0), on(1, 0, 500.0)];
        let mut p = processor(ScriptedMatcher::ok(script), ms, &options(true, false));
        let fired: usize = (0..4).map(|t| p.process(&fix(t)).unwrap().milestones.len()).sum();
        assert_eq!(fired, 1);
    }

    #[test]
    fn replace_route_resets_tracking_but_keeps_milestones() {
        let ms = MilestoneEvaluator::with_milestones([Milestone::once(
            MilestoneId(1),
            "started",
            Trigger::Always,
        )])
        .unwrap();
        let matcher = ScriptedMatcher::ok([on(1, 0, 100.0), on(0, 0, 1000.0)]);
        let resets = Arc::clone(&matcher.resets);
        let mut opts = options(true, true);
        opts.faster_route.check_interval_secs = 0;
        let mut p = processor(matcher, ms, &opts);

        let before = p.process(&fix(0)).unwrap();
        assert_eq!(before.milestones.len(), 1);
        assert!(p.faster_route_gate().state().last_check.is_some());

        let new_route = route();
        p.replace_route(Arc::clone(&new_route));
        assert!(Arc::ptr_eq(&p.context().route, &new_route));
        assert_eq!(p.previous(), None);
        assert_eq!(p.faster_route_gate().state().last_check, None);
        assert_eq!(resets.load(Ordering::SeqCst), 1);

        // (0, 0) after (1, 0) is not a regression on the new route.
        let after = p.process(&fix(1)).unwrap();
        assert!(after.milestones.is_empty());
        assert!(after.progress.advancement.leg_changed);
        assert_eq!(after.leg_change, None);
    }

    #[test]
    fn context_flags_follow_options() {
        let p = processor(ScriptedMatcher::ok([]), MilestoneEvaluator::new(), &options(false, true));
        assert_eq!(p.context().flags, FeatureFlags { snap_to_route: false, faster_route_detection: true });
        assert_eq!(p.context().session, SessionId(7));
    }
}

// ── Worker ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod worker {
    use super::*;
    use crate::{EngineError, OverflowPolicy, ProcessingWorker, QueueConfig, TeardownMode, WorkerStats};

    fn collect(rx: &mut crate::DispatchReceiver) -> Vec<DispatchBundle> {
        std::iter::from_fn(|| rx.recv_blocking()).collect()
    }

    #[test]
    fn on_off_on_scenario() {
        let mut opts = options(true, true);
        opts.faster_route.check_interval_secs = 60;
        let ms = MilestoneEvaluator::with_milestones([Milestone::once(
            MilestoneId(1),
            "second step",
            Trigger::gte(TriggerProperty::StepIndex, 1.0),
        )])
        .unwrap();
        let script = [on(0, 0, 900.0), on(0, 1, 450.0), off(0, 1, 400.0), on(0, 1, 300.0)];
        let p = processor(ScriptedMatcher::ok(script), ms, &opts);

        let (worker, mut rx) = ProcessingWorker::spawn(p, opts.queue).unwrap();
        for secs in [0, 100, 200, 300] {
            worker.submit(fix(secs)).unwrap();
        }
        let stats = worker.shutdown(TeardownMode::Drain);
        assert_eq!(stats, WorkerStats { processed: 4, dropped: 0, coalesced: 0 });

        let b = collect(&mut rx);
        assert_eq!(b.len(), 4);

        // t0
        assert_eq!(b[0].progress.step_index, 0);
        assert!(b[0].milestones.is_empty());
        assert!(!b[0].off_route);
        assert!(!b[0].check_faster_route);
        assert_eq!(b[0].position.position, MATCHED);

        // t1: step advanced, milestone, throttle elapsed.
        assert_eq!(b[1].progress.step_index, 1);
        assert!(b[1].progress.advancement.step_changed);
        assert_eq!(b[1].milestones.len(), 1);
        assert!(!b[1].off_route);
        assert!(b[1].check_faster_route);

        // t2: off-route.
        assert!(b[2].off_route);
        assert!(!b[2].check_faster_route);
        assert_eq!(b[2].position, fix(200));

        // t3: back on route.
        assert!(!b[3].off_route);
        assert_eq!(b[3].position.position, MATCHED);
        assert!(b[3].check_faster_route);

        let mut rec = Recorder::default();
        for bundle in &b {
            bundle.deliver(&mut rec);
        }
        assert_eq!(rec.calls.len(), 16);
        assert!(rec.calls.chunks(4).all(|c| c == ["progress", "milestones", "off_route", "faster_route"]));
    }

    #[test]
    fn failures_and_panics_do_not_stop_the_worker() {
        let script = [
            Scripted::Ok(on(0, 0, 900.0)),
            Scripted::Fail,
            Scripted::Panic,
            Scripted::Ok(on(0, 0, 800.0)),
        ];
        let p = processor(ScriptedMatcher::new(script), MilestoneEvaluator::new(), &options(true, false));
        let (worker, mut rx) = ProcessingWorker::spawn(p, QueueConfig::default()).unwrap();
        for secs in 0..4 {
            worker.submit(fix(secs)).unwrap();
        }
        let stats = worker.shutdown(TeardownMode::Drain);
        assert_eq!(stats.processed, 2);
        assert_eq!(stats.dropped, 2);

        let b = collect(&mut rx);
        assert_eq!(b.len(), 2);
        assert_eq!(b[0].position.timestamp, Timestamp::from_secs(0));
        assert_eq!(b[1].position.timestamp, Timestamp::from_secs(3));
        assert!(!b[1].progress.advancement.step_changed);
    }

    #[test]
    fn drop_oldest_keeps_newest_fixes() {
        let statuses = (0..5).map(|i| on(0, 0, 900.0 - i as f64 * 10.0));
        let (matcher, entered, release) = ScriptedMatcher::ok(statuses).gated();
        let p = processor(matcher, MilestoneEvaluator::new(), &options(true, false));
        let queue = QueueConfig { capacity: 2, overflow: OverflowPolicy::DropOldest };
        let (worker, mut rx) = ProcessingWorker::spawn(p, queue).unwrap();

        worker.submit(fix(0)).unwrap();
        entered.recv().unwrap();
        for secs in 1..5 {
            worker.submit(fix(secs)).unwrap();
        }
        assert_eq!(worker.pending(), 2);
        assert_eq!(worker.stats().coalesced, 2);

        drop(release);
        let stats = worker.shutdown(TeardownMode::Drain);
        assert_eq!(stats.processed, 3);

        let times: Vec<_> = collect(&mut rx).iter().map(|b| b.position.timestamp).collect();
        assert_eq!(times, [0, 3, 4].map(Timestamp::from_secs));
    }

    #[test]
    fn discard_drops_pending_and_in_flight() {
        let (matcher, entered, release) = ScriptedMatcher::ok([on(0, 0, 900.0); 3]).gated();
        let p = processor(matcher, MilestoneEvaluator::new(), &options(true, false));
        let (worker, mut rx) = ProcessingWorker::spawn(p, QueueConfig::default()).unwrap();
        let sender = worker.sender();

        for secs in 0..3 {
            sender.submit(fix(secs)).unwrap();
        }
        entered.recv().unwrap();

        let releaser = std::thread::spawn(move || {
            std::thread::sleep(std::time::Duration::from_millis(50));
            drop(release);
        });
        let stats = worker.shutdown(TeardownMode::Discard);
        releaser.join().unwrap();

        // The in-flight tick completed, but its bundle is not delivered.
        assert_eq!(stats.processed, 1);
        assert!(rx.try_recv().is_none());
        assert!(rx.recv_blocking().is_none());
        assert!(matches!(sender.submit(fix(9)), Err(EngineError::WorkerStopped)));
    }

    #[test]
    fn route_replacement_is_ordered_with_fixes() {
        let matcher = ScriptedMatcher::ok([on(0, 1, 100.0), on(0, 0, 1000.0)]);
        let resets = Arc::clone(&matcher.resets);
        let p = processor(matcher, MilestoneEvaluator::new(), &options(true, false));
        let (worker, mut rx) = ProcessingWorker::spawn(p, QueueConfig::default()).unwrap();

        worker.submit(fix(0)).unwrap();
        worker.replace_route(route()).unwrap();
        worker.submit(fix(1)).unwrap();
        let stats = worker.shutdown(TeardownMode::Drain);

        assert_eq!(stats.dropped, 0);
        assert_eq!(resets.load(Ordering::SeqCst), 1);
        let b = collect(&mut rx);
        assert_eq!(b.len(), 2);
        assert!(b[1].progress.advancement.step_changed);
    }

    #[test]
    fn try_deliver_drains_ready_bundles() {
        let script = [on(0, 0, 900.0), on(0, 0, 800.0)];
        let p = processor(ScriptedMatcher::ok(script), MilestoneEvaluator::new(), &options(true, false));
        let (worker, mut rx) = ProcessingWorker::spawn(p, QueueConfig::default()).unwrap();
        worker.submit(fix(0)).unwrap();
        worker.submit(fix(1)).unwrap();
        worker.shutdown(TeardownMode::Drain);

        let mut rec = Recorder::default();
        assert_eq!(rx.try_deliver(&mut rec), 2);
        assert_eq!(rec.calls.len(), 8);
        assert!(!rx.deliver_blocking(&mut rec));
    }

    #[test]
    fn zero_capacity_refused_at_spawn() {
        let p = processor(ScriptedMatcher::ok([]), MilestoneEvaluator::new(), &options(true, false));
        let queue = QueueConfig { capacity: 0, overflow: OverflowPolicy::DropOldest };
        assert!(matches!(ProcessingWorker::spawn(p, queue), Err(EngineError::Config(_))));
    }

    #[test]
    fn dropping_the_handle_stops_the_thread() {
        let p = processor(ScriptedMatcher::ok([]), MilestoneEvaluator::new(), &options(true, false));
        let (worker, mut rx) = ProcessingWorker::spawn(p, QueueConfig::default()).unwrap();
        let sender = worker.sender();
        assert!(worker.is_running());
        drop(worker);
        assert!(rx.recv_blocking().is_none());
        assert!(sender.submit(fix(0)).is_err());
    }
}
