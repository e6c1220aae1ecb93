//! Reference [`RouteMatcher`] that projects fixes onto step geometry.
//!
//! # Method
//!
//! At first use for a route the matcher projects every step polyline into a
//! local equirectangular frame (metres, origin at the route start) and bulk
//! loads its segments into an R-tree.  Each fix is then:
//!
//! 1. projected into the same frame,
//! 2. matched to the nearest segment that is not behind the last on-route
//!    match (so indices never go backwards),
//! 3. declared off-route when the perpendicular distance exceeds
//!    `off_route_threshold_m`.
//!
//! Remaining step distance is measured along the polyline from the projection
//! point and rescaled to the step's published `distance_m`; remaining
//! duration uses the same fraction.
//!
//! The equirectangular frame is accurate to well under 1 % over the extent of
//! a city route.  Continental routes should use a real map matcher.

use std::sync::Arc;

use rstar::{PointDistance, RTree, RTreeObject, AABB};

use nav_core::{GeoPoint, LocationFix};

use crate::{MatchError, MatchResult, MatchStatus, MatchedPosition, NavigationContext, Route, RouteMatcher};

// ── Configuration ─────────────────────────────────────────────────────────────

/// Tuning for [`PolylineMatcher`].
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PolylineMatcherConfig {
    /// Perpendicular distance beyond which a fix is off-route, metres.
    pub off_route_threshold_m: f64,
}

impl Default for PolylineMatcherConfig {
    fn default() -> Self {
        Self { off_route_threshold_m: 50.0 }
    }
}

// ── Local planar frame ────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug)]
struct LocalFrame {
    origin:  GeoPoint,
    cos_lat: f64,
}

impl LocalFrame {
    fn new(origin: GeoPoint) -> Self {
        Self { origin, cos_lat: origin.lat.to_radians().cos() }
    }

    fn project(&self, p: GeoPoint) -> [f64; 2] {
        let r = GeoPoint::EARTH_RADIUS_M;
        [
            (p.lon - self.origin.lon).to_radians() * r * self.cos_lat,
            (p.lat - self.origin.lat).to_radians() * r,
        ]
    }

    fn unproject(&self, xy: [f64; 2]) -> GeoPoint {
        let r = GeoPoint::EARTH_RADIUS_M;
        GeoPoint {
            lat: self.origin.lat + (xy[1] / r).to_degrees(),
            lon: self.origin.lon + (xy[0] / (r * self.cos_lat)).to_degrees(),
        }
    }
}

// ── R-tree segment entry ──────────────────────────────────────────────────────

/// One polyline segment of one step, in local metres.
#[derive(Clone, Debug)]
struct SegmentEntry {
    a:    [f64; 2],
    b:    [f64; 2],
    leg:  usize,
    step: usize,
    seg:  usize,
}

impl SegmentEntry {
    /// Closest point on the segment to `p` and its parameter `t ∈ [0, 1]`.
    fn closest(&self, p: [f64; 2]) -> ([f64; 2], f64) {
        let dx = self.b[0] - self.a[0];
        let dy = self.b[1] - self.a[1];
        let len2 = dx * dx + dy * dy;
        if len2 == 0.0 {
            return (self.a, 0.0);
        }
        let t = (((p[0] - self.a[0]) * dx + (p[1] - self.a[1]) * dy) / len2).clamp(0.0, 1.0);
        ([self.a[0] + t * dx, self.a[1] + t * dy], t)
    }

    /// Segment heading, degrees clockwise from north.
    fn bearing(&self) -> Option<f32> {
        let dx = self.b[0] - self.a[0];
        let dy = self.b[1] - self.a[1];
        if dx == 0.0 && dy == 0.0 {
            return None;
        }
        Some(dx.atan2(dy).to_degrees().rem_euclid(360.0) as f32)
    }
}

impl RTreeObject for SegmentEntry {
    type Envelope = AABB<[f64; 2]>;
    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(self.a, self.b)
    }
}

impl PointDistance for SegmentEntry {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let (q, _) = self.closest(*point);
        let dx = q[0] - point[0];
        let dy = q[1] - point[1];
        dx * dx + dy * dy
    }
}

// ── Per-route index ───────────────────────────────────────────────────────────

/// Segment lengths of one step polyline.
#[derive(Debug, Default)]
struct StepGeometry {
    seg_len:   Vec<f64>,
    /// Length of all segments after segment `i`.
    seg_after: Vec<f64>,
    total:     f64,
}

struct RouteIndex {
    route: Arc<Route>,
    frame: LocalFrame,
    tree:  RTree<SegmentEntry>,
    steps: Vec<Vec<StepGeometry>>,
}

impl RouteIndex {
    fn build(route: Arc<Route>) -> Self {
        let origin = route
            .legs()
            .iter()
            .flat_map(|l| l.steps.iter())
            .find_map(|s| s.geometry.first().copied())
            .unwrap_or(GeoPoint::new(0.0, 0.0));
        let frame = LocalFrame::new(origin);

        let mut entries = Vec::new();
        let mut steps   = Vec::with_capacity(route.leg_count());

        for (li, leg) in route.legs().iter().enumerate() {
            let mut leg_geom = Vec::with_capacity(leg.steps.len());
            for (si, step) in leg.steps.iter().enumerate() {
                let pts: Vec<[f64; 2]> = step.geometry.iter().map(|&p| frame.project(p)).collect();

                // A single-point step still needs to be matchable.
                let pairs: Vec<([f64; 2], [f64; 2])> = match pts.len() {
                    0 => vec![],
                    1 => vec![(pts[0], pts[0])],
                    _ => pts.windows(2).map(|w| (w[0], w[1])).collect(),
                };

                let mut geom = StepGeometry::default();
                for (seg, &(a, b)) in pairs.iter().enumerate() {
                    let len = ((b[0] - a[0]).powi(2) + (b[1] - a[1]).powi(2)).sqrt();
                    geom.seg_len.push(len);
                    entries.push(SegmentEntry { a, b, leg: li, step: si, seg });
                }
                let mut acc = 0.0;
                geom.seg_after = vec![0.0; geom.seg_len.len()];
                for i in (0..geom.seg_len.len()).rev() {
                    geom.seg_after[i] = acc;
                    acc += geom.seg_len[i];
                }
                geom.total = acc;
                leg_geom.push(geom);
            }
            steps.push(leg_geom);
        }

        Self { route, frame, tree: RTree::bulk_load(entries), steps }
    }

    fn locate(
        &self,
        fix:       &LocationFix,
        last:      (usize, usize),
        threshold: f64,
    ) -> MatchResult<MatchStatus> {
        let p = self.frame.project(fix.position);

        let hit = self
            .tree
            .nearest_neighbor_iter(&p)
            .find(|e| (e.leg, e.step) >= last)
            .ok_or_else(|| MatchError::Unmatched("no route geometry ahead of the last match".into()))?;

        let (q, t) = hit.closest(p);
        let offset = ((p[0] - q[0]).powi(2) + (p[1] - q[1]).powi(2)).sqrt();

        let step = self
            .route
            .step(hit.leg, hit.step)
            .ok_or(MatchError::IndexOutOfRange { leg: hit.leg, step: hit.step })?;
        let geom = &self.steps[hit.leg][hit.step];

        let along_remaining = geom.seg_len[hit.seg] * (1.0 - t) + geom.seg_after[hit.seg];
        let ratio = if geom.total > 0.0 { along_remaining / geom.total } else { 0.0 };

        Ok(MatchStatus {
            off_route: offset > threshold,
            matched: MatchedPosition {
                point:   self.frame.unproject(q),
                bearing: hit.bearing(),
            },
            leg_index:                 hit.leg,
            step_index:                hit.step,
            step_distance_remaining_m: step.distance_m * ratio,
            step_duration_remaining_s: step.duration_s * ratio,
        })
    }
}

// ── PolylineMatcher ───────────────────────────────────────────────────────────

/// Nearest-segment matcher over step geometry.  See the module docs.
///
/// The segment index is rebuilt lazily whenever the context carries a
/// different `Arc<Route>` than the one last indexed.
pub struct PolylineMatcher {
    config: PolylineMatcherConfig,
    index:  Option<RouteIndex>,
    /// Last on-route (leg, step).  Candidates behind it are ignored.
    last:   (usize, usize),
}

impl PolylineMatcher {
    pub fn new(config: PolylineMatcherConfig) -> Self {
        Self { config, index: None, last: (0, 0) }
    }
}

impl Default for PolylineMatcher {
    fn default() -> Self {
        Self::new(PolylineMatcherConfig::default())
    }
}

impl RouteMatcher for PolylineMatcher {
    fn match_fix(&mut self, fix: &LocationFix, ctx: &NavigationContext) -> MatchResult<MatchStatus> {
        fix.validate()?;

        let stale = self
            .index
            .as_ref()
            .is_none_or(|i| !Arc::ptr_eq(&i.route, &ctx.route));
        if stale {
            self.index = Some(RouteIndex::build(Arc::clone(&ctx.route)));
            self.last = (0, 0);
        }
        let index = self.index.as_ref().ok_or(MatchError::NoActiveRoute)?;

        let status = index.locate(fix, self.last, self.config.off_route_threshold_m)?;
        if !status.off_route {
            self.last = (status.leg_index, status.step_index);
        }
        Ok(status)
    }

    fn reset(&mut self) {
        self.index = None;
        self.last = (0, 0);
    }
}
