//! Demo route: two legs through downtown Mobile, Alabama.
//!
//! ```text
//!            (2)──────────(3)  waypoint 2
//!             │
//!             │ Royal St
//!             │
//! (0)────────(1)  waypoint 1
//!   Government St
//! ```

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use nav_core::GeoPoint;
use nav_route::{Route, RouteLeg, RouteStep};

/// On-disk route document: `{ "legs": [ { "steps": [ ... ] } ] }`.
#[derive(Deserialize)]
struct RouteFile {
    legs: Vec<RouteLeg>,
}

pub fn load_route_json(path: &Path) -> Result<Route> {
    let text = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let file: RouteFile = serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))?;
    Ok(Route::new(file.legs)?)
}

/// Step with geometry; distance from the polyline, duration at `speed_mps`.
fn step(name: &str, points: &[GeoPoint], speed_mps: f64) -> RouteStep {
    let distance_m: f64 = points.windows(2).map(|w| w[0].distance_m(w[1])).sum();
    RouteStep::new(name, distance_m, distance_m / speed_mps).with_geometry(points.to_vec())
}

pub fn build_demo_route() -> Result<Route> {
    let p0 = GeoPoint::new(30.6900, -88.0500);
    let p1 = GeoPoint::new(30.6900, -88.0400);
    let p2 = GeoPoint::new(30.6990, -88.0400);
    let p3 = GeoPoint::new(30.6990, -88.0320);

    let leg_one = RouteLeg::new(vec![
        step("Government St", &[p0, GeoPoint::new(30.6900, -88.0450), p1], 11.0),
        step("arrive: waypoint 1", &[p1], 11.0),
    ]);
    let leg_two = RouteLeg::new(vec![
        step("Royal St", &[p1, p2], 9.0),
        step("St Francis St", &[p2, p3], 9.0),
        step("arrive: waypoint 2", &[p3], 9.0),
    ]);

    Ok(Route::new(vec![leg_one, leg_two])?)
}
