//! Fix traces: CSV loading and synthetic generation.
//!
//! # CSV format
//!
//! ```csv
//! t_ms,lat,lon,bearing,speed,accuracy
//! 0,30.69001,-88.04998,90.0,11.2,4.0
//! 2000,30.68999,-88.04975,,11.0,
//! ```
//!
//! `bearing`, `speed` and `accuracy` may be left empty.

use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;

use nav_core::{GeoPoint, LocationFix, Timestamp};
use nav_route::Route;

// ── CSV record ────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct FixRecord {
    t_ms:     u64,
    lat:      f64,
    lon:      f64,
    bearing:  Option<f32>,
    speed:    Option<f32>,
    accuracy: Option<f32>,
}

impl From<FixRecord> for LocationFix {
    fn from(r: FixRecord) -> Self {
        LocationFix {
            position:  GeoPoint::new(r.lat, r.lon),
            timestamp: Timestamp(r.t_ms),
            bearing:   r.bearing,
            speed:     r.speed,
            accuracy:  r.accuracy,
        }
    }
}

pub fn load_fixes_csv(path: &Path) -> Result<Vec<LocationFix>> {
    let file = std::fs::File::open(path).with_context(|| format!("opening {}", path.display()))?;
    load_fixes_reader(file)
}

/// Like [`load_fixes_csv`] but accepts any `Read` source.
pub fn load_fixes_reader<R: Read>(reader: R) -> Result<Vec<LocationFix>> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut fixes = Vec::new();
    for (row, result) in csv_reader.deserialize::<FixRecord>().enumerate() {
        let record = result.with_context(|| format!("fix row {}", row + 1))?;
        fixes.push(record.into());
    }
    Ok(fixes)
}

// ── Synthetic trace ───────────────────────────────────────────────────────────

const M_PER_DEG_LAT: f64 = 111_195.0;

/// Shift `p` by the given metres north and east.
fn offset(p: GeoPoint, north_m: f64, east_m: f64) -> GeoPoint {
    GeoPoint::new(
        p.lat + north_m / M_PER_DEG_LAT,
        p.lon + east_m / (M_PER_DEG_LAT * p.lat.to_radians().cos()),
    )
}

/// Tuning for [`synthesize`].
pub struct TraceConfig {
    pub seed:           u64,
    pub speed_mps:      f64,
    pub interval_ms:    u64,
    /// GPS noise amplitude, metres.
    pub jitter_m:       f64,
    /// Route fraction range over which the driver strays sideways.
    pub detour:         (f64, f64),
    pub detour_m:       f64,
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            seed:        42,
            speed_mps:   10.0,
            interval_ms: 2_000,
            jitter_m:    3.0,
            detour:      (0.55, 0.62),
            detour_m:    120.0,
        }
    }
}

/// Drive the route geometry at constant speed and sample noisy fixes.
pub fn synthesize(route: &Route, config: &TraceConfig) -> Vec<LocationFix> {
    let mut points: Vec<GeoPoint> = Vec::new();
    for step in route.legs().iter().flat_map(|l| l.steps.iter()) {
        for &p in &step.geometry {
            if points.last() != Some(&p) {
                points.push(p);
            }
        }
    }
    let total_m: f64 = points.windows(2).map(|w| w[0].distance_m(w[1])).sum();
    if total_m == 0.0 {
        return Vec::new();
    }

    let mut rng = SmallRng::seed_from_u64(config.seed);
    let spacing = config.speed_mps * config.interval_ms as f64 / 1_000.0;
    let mut fixes = Vec::new();
    let mut driven = 0.0;
    let mut t_ms = 0;

    for w in points.windows(2) {
        let (a, b) = (w[0], w[1]);
        let len = a.distance_m(b);
        if len == 0.0 {
            continue;
        }
        let north = (b.lat - a.lat) * M_PER_DEG_LAT;
        let east = (b.lon - a.lon) * M_PER_DEG_LAT * a.lat.to_radians().cos();
        let bearing = east.atan2(north).to_degrees().rem_euclid(360.0) as f32;

        let mut along = (fixes.len() as f64 * spacing) - driven;
        while along < len {
            let f = along / len;
            let mut p = GeoPoint::new(a.lat + (b.lat - a.lat) * f, a.lon + (b.lon - a.lon) * f);

            let fraction = (driven + along) / total_m;
            if (config.detour.0..config.detour.1).contains(&fraction) {
                // Left-hand normal of the segment direction.
                p = offset(p, east / len * config.detour_m, -north / len * config.detour_m);
            }
            let jn = rng.gen_range(-config.jitter_m..=config.jitter_m);
            let je = rng.gen_range(-config.jitter_m..=config.jitter_m);
            p = offset(p, jn, je);

            fixes.push(
                LocationFix::new(p, Timestamp(t_ms))
                    .with_bearing(bearing)
                    .with_speed(config.speed_mps as f32)
                    .with_accuracy(config.jitter_m as f32),
            );
            t_ms += config.interval_ms;
            along += spacing;
        }
        driven += len;
    }

    fixes
}
