//! Engine configuration.
//!
//! Owned by the embedding application and read-only to the engine.  Every
//! field has a default so a partial (or empty) JSON object is valid:
//!
//! ```json
//! {
//!   "snap_to_route": true,
//!   "faster_route_detection": true,
//!   "faster_route": { "check_interval_secs": 120 },
//!   "queue": { "capacity": 32, "overflow": "drop_oldest" }
//! }
//! ```

use serde::{Deserialize, Serialize};

use nav_route::FeatureFlags;

use crate::{EngineError, EngineResult};

/// Top-level engine options.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigationOptions {
    /// Report the matched position while on-route.  Default: `true`.
    pub snap_to_route:          bool,
    /// Let the faster-route gate fire.  Default: `false`.
    pub faster_route_detection: bool,
    pub faster_route:           FasterRouteConfig,
    pub queue:                  QueueConfig,
}

impl Default for NavigationOptions {
    fn default() -> Self {
        Self {
            snap_to_route:          true,
            faster_route_detection: false,
            faster_route:           FasterRouteConfig::default(),
            queue:                  QueueConfig::default(),
        }
    }
}

impl NavigationOptions {
    /// Parse and validate options from a JSON document.
    pub fn from_json_str(json: &str) -> EngineResult<Self> {
        let options: Self = serde_json::from_str(json).map_err(|e| EngineError::Config(e.to_string()))?;
        options.validate()?;
        Ok(options)
    }

    pub fn validate(&self) -> EngineResult<()> {
        if self.queue.overflow == OverflowPolicy::DropOldest && self.queue.capacity == 0 {
            return Err(EngineError::Config("queue.capacity must be at least 1 with drop_oldest".into()));
        }
        let fr = &self.faster_route;
        if !fr.min_distance_m.is_finite() || fr.min_distance_m < 0.0 {
            return Err(EngineError::Config("faster_route.min_distance_m must be >= 0".into()));
        }
        if !fr.min_route_duration_remaining_s.is_finite() || fr.min_route_duration_remaining_s < 0.0 {
            return Err(EngineError::Config(
                "faster_route.min_route_duration_remaining_s must be >= 0".into(),
            ));
        }
        Ok(())
    }

    /// The feature toggles handed to the matcher through the context.
    pub fn flags(&self) -> FeatureFlags {
        FeatureFlags {
            snap_to_route:          self.snap_to_route,
            faster_route_detection: self.faster_route_detection,
        }
    }
}

/// Throttle thresholds for the faster-route gate.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FasterRouteConfig {
    /// Minimum time between two positive decisions.  Default: 120 s.
    pub check_interval_secs:            u64,
    /// Minimum distance moved since the last positive decision.  Default: 0.
    pub min_distance_m:                 f64,
    /// Skip checks when this little of the route is left.  Default: 600 s.
    pub min_route_duration_remaining_s: f64,
}

impl Default for FasterRouteConfig {
    fn default() -> Self {
        Self {
            check_interval_secs:            120,
            min_distance_m:                 0.0,
            min_route_duration_remaining_s: 600.0,
        }
    }
}

/// What to do when fixes arrive faster than the worker drains them.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverflowPolicy {
    /// Keep at most `capacity` fixes; evict the oldest to admit a new one.
    #[default]
    DropOldest,
    /// Never drop.  Memory grows with the backlog.
    Unbounded,
}

/// Inbound queue sizing.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Maximum queued fixes.  Default: 64.
    pub capacity: usize,
    pub overflow: OverflowPolicy,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self { capacity: 64, overflow: OverflowPolicy::DropOldest }
    }
}
