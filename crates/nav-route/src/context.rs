//! Read-only per-session view handed to the matcher on every fix.

use std::sync::Arc;

use nav_core::SessionId;

use crate::Route;

/// Feature toggles owned by the embedding application.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FeatureFlags {
    /// Report the route-matched position instead of the raw fix while on-route.
    pub snap_to_route:          bool,
    /// Allow the faster-route gate to request out-of-band checks.
    pub faster_route_detection: bool,
}

/// The active route, the feature flags and the session identity.
///
/// Cloning is cheap (one `Arc` bump).  The core never mutates a context; a
/// route replacement installs a new one.
#[derive(Clone, Debug)]
pub struct NavigationContext {
    pub route:   Arc<Route>,
    pub session: SessionId,
    pub flags:   FeatureFlags,
}

impl NavigationContext {
    pub fn new(route: Arc<Route>, session: SessionId, flags: FeatureFlags) -> Self {
        Self { route, session, flags }
    }

    /// Same session and flags, different route.
    pub fn with_route(&self, route: Arc<Route>) -> Self {
        Self { route, session: self.session, flags: self.flags }
    }
}
