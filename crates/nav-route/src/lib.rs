//! `nav-route` — the active route and the route-matcher boundary.
//!
//! # Crate layout
//!
//! | Module      | Contents                                                        |
//! |-------------|-----------------------------------------------------------------|
//! | [`route`]   | `Route`, `RouteLeg`, `RouteStep`, precomputed suffix `Totals`   |
//! | [`context`] | `NavigationContext`, `FeatureFlags` — read-only per-session view |
//! | [`matcher`] | `RouteMatcher` trait, `MatchStatus`, `MatchedPosition`           |
//! | [`polyline`]| `PolylineMatcher` — reference matcher over step geometry         |
//! | [`error`]   | `RouteError`, `MatchError`                                       |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                       |
//! |---------|--------------------------------------------------------------|
//! | `serde` | Derives `Serialize`/`Deserialize` on legs, steps and flags.  |

pub mod context;
pub mod error;
pub mod matcher;
pub mod polyline;
pub mod route;


pub use context::{FeatureFlags, NavigationContext};
pub use error::{MatchError, MatchResult, RouteError, RouteResult};
pub use matcher::{MatchStatus, MatchedPosition, RouteMatcher};
pub use polyline::{PolylineMatcher, PolylineMatcherConfig};
pub use route::{Route, RouteLeg, RouteStep, Totals};
