//! `nav-core` — foundational types for the `rust_nav` route-progress engine.
//!
//! This crate is a dependency of every other `nav-*` crate.  It has no
//! `nav-*` dependencies and minimal external ones (only `thiserror`, plus
//! optional `serde`).
//!
//! # What lives here
//!
//! | Module     | Contents                                              |
//! |------------|-------------------------------------------------------|
//! | [`ids`]    | `MilestoneId`, `SessionId`                            |
//! | [`geo`]    | `GeoPoint`, haversine distance                        |
//! | [`time`]   | `Timestamp` (epoch milliseconds)                      |
//! | [`fix`]    | `LocationFix` — one raw position sample               |
//! | [`error`]  | `CoreError`, `CoreResult`                             |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public types.        |

pub mod error;
pub mod fix;
pub mod geo;
pub mod ids;
pub mod time;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use error::{CoreError, CoreResult};
pub use fix::LocationFix;
pub use geo::GeoPoint;
pub use ids::{MilestoneId, SessionId};
pub use time::Timestamp;
