//! Snap resolver.

use nav_core::LocationFix;
use nav_route::MatchStatus;

/// Choose the position reported downstream for one fix.
///
/// Returns the raw fix with its coordinate (and bearing, if the matcher
/// supplied one) replaced by the matched position when `snap_enabled` and
/// not `off_route`; otherwise the raw fix unchanged.  Timestamp, speed and
/// accuracy always come from the raw fix.
pub fn resolve_position(
    fix:          &LocationFix,
    status:       &MatchStatus,
    off_route:    bool,
    snap_enabled: bool,
) -> LocationFix {
    if !snap_enabled || off_route {
        return fix.clone();
    }
    LocationFix {
        position: status.matched.point,
        bearing:  status.matched.bearing.or(fix.bearing),
        ..fix.clone()
    }
}
