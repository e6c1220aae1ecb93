//! Raw location samples.

use crate::{CoreError, CoreResult, GeoPoint, Timestamp};

/// One raw position sample from the location source.
///
/// Created by the producer, consumed once per tick.  Optional fields are
/// `None` when the provider did not report them.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LocationFix {
    pub position:  GeoPoint,
    pub timestamp: Timestamp,
    /// Heading in degrees clockwise from true north, `[0, 360)`.
    pub bearing:   Option<f32>,
    /// Ground speed, metres per second.
    pub speed:     Option<f32>,
    /// Horizontal accuracy radius, metres.
    pub accuracy:  Option<f32>,
}

impl LocationFix {
    /// A fix with only a position and a timestamp.
    pub fn new(position: GeoPoint, timestamp: Timestamp) -> Self {
        Self {
            position,
            timestamp,
            bearing:  None,
            speed:    None,
            accuracy: None,
        }
    }

    pub fn with_bearing(mut self, bearing: f32) -> Self {
        self.bearing = Some(bearing);
        self
    }

    pub fn with_speed(mut self, speed: f32) -> Self {
        self.speed = Some(speed);
        self
    }

    pub fn with_accuracy(mut self, accuracy: f32) -> Self {
        self.accuracy = Some(accuracy);
        self
    }

    /// Reject fixes a matcher could never resolve.
    pub fn validate(&self) -> CoreResult<()> {
        if !self.position.is_valid() {
            return Err(CoreError::InvalidFix(format!(
                "position {} out of range",
                self.position
            )));
        }
        if let Some(acc) = self.accuracy {
            if !acc.is_finite() || acc < 0.0 {
                return Err(CoreError::InvalidFix(format!("accuracy {acc} is not a radius")));
            }
        }
        if let Some(speed) = self.speed {
            if !speed.is_finite() || speed < 0.0 {
                return Err(CoreError::InvalidFix(format!("speed {speed} is not a magnitude")));
            }
        }
        Ok(())
    }
}
