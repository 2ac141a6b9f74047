//! Display projection: maps a geographic delta onto the tracking surface.
//!
//! The victim is pinned at the center (50, 50) of a normalized 0-100 surface.
//! Offsets are linear in degrees (no cos(lat) correction) and clamped to
//! [10, 90] so the responder marker always stays visible.

use glam::DVec2;

use rescue_core::constants::{DISPLAY_CENTER, DISPLAY_MAX, DISPLAY_MIN};
use rescue_core::types::{Connector, Coordinate, ScreenPoint};
use rescue_core::TrackError;

/// Victim-centered projection with a fixed scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projector {
    /// Display units per degree of coordinate delta.
    scale: f64,
}

impl Projector {
    /// Create a projector. The scale must be positive and finite.
    pub fn new(scale: f64) -> Result<Self, TrackError> {
        if scale.is_finite() && scale > 0.0 {
            Ok(Self { scale })
        } else {
            Err(TrackError::Configuration(format!(
                "projection scale must be positive, got {scale}"
            )))
        }
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Display position of the victim marker.
    pub fn center() -> ScreenPoint {
        ScreenPoint::new(DISPLAY_CENTER, DISPLAY_CENTER)
    }

    /// Project `other` relative to `victim`. North renders upward.
    pub fn project(&self, victim: &Coordinate, other: &Coordinate) -> ScreenPoint {
        let offset = DVec2::new(
            other.longitude - victim.longitude,
            victim.latitude - other.latitude,
        ) * self.scale;
        let point = (DVec2::splat(DISPLAY_CENTER) + offset)
            .clamp(DVec2::splat(DISPLAY_MIN), DVec2::splat(DISPLAY_MAX));
        ScreenPoint::new(point.x, point.y)
    }
}

/// Length and `atan2` angle (degrees) of the segment `from -> to`.
pub fn connector(from: &ScreenPoint, to: &ScreenPoint) -> Connector {
    let delta = DVec2::new(to.x - from.x, to.y - from.y);
    Connector {
        length: delta.length(),
        angle_degrees: delta.y.atan2(delta.x).to_degrees(),
    }
}
