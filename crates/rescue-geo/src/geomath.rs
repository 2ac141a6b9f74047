//! Great-circle distance, bearing and ETA.
//!
//! All functions are pure. Inputs are assumed to be validated coordinates;
//! NaN in gives NaN out.

use rescue_core::constants::{DEFAULT_ASSUMED_SPEED_KMH, EARTH_RADIUS_KM};
use rescue_core::types::Coordinate;
use rescue_core::TrackError;

/// Haversine distance between two coordinates (km).
pub fn distance_km(a: &Coordinate, b: &Coordinate) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let dlat = (b.latitude - a.latitude).to_radians();
    let dlon = (b.longitude - a.longitude).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    // Rounding can push h just past 1 for near-antipodal points.
    let h = h.clamp(0.0, 1.0);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_KM * c
}

/// Initial great-circle bearing from `a` to `b` in degrees (0 = North, clockwise).
pub fn initial_bearing_deg(a: &Coordinate, b: &Coordinate) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let dlon = (b.longitude - a.longitude).to_radians();

    let y = dlon.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * dlon.cos();
    y.atan2(x).to_degrees().rem_euclid(360.0)
}

/// Linear ETA in whole minutes: `ceil(distance / speed * 60)`.
///
/// Rejects non-positive speeds with `TrackError::Configuration`.
pub fn eta_minutes(distance_km: f64, speed_kmh: f64) -> Result<f64, TrackError> {
    Ok(AssumedSpeed::new(speed_kmh)?.eta_minutes(distance_km))
}

/// Validated average responder speed (km/h).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AssumedSpeed(f64);

impl AssumedSpeed {
    pub fn new(kmh: f64) -> Result<Self, TrackError> {
        if kmh.is_finite() && kmh > 0.0 {
            Ok(Self(kmh))
        } else {
            Err(TrackError::Configuration(format!(
                "assumed speed must be positive, got {kmh} km/h"
            )))
        }
    }

    pub fn kmh(&self) -> f64 {
        self.0
    }

    pub fn eta_minutes(&self, distance_km: f64) -> f64 {
        (distance_km / self.0 * 60.0).ceil()
    }
}

impl Default for AssumedSpeed {
    fn default() -> Self {
        Self(DEFAULT_ASSUMED_SPEED_KMH)
    }
}

/// Distance readout: meters below 1 km ("850m"), one decimal above ("12.4km").
pub fn format_distance(distance_km: f64) -> String {
    if distance_km < 1.0 {
        format!("{}m", (distance_km * 1000.0).round())
    } else {
        format!("{distance_km:.1}km")
    }
}
