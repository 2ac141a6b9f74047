//! Engine configuration.
//!
//! Every field except `projection_scale` has a default. The scale is tied to
//! the magnitude of the coordinate deltas a surface expects, so callers must
//! pick one explicitly (see `constants::SCALE_SYNTHETIC` / `SCALE_STREET`).

use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::error::TrackError;

/// Tuning parameters recognized by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Fraction of the remaining gap closed per simulation tick, in (0, 1].
    #[serde(default = "default_step_fraction")]
    pub step_fraction: f64,
    /// Arrival distance (km).
    #[serde(default = "default_arrival_threshold_km")]
    pub arrival_threshold_km: f64,
    /// Assumed responder speed for ETA estimates (km/h).
    #[serde(default = "default_assumed_speed_kmh")]
    pub assumed_speed_kmh: f64,
    /// Display units per degree of coordinate delta.
    pub projection_scale: f64,
    /// Status poll interval (ms).
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Movement simulation interval (ms).
    #[serde(default = "default_simulation_interval_ms")]
    pub simulation_interval_ms: u64,
}

fn default_step_fraction() -> f64 {
    DEFAULT_STEP_FRACTION
}

fn default_arrival_threshold_km() -> f64 {
    ARRIVAL_THRESHOLD_KM
}

fn default_assumed_speed_kmh() -> f64 {
    DEFAULT_ASSUMED_SPEED_KMH
}

fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}

fn default_simulation_interval_ms() -> u64 {
    DEFAULT_SIMULATION_INTERVAL_MS
}

impl EngineConfig {
    /// Defaults for everything but the projection scale.
    pub fn new(projection_scale: f64) -> Self {
        Self {
            step_fraction: DEFAULT_STEP_FRACTION,
            arrival_threshold_km: ARRIVAL_THRESHOLD_KM,
            assumed_speed_kmh: DEFAULT_ASSUMED_SPEED_KMH,
            projection_scale,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            simulation_interval_ms: DEFAULT_SIMULATION_INTERVAL_MS,
        }
    }

    /// Reject values the engine cannot run with.
    pub fn validate(&self) -> Result<(), TrackError> {
        if !(self.step_fraction > 0.0 && self.step_fraction <= 1.0) {
            return Err(TrackError::Configuration(format!(
                "step_fraction must be in (0, 1], got {}",
                self.step_fraction
            )));
        }
        if !(self.arrival_threshold_km.is_finite() && self.arrival_threshold_km >= 0.0) {
            return Err(TrackError::Configuration(format!(
                "arrival_threshold_km must be non-negative, got {}",
                self.arrival_threshold_km
            )));
        }
        if !(self.assumed_speed_kmh.is_finite() && self.assumed_speed_kmh > 0.0) {
            return Err(TrackError::Configuration(format!(
                "assumed_speed_kmh must be positive, got {}",
                self.assumed_speed_kmh
            )));
        }
        if !(self.projection_scale.is_finite() && self.projection_scale > 0.0) {
            return Err(TrackError::Configuration(format!(
                "projection_scale must be positive, got {}",
                self.projection_scale
            )));
        }
        if self.poll_interval_ms == 0 {
            return Err(TrackError::Configuration(
                "poll_interval_ms must be non-zero".into(),
            ));
        }
        if self.simulation_interval_ms == 0 {
            return Err(TrackError::Configuration(
                "simulation_interval_ms must be non-zero".into(),
            ));
        }
        Ok(())
    }
}
