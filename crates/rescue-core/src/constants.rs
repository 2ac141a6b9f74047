//! Engine constants and tuning defaults.

// --- Geodesy ---

/// Mean Earth radius in kilometres used by the haversine formula.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Valid latitude range (degrees).
pub const MAX_LATITUDE: f64 = 90.0;

/// Valid longitude range (degrees).
pub const MAX_LONGITUDE: f64 = 180.0;

// --- Movement simulation ---

/// Fraction of the remaining gap closed per simulation tick.
pub const DEFAULT_STEP_FRACTION: f64 = 0.05;

/// Distance at which a responder counts as arrived (km, ~100 m).
pub const ARRIVAL_THRESHOLD_KM: f64 = 0.1;

/// Simulation tick interval (ms).
pub const DEFAULT_SIMULATION_INTERVAL_MS: u64 = 1000;

// --- Reconciliation ---

/// Status poll interval (ms). Dashboards use 3-30 s depending on surface.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 5000;

// --- ETA ---

/// Assumed average responder speed (km/h).
pub const DEFAULT_ASSUMED_SPEED_KMH: f64 = 60.0;

// --- Display surface ---

/// Display position of the victim on the 0-100 surface (both axes).
pub const DISPLAY_CENTER: f64 = 50.0;

/// Lower clamp bound for projected markers.
pub const DISPLAY_MIN: f64 = 10.0;

/// Upper clamp bound for projected markers.
pub const DISPLAY_MAX: f64 = 90.0;

/// Projection scale for small synthetic deltas (display units per degree).
pub const SCALE_SYNTHETIC: f64 = 30.0;

/// Projection scale for street-level real-world deltas (display units per degree).
pub const SCALE_STREET: f64 = 5000.0;

// --- Proximity bands ---

/// Below this distance a responder is shown as near (km).
pub const NEAR_BAND_KM: f64 = 1.0;

/// Below this distance a responder is shown as approaching (km).
pub const APPROACHING_BAND_KM: f64 = 5.0;
