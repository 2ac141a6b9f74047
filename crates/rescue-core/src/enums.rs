//! Enumeration types used throughout the engine.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::{APPROACHING_BAND_KM, NEAR_BAND_KM};

/// Lifecycle of one victim/responder tracking relationship.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TrackingStatus {
    /// No responder position has been reported yet.
    #[default]
    Unassigned,
    /// A responder is assigned and still outside the arrival threshold.
    EnRoute,
    /// The simulated responder is within the arrival threshold (terminal
    /// until a farther target re-opens the session).
    Arrived,
}

/// Alert status string owned by the status service.
///
/// Unrecognized strings map to `Unknown` rather than failing the poll.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AlertStatus {
    #[default]
    Pending,
    Dispatched,
    InProgress,
    Resolved,
    Unknown,
}

impl AlertStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Dispatched => "dispatched",
            Self::InProgress => "in_progress",
            Self::Resolved => "resolved",
            Self::Unknown => "unknown",
        }
    }
}

impl From<String> for AlertStatus {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "pending" => Self::Pending,
            "dispatched" => Self::Dispatched,
            "in_progress" => Self::InProgress,
            "resolved" => Self::Resolved,
            _ => Self::Unknown,
        }
    }
}

impl From<AlertStatus> for String {
    fn from(value: AlertStatus) -> Self {
        value.as_str().to_owned()
    }
}

impl fmt::Display for AlertStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse distance band used to color the distance readout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProximityBand {
    /// Under 1 km.
    Near,
    /// Under 5 km.
    Approaching,
    #[default]
    Distant,
}

impl ProximityBand {
    pub fn classify(distance_km: f64) -> Self {
        if distance_km < NEAR_BAND_KM {
            Self::Near
        } else if distance_km < APPROACHING_BAND_KM {
            Self::Approaching
        } else {
            Self::Distant
        }
    }
}

/// Which repeating task a timer handle drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TimerSlot {
    /// Movement simulation tick.
    Simulation,
    /// Authoritative status poll.
    Reconciliation,
}
