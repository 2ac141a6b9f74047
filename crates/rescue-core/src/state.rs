//! Per-tick output consumed by the rendering collaborator.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::enums::{AlertStatus, ProximityBand, TrackingStatus};
use crate::types::{Connector, ScreenPoint, SessionId};

/// ETA readout. Minutes at or below one collapse into a sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "minutes")]
pub enum EtaDisplay {
    /// No responder assigned yet.
    Pending,
    LessThanOneMinute,
    Minutes(u32),
    Arrived,
}

impl EtaDisplay {
    /// Display form of a raw minute estimate.
    pub fn from_minutes(minutes: f64) -> Self {
        if minutes <= 1.0 {
            Self::LessThanOneMinute
        } else {
            Self::Minutes(minutes.ceil().min(u32::MAX as f64) as u32)
        }
    }
}

impl fmt::Display for EtaDisplay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => f.write_str("Pending assignment"),
            Self::LessThanOneMinute => f.write_str("Less than 1 minute"),
            Self::Minutes(n) => write!(f, "{n} minutes"),
            Self::Arrived => f.write_str("Arrived"),
        }
    }
}

/// Everything the rendering collaborator needs to paint one session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackingFrame {
    pub session_id: SessionId,
    /// Engine clock when the frame was produced (ms).
    pub at_ms: u64,
    pub status: TrackingStatus,
    pub alert_status: AlertStatus,
    /// Distance from victim to simulated responder (km).
    pub distance_km: f64,
    /// Human readout, e.g. "850m" or "12.4km".
    pub distance_text: String,
    pub eta_minutes: f64,
    pub eta: EtaDisplay,
    pub proximity: ProximityBand,
    /// Responder marker on the display surface (victim sits at the center).
    pub projected: ScreenPoint,
    /// Indicator from the victim marker to the responder marker.
    pub connector: Connector,
}
