//! Events emitted by the engine for logging and UI feedback.

use serde::{Deserialize, Serialize};

use crate::enums::AlertStatus;
use crate::types::{Coordinate, SessionId};

/// Notable state changes, drained by the host after each `advance`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum TrackingEvent {
    /// Tracking surface opened.
    SessionOpened { session_id: SessionId },
    /// First responder position for the session.
    TargetAssigned {
        session_id: SessionId,
        target: Coordinate,
    },
    /// Authoritative position replaced the previous target.
    TargetUpdated {
        session_id: SessionId,
        target: Coordinate,
    },
    /// Responder no longer reported; simulation paused.
    TargetCleared { session_id: SessionId },
    /// Alert status string changed.
    AlertStatusChanged {
        session_id: SessionId,
        status: AlertStatus,
    },
    /// Simulated responder crossed the arrival threshold.
    Arrived { session_id: SessionId, at_ms: u64 },
    /// A farther target re-opened an arrived session.
    Reopened { session_id: SessionId },
    /// Status poll failed; previous target retained.
    PollFailed { session_id: SessionId, reason: String },
    /// A coordinate was rejected and the cycle skipped.
    CoordinateRejected { session_id: SessionId, reason: String },
    /// Tracking surface torn down.
    SessionClosed { session_id: SessionId },
}
