//! Error types for the tracking engine.

use thiserror::Error;

use crate::types::SessionId;

/// Errors produced by the tracking engine.
///
/// Only `Configuration` is surfaced to callers at construction time. The
/// other kinds are absorbed inside scheduled ticks: the engine logs them and
/// keeps showing the last known good state.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TrackError {
    /// Latitude/longitude is NaN, infinite, or outside its valid range.
    #[error("invalid coordinate ({latitude}, {longitude})")]
    InvalidCoordinate { latitude: f64, longitude: f64 },

    /// A tuning parameter was rejected.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The status collaborator failed (network error, non-2xx response).
    #[error("poll transport failure: {0}")]
    PollTransport(String),

    /// No session is registered under this id.
    #[error("unknown session: {0}")]
    UnknownSession(SessionId),
}
