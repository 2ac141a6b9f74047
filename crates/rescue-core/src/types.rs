//! Fundamental geographic and display types.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use crate::constants::{MAX_LATITUDE, MAX_LONGITUDE};
use crate::enums::AlertStatus;
use crate::error::TrackError;

/// Geographic position in degrees (WGS84 lat/lon).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Build a coordinate, rejecting NaN and out-of-range values.
    pub fn try_new(latitude: f64, longitude: f64) -> Result<Self, TrackError> {
        let coord = Self::new(latitude, longitude);
        coord.validate()?;
        Ok(coord)
    }

    /// Check that both axes are finite and within range.
    pub fn validate(&self) -> Result<(), TrackError> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(TrackError::InvalidCoordinate {
                latitude: self.latitude,
                longitude: self.longitude,
            })
        }
    }

    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && self.latitude.abs() <= MAX_LATITUDE
            && self.longitude.abs() <= MAX_LONGITUDE
    }

    /// Move `fraction` of the way toward `other`, independently per axis.
    ///
    /// Longitude is interpolated linearly, not around the antimeridian: a
    /// glide between 179.9 and -179.9 sweeps the long way across the globe.
    pub fn step_toward(&self, other: &Coordinate, fraction: f64) -> Coordinate {
        Coordinate {
            latitude: self.latitude + (other.latitude - self.latitude) * fraction,
            longitude: self.longitude + (other.longitude - self.longitude) * fraction,
        }
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.5}, {:.5}", self.latitude, self.longitude)
    }
}

/// Device-reported position from a geolocation collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionFix {
    pub coordinate: Coordinate,
    /// Reported horizontal accuracy radius (meters), when the device gives one.
    #[serde(default)]
    pub accuracy_m: Option<f64>,
}

impl PositionFix {
    pub fn new(coordinate: Coordinate, accuracy_m: Option<f64>) -> Self {
        Self {
            coordinate,
            accuracy_m,
        }
    }
}

/// Externally assigned alert/assignment identifier.
///
/// Serializes as a string; deserializes from a string or an integer id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct SessionId(String);

#[derive(Deserialize)]
#[serde(untagged)]
enum RawSessionId {
    Text(String),
    Number(u64),
}

impl<'de> Deserialize<'de> for SessionId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match RawSessionId::deserialize(deserializer)? {
            RawSessionId::Text(id) => Self(id),
            RawSessionId::Number(id) => Self::from(id),
        })
    }
}

impl SessionId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<u64> for SessionId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

impl From<&str> for SessionId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<String> for SessionId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Point on the normalized 0-100 display surface.
/// x grows to the right (east), y grows downward (south).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

impl ScreenPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Size and rotation of the indicator joining two projected points.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Connector {
    /// Length in display units.
    pub length: f64,
    /// Rotation in degrees, `atan2(dy, dx)` convention.
    pub angle_degrees: f64,
}

/// Authoritative status record returned by the alert/assignment status service.
///
/// A record without a responder position means no responder is assigned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusRecord {
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub status: AlertStatus,
    /// Server timestamp in ms since the Unix epoch. Feeds talking to a
    /// service that reports ISO-8601 datetimes convert before handing the
    /// record over; absent means 0.
    #[serde(default)]
    pub timestamp: u64,
}

impl StatusRecord {
    /// Record reporting a responder at `coord`.
    pub fn at(coord: Coordinate, status: AlertStatus, timestamp: u64) -> Self {
        Self {
            latitude: Some(coord.latitude),
            longitude: Some(coord.longitude),
            status,
            timestamp,
        }
    }

    /// Record reporting no assigned responder.
    pub fn unassigned(status: AlertStatus, timestamp: u64) -> Self {
        Self {
            latitude: None,
            longitude: None,
            status,
            timestamp,
        }
    }

    /// Reported responder position, if both axes are present.
    pub fn responder(&self) -> Option<Coordinate> {
        match (self.latitude, self.longitude) {
            (Some(latitude), Some(longitude)) => Some(Coordinate::new(latitude, longitude)),
            _ => None,
        }
    }
}
