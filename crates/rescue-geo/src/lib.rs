//! Geographic math and display projection for the rescue tracking engine.
//!
//! - `geomath`: haversine distance, bearing, ETA, distance readouts
//! - `projection`: victim-centered projection onto the 0-100 display surface

pub mod geomath;
pub mod projection;

pub use geomath::{distance_km, eta_minutes, AssumedSpeed};
pub use projection::{connector, Projector};
