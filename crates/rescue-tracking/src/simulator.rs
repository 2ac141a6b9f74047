//! Movement simulator: glides the rendered responder toward its target.
//!
//! Purely cosmetic. Each tick closes a fixed fraction of the remaining gap
//! between the simulated position and the authoritative target, so motion
//! looks continuous between two polled snapshots. The authoritative record
//! is never touched.

use rescue_core::config::EngineConfig;
use rescue_core::enums::{ProximityBand, TrackingStatus};
use rescue_core::state::TrackingFrame;
use rescue_core::TrackError;
use rescue_geo::geomath::format_distance;
use rescue_geo::projection::{connector, Projector};

use crate::session::TrackingSession;

/// Result of one simulation tick.
#[derive(Debug, Clone, PartialEq)]
pub enum SimulationStep {
    /// Position advanced; still en route.
    Advanced(TrackingFrame),
    /// Position advanced and crossed the arrival threshold on this tick.
    Arrived(TrackingFrame),
    /// No target to move toward; the task should stop until one arrives.
    Paused,
    /// Session already arrived; nothing to do.
    Idle,
    /// Malformed coordinate; cycle skipped, previous state retained.
    Skipped(TrackError),
}

/// Stateless stepper shared by every session.
#[derive(Debug, Clone)]
pub struct MovementSimulator {
    step_fraction: f64,
    interval_ms: u64,
    projector: Projector,
}

impl MovementSimulator {
    pub fn new(config: &EngineConfig) -> Result<Self, TrackError> {
        Ok(Self {
            step_fraction: config.step_fraction,
            interval_ms: config.simulation_interval_ms,
            projector: Projector::new(config.projection_scale)?,
        })
    }

    pub fn interval_ms(&self) -> u64 {
        self.interval_ms
    }

    pub fn step_fraction(&self) -> f64 {
        self.step_fraction
    }

    pub fn projector(&self) -> &Projector {
        &self.projector
    }

    /// Advance one session by one tick.
    pub fn tick(&self, session: &mut TrackingSession, now_ms: u64) -> SimulationStep {
        if session.status() == TrackingStatus::Arrived {
            return SimulationStep::Idle;
        }
        let (Some(target), Some(current)) = (session.target(), session.simulated()) else {
            return SimulationStep::Paused;
        };
        if let Err(err) = target.validate().and(current.validate()) {
            return SimulationStep::Skipped(err);
        }

        let next = current.step_toward(&target, self.step_fraction);
        match session.advance_simulated(next) {
            Err(err) => SimulationStep::Skipped(err),
            Ok(status) => match self.frame(session, now_ms) {
                Some(frame) if status == TrackingStatus::Arrived => SimulationStep::Arrived(frame),
                Some(frame) => SimulationStep::Advanced(frame),
                None => SimulationStep::Paused,
            },
        }
    }

    /// Render the session's current state. `None` before the first target.
    pub fn frame(&self, session: &TrackingSession, now_ms: u64) -> Option<TrackingFrame> {
        let simulated = session.simulated()?;
        let projected = self.projector.project(&session.victim(), &simulated);
        let distance_km = session.last_distance_km();

        Some(TrackingFrame {
            session_id: session.id().clone(),
            at_ms: now_ms,
            status: session.status(),
            alert_status: session.alert_status(),
            distance_km,
            distance_text: format_distance(distance_km),
            eta_minutes: session.last_eta_minutes(),
            eta: session.eta_display(),
            proximity: ProximityBand::classify(distance_km),
            projected,
            connector: connector(&Projector::center(), &projected),
        })
    }
}
