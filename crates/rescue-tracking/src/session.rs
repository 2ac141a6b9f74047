//! State container for one victim/responder tracking relationship.

use rescue_core::config::EngineConfig;
use rescue_core::enums::{AlertStatus, TrackingStatus};
use rescue_core::state::EtaDisplay;
use rescue_core::types::{Coordinate, SessionId};
use rescue_core::TrackError;
use rescue_geo::geomath::{distance_km, AssumedSpeed};

/// How a call to `set_target` changed the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetChange {
    /// First target, or first after the responder was unassigned.
    Assigned,
    /// Replaced an existing target.
    Updated,
    /// Replaced the target of an arrived session and re-opened it.
    Reopened,
}

/// One tracking session. The victim is fixed; the target comes from
/// authoritative reports; the simulated position belongs to the engine.
#[derive(Debug, Clone)]
pub struct TrackingSession {
    id: SessionId,
    victim: Coordinate,
    target: Option<Coordinate>,
    simulated: Option<Coordinate>,
    status: TrackingStatus,
    alert_status: AlertStatus,
    last_distance_km: f64,
    last_eta_minutes: f64,
    last_report_ms: Option<u64>,
    arrival_threshold_km: f64,
    speed: AssumedSpeed,
}

impl TrackingSession {
    /// New unassigned session. Fails on an invalid victim position or speed.
    pub fn create(
        id: SessionId,
        victim: Coordinate,
        config: &EngineConfig,
    ) -> Result<Self, TrackError> {
        victim.validate()?;
        Ok(Self {
            id,
            victim,
            target: None,
            simulated: None,
            status: TrackingStatus::Unassigned,
            alert_status: AlertStatus::default(),
            last_distance_km: 0.0,
            last_eta_minutes: 0.0,
            last_report_ms: None,
            arrival_threshold_km: config.arrival_threshold_km,
            speed: AssumedSpeed::new(config.assumed_speed_kmh)?,
        })
    }

    /// Record a new authoritative responder position.
    ///
    /// The first target snaps the simulated position onto it. An arrived
    /// session only re-opens when the new target lies outside the threshold.
    pub fn set_target(&mut self, target: Coordinate) -> Result<TargetChange, TrackError> {
        target.validate()?;

        let previous_target = self.target.replace(target);
        let was_arrived = self.status == TrackingStatus::Arrived;
        let simulated = *self.simulated.get_or_insert(target);

        self.recompute(&simulated);
        self.status = self.settled_status();

        Ok(match previous_target {
            None => TargetChange::Assigned,
            Some(_) if was_arrived && self.status == TrackingStatus::EnRoute => {
                TargetChange::Reopened
            }
            Some(_) => TargetChange::Updated,
        })
    }

    /// Responder no longer reported. The simulated position is kept so the
    /// marker does not snap backward. Returns false if there was no target.
    pub fn clear_target(&mut self) -> bool {
        self.target.take().is_some()
    }

    /// Replace the simulated position and recompute metrics and status.
    ///
    /// A no-op before the first target has been set.
    pub fn advance_simulated(&mut self, next: Coordinate) -> Result<TrackingStatus, TrackError> {
        next.validate()?;
        if self.simulated.is_none() {
            return Ok(self.status);
        }
        self.simulated = Some(next);
        self.recompute(&next);
        self.status = self.settled_status();
        Ok(self.status)
    }

    /// Apply status metadata from a report. Returns true if the alert status changed.
    pub fn apply_report(&mut self, alert_status: AlertStatus, timestamp_ms: u64) -> bool {
        self.last_report_ms = Some(timestamp_ms);
        let changed = self.alert_status != alert_status;
        self.alert_status = alert_status;
        changed
    }

    fn recompute(&mut self, simulated: &Coordinate) {
        self.last_distance_km = distance_km(&self.victim, simulated);
        self.last_eta_minutes = self.speed.eta_minutes(self.last_distance_km);
    }

    /// Arrived when the simulated responder is inside the threshold and the
    /// authoritative target is too; a marker merely passing near the victim
    /// on its way to a farther target stays en route.
    fn settled_status(&self) -> TrackingStatus {
        let target_inside = self
            .target
            .map_or(true, |t| distance_km(&self.victim, &t) <= self.arrival_threshold_km);
        if target_inside && self.last_distance_km <= self.arrival_threshold_km {
            TrackingStatus::Arrived
        } else {
            TrackingStatus::EnRoute
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn victim(&self) -> Coordinate {
        self.victim
    }

    pub fn target(&self) -> Option<Coordinate> {
        self.target
    }

    pub fn simulated(&self) -> Option<Coordinate> {
        self.simulated
    }

    pub fn status(&self) -> TrackingStatus {
        self.status
    }

    pub fn alert_status(&self) -> AlertStatus {
        self.alert_status
    }

    pub fn last_distance_km(&self) -> f64 {
        self.last_distance_km
    }

    pub fn last_eta_minutes(&self) -> f64 {
        self.last_eta_minutes
    }

    pub fn last_report_ms(&self) -> Option<u64> {
        self.last_report_ms
    }

    pub fn arrival_threshold_km(&self) -> f64 {
        self.arrival_threshold_km
    }

    /// ETA readout for the current status.
    pub fn eta_display(&self) -> EtaDisplay {
        match self.status {
            TrackingStatus::Unassigned => EtaDisplay::Pending,
            TrackingStatus::Arrived => EtaDisplay::Arrived,
            TrackingStatus::EnRoute => EtaDisplay::from_minutes(self.last_eta_minutes),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rescue_core::constants::SCALE_SYNTHETIC;

    fn session() -> TrackingSession {
        TrackingSession::create(
            SessionId::from(1u64),
            Coordinate::new(0.0, 0.0),
            &EngineConfig::new(SCALE_SYNTHETIC),
        )
        .unwrap()
    }

    #[test]
    fn test_create_is_unassigned() {
        let s = session();
        assert_eq!(s.status(), TrackingStatus::Unassigned);
        assert!(s.target().is_none());
        assert!(s.simulated().is_none());
        assert_eq!(s.eta_display(), EtaDisplay::Pending);
    }

    #[test]
    fn test_create_rejects_invalid_victim() {
        let result = TrackingSession::create(
            SessionId::from(1u64),
            Coordinate::new(f64::NAN, 0.0),
            &EngineConfig::new(SCALE_SYNTHETIC),
        );
        assert!(matches!(result, Err(TrackError::InvalidCoordinate { .. })));
    }

    #[test]
    fn test_first_target_snaps_simulated() {
        let mut s = session();
        let target = Coordinate::new(0.0, 1.0);
        assert_eq!(s.set_target(target).unwrap(), TargetChange::Assigned);
        assert_eq!(s.simulated(), Some(target));
        assert_eq!(s.status(), TrackingStatus::EnRoute);
        assert!((s.last_distance_km() - 111.19).abs() < 0.5);
        assert_eq!(s.last_eta_minutes(), 112.0);
    }

    #[test]
    fn test_later_target_does_not_move_simulated() {
        let mut s = session();
        s.set_target(Coordinate::new(0.0, 1.0)).unwrap();
        assert_eq!(
            s.set_target(Coordinate::new(0.0, 0.5)).unwrap(),
            TargetChange::Updated
        );
        assert_eq!(s.simulated(), Some(Coordinate::new(0.0, 1.0)));
        assert_eq!(s.target(), Some(Coordinate::new(0.0, 0.5)));
    }

    #[test]
    fn test_target_at_victim_is_immediately_arrived() {
        let mut s = session();
        s.set_target(Coordinate::new(0.0, 0.0005)).unwrap();
        assert_eq!(s.status(), TrackingStatus::Arrived);
        assert_eq!(s.eta_display(), EtaDisplay::Arrived);
    }

    #[test]
    fn test_advance_transitions_to_arrived() {
        let mut s = session();
        s.set_target(Coordinate::new(0.0, 0.01)).unwrap();
        s.set_target(Coordinate::new(0.0, 0.0)).unwrap();
        assert_eq!(s.status(), TrackingStatus::EnRoute);

        let status = s.advance_simulated(Coordinate::new(0.0, 0.0008)).unwrap();
        assert_eq!(status, TrackingStatus::Arrived);
        assert!(s.last_distance_km() <= 0.1);
    }

    #[test]
    fn test_passing_near_victim_toward_far_target_stays_en_route() {
        let mut s = session();
        s.set_target(Coordinate::new(0.0, -0.01)).unwrap();
        s.set_target(Coordinate::new(0.0, 0.01)).unwrap();

        let status = s.advance_simulated(Coordinate::new(0.0, 0.0001)).unwrap();
        assert!(s.last_distance_km() <= 0.1);
        assert_eq!(status, TrackingStatus::EnRoute);
    }

    #[test]
    fn test_advance_rejects_invalid_and_keeps_state() {
        let mut s = session();
        s.set_target(Coordinate::new(0.0, 1.0)).unwrap();
        let before = s.simulated();
        assert!(s.advance_simulated(Coordinate::new(0.0, f64::NAN)).is_err());
        assert_eq!(s.simulated(), before);
        assert_eq!(s.status(), TrackingStatus::EnRoute);
    }

    #[test]
    fn test_advance_before_assignment_is_noop() {
        let mut s = session();
        let status = s.advance_simulated(Coordinate::new(0.0, 0.0)).unwrap();
        assert_eq!(status, TrackingStatus::Unassigned);
        assert!(s.simulated().is_none());
    }

    #[test]
    fn test_farther_target_reopens_arrived_session() {
        let mut s = session();
        s.set_target(Coordinate::new(0.0, 0.0005)).unwrap();
        assert_eq!(s.status(), TrackingStatus::Arrived);

        // Another target still inside the threshold keeps it arrived.
        assert_eq!(
            s.set_target(Coordinate::new(0.0005, 0.0)).unwrap(),
            TargetChange::Updated
        );
        assert_eq!(s.status(), TrackingStatus::Arrived);

        assert_eq!(
            s.set_target(Coordinate::new(0.0, 0.2)).unwrap(),
            TargetChange::Reopened
        );
        assert_eq!(s.status(), TrackingStatus::EnRoute);
    }

    #[test]
    fn test_clear_target_keeps_simulated() {
        let mut s = session();
        s.set_target(Coordinate::new(0.0, 1.0)).unwrap();
        assert!(s.clear_target());
        assert!(s.target().is_none());
        assert_eq!(s.simulated(), Some(Coordinate::new(0.0, 1.0)));
        assert!(!s.clear_target());

        assert_eq!(
            s.set_target(Coordinate::new(0.0, 0.9)).unwrap(),
            TargetChange::Assigned
        );
    }

    #[test]
    fn test_apply_report_tracks_status_changes() {
        let mut s = session();
        assert!(!s.apply_report(AlertStatus::Pending, 10));
        assert!(s.apply_report(AlertStatus::Dispatched, 20));
        assert_eq!(s.alert_status(), AlertStatus::Dispatched);
        assert_eq!(s.last_report_ms(), Some(20));
    }
}
