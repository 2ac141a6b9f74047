//! Reconciliation poller: replaces simulated assumptions with server truth.

use tracing::{debug, warn};

use rescue_core::config::EngineConfig;
use rescue_core::types::{SessionId, StatusRecord};
use rescue_core::TrackError;

use crate::session::{TargetChange, TrackingSession};

/// The alert/assignment status service.
///
/// Implementations must not block: `Ok(None)` means no response is
/// available yet and the poller will simply try again on its next tick.
pub trait StatusFeed {
    fn fetch(
        &mut self,
        session_id: &SessionId,
        now_ms: u64,
    ) -> Result<Option<StatusRecord>, TrackError>;
}

impl<F: StatusFeed + ?Sized> StatusFeed for Box<F> {
    fn fetch(
        &mut self,
        session_id: &SessionId,
        now_ms: u64,
    ) -> Result<Option<StatusRecord>, TrackError> {
        (**self).fetch(session_id, now_ms)
    }
}

/// Result of one reconciliation tick.
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    /// Request still in flight.
    Pending,
    /// Reported position equals the current target.
    Unchanged,
    /// Target replaced with the reported position.
    Retargeted(TargetChange),
    /// Report carried no responder; target cleared.
    Unassigned,
    /// Transport failure; session untouched.
    Failed(TrackError),
    /// Reported position was malformed and ignored.
    Rejected(TrackError),
}

#[derive(Debug, Clone)]
pub struct ReconciliationPoller {
    interval_ms: u64,
}

impl ReconciliationPoller {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            interval_ms: config.poll_interval_ms,
        }
    }

    pub fn interval_ms(&self) -> u64 {
        self.interval_ms
    }

    /// Fetch the latest record for `session` and reconcile it.
    pub fn poll<F: StatusFeed + ?Sized>(
        &self,
        feed: &mut F,
        session: &mut TrackingSession,
        now_ms: u64,
    ) -> PollOutcome {
        match feed.fetch(session.id(), now_ms) {
            Ok(Some(record)) => self.reconcile(session, &record),
            Ok(None) => PollOutcome::Pending,
            Err(err) => {
                warn!(session = %session.id(), error = %err, "status poll failed; keeping previous target");
                PollOutcome::Failed(err)
            }
        }
    }

    /// Apply one authoritative record to the session.
    ///
    /// Status metadata is always applied. The target only changes when the
    /// reported coordinate differs from it exactly.
    pub fn reconcile(&self, session: &mut TrackingSession, record: &StatusRecord) -> PollOutcome {
        session.apply_report(record.status, record.timestamp);

        let Some(reported) = record.responder() else {
            return if session.clear_target() {
                debug!(session = %session.id(), "responder no longer reported");
                PollOutcome::Unassigned
            } else {
                PollOutcome::Unchanged
            };
        };

        if session.target() == Some(reported) {
            return PollOutcome::Unchanged;
        }

        match session.set_target(reported) {
            Ok(change) => {
                debug!(session = %session.id(), target = %reported, ?change, "reconciled target");
                PollOutcome::Retargeted(change)
            }
            Err(err) => {
                warn!(session = %session.id(), error = %err, "ignoring malformed reported position");
                PollOutcome::Rejected(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rescue_core::constants::SCALE_STREET;
    use rescue_core::enums::{AlertStatus, TrackingStatus};
    use rescue_core::types::Coordinate;

    /// Feed returning a fixed response.
    struct FixedFeed(Result<Option<StatusRecord>, TrackError>);

    impl StatusFeed for FixedFeed {
        fn fetch(&mut self, _: &SessionId, _: u64) -> Result<Option<StatusRecord>, TrackError> {
            self.0.clone()
        }
    }

    fn setup() -> (ReconciliationPoller, TrackingSession) {
        let config = EngineConfig::new(SCALE_STREET);
        let session =
            TrackingSession::create(SessionId::from(7u64), Coordinate::new(-1.29, 36.82), &config)
                .unwrap();
        (ReconciliationPoller::new(&config), session)
    }

    #[test]
    fn test_first_report_assigns_target() {
        let (poller, mut session) = setup();
        let at = Coordinate::new(-1.30, 36.83);
        let mut feed = FixedFeed(Ok(Some(StatusRecord::at(at, AlertStatus::Dispatched, 5))));

        assert_eq!(
            poller.poll(&mut feed, &mut session, 5000),
            PollOutcome::Retargeted(TargetChange::Assigned)
        );
        assert_eq!(session.target(), Some(at));
        assert_eq!(session.simulated(), Some(at));
        assert_eq!(session.alert_status(), AlertStatus::Dispatched);
    }

    #[test]
    fn test_failed_poll_leaves_session_unchanged() {
        let (poller, mut session) = setup();
        let at = Coordinate::new(-1.30, 36.83);
        session.set_target(at).unwrap();
        let status = session.status();

        let mut feed = FixedFeed(Err(TrackError::PollTransport("503".into())));
        let outcome = poller.poll(&mut feed, &mut session, 5000);

        assert!(matches!(outcome, PollOutcome::Failed(_)));
        assert_eq!(session.target(), Some(at));
        assert_eq!(session.status(), status);
        assert_eq!(session.last_report_ms(), None);
    }

    #[test]
    fn test_unchanged_position_does_not_resnap() {
        let (poller, mut session) = setup();
        let at = Coordinate::new(-1.30, 36.83);
        session.set_target(at).unwrap();
        session
            .advance_simulated(Coordinate::new(-1.295, 36.825))
            .unwrap();
        let simulated = session.simulated();

        let record = StatusRecord::at(at, AlertStatus::InProgress, 9);
        assert_eq!(poller.reconcile(&mut session, &record), PollOutcome::Unchanged);
        assert_eq!(session.simulated(), simulated);
        assert_eq!(session.alert_status(), AlertStatus::InProgress);
    }

    #[test]
    fn test_pending_response_is_not_a_failure() {
        let (poller, mut session) = setup();
        let mut feed = FixedFeed(Ok(None));
        assert_eq!(poller.poll(&mut feed, &mut session, 5000), PollOutcome::Pending);
        assert_eq!(session.status(), TrackingStatus::Unassigned);
    }

    #[test]
    fn test_malformed_position_rejected() {
        let (poller, mut session) = setup();
        let at = Coordinate::new(-1.30, 36.83);
        session.set_target(at).unwrap();

        let record = StatusRecord {
            latitude: Some(123.0),
            longitude: Some(36.8),
            status: AlertStatus::Dispatched,
            timestamp: 1,
        };
        assert!(matches!(
            poller.reconcile(&mut session, &record),
            PollOutcome::Rejected(TrackError::InvalidCoordinate { .. })
        ));
        assert_eq!(session.target(), Some(at));
    }

    #[test]
    fn test_missing_responder_clears_target() {
        let (poller, mut session) = setup();
        session.set_target(Coordinate::new(-1.30, 36.83)).unwrap();

        let record = StatusRecord::unassigned(AlertStatus::Pending, 3);
        assert_eq!(poller.reconcile(&mut session, &record), PollOutcome::Unassigned);
        assert!(session.target().is_none());
        assert!(session.simulated().is_some());
        assert_eq!(poller.reconcile(&mut session, &record), PollOutcome::Unchanged);
    }
}
