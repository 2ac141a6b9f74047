//! Tracking engine: the single-threaded loop that owns every session.
//!
//! `TrackingEngine` holds the sessions, the registry of timer handles, the
//! scheduler and the status feed. The host calls `advance` with its clock;
//! each due task runs to completion in turn, so the simulation tick and the
//! reconciliation poll of a session never interleave. Headless: no sleeping,
//! no threads, no I/O of its own.

use std::collections::HashMap;

use tracing::{debug, info, warn};

use rescue_core::config::EngineConfig;
use rescue_core::enums::{TimerSlot, TrackingStatus};
use rescue_core::events::TrackingEvent;
use rescue_core::state::TrackingFrame;
use rescue_core::types::{Coordinate, PositionFix, SessionId};
use rescue_core::TrackError;

use crate::poller::{PollOutcome, ReconciliationPoller, StatusFeed};
use crate::registry::SessionRegistry;
use crate::scheduler::Scheduler;
use crate::session::{TargetChange, TrackingSession};
use crate::simulator::{MovementSimulator, SimulationStep};

/// The tracking engine. Owns all sessions and their timers.
pub struct TrackingEngine<S: Scheduler, F: StatusFeed> {
    config: EngineConfig,
    simulator: MovementSimulator,
    poller: ReconciliationPoller,
    scheduler: S,
    feed: F,
    registry: SessionRegistry,
    sessions: HashMap<SessionId, TrackingSession>,
    events: Vec<TrackingEvent>,
    now_ms: u64,
}

impl<S: Scheduler, F: StatusFeed> TrackingEngine<S, F> {
    /// Create an engine. Rejects invalid configuration up front.
    pub fn new(config: EngineConfig, scheduler: S, feed: F) -> Result<Self, TrackError> {
        config.validate()?;
        let simulator = MovementSimulator::new(&config)?;
        let poller = ReconciliationPoller::new(&config);
        Ok(Self {
            config,
            simulator,
            poller,
            scheduler,
            feed,
            registry: SessionRegistry::new(),
            sessions: HashMap::new(),
            events: Vec::new(),
            now_ms: 0,
        })
    }

    /// Start tracking an alert/assignment. Re-opening an existing id replaces
    /// the session and restarts its poll; no timer is ever duplicated.
    pub fn open_session(
        &mut self,
        id: impl Into<SessionId>,
        victim: Coordinate,
    ) -> Result<(), TrackError> {
        let id = id.into();
        let session = TrackingSession::create(id.clone(), victim, &self.config)?;

        if self.sessions.insert(id.clone(), session).is_some() {
            debug!(session = %id, "re-opening session");
            self.registry
                .stop(&mut self.scheduler, &id, TimerSlot::Simulation);
        }
        self.registry.start(
            &mut self.scheduler,
            &id,
            TimerSlot::Reconciliation,
            self.poller.interval_ms(),
        );

        info!(session = %id, victim = %victim, "tracking session opened");
        self.events
            .push(TrackingEvent::SessionOpened { session_id: id });
        Ok(())
    }

    /// Seed a responder position known up front (page data, local geolocation).
    /// Returns the initial frame to render.
    pub fn seed_target(
        &mut self,
        id: &SessionId,
        target: Coordinate,
    ) -> Result<Option<TrackingFrame>, TrackError> {
        let session = self
            .sessions
            .get_mut(id)
            .ok_or_else(|| TrackError::UnknownSession(id.clone()))?;
        let was_arrived = session.status() == TrackingStatus::Arrived;
        let change = session.set_target(target)?;

        self.on_target_change(id, change, was_arrived);
        Ok(self.frame(id))
    }

    /// Seed from a device geolocation fix.
    pub fn seed_fix(
        &mut self,
        id: &SessionId,
        fix: PositionFix,
    ) -> Result<Option<TrackingFrame>, TrackError> {
        debug!(session = %id, position = %fix.coordinate, accuracy_m = ?fix.accuracy_m, "seeding from geolocation fix");
        self.seed_target(id, fix.coordinate)
    }

    /// Tear down one tracking surface. Returns false for an unknown id.
    pub fn close_session(&mut self, id: &SessionId) -> bool {
        self.registry.teardown(&mut self.scheduler, id);
        if self.sessions.remove(id).is_none() {
            return false;
        }
        info!(session = %id, "tracking session closed");
        self.events.push(TrackingEvent::SessionClosed {
            session_id: id.clone(),
        });
        true
    }

    /// Page/view unload: cancel every timer and drop every session.
    pub fn shutdown(&mut self) -> usize {
        self.registry.teardown_all(&mut self.scheduler);
        let mut ids: Vec<SessionId> = self.sessions.drain().map(|(id, _)| id).collect();
        ids.sort();
        info!(sessions = ids.len(), "tracking engine shut down");
        let count = ids.len();
        self.events.extend(
            ids.into_iter()
                .map(|session_id| TrackingEvent::SessionClosed { session_id }),
        );
        count
    }

    /// Run every task due at `now_ms` and return the frames they produced.
    pub fn advance(&mut self, now_ms: u64) -> Vec<TrackingFrame> {
        self.now_ms = self.now_ms.max(now_ms);
        let mut frames = Vec::new();

        for due in self.scheduler.take_due(self.now_ms) {
            // Skip handles cancelled or replaced earlier in this turn.
            let current = self.registry.handle(&due.task.session_id, due.task.slot);
            if current != Some(due.handle) || !self.scheduler.is_active(due.handle) {
                continue;
            }
            let frame = match due.task.slot {
                TimerSlot::Simulation => self.run_simulation(&due.task.session_id),
                TimerSlot::Reconciliation => self.run_reconciliation(&due.task.session_id),
            };
            frames.extend(frame);
        }
        frames
    }

    fn run_simulation(&mut self, id: &SessionId) -> Option<TrackingFrame> {
        let session = self.sessions.get_mut(id)?;

        match self.simulator.tick(session, self.now_ms) {
            SimulationStep::Advanced(frame) => Some(frame),
            SimulationStep::Arrived(frame) => {
                info!(session = %id, distance_km = frame.distance_km, "responder arrived");
                self.registry
                    .stop(&mut self.scheduler, id, TimerSlot::Simulation);
                self.events.push(TrackingEvent::Arrived {
                    session_id: id.clone(),
                    at_ms: self.now_ms,
                });
                Some(frame)
            }
            SimulationStep::Paused | SimulationStep::Idle => {
                debug!(session = %id, status = ?session.status(), "simulation paused");
                self.registry
                    .stop(&mut self.scheduler, id, TimerSlot::Simulation);
                None
            }
            SimulationStep::Skipped(err) => {
                warn!(session = %id, error = %err, "skipping simulation tick");
                self.events.push(TrackingEvent::CoordinateRejected {
                    session_id: id.clone(),
                    reason: err.to_string(),
                });
                None
            }
        }
    }

    fn run_reconciliation(&mut self, id: &SessionId) -> Option<TrackingFrame> {
        let session = self.sessions.get_mut(id)?;
        let alert_before = session.alert_status();
        let was_arrived = session.status() == TrackingStatus::Arrived;

        let outcome = self.poller.poll(&mut self.feed, session, self.now_ms);

        if session.alert_status() != alert_before {
            self.events.push(TrackingEvent::AlertStatusChanged {
                session_id: id.clone(),
                status: session.alert_status(),
            });
        }

        match outcome {
            PollOutcome::Pending | PollOutcome::Unchanged => None,
            PollOutcome::Retargeted(change) => {
                self.on_target_change(id, change, was_arrived);
                self.frame(id)
            }
            PollOutcome::Unassigned => {
                self.registry
                    .stop(&mut self.scheduler, id, TimerSlot::Simulation);
                self.events.push(TrackingEvent::TargetCleared {
                    session_id: id.clone(),
                });
                None
            }
            PollOutcome::Failed(err) => {
                self.events.push(TrackingEvent::PollFailed {
                    session_id: id.clone(),
                    reason: err.to_string(),
                });
                None
            }
            PollOutcome::Rejected(err) => {
                self.events.push(TrackingEvent::CoordinateRejected {
                    session_id: id.clone(),
                    reason: err.to_string(),
                });
                None
            }
        }
    }

    /// Take all events emitted since the last drain.
    pub fn drain_events(&mut self) -> Vec<TrackingEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn session(&self, id: &SessionId) -> Option<&TrackingSession> {
        self.sessions.get(id)
    }

    pub fn sessions(&self) -> impl Iterator<Item = &TrackingSession> {
        self.sessions.values()
    }

    /// Render the current state of one session without advancing it.
    pub fn frame(&self, id: &SessionId) -> Option<TrackingFrame> {
        self.simulator.frame(self.sessions.get(id)?, self.now_ms)
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn feed_mut(&mut self) -> &mut F {
        &mut self.feed
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    /// Record a target change, then keep the simulation timer in step with
    /// the new status. A target that settles the session inside the
    /// threshold counts as the arrival.
    fn on_target_change(&mut self, id: &SessionId, change: TargetChange, was_arrived: bool) {
        let Some(session) = self.sessions.get(id) else {
            return;
        };
        let Some(target) = session.target() else {
            return;
        };

        match change {
            TargetChange::Assigned => {
                info!(session = %id, target = %target, "responder assigned");
                self.events.push(TrackingEvent::TargetAssigned {
                    session_id: id.clone(),
                    target,
                });
            }
            TargetChange::Updated => self.events.push(TrackingEvent::TargetUpdated {
                session_id: id.clone(),
                target,
            }),
            TargetChange::Reopened => {
                info!(session = %id, target = %target, "session re-opened");
                self.events.push(TrackingEvent::TargetUpdated {
                    session_id: id.clone(),
                    target,
                });
                self.events.push(TrackingEvent::Reopened {
                    session_id: id.clone(),
                });
            }
        }

        match session.status() {
            TrackingStatus::EnRoute => {
                if !self.registry.is_running(id, TimerSlot::Simulation) {
                    self.registry.start(
                        &mut self.scheduler,
                        id,
                        TimerSlot::Simulation,
                        self.simulator.interval_ms(),
                    );
                }
            }
            TrackingStatus::Arrived => {
                self.registry
                    .stop(&mut self.scheduler, id, TimerSlot::Simulation);
                if !was_arrived {
                    info!(session = %id, distance_km = session.last_distance_km(), "responder arrived");
                    self.events.push(TrackingEvent::Arrived {
                        session_id: id.clone(),
                        at_ms: self.now_ms,
                    });
                }
            }
            TrackingStatus::Unassigned => {}
        }
    }
}
