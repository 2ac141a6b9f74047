//! Tracking engine for the rescue dashboards.
//!
//! Owns one `TrackingSession` per alert/assignment, runs the movement
//! simulation and reconciliation poll as repeating tasks on a
//! single-threaded `Scheduler`, and produces `TrackingFrame`s for the
//! rendering collaborator. Completely headless, so every behavior can be
//! driven deterministically from tests.

pub mod engine;
pub mod poller;
pub mod registry;
pub mod scheduler;
pub mod session;
pub mod simulator;

pub use engine::TrackingEngine;
pub use poller::{PollOutcome, ReconciliationPoller, StatusFeed};
pub use registry::SessionRegistry;
pub use rescue_core as core;
pub use scheduler::{DueTask, IntervalScheduler, Scheduler, TimerHandle, TimerTask};
pub use session::{TargetChange, TrackingSession};
pub use simulator::{MovementSimulator, SimulationStep};
