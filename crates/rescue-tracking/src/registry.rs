//! Session registry: sole owner of timer handles.
//!
//! Holds at most one simulation handle and one reconciliation handle per
//! session id. Starting a slot cancels whatever was running in it first, and
//! tearing a session down cancels both slots before the entry is dropped, so
//! no ticker can outlive the session it mutates.

use std::collections::HashMap;

use tracing::debug;

use rescue_core::enums::TimerSlot;
use rescue_core::types::SessionId;

use crate::scheduler::{Scheduler, TimerHandle, TimerTask};

/// Timer handles owned for one session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionTimers {
    pub simulation: Option<TimerHandle>,
    pub reconciliation: Option<TimerHandle>,
}

impl SessionTimers {
    pub fn get(&self, slot: TimerSlot) -> Option<TimerHandle> {
        match slot {
            TimerSlot::Simulation => self.simulation,
            TimerSlot::Reconciliation => self.reconciliation,
        }
    }

    fn slot_mut(&mut self, slot: TimerSlot) -> &mut Option<TimerHandle> {
        match slot {
            TimerSlot::Simulation => &mut self.simulation,
            TimerSlot::Reconciliation => &mut self.reconciliation,
        }
    }
}

/// Map of session id to its timer handles.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    entries: HashMap<SessionId, SessionTimers>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a repeating task for `slot`, cancelling any handle already in it.
    pub fn start<S: Scheduler + ?Sized>(
        &mut self,
        scheduler: &mut S,
        session_id: &SessionId,
        slot: TimerSlot,
        interval_ms: u64,
    ) -> TimerHandle {
        let timers = self.entries.entry(session_id.clone()).or_default();
        let held = timers.slot_mut(slot);
        if let Some(previous) = held.take() {
            scheduler.cancel(previous);
            debug!(session = %session_id, ?slot, handle = previous.id(), "replaced running timer");
        }
        let handle =
            scheduler.schedule_repeating(TimerTask::new(session_id.clone(), slot), interval_ms);
        *held = Some(handle);
        handle
    }

    /// Cancel one slot. Returns true if a handle was running.
    pub fn stop<S: Scheduler + ?Sized>(
        &mut self,
        scheduler: &mut S,
        session_id: &SessionId,
        slot: TimerSlot,
    ) -> bool {
        let Some(timers) = self.entries.get_mut(session_id) else {
            return false;
        };
        match timers.slot_mut(slot).take() {
            Some(handle) => {
                scheduler.cancel(handle);
                true
            }
            None => false,
        }
    }

    /// Cancel both slots and forget the session. Returns true if it was registered.
    pub fn teardown<S: Scheduler + ?Sized>(&mut self, scheduler: &mut S, session_id: &SessionId) -> bool {
        match self.entries.remove(session_id) {
            Some(timers) => {
                for handle in [timers.simulation, timers.reconciliation].into_iter().flatten() {
                    scheduler.cancel(handle);
                }
                true
            }
            None => false,
        }
    }

    /// Tear down every session (page/view unload). Returns the ids removed.
    pub fn teardown_all<S: Scheduler + ?Sized>(&mut self, scheduler: &mut S) -> Vec<SessionId> {
        let mut ids: Vec<SessionId> = self.entries.keys().cloned().collect();
        ids.sort();
        for id in &ids {
            self.teardown(scheduler, id);
        }
        ids
    }

    pub fn handle(&self, session_id: &SessionId, slot: TimerSlot) -> Option<TimerHandle> {
        self.entries.get(session_id).and_then(|t| t.get(slot))
    }

    pub fn timers(&self, session_id: &SessionId) -> Option<SessionTimers> {
        self.entries.get(session_id).copied()
    }

    pub fn is_running(&self, session_id: &SessionId, slot: TimerSlot) -> bool {
        self.handle(session_id, slot).is_some()
    }

    pub fn contains(&self, session_id: &SessionId) -> bool {
        self.entries.contains_key(session_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::IntervalScheduler;

    #[test]
    fn test_start_replaces_existing_handle() {
        let mut sched = IntervalScheduler::new();
        let mut registry = SessionRegistry::new();
        let id = SessionId::from(1u64);

        let first = registry.start(&mut sched, &id, TimerSlot::Simulation, 1000);
        let second = registry.start(&mut sched, &id, TimerSlot::Simulation, 1000);

        assert_ne!(first, second);
        assert!(!sched.is_active(first));
        assert!(sched.is_active(second));
        assert_eq!(registry.handle(&id, TimerSlot::Simulation), Some(second));
        assert_eq!(
            sched.active_for(&TimerTask::new(id.clone(), TimerSlot::Simulation)),
            1
        );
    }

    #[test]
    fn test_slots_are_independent() {
        let mut sched = IntervalScheduler::new();
        let mut registry = SessionRegistry::new();
        let id = SessionId::from(1u64);

        registry.start(&mut sched, &id, TimerSlot::Simulation, 1000);
        let poll = registry.start(&mut sched, &id, TimerSlot::Reconciliation, 5000);
        assert!(registry.stop(&mut sched, &id, TimerSlot::Simulation));
        assert!(!registry.stop(&mut sched, &id, TimerSlot::Simulation));

        assert!(sched.is_active(poll));
        assert!(registry.contains(&id));
        assert!(!registry.is_running(&id, TimerSlot::Simulation));
    }

    #[test]
    fn test_teardown_cancels_both_slots() {
        let mut sched = IntervalScheduler::new();
        let mut registry = SessionRegistry::new();
        let a = SessionId::from(1u64);
        let b = SessionId::from(2u64);

        let sim = registry.start(&mut sched, &a, TimerSlot::Simulation, 1000);
        let poll = registry.start(&mut sched, &a, TimerSlot::Reconciliation, 5000);
        let other = registry.start(&mut sched, &b, TimerSlot::Reconciliation, 5000);

        assert!(registry.teardown(&mut sched, &a));
        assert!(!sched.is_active(sim));
        assert!(!sched.is_active(poll));
        assert!(sched.is_active(other), "other sessions untouched");
        assert!(!registry.contains(&a));
        assert!(!registry.teardown(&mut sched, &a));
    }

    #[test]
    fn test_teardown_all_leaves_no_timers() {
        let mut sched = IntervalScheduler::new();
        let mut registry = SessionRegistry::new();
        for id in 0..5u64 {
            let id = SessionId::from(id);
            registry.start(&mut sched, &id, TimerSlot::Simulation, 1000);
            registry.start(&mut sched, &id, TimerSlot::Reconciliation, 3000);
        }
        assert_eq!(sched.active_count(), 10);

        let removed = registry.teardown_all(&mut sched);
        assert_eq!(removed.len(), 5);
        assert!(registry.is_empty());
        assert_eq!(sched.active_count(), 0);
    }
}
