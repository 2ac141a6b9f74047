//! Single-threaded repeating-task scheduler.
//!
//! The engine never sleeps or spawns. The host advances a millisecond clock
//! and the scheduler reports which repeating tasks are due; each due task
//! then runs to completion before the next one starts.

use std::collections::BTreeMap;

use rescue_core::enums::TimerSlot;
use rescue_core::types::SessionId;

/// Opaque handle to a scheduled repeating task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(u64);

impl TimerHandle {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn id(&self) -> u64 {
        self.0
    }
}

/// What a timer drives: one slot of one session.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TimerTask {
    pub session_id: SessionId,
    pub slot: TimerSlot,
}

impl TimerTask {
    pub fn new(session_id: SessionId, slot: TimerSlot) -> Self {
        Self { session_id, slot }
    }
}

/// A task that came due during `take_due`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DueTask {
    pub handle: TimerHandle,
    pub task: TimerTask,
}

/// Cooperative scheduler for repeating tasks.
pub trait Scheduler {
    /// Register a task that first fires one interval from now, then repeats.
    fn schedule_repeating(&mut self, task: TimerTask, interval_ms: u64) -> TimerHandle;

    /// Cancel a task. Returns false if the handle was not active.
    fn cancel(&mut self, handle: TimerHandle) -> bool;

    fn is_active(&self, handle: TimerHandle) -> bool;

    /// Advance the clock to `now_ms` and return the tasks that are due.
    fn take_due(&mut self, now_ms: u64) -> Vec<DueTask>;
}

#[derive(Debug, Clone)]
struct Timer {
    task: TimerTask,
    interval_ms: u64,
    next_due_ms: u64,
}

/// Deterministic scheduler over a virtual millisecond clock.
///
/// Each timer fires at most once per `take_due` call. A timer that has
/// fallen more than one interval behind is re-based on the current time
/// instead of firing a burst of catch-up ticks.
#[derive(Debug, Default)]
pub struct IntervalScheduler {
    now_ms: u64,
    next_handle: u64,
    timers: BTreeMap<TimerHandle, Timer>,
}

impl IntervalScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current clock (ms).
    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    /// Number of live timers.
    pub fn active_count(&self) -> usize {
        self.timers.len()
    }

    /// Live timers driving the given task.
    pub fn active_for(&self, task: &TimerTask) -> usize {
        self.timers.values().filter(|t| &t.task == task).count()
    }
}

impl Scheduler for IntervalScheduler {
    fn schedule_repeating(&mut self, task: TimerTask, interval_ms: u64) -> TimerHandle {
        let handle = TimerHandle(self.next_handle);
        self.next_handle += 1;
        let interval_ms = interval_ms.max(1);
        self.timers.insert(
            handle,
            Timer {
                task,
                interval_ms,
                next_due_ms: self.now_ms.saturating_add(interval_ms),
            },
        );
        handle
    }

    fn cancel(&mut self, handle: TimerHandle) -> bool {
        self.timers.remove(&handle).is_some()
    }

    fn is_active(&self, handle: TimerHandle) -> bool {
        self.timers.contains_key(&handle)
    }

    fn take_due(&mut self, now_ms: u64) -> Vec<DueTask> {
        self.now_ms = self.now_ms.max(now_ms);
        let now = self.now_ms;

        let mut due: Vec<(u64, TimerHandle)> = self
            .timers
            .iter()
            .filter(|(_, timer)| timer.next_due_ms <= now)
            .map(|(handle, timer)| (timer.next_due_ms, *handle))
            .collect();
        due.sort_unstable();

        let mut out = Vec::with_capacity(due.len());
        for (_, handle) in due {
            if let Some(timer) = self.timers.get_mut(&handle) {
                timer.next_due_ms = timer.next_due_ms.saturating_add(timer.interval_ms);
                if timer.next_due_ms <= now {
                    // Too far behind: reset to avoid a catch-up spiral.
                    timer.next_due_ms = now.saturating_add(timer.interval_ms);
                }
                out.push(DueTask {
                    handle,
                    task: timer.task.clone(),
                });
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(id: u64, slot: TimerSlot) -> TimerTask {
        TimerTask::new(SessionId::from(id), slot)
    }

    #[test]
    fn test_first_fire_after_one_interval() {
        let mut sched = IntervalScheduler::new();
        let h = sched.schedule_repeating(task(1, TimerSlot::Simulation), 1000);

        assert!(sched.take_due(999).is_empty());
        let due = sched.take_due(1000);
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].handle, h);
        assert!(sched.take_due(1500).is_empty());
        assert_eq!(sched.take_due(2000).len(), 1);
    }

    #[test]
    fn test_cancel_stops_firing() {
        let mut sched = IntervalScheduler::new();
        let h = sched.schedule_repeating(task(1, TimerSlot::Simulation), 100);
        assert!(sched.is_active(h));
        assert!(sched.cancel(h));
        assert!(!sched.is_active(h));
        assert!(!sched.cancel(h), "second cancel is a no-op");
        assert!(sched.take_due(10_000).is_empty());
    }

    #[test]
    fn test_no_catch_up_burst() {
        let mut sched = IntervalScheduler::new();
        sched.schedule_repeating(task(1, TimerSlot::Simulation), 100);

        // Jump ten intervals ahead: one firing, then re-based.
        assert_eq!(sched.take_due(1000).len(), 1);
        assert!(sched.take_due(1050).is_empty());
        assert_eq!(sched.take_due(1100).len(), 1);
    }

    #[test]
    fn test_due_order_is_deterministic() {
        let mut sched = IntervalScheduler::new();
        let poll = sched.schedule_repeating(task(1, TimerSlot::Reconciliation), 300);
        let sim = sched.schedule_repeating(task(1, TimerSlot::Simulation), 100);
        let other = sched.schedule_repeating(task(2, TimerSlot::Simulation), 300);

        let due: Vec<TimerHandle> = sched.take_due(300).into_iter().map(|d| d.handle).collect();
        // sim was due at 100 (earliest), then poll/other tie at 300 broken by handle.
        assert_eq!(due, vec![sim, poll, other]);
    }

    #[test]
    fn test_huge_interval_saturates() {
        let mut sched = IntervalScheduler::new();
        sched.take_due(10);
        let h = sched.schedule_repeating(task(1, TimerSlot::Reconciliation), u64::MAX);
        assert!(sched.is_active(h));
        assert!(sched.take_due(u64::MAX - 1).is_empty());
        assert_eq!(sched.take_due(u64::MAX).len(), 1);
        // Re-based at the end of the clock; still no overflow.
        assert_eq!(sched.take_due(u64::MAX).len(), 1);
    }

    #[test]
    fn test_clock_never_moves_backward() {
        let mut sched = IntervalScheduler::new();
        sched.take_due(5000);
        sched.take_due(1000);
        assert_eq!(sched.now_ms(), 5000);
        sched.schedule_repeating(task(1, TimerSlot::Simulation), 1000);
        assert!(sched.take_due(5999).is_empty());
        assert_eq!(sched.take_due(6000).len(), 1);
    }
}
