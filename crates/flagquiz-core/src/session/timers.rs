//! Clock and timer capabilities the scheduler depends on.
//!
//! The scheduler never sleeps or spawns. It asks a [`TimerDriver`] to arm a
//! timer and later receives the fired [`TimerHandle`] back through
//! `SessionScheduler::on_timer`. Production uses the tokio-backed driver in
//! `session::runtime`; tests and one-shot CLI commands use [`ManualTimers`],
//! which only fires when told to advance.

use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// Source of the current wall-clock instant.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Identifies one armed timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(pub u64);

/// Arms one-shot and recurring timers.
///
/// `cancel` must be idempotent: cancelling an unknown or already-fired
/// handle is a no-op.
pub trait TimerDriver: Send {
    fn after(&mut self, delay: Duration) -> TimerHandle;
    fn every(&mut self, interval: Duration) -> TimerHandle;
    fn cancel(&mut self, handle: TimerHandle);
    fn cancel_all(&mut self);
}

#[derive(Debug, Clone)]
struct ManualTimer {
    handle: TimerHandle,
    due: DateTime<Utc>,
    interval: Option<chrono::Duration>,
}

#[derive(Debug)]
struct ManualState {
    now: DateTime<Utc>,
    next_id: u64,
    armed: Vec<ManualTimer>,
}

/// Deterministic clock and timer driver.
///
/// Clones share state, so a test can hand one clone to the scheduler and keep
/// another to move time forward.
#[derive(Debug, Clone)]
pub struct ManualTimers {
    state: Arc<Mutex<ManualState>>,
}

impl ManualTimers {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            state: Arc::new(Mutex::new(ManualState {
                now,
                next_id: 1,
                armed: Vec::new(),
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ManualState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Move the clock without firing anything, like a process that was not
    /// running for a while.
    pub fn skip(&self, secs: i64) {
        let mut state = self.lock();
        state.now += chrono::Duration::seconds(secs);
    }

    /// Advance exactly one second and return the timers that came due, in
    /// due order. Recurring timers are re-armed; one-shots are dropped.
    pub fn step(&self) -> Vec<TimerHandle> {
        let mut state = self.lock();
        state.now += chrono::Duration::seconds(1);
        let now = state.now;

        let mut due: Vec<(DateTime<Utc>, TimerHandle)> = state
            .armed
            .iter()
            .filter(|t| t.due <= now)
            .map(|t| (t.due, t.handle))
            .collect();
        due.sort();

        for timer in state.armed.iter_mut() {
            if timer.due <= now {
                if let Some(interval) = timer.interval {
                    timer.due += interval;
                }
            }
        }
        state.armed.retain(|t| t.interval.is_some() || t.due > now);

        due.into_iter().map(|(_, h)| h).collect()
    }

    pub fn armed_count(&self) -> usize {
        self.lock().armed.len()
    }

    pub fn is_armed(&self, handle: TimerHandle) -> bool {
        self.lock().armed.iter().any(|t| t.handle == handle)
    }

    fn arm(&mut self, delay: Duration, recurring: bool) -> TimerHandle {
        let mut state = self.lock();
        let handle = TimerHandle(state.next_id);
        state.next_id += 1;
        let delay = chrono::Duration::from_std(delay).unwrap_or_else(|_| chrono::Duration::zero());
        let due = state.now + delay;
        state.armed.push(ManualTimer {
            handle,
            due,
            interval: recurring.then_some(delay),
        });
        handle
    }
}

impl Clock for ManualTimers {
    fn now(&self) -> DateTime<Utc> {
        self.lock().now
    }
}

impl TimerDriver for ManualTimers {
    fn after(&mut self, delay: Duration) -> TimerHandle {
        self.arm(delay, false)
    }

    fn every(&mut self, interval: Duration) -> TimerHandle {
        self.arm(interval, true)
    }

    fn cancel(&mut self, handle: TimerHandle) {
        self.lock().armed.retain(|t| t.handle != handle);
    }

    fn cancel_all(&mut self) {
        self.lock().armed.clear();
    }
}
