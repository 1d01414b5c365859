use std::{
    collections::BTreeSet,
    time::{Duration, Instant},
};

use crate::{backend::Scheduler, error::BackendError};

/// Opaque handle for a scheduled wake-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

/// Deadline-ordered timer queue.
///
/// Deadlines are offsets from an origin chosen by the owner (a virtual clock
/// or an `Instant`). Equal deadlines fire in scheduling order.
#[derive(Debug, Default)]
pub struct TimerQueue {
    next_id: u64,
    entries: BTreeSet<(Duration, TimerId)>,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, deadline: Duration) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.entries.insert((deadline, id));
        id
    }

    /// Returns false if the timer was not pending.
    pub fn remove(&mut self, id: TimerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|&(_, entry)| entry != id);
        self.entries.len() != before
    }

    /// Pop the earliest timer with `deadline <= now`.
    pub fn pop_due(&mut self, now: Duration) -> Option<(Duration, TimerId)> {
        let &(deadline, id) = self.entries.first()?;
        if deadline > now {
            return None;
        }
        self.entries.pop_first();
        Some((deadline, id))
    }

    pub fn next_deadline(&self) -> Option<Duration> {
        self.entries.first().map(|&(deadline, _)| deadline)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Virtual-clock scheduler for offline rendering and tests.
///
/// Time only moves when [`ManualScheduler::advance`] is called. While due
/// timers are drained, `now` sits at the deadline of the timer just fired, so
/// anything scheduled in response is relative to its logical firing time.
#[derive(Debug, Default)]
pub struct ManualScheduler {
    queue: TimerQueue,
    now: Duration,
    horizon: Duration,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move the clock forward. Timers up to the new time become due.
    pub fn advance(&mut self, by: Duration) {
        self.horizon += by;
    }

    /// Current logical time since the scheduler was created.
    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }
}

impl Scheduler for ManualScheduler {
    type Timer = TimerId;

    fn schedule_after(&mut self, delay: Duration) -> Result<TimerId, BackendError> {
        Ok(self.queue.insert(self.now + delay))
    }

    fn cancel(&mut self, timer: TimerId) {
        self.queue.remove(timer);
    }

    fn pop_due(&mut self) -> Option<TimerId> {
        match self.queue.pop_due(self.horizon) {
            Some((deadline, id)) => {
                self.now = self.now.max(deadline);
                Some(id)
            }
            None => {
                self.now = self.horizon;
                None
            }
        }
    }

    fn time_until_next(&self) -> Option<Duration> {
        self.queue
            .next_deadline()
            .map(|deadline| deadline.saturating_sub(self.now))
    }
}

/// Wall-clock scheduler.
///
/// A timer scheduled right after another one fired is based on the fired
/// deadline rather than on the current time, so a steady tick does not
/// accumulate the latency of each wake-up. If the caller is more than one
/// delay late the base resyncs to the wall clock instead of bursting.
#[derive(Debug)]
pub struct RealtimeScheduler {
    queue: TimerQueue,
    origin: Instant,
    last_fired: Option<Duration>,
}

impl RealtimeScheduler {
    pub fn new() -> Self {
        Self {
            queue: TimerQueue::new(),
            origin: Instant::now(),
            last_fired: None,
        }
    }

    fn elapsed(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Where a new timer's delay counts from: the deadline that just fired, unless
/// `now` is already a full `delay` past it.
fn reschedule_base(now: Duration, last_fired: Option<Duration>, delay: Duration) -> Duration {
    last_fired
        .filter(|&fired| now.saturating_sub(fired) < delay)
        .unwrap_or(now)
}

impl Default for RealtimeScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler for RealtimeScheduler {
    type Timer = TimerId;

    fn schedule_after(&mut self, delay: Duration) -> Result<TimerId, BackendError> {
        let base = reschedule_base(self.elapsed(), self.last_fired.take(), delay);
        Ok(self.queue.insert(base + delay))
    }

    fn cancel(&mut self, timer: TimerId) {
        self.queue.remove(timer);
    }

    fn pop_due(&mut self) -> Option<TimerId> {
        let (deadline, id) = self.queue.pop_due(self.elapsed())?;
        self.last_fired = Some(deadline);
        Some(id)
    }

    fn time_until_next(&self) -> Option<Duration> {
        self.queue
            .next_deadline()
            .map(|deadline| deadline.saturating_sub(self.elapsed()))
    }
}

/// The engine's self-rescheduling tick, as an explicit object.
///
/// Holds the repeat interval and at most one pending timer. Firing is
/// confirmed through [`RepeatingTask::claim`], which rejects any timer that
/// is not the current pending one, so a cancelled tick can never run.
#[derive(Debug)]
pub struct RepeatingTask<T> {
    interval: Duration,
    pending: Option<T>,
}

impl<T: Copy + Eq> RepeatingTask<T> {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            pending: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_armed(&self) -> bool {
        self.pending.is_some()
    }

    /// Schedule the next run, replacing (and cancelling) any pending one.
    pub fn arm<S: Scheduler<Timer = T>>(&mut self, scheduler: &mut S) -> Result<(), BackendError> {
        self.cancel(scheduler);
        self.pending = Some(scheduler.schedule_after(self.interval)?);
        Ok(())
    }

    pub fn cancel<S: Scheduler<Timer = T>>(&mut self, scheduler: &mut S) {
        if let Some(timer) = self.pending.take() {
            scheduler.cancel(timer);
        }
    }

    /// True (and disarmed) if `fired` is the pending run.
    pub fn claim(&mut self, fired: T) -> bool {
        if self.pending == Some(fired) {
            self.pending = None;
            true
        } else {
            false
        }
    }
}
