#![forbid(unsafe_code)]

//! A deterministic, manually advanced timer queue.
//!
//! Components schedule intervals and timeouts here instead of on a real
//! clock. Time only moves when [`Timers::advance`] is called; due callbacks
//! run synchronously inside that call, in due-time order, ties broken by
//! scheduling order.
//!
//! All clones of a `Timers` share the same queue and clock.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::time::Duration;

/// Smallest interval period. Shorter periods are rounded up.
pub const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Handle for clearing a scheduled timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

struct Timer {
    id: TimerId,
    due: Duration,
    period: Option<Duration>,
    callback: Rc<dyn Fn()>,
}

#[derive(Default)]
struct TimerQueue {
    now: Duration,
    next_id: u64,
    timers: Vec<Timer>,
}

impl TimerQueue {
    fn schedule(&mut self, delay: Duration, period: Option<Duration>, callback: Rc<dyn Fn()>) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.timers.push(Timer {
            id,
            due: self.now + delay,
            period,
            callback,
        });
        id
    }

    /// Pop the earliest timer due at or before `limit`, rescheduling it if
    /// it repeats.
    fn take_due(&mut self, limit: Duration) -> Option<Rc<dyn Fn()>> {
        let index = self
            .timers
            .iter()
            .enumerate()
            .filter(|(_, timer)| timer.due <= limit)
            .min_by_key(|(_, timer)| (timer.due, timer.id))
            .map(|(index, _)| index)?;

        let (due, period, callback) = {
            let timer = &self.timers[index];
            (timer.due, timer.period, Rc::clone(&timer.callback))
        };
        self.now = due;
        match period {
            Some(period) => self.timers[index].due = due + period,
            None => {
                self.timers.swap_remove(index);
            }
        }
        Some(callback)
    }
}

/// Shared virtual clock with scheduled callbacks.
#[derive(Clone, Default)]
pub struct Timers {
    queue: Rc<RefCell<TimerQueue>>,
}

impl fmt::Debug for Timers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let queue = self.queue.borrow();
        f.debug_struct("Timers")
            .field("now", &queue.now)
            .field("pending", &queue.timers.len())
            .finish()
    }
}

impl Timers {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `callback` every `period`, first after one period.
    pub fn set_interval(&self, period: Duration, callback: impl Fn() + 'static) -> TimerId {
        let period = period.max(MIN_PERIOD);
        self.queue
            .borrow_mut()
            .schedule(period, Some(period), Rc::new(callback))
    }

    /// Run `callback` once after `delay`.
    pub fn set_timeout(&self, delay: Duration, callback: impl Fn() + 'static) -> TimerId {
        self.queue
            .borrow_mut()
            .schedule(delay, None, Rc::new(callback))
    }

    /// Cancel a timer. Returns whether it was still scheduled.
    pub fn clear(&self, id: TimerId) -> bool {
        let mut queue = self.queue.borrow_mut();
        let before = queue.timers.len();
        queue.timers.retain(|timer| timer.id != id);
        queue.timers.len() != before
    }

    /// Move the clock forward by `delta`, running every callback that falls
    /// due on the way. Returns how many ran.
    pub fn advance(&self, delta: Duration) -> usize {
        let limit = self.queue.borrow().now + delta;
        let mut fired = 0;
        loop {
            // The borrow ends before the callback runs.
            let Some(callback) = self.queue.borrow_mut().take_due(limit) else {
                break;
            };
            callback();
            fired += 1;
        }
        self.queue.borrow_mut().now = limit;
        tracing::trace!(message = "timers.advance", delta_us = delta.as_micros() as u64, fired);
        fired
    }

    /// Time elapsed since creation.
    #[must_use]
    pub fn now(&self) -> Duration {
        self.queue.borrow().now
    }

    /// Number of scheduled timers.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue.borrow().timers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn counter() -> (Rc<Cell<u32>>, impl Fn() + 'static) {
        let hits = Rc::new(Cell::new(0));
        let hits_clone = Rc::clone(&hits);
        (hits, move || hits_clone.set(hits_clone.get() + 1))
    }

    #[test]
    fn interval_fires_per_period() {
        let timers = Timers::new();
        let (hits, tick) = counter();
        timers.set_interval(Duration::from_secs(1), tick);

        assert_eq!(timers.advance(Duration::from_millis(999)), 0);
        assert_eq!(timers.advance(Duration::from_millis(1)), 1);
        assert_eq!(timers.advance(Duration::from_secs(3)), 3);
        assert_eq!(hits.get(), 4);
        assert_eq!(timers.now(), Duration::from_secs(4));
    }

    #[test]
    fn timeout_fires_once() {
        let timers = Timers::new();
        let (hits, tick) = counter();
        timers.set_timeout(Duration::from_millis(10), tick);
        assert_eq!(timers.pending(), 1);

        timers.advance(Duration::from_secs(1));
        timers.advance(Duration::from_secs(1));
        assert_eq!(hits.get(), 1);
        assert_eq!(timers.pending(), 0);
    }

    #[test]
    fn clear_cancels() {
        let timers = Timers::new();
        let (hits, tick) = counter();
        let id = timers.set_interval(Duration::from_secs(1), tick);
        assert!(timers.clear(id));
        assert!(!timers.clear(id));
        timers.advance(Duration::from_secs(5));
        assert_eq!(hits.get(), 0);
    }

    #[test]
    fn callbacks_run_in_due_order() {
        let timers = Timers::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        for (name, ms) in [("slow", 30), ("fast", 10), ("tie", 10)] {
            let log = Rc::clone(&log);
            timers.set_timeout(Duration::from_millis(ms), move || log.borrow_mut().push(name));
        }
        timers.advance(Duration::from_millis(50));
        assert_eq!(*log.borrow(), vec!["fast", "tie", "slow"]);
    }

    #[test]
    fn callback_may_clear_itself_and_schedule() {
        let timers = Timers::new();
        let id_slot = Rc::new(Cell::new(None));
        let (hits, tick) = counter();
        let timers_clone = timers.clone();
        let id_clone = Rc::clone(&id_slot);
        let tick = Rc::new(tick);
        let id = timers.set_interval(Duration::from_secs(1), move || {
            if let Some(id) = id_clone.get() {
                timers_clone.clear(id);
            }
            let tick = Rc::clone(&tick);
            timers_clone.set_timeout(Duration::from_secs(1), move || tick());
        });
        id_slot.set(Some(id));

        timers.advance(Duration::from_secs(5));
        assert_eq!(hits.get(), 1);
        assert_eq!(timers.pending(), 0);
    }

    #[test]
    fn zero_period_is_rounded_up() {
        let timers = Timers::new();
        let (hits, tick) = counter();
        timers.set_interval(Duration::ZERO, tick);
        timers.advance(Duration::from_millis(3));
        assert_eq!(hits.get(), 3);
    }
}
