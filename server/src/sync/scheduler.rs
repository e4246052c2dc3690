use std::time::{Duration, Instant};

use iomust_shared::{Slot, TimeQueue};

/// Fires a slot timeout once `delay` has elapsed.
///
/// Timeouts are fire-once and are never cancelled; the synchronizer ignores
/// those that fire for slots it has already released.
pub trait Scheduler {
    fn after(&mut self, delay: Duration, slot: Slot);
}

/// A Scheduler backed by a TimeQueue, polled by the server loop
pub struct TimerQueue {
    now: Instant,
    queue: TimeQueue<Slot>,
}

impl TimerQueue {
    pub fn new(now: Instant) -> Self {
        Self {
            now,
            queue: TimeQueue::new(),
        }
    }

    /// Moves the queue's notion of "now" forward. Earlier instants are ignored.
    pub fn advance(&mut self, now: Instant) {
        if now > self.now {
            self.now = now;
        }
    }

    pub fn now(&self) -> Instant {
        self.now
    }

    /// Next slot whose timeout is due
    pub fn pop_expired(&mut self) -> Option<Slot> {
        self.queue.pop_item(&self.now)
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.queue.next_instant()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

impl Scheduler for TimerQueue {
    fn after(&mut self, delay: Duration, slot: Slot) {
        self.queue.add_item(self.now + delay, slot);
    }
}

#[cfg(test)]
impl Scheduler for Vec<(Duration, Slot)> {
    fn after(&mut self, delay: Duration, slot: Slot) {
        self.push((delay, slot));
    }
}
