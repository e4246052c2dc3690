use std::{
    net::SocketAddr,
    time::{Duration, Instant},
};

use iomust_shared::TimeQueue;

/// Fire-and-forget delivery of encoded messages
pub trait Transport {
    fn send(&mut self, destination: SocketAddr, payload: Vec<u8>, delay: Duration);
}

/// A Transport that holds each datagram until its send delay has elapsed;
/// the server loop drains it into the packet socket
pub struct OutgoingQueue {
    now: Instant,
    queue: TimeQueue<(SocketAddr, Vec<u8>)>,
}

impl OutgoingQueue {
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

    /// Next datagram that is due to be sent
    pub fn pop_ready(&mut self) -> Option<(SocketAddr, Vec<u8>)> {
        self.queue.pop_item(&self.now)
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

impl Transport for OutgoingQueue {
    fn send(&mut self, destination: SocketAddr, payload: Vec<u8>, delay: Duration) {
        self.queue.add_item(self.now + delay, (destination, payload));
    }
}

// records every send, for unit tests
#[cfg(test)]
impl Transport for Vec<(SocketAddr, Vec<u8>, Duration)> {
    fn send(&mut self, destination: SocketAddr, payload: Vec<u8>, delay: Duration) {
        self.push((destination, payload, delay));
    }
}
