use std::{collections::HashMap, net::SocketAddr, time::Duration};

use log::info;

use iomust_shared::{Slot, SlotOffset, WireMessage};

use super::stream::Stream;

/// Owns every Stream of a session, keyed by sender address.
///
/// The first Stream ever created fixes the session's reference time; every
/// later Stream gets the integer number of periods that aligns its local
/// numbering with the reference sender's.
pub struct StreamRegistry {
    period_nanos: i128,
    ring_capacity: usize,
    reply_port: Option<u16>,
    reference_time: Option<i128>,
    // creation order, so "the first stream with content" is deterministic
    streams: Vec<Stream>,
    indices: HashMap<SocketAddr, usize>,
}

impl StreamRegistry {
    pub fn new(period: Duration, ring_capacity: usize, reply_port: Option<u16>) -> Self {
        Self {
            period_nanos: period.as_nanos() as i128,
            ring_capacity,
            reply_port,
            reference_time: None,
            streams: Vec::new(),
            indices: HashMap::new(),
        }
    }

    /// Returns the Stream for `address`, creating it from `message` on first
    /// contact
    pub fn resolve(&mut self, address: &SocketAddr, message: &WireMessage) -> &mut Stream {
        let index = match self.indices.get(address) {
            Some(index) => *index,
            None => self.add_stream(address, message),
        };
        &mut self.streams[index]
    }

    fn add_stream(&mut self, address: &SocketAddr, message: &WireMessage) -> usize {
        let stream_origin = self.stream_origin(message);

        let offset = match self.reference_time {
            Some(reference_time) => round_div(reference_time - stream_origin, self.period_nanos),
            None => {
                self.reference_time = Some(stream_origin);
                0
            }
        };

        let mut reply_address = *address;
        if let Some(port) = self.reply_port {
            reply_address.set_port(port);
        }

        info!(
            "New stream from {} (replies to {}), offset {} periods",
            address, reply_address, offset
        );

        let index = self.streams.len();
        self.streams.push(Stream::new(
            *address,
            reply_address,
            offset,
            self.ring_capacity,
        ));
        self.indices.insert(*address, index);
        index
    }

    /// Logical start time of the sender, in nanoseconds of its own clock
    fn stream_origin(&self, message: &WireMessage) -> i128 {
        let send_time = i128::from(message.send_time()) * 1_000;
        send_time - i128::from(message.seq_n()) * self.period_nanos
    }

    pub fn get(&self, address: &SocketAddr) -> Option<&Stream> {
        self.indices.get(address).map(|index| &self.streams[*index])
    }

    /// Streams in creation order
    pub fn iter(&self) -> impl Iterator<Item = &Stream> {
        self.streams.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Stream> {
        self.streams.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.streams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }

    /// Whether every known Stream holds a message for `slot`
    pub fn all_present(&self, slot: Slot) -> bool {
        !self.streams.is_empty() && self.streams.iter().all(|stream| stream.has(slot))
    }

    /// Whether at least one Stream holds a message for `slot`
    pub fn any_present(&self, slot: Slot) -> bool {
        self.streams.iter().any(|stream| stream.has(slot))
    }

    /// Start time of the first Stream of the session, in microseconds
    pub fn reference_time(&self) -> Option<i64> {
        self.reference_time.map(|nanos| (nanos / 1_000) as i64)
    }
}

/// Integer division rounding half away from zero
fn round_div(numerator: i128, denominator: i128) -> SlotOffset {
    if denominator == 0 {
        return 0;
    }
    let quotient = numerator / denominator;
    let remainder = numerator % denominator;
    let rounded = if remainder.abs() * 2 >= denominator.abs() {
        if (numerator < 0) != (denominator < 0) {
            quotient - 1
        } else {
            quotient + 1
        }
    } else {
        quotient
    };
    rounded as SlotOffset
}
