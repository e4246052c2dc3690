use std::net::SocketAddr;

use iomust_shared::{SequenceNumber, Slot, SlotOffset, WireMessage};

/// A ring position, remembering which slot it was written for so that
/// slot `s` and slot `s + capacity` never alias
struct BufferedMessage {
    slot: Slot,
    message: WireMessage,
}

/// The stream of numbered messages arriving from one sender.
///
/// Messages are buffered by slot in a fixed-capacity ring until the
/// synchronizer releases them. The offset that maps this sender's local
/// numbering onto the shared slot domain is fixed at creation.
pub struct Stream {
    address: SocketAddr,
    reply_address: SocketAddr,
    offset: SlotOffset,
    buffer: Vec<Option<BufferedMessage>>,
}

impl Stream {
    pub fn new(
        address: SocketAddr,
        reply_address: SocketAddr,
        offset: SlotOffset,
        capacity: usize,
    ) -> Self {
        let mut buffer = Vec::with_capacity(capacity);
        buffer.resize_with(capacity.max(1), || None);

        Self {
            address,
            reply_address,
            offset,
            buffer,
        }
    }

    /// Address the stream's messages arrive from
    pub fn address(&self) -> SocketAddr {
        self.address
    }

    /// Address released content for this stream is sent to
    pub fn reply_address(&self) -> SocketAddr {
        self.reply_address
    }

    pub fn offset(&self) -> SlotOffset {
        self.offset
    }

    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Maps a local sequence number onto the shared slot domain
    pub fn normalize(&self, seq_n: SequenceNumber) -> Slot {
        Slot::from(seq_n) - self.offset
    }

    /// Maps a slot back onto this stream's local numbering
    pub fn denormalize(&self, slot: Slot) -> SequenceNumber {
        // sequence counters wrap, so truncation is the intended conversion
        (slot + self.offset) as SequenceNumber
    }

    /// Buffers a message, replacing whatever occupied its ring position.
    /// Returns the slot the message belongs to.
    pub fn add(&mut self, message: WireMessage) -> Slot {
        let slot = self.normalize(message.seq_n());
        let index = self.index(slot);
        self.buffer[index] = Some(BufferedMessage { slot, message });
        slot
    }

    pub fn get(&self, slot: Slot) -> Option<&WireMessage> {
        match &self.buffer[self.index(slot)] {
            Some(buffered) if buffered.slot == slot => Some(&buffered.message),
            _ => None,
        }
    }

    pub fn has(&self, slot: Slot) -> bool {
        self.get(slot).is_some()
    }

    /// Marks the message buffered for `slot` as sent
    pub fn clear(&mut self, slot: Slot) {
        let index = self.index(slot);
        if let Some(buffered) = &self.buffer[index] {
            if buffered.slot == slot {
                self.buffer[index] = None;
            }
        }
    }

    /// Number of occupied ring positions
    pub fn pending(&self) -> usize {
        self.buffer.iter().filter(|entry| entry.is_some()).count()
    }

    fn index(&self, slot: Slot) -> usize {
        // rem_euclid keeps negative slots inside the ring
        slot.rem_euclid(self.buffer.len() as Slot) as usize
    }
}
