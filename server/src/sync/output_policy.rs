use std::net::SocketAddr;

use iomust_shared::{SequenceNumber, Slot, WireMessage};

/// One stream's content for a released slot, already re-sequenced to the
/// stream's local numbering and addressed to the stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotContribution {
    pub source: SocketAddr,
    pub reply_address: SocketAddr,
    pub local_seq_n: SequenceNumber,
    pub message: WireMessage,
    /// Synthesized from another stream's content because this stream missed the slot
    pub concealed: bool,
}

/// A message the synchronizer hands to the Transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatch {
    pub destination: SocketAddr,
    pub message: WireMessage,
}

impl Dispatch {
    /// Builds a dispatch whose header destination matches where it is sent
    pub fn addressed(destination: SocketAddr, mut message: WireMessage) -> Self {
        if let SocketAddr::V4(address) = destination {
            message.set_destination(*address.ip());
        }
        Self {
            destination,
            message,
        }
    }
}

/// Decides who receives what when a slot is released
pub trait OutputPolicy {
    fn distribute(&mut self, slot: Slot, contributions: &[SlotContribution]) -> Vec<Dispatch>;
}

/// Which OutputPolicy a mixing session uses
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputPolicyKind {
    /// Symmetric mesh: every peer hears everyone except itself
    Broadcast,
    /// Every stream is an uplink; the slot is merged and sent to one sink
    AggregateForward { sink: SocketAddr },
}

impl OutputPolicyKind {
    pub fn build(&self) -> Box<dyn OutputPolicy> {
        match self {
            OutputPolicyKind::Broadcast => Box::new(BroadcastRelease),
            OutputPolicyKind::AggregateForward { sink } => Box::new(AggregateForward::new(*sink)),
        }
    }
}

impl Default for OutputPolicyKind {
    fn default() -> Self {
        OutputPolicyKind::Broadcast
    }
}

/// Sends every participant the other participants' content for the slot
pub struct BroadcastRelease;

impl OutputPolicy for BroadcastRelease {
    fn distribute(&mut self, _slot: Slot, contributions: &[SlotContribution]) -> Vec<Dispatch> {
        let mut dispatches = Vec::new();
        for receiver in contributions {
            for other in contributions {
                if other.source == receiver.source {
                    continue;
                }
                let mut message = other.message.clone();
                message.set_seq_n(receiver.local_seq_n);
                dispatches.push(Dispatch::addressed(receiver.reply_address, message));
            }
        }
        dispatches
    }
}

/// Concatenates the slot's payloads and forwards them to a single downlink
pub struct AggregateForward {
    sink: SocketAddr,
}

impl AggregateForward {
    pub fn new(sink: SocketAddr) -> Self {
        Self { sink }
    }

    pub fn sink(&self) -> SocketAddr {
        self.sink
    }
}

impl OutputPolicy for AggregateForward {
    fn distribute(&mut self, slot: Slot, contributions: &[SlotContribution]) -> Vec<Dispatch> {
        let Some(first) = contributions.first() else {
            return Vec::new();
        };

        let size = contributions
            .iter()
            .map(|contribution| contribution.message.payload().len())
            .sum();
        let mut payload = Vec::with_capacity(size);
        for contribution in contributions {
            payload.extend_from_slice(contribution.message.payload());
        }

        let mut message = first.message.clone();
        message.set_payload(payload);
        // slots are numbered like the reference stream, whose offset is zero
        message.set_seq_n(slot as SequenceNumber);

        vec![Dispatch::addressed(self.sink, message)]
    }
}
