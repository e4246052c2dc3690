use std::{net::SocketAddr, time::Duration};

use iomust_server::Transport;
use iomust_shared::WireMessage;

/// A message handed to a RecordingTransport, decoded back from its bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub destination: SocketAddr,
    pub message: WireMessage,
    pub delay: Duration,
}

/// Transport that keeps every message instead of sending it
#[derive(Default)]
pub struct RecordingTransport {
    sent: Vec<SentMessage>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> &[SentMessage] {
        &self.sent
    }

    /// Removes and returns everything recorded so far
    pub fn take(&mut self) -> Vec<SentMessage> {
        std::mem::take(&mut self.sent)
    }

    /// Messages recorded for one destination, in send order
    pub fn sent_to(&self, destination: &SocketAddr) -> Vec<&SentMessage> {
        self.sent
            .iter()
            .filter(|sent| sent.destination == *destination)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.sent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sent.is_empty()
    }
}

impl Transport for RecordingTransport {
    fn send(&mut self, destination: SocketAddr, payload: Vec<u8>, delay: Duration) {
        let message = WireMessage::decode(&payload).expect("sent an undecodable message");
        self.sent.push(SentMessage {
            destination,
            message,
            delay,
        });
    }
}
