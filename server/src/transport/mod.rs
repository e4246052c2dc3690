use std::net::SocketAddr;

use thiserror::Error;

pub mod channel;

cfg_if! {
    if #[cfg(feature = "transport_udp")] {
        pub mod udp;
    }
}

/// A datagram could not be handed to the network
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Failed to send datagram")]
pub struct SendError;

/// The socket can no longer deliver datagrams
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Failed to receive datagram")]
pub struct RecvError;

pub trait PacketSender: Send {
    /// Sends a datagram to the given address
    fn send(&self, address: &SocketAddr, payload: &[u8]) -> Result<(), SendError>;
}

pub trait PacketReceiver: Send {
    /// Returns the next received datagram and its sender, if any
    fn receive(&mut self) -> Result<Option<(SocketAddr, &[u8])>, RecvError>;
}

/// A listening endpoint the server can be loaded with
pub trait Socket {
    fn listen(self: Box<Self>) -> (Box<dyn PacketSender>, Box<dyn PacketReceiver>);
}
