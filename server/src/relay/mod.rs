use std::net::SocketAddr;

use iomust_shared::WireError;

mod broadcast;
mod forward;

pub use broadcast::{BroadcastConfig, BroadcastRelay};
pub use forward::{ForwardConfig, ForwardRelay};

/// A stateless server engine that re-sends every message it receives,
/// without any slot alignment
pub trait Relay {
    /// Handles one datagram received from `from`. Datagrams too short to
    /// carry a header are refused and nothing is sent.
    fn relay(&mut self, from: &SocketAddr, bytes: &[u8]) -> Result<(), WireError>;
}
