use std::net::SocketAddr;

use thiserror::Error;

use iomust_shared::WireError;

use crate::transport::{RecvError, SendError};

/// Errors surfaced by the mixing server
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IomustServerError {
    /// A received datagram could not be decoded
    #[error("Wire error: {0}")]
    Wire(#[from] WireError),

    /// The packet socket refused a datagram
    #[error("Send error: {0}")]
    Send(#[from] SendError),

    /// The packet socket stopped delivering datagrams
    #[error("Receive error: {0}")]
    Recv(#[from] RecvError),

    /// The server configuration cannot drive a session
    #[error("Invalid server configuration: {reason}")]
    InvalidConfig { reason: &'static str },

    /// The listening socket could not be opened
    #[error("Failed to bind {address}: {reason}")]
    Bind { address: SocketAddr, reason: String },
}
