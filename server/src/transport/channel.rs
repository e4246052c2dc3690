use std::net::SocketAddr;

use smol::{
    channel,
    channel::{Receiver, Sender, TryRecvError},
};

use super::{
    PacketReceiver as TransportReceiver, PacketSender as TransportSender, RecvError, SendError,
    Socket as TransportSocket,
};

type Datagram = (SocketAddr, Box<[u8]>);

impl TransportSender for Sender<Datagram> {
    fn send(&self, address: &SocketAddr, payload: &[u8]) -> Result<(), SendError> {
        self.try_send((*address, payload.into()))
            .map_err(|_| SendError)
    }
}

#[derive(Clone)]
struct PacketChannelReceiver {
    receiver: Receiver<Datagram>,
    current_payload: Option<Box<[u8]>>,
}

impl PacketChannelReceiver {
    fn new(receiver: Receiver<Datagram>) -> Self {
        Self {
            receiver,
            current_payload: None,
        }
    }
}

impl TransportReceiver for PacketChannelReceiver {
    /// Receives a datagram sent into the channel
    fn receive(&mut self) -> Result<Option<(SocketAddr, &[u8])>, RecvError> {
        match self.receiver.try_recv() {
            Ok((address, payload)) => {
                let payload = self.current_payload.insert(payload);
                Ok(Some((address, &payload[..])))
            }
            Err(TryRecvError::Empty) => Ok(None),
            Err(_) => Err(RecvError),
        }
    }
}

/// An in-memory Socket, for running a server without touching the network
pub struct ChannelSocket {
    inbound: Receiver<Datagram>,
    outbound: Sender<Datagram>,
}

impl ChannelSocket {
    /// Creates the socket together with the handle its peers use
    pub fn new() -> (Self, ChannelPeers) {
        let (inbound_sender, inbound_receiver) = channel::unbounded();
        let (outbound_sender, outbound_receiver) = channel::unbounded();
        (
            Self {
                inbound: inbound_receiver,
                outbound: outbound_sender,
            },
            ChannelPeers {
                inbound: inbound_sender,
                outbound: outbound_receiver,
            },
        )
    }
}

impl TransportSocket for ChannelSocket {
    fn listen(self: Box<Self>) -> (Box<dyn TransportSender>, Box<dyn TransportReceiver>) {
        (
            Box::new(self.outbound),
            Box::new(PacketChannelReceiver::new(self.inbound)),
        )
    }
}

impl Into<Box<dyn TransportSocket>> for ChannelSocket {
    fn into(self) -> Box<dyn TransportSocket> {
        Box::new(self)
    }
}

/// The far side of a ChannelSocket
#[derive(Clone)]
pub struct ChannelPeers {
    inbound: Sender<Datagram>,
    outbound: Receiver<Datagram>,
}

impl ChannelPeers {
    /// Delivers a datagram to the server as if sent from `from`
    pub fn send_from(&self, from: &SocketAddr, payload: &[u8]) -> Result<(), SendError> {
        TransportSender::send(&self.inbound, from, payload)
    }

    /// Next datagram the server has sent, with its destination
    pub fn receive(&self) -> Option<Datagram> {
        self.outbound.try_recv().ok()
    }

    /// Every datagram the server has sent so far
    pub fn receive_all(&self) -> Vec<Datagram> {
        std::iter::from_fn(|| self.receive()).collect()
    }
}
